//! Dependency walker: POM loading, per-dependency checks and module recursion

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::config::{BASE_SECTION, Config, ConfigError, DEFAULT_MAX_THREADS};
use crate::http::{Credentials, HttpClient};
use crate::pom::{Dependency, Pom, is_placeholder, load_pom, module_paths, resolve_version};
use crate::version::cache::{CacheBackend, CacheBackendKind, CachePolicy, VersionCache, current_timestamp};
use crate::version::checker::{CheckerSettings, VersionChecker};
use crate::version::error::CheckError;
use crate::version::prober::RepositoryProber;
use crate::version::threshold::FailThreshold;
use crate::version::types::{Coordinate, RepositorySection, display_version};
use crate::vulnerability::{OssIndexClient, OssIndexSettings, VulnerabilityMap, purl};

/// What a run processes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// One POM file or URL
    Pom(String),
    /// One `group:artifact:version`
    Artifact(String),
    /// Every entry of the `pom_files` section
    ConfiguredPoms,
}

impl RunMode {
    pub fn select(pom_file: Option<String>, find_artifact: Option<String>) -> Self {
        match (pom_file, find_artifact) {
            (Some(pom), _) => RunMode::Pom(pom),
            (None, Some(artifact)) => RunMode::Artifact(artifact),
            (None, None) => RunMode::ConfiguredPoms,
        }
    }
}

/// Walk switches from the `base` section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    pub search_plugins: bool,
    pub process_modules: bool,
    pub show_skip: bool,
    pub show_search: bool,
    pub empty_version: bool,
    pub threading: bool,
    pub max_threads: usize,
}

impl WalkOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            search_plugins: config.flag("search_plugins"),
            process_modules: config.flag("process_modules"),
            show_skip: config.flag("show_skip"),
            show_search: config.flag("show_search"),
            empty_version: config.flag("empty_version"),
            threading: config.flag("threading"),
            max_threads: config
                .get_or("max_threads", BASE_SECTION, DEFAULT_MAX_THREADS)
                .max(1),
        }
    }
}

/// Opens the configured cache store, or `None` when `cache_off` is set.
pub fn open_cache_backend(config: &Config) -> Result<Option<Box<dyn CacheBackend>>, CheckError> {
    if config.flag("cache_off") {
        return Ok(None);
    }

    let kind = match config.get::<String>("cache_backend", BASE_SECTION) {
        None => CacheBackendKind::default(),
        Some(name) => name.parse::<CacheBackendKind>().map_err(|_| ConfigError::InvalidValue {
            section: BASE_SECTION.to_string(),
            key: "cache_backend".to_string(),
            value: name.clone(),
        })?,
    };
    let path = config
        .get::<String>("cache_file", BASE_SECTION)
        .map(PathBuf::from);

    Ok(Some(kind.open(path)?))
}

/// Loads the cache, processes `mode`, and saves the cache back.
///
/// The cache is saved even when the walk fails, so entries written before a
/// fail-mode breach are kept.
pub async fn run(config: &Config, mode: RunMode) -> Result<(), CheckError> {
    let backend = open_cache_backend(config)?;
    let cache = match &backend {
        Some(backend) => Some(Arc::new(VersionCache::load(backend.as_ref())?)),
        None => None,
    };

    let processor = Processor::from_config(config, cache.clone())?;
    let outcome = match mode {
        RunMode::Pom(location) => processor.process_pom(location, None).await,
        RunMode::Artifact(artifact) => processor.process_artifact(&artifact).await,
        RunMode::ConfiguredPoms => processor.process_configured_poms(config).await,
    };

    let saved = match (&backend, &cache) {
        (Some(backend), Some(cache)) => cache.save(backend.as_ref()),
        _ => Ok(()),
    };

    outcome?;
    saved?;
    processor.finish()
}

/// Checks every dependency of a POM tree against the configured repositories
pub struct Processor {
    pom_http: HttpClient,
    probers: Vec<RepositoryProber>,
    checker: VersionChecker,
    cache_policy: CachePolicy,
    vulnerabilities: OssIndexClient,
    options: WalkOptions,
    failed_tasks: AtomicUsize,
}

impl Processor {
    pub fn from_config(
        config: &Config,
        cache: Option<Arc<VersionCache>>,
    ) -> Result<Self, CheckError> {
        let http = HttpClient::new(config.get_or("verify", "requests", true))?;
        let credentials = config
            .get::<String>("user", BASE_SECTION)
            .map(|user| Credentials::new(user, config.get("password", BASE_SECTION)));

        let pom_http = if config.get_or("auth", "pom_http", false) {
            http.with_credentials(credentials.clone())
        } else {
            http.clone()
        };

        let probers = config
            .items("repositories")
            .into_iter()
            .map(|(key, section)| {
                let repository = RepositorySection::from_config(config, &key, &section)?;
                let client = if repository.auth {
                    http.with_credentials(credentials.clone())
                } else {
                    http.clone()
                };
                Ok(RepositoryProber::new(repository, client))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let fail_threshold = if config.flag("fail_mode") {
            Some(FailThreshold::new(
                config.parse("fail_major", BASE_SECTION)?.unwrap_or(0),
                config.parse("fail_minor", BASE_SECTION)?.unwrap_or(0),
            ))
        } else {
            None
        };

        let checker = VersionChecker::new(
            CheckerSettings {
                skip_current: config.flag("skip_current"),
                show_invalid: config.flag("show_invalid"),
                sort_versions: config.flag("sort_versions"),
                fail_threshold,
            },
            cache,
        );

        Ok(Self {
            pom_http,
            probers,
            checker,
            cache_policy: CachePolicy::new(config.get_or("cache_time", BASE_SECTION, 0)),
            vulnerabilities: OssIndexClient::new(&http, OssIndexSettings::from_config(config)),
            options: WalkOptions::from_config(config),
            failed_tasks: AtomicUsize::new(0),
        })
    }

    /// Turns errors already logged by parallel tasks into the run's result.
    pub fn finish(&self) -> Result<(), CheckError> {
        match self.failed_tasks.load(Ordering::SeqCst) {
            0 => Ok(()),
            failed => Err(CheckError::TasksFailed(failed)),
        }
    }

    pub async fn process_configured_poms(&self, config: &Config) -> Result<(), CheckError> {
        for (_, location) in config.items("pom_files") {
            self.process_pom(location, None).await?;
        }
        Ok(())
    }

    /// Processes one POM and, when enabled, its modules. Module names are
    /// prefixed with `"{prefix} / "`.
    pub fn process_pom(
        &self,
        location: String,
        prefix: Option<String>,
    ) -> BoxFuture<'_, Result<(), CheckError>> {
        async move {
            let pom = load_pom(&self.pom_http, &location).await?;

            let name = match prefix {
                Some(prefix) => format!("{} / {}", prefix, pom.display_name()),
                None => pom.display_name(),
            };
            info!("=== Processing: {} ===", name);

            let entries = pom.entries(self.options.search_plugins);
            let vulnerabilities = self.fetch_vulnerabilities(&pom, &entries).await;

            if self.options.threading {
                let tasks: Vec<_> = entries
                    .iter()
                    .map(|dependency| self.process_dependency(&pom, dependency, &vulnerabilities))
                    .collect();
                let results: Vec<_> = stream::iter(tasks)
                    .buffer_unordered(self.options.max_threads)
                    .collect()
                    .await;
                self.record_failures(results, "Error processing dependency");
            } else {
                for dependency in &entries {
                    self.process_dependency(&pom, dependency, &vulnerabilities)
                        .await?;
                }
            }

            if self.options.process_modules {
                self.process_modules(&pom, &location, &name).await?;
            }

            Ok(())
        }
        .boxed()
    }

    async fn process_modules(&self, pom: &Pom, location: &str, name: &str) -> Result<(), CheckError> {
        let paths = module_paths(location, &pom.modules);

        if self.options.threading {
            let tasks: Vec<_> = paths
                .into_iter()
                .map(|path| self.process_pom(path, Some(name.to_string())))
                .collect();
            let results: Vec<_> = stream::iter(tasks)
                .buffer_unordered(self.options.max_threads)
                .collect()
                .await;
            self.record_failures(results, "Error processing module");
        } else {
            for path in paths {
                self.process_pom(path, Some(name.to_string())).await?;
            }
        }

        Ok(())
    }

    fn record_failures(&self, results: Vec<Result<(), CheckError>>, context: &str) {
        for result in results {
            if let Err(e) = result {
                error!("{}: {}", context, e);
                self.failed_tasks.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    /// Checks one declared dependency or plugin.
    pub async fn process_dependency(
        &self,
        pom: &Pom,
        dependency: &Dependency,
        vulnerabilities: &VulnerabilityMap,
    ) -> Result<(), CheckError> {
        let (Some(group), Some(artifact)) = (&dependency.group, &dependency.artifact) else {
            error!("Missing artifactId or groupId in a dependency.");
            return Ok(());
        };
        let coordinate = Coordinate::new(group.as_str(), artifact.as_str());

        let resolved = resolve_version(
            dependency.version.as_deref(),
            pom,
            self.options.empty_version,
        );
        let version = resolved.version.as_deref();

        if resolved.skip {
            if self.options.show_skip {
                warn!("Skip: {}:{}", coordinate, display_version(version));
            }
            return Ok(());
        }

        self.log_search(&coordinate, version);

        if let Some(version) = version {
            self.vulnerabilities
                .check(&coordinate, version, vulnerabilities)?;
        }

        if self.cached(&coordinate, version) {
            return Ok(());
        }

        if !self.probe_repositories(&coordinate, version).await? {
            warn!("{}", not_found_line(&coordinate, version));
        }

        Ok(())
    }

    /// Looks up `group:artifact:version` in every repository, bypassing the cache.
    pub async fn process_artifact(&self, artifact: &str) -> Result<(), CheckError> {
        let Some((coordinate, version)) = split_artifact(artifact) else {
            return Err(ConfigError::InvalidValue {
                section: BASE_SECTION.to_string(),
                key: "find_artifact".to_string(),
                value: artifact.to_string(),
            }
            .into());
        };

        self.log_search(&coordinate, Some(version));

        if !self.probe_repositories(&coordinate, Some(version)).await? {
            warn!("{}", not_found_line(&coordinate, Some(version)));
        }

        Ok(())
    }

    /// Repositories in declaration order; the first match wins.
    pub async fn probe_repositories(
        &self,
        coordinate: &Coordinate,
        version: Option<&str>,
    ) -> Result<bool, CheckError> {
        for prober in &self.probers {
            if prober.probe(coordinate, version, &self.checker).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn cached(&self, coordinate: &Coordinate, version: Option<&str>) -> bool {
        self.checker
            .cache()
            .and_then(|cache| cache.get(coordinate))
            .is_some_and(|entry| {
                self.cache_policy
                    .accept(coordinate, version, &entry, current_timestamp())
            })
    }

    fn log_search(&self, coordinate: &Coordinate, version: Option<&str>) {
        if !self.options.show_search {
            return;
        }
        match version {
            Some(v) if !is_placeholder(v) => info!("Search: {}:{}", coordinate, v),
            _ => warn!("Search: {}:{}", coordinate, display_version(version)),
        }
    }

    async fn fetch_vulnerabilities(&self, pom: &Pom, entries: &[Dependency]) -> VulnerabilityMap {
        if !self.vulnerabilities.settings().enabled {
            return VulnerabilityMap::new();
        }

        let coordinates: Vec<String> = entries
            .iter()
            .filter_map(|dependency| {
                let coordinate = Coordinate::new(
                    dependency.group.as_deref()?,
                    dependency.artifact.as_deref()?,
                );
                let resolved = resolve_version(dependency.version.as_deref(), pom, false);
                let version = resolved.version.filter(|_| !resolved.skip)?;
                Some(purl(&coordinate, &version))
            })
            .collect();

        self.vulnerabilities.fetch(&coordinates).await
    }
}

/// `Not Found: {group}:{artifact}, current:{version}`
pub fn not_found_line(coordinate: &Coordinate, version: Option<&str>) -> String {
    format!("Not Found: {}, current:{}", coordinate, display_version(version))
}

/// Splits `group:artifact:version` on its first two colons.
pub fn split_artifact(artifact: &str) -> Option<(Coordinate, &str)> {
    let mut parts = artifact.splitn(3, ':');
    let group = parts.next()?;
    let artifact = parts.next()?;
    let version = parts.next()?;
    Some((Coordinate::new(group, artifact), version))
}
