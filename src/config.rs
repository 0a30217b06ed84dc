use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::info;

/// Config file looked up in the working directory, then in the home directory
pub const CONFIG_FILE: &str = "maven_check_versions.yml";

/// Section holding the run-wide switches; the only one CLI and env can override
pub const BASE_SECTION: &str = "base";

/// Environment overrides are `CV_<KEY>`
pub const ENV_PREFIX: &str = "CV_";

/// Default worker count for the parallel dependency and module passes
pub const DEFAULT_MAX_THREADS: usize = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing '{key}' in config section '{section}'")]
    MissingKey { section: String, key: String },

    #[error("Invalid value '{value}' for '{key}' in config section '{section}'")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },

    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// One layer of the lookup chain
pub trait ConfigSource: Send + Sync {
    /// Raw text of `section.key`, if this layer defines it
    fn lookup(&self, key: &str, section: &str) -> Option<String>;

    /// Every pair of `section` in declaration order
    fn items(&self, _section: &str) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Command-line overrides of `base` keys; only flags actually given are present
#[derive(Debug, Clone, Default)]
pub struct ArgumentSource {
    values: IndexMap<String, String>,
}

impl ArgumentSource {
    pub fn new(values: IndexMap<String, String>) -> Self {
        Self { values }
    }
}

impl ConfigSource for ArgumentSource {
    fn lookup(&self, key: &str, section: &str) -> Option<String> {
        if section != BASE_SECTION {
            return None;
        }
        self.values.get(key).cloned()
    }
}

/// `CV_<KEY>` environment overrides of `base` keys
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    values: IndexMap<String, String>,
}

impl EnvSource {
    /// Snapshot of the `CV_` variables of the current process
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            values: vars
                .into_iter()
                .filter(|(name, _)| name.starts_with(ENV_PREFIX))
                .collect(),
        }
    }
}

impl ConfigSource for EnvSource {
    fn lookup(&self, key: &str, section: &str) -> Option<String> {
        if section != BASE_SECTION {
            return None;
        }
        self.values
            .get(&format!("{}{}", ENV_PREFIX, key.to_uppercase()))
            .cloned()
    }
}

type Sections = IndexMap<String, IndexMap<String, serde_yaml::Value>>;

/// Sections of the YAML config file
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    sections: Sections,
}

impl FileSource {
    pub fn parse(yaml: &str, path: &Path) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let sections: Option<Sections> =
            serde_yaml::from_str(yaml).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            sections: sections.unwrap_or_default(),
        })
    }

    /// Reads `path`; a missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Self::parse(&text, path)?;

        let shown = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        info!("Load Config: {}", shown.display());

        Ok(source)
    }
}

impl ConfigSource for FileSource {
    fn lookup(&self, key: &str, section: &str) -> Option<String> {
        self.sections.get(section)?.get(key).and_then(scalar_text)
    }

    fn items(&self, section: &str) -> Vec<(String, String)> {
        self.sections
            .get(section)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|(key, value)| Some((key.clone(), scalar_text(value)?)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Conversion from the raw text of a config value
pub trait ConfigValue: Sized {
    fn from_raw(raw: &str) -> Option<Self>;
}

impl ConfigValue for String {
    fn from_raw(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl ConfigValue for bool {
    /// Only `true`, in any case, is true.
    fn from_raw(raw: &str) -> Option<Self> {
        Some(raw.trim().eq_ignore_ascii_case("true"))
    }
}

macro_rules! parsed_config_value {
    ($($ty:ty),*) => {
        $(
            impl ConfigValue for $ty {
                fn from_raw(raw: &str) -> Option<Self> {
                    raw.trim().parse().ok()
                }
            }
        )*
    };
}

parsed_config_value!(i64, u64, usize, f64);

/// Lookup chain over CLI overrides, environment overrides and the config file
pub struct Config {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl Config {
    /// `sources` in priority order, highest first
    pub fn new(sources: Vec<Box<dyn ConfigSource>>) -> Self {
        Self { sources }
    }

    /// Arguments, then `CV_` variables, then `file`
    pub fn layered(arguments: ArgumentSource, file: FileSource) -> Self {
        Self::new(vec![
            Box::new(arguments),
            Box::new(EnvSource::from_env()),
            Box::new(file),
        ])
    }

    /// Loads the config file at `path` under the given overrides.
    pub fn load(arguments: ArgumentSource, path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::layered(arguments, FileSource::load(path)?))
    }

    pub fn raw(&self, key: &str, section: &str) -> Option<String> {
        self.sources
            .iter()
            .find_map(|source| source.lookup(key, section))
    }

    /// Typed value of `section.key`; text that does not convert counts as absent.
    pub fn get<T: ConfigValue>(&self, key: &str, section: &str) -> Option<T> {
        self.raw(key, section).and_then(|raw| T::from_raw(&raw))
    }

    pub fn get_or<T: ConfigValue>(&self, key: &str, section: &str, default: T) -> T {
        self.get(key, section).unwrap_or(default)
    }

    /// `base` switch, false when absent
    pub fn flag(&self, key: &str) -> bool {
        self.get_or(key, BASE_SECTION, false)
    }

    /// Like [`Config::get`], but text that does not convert is an error.
    pub fn parse<T: ConfigValue>(&self, key: &str, section: &str) -> Result<Option<T>, ConfigError> {
        match self.raw(key, section) {
            None => Ok(None),
            Some(raw) => T::from_raw(&raw)
                .map(Some)
                .ok_or_else(|| ConfigError::InvalidValue {
                    section: section.to_string(),
                    key: key.to_string(),
                    value: raw,
                }),
        }
    }

    pub fn items(&self, section: &str) -> Vec<(String, String)> {
        self.sources
            .iter()
            .map(|source| source.items(section))
            .find(|items| !items.is_empty())
            .unwrap_or_default()
    }
}

/// Returns the config file to read: `explicit` when given, else
/// [`CONFIG_FILE`] in the working directory, else in the home directory.
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    config_path_with_home(explicit, Path::new(CONFIG_FILE).exists(), dirs::home_dir())
}

fn config_path_with_home(
    explicit: Option<PathBuf>,
    local_exists: bool,
    home_dir: Option<PathBuf>,
) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if local_exists {
        return PathBuf::from(CONFIG_FILE);
    }
    home_dir
        .map(|home| home.join(CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serial_test::serial;
    use std::io::Write;

    const YAML: &str = r#"
base:
  cache_time: 600
  fail_mode: true
  show_skip: "False"
  max_threads: many
requests:
  verify: false
repositories:
  Central (repo1.maven.org): repo1
  Custom: nexus
repo1:
  base: https://repo1.maven.org
  path: maven2
vulnerability:
  fail-score: 7.5
"#;

    fn file_source() -> FileSource {
        FileSource::parse(YAML, Path::new("test.yml")).unwrap()
    }

    fn arguments(pairs: &[(&str, &str)]) -> ArgumentSource {
        ArgumentSource::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn env(pairs: &[(&str, &str)]) -> EnvSource {
        EnvSource::from_vars(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn get_converts_file_values() {
        let config = Config::new(vec![Box::new(file_source())]);

        assert_eq!(config.get::<i64>("cache_time", "base"), Some(600));
        assert_eq!(config.get::<bool>("fail_mode", "base"), Some(true));
        assert_eq!(config.get::<bool>("show_skip", "base"), Some(false));
        assert_eq!(config.get::<bool>("verify", "requests"), Some(false));
        assert_eq!(config.get::<f64>("fail-score", "vulnerability"), Some(7.5));
        assert_eq!(
            config.get::<String>("base", "repo1"),
            Some("https://repo1.maven.org".to_string())
        );
    }

    #[test]
    fn get_treats_unconvertible_and_missing_values_as_absent() {
        let config = Config::new(vec![Box::new(file_source())]);

        assert_eq!(config.get::<usize>("max_threads", "base"), None);
        assert_eq!(config.get_or("max_threads", "base", DEFAULT_MAX_THREADS), 8);
        assert_eq!(config.get::<String>("nope", "base"), None);
        assert_eq!(config.get::<String>("base", "missing_section"), None);
    }

    #[test]
    fn parse_reports_unconvertible_values() {
        let config = Config::new(vec![Box::new(file_source())]);

        assert!(matches!(
            config.parse::<usize>("max_threads", "base"),
            Err(ConfigError::InvalidValue { ref value, .. }) if value == "many"
        ));
        assert_eq!(config.parse::<i64>("cache_time", "base").unwrap(), Some(600));
        assert_eq!(config.parse::<i64>("absent", "base").unwrap(), None);
    }

    #[rstest]
    // argument wins over env and file
    #[case(&[("cache_time", "1")], &[("CV_CACHE_TIME", "2")], "1")]
    // env wins over file
    #[case(&[], &[("CV_CACHE_TIME", "2")], "2")]
    #[case(&[], &[], "600")]
    fn lookup_chain_priority(
        #[case] args: &[(&str, &str)],
        #[case] vars: &[(&str, &str)],
        #[case] expected: &str,
    ) {
        let config = Config::new(vec![
            Box::new(arguments(args)),
            Box::new(env(vars)),
            Box::new(file_source()),
        ]);

        assert_eq!(config.raw("cache_time", "base"), Some(expected.to_string()));
    }

    #[test]
    fn overrides_only_apply_to_base_section() {
        let config = Config::new(vec![
            Box::new(arguments(&[("verify", "true")])),
            Box::new(env(&[("CV_VERIFY", "true")])),
            Box::new(file_source()),
        ]);

        assert_eq!(config.get::<bool>("verify", "requests"), Some(false));
    }

    #[test]
    fn items_preserve_declaration_order() {
        let config = Config::new(vec![Box::new(arguments(&[])), Box::new(file_source())]);

        assert_eq!(
            config.items("repositories"),
            vec![
                ("Central (repo1.maven.org)".to_string(), "repo1".to_string()),
                ("Custom".to_string(), "nexus".to_string()),
            ]
        );
        assert!(config.items("pom_files").is_empty());
    }

    #[test]
    fn parse_rejects_malformed_yaml() {
        let result = FileSource::parse("base: [unclosed", Path::new("bad.yml"));

        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn parse_accepts_empty_document() {
        let config = Config::new(vec![Box::new(
            FileSource::parse("", Path::new("empty.yml")).unwrap(),
        )]);

        assert!(config.items("base").is_empty());
    }

    #[test]
    fn load_reads_file_and_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(YAML.as_bytes())
            .unwrap();

        let loaded = FileSource::load(&path).unwrap();
        assert_eq!(loaded.lookup("path", "repo1"), Some("maven2".to_string()));

        let missing = FileSource::load(&dir.path().join("absent.yml")).unwrap();
        assert_eq!(missing.lookup("path", "repo1"), None);
    }

    #[test]
    #[serial]
    fn env_source_reads_prefixed_process_variables() {
        // SAFETY: serialized with every other test touching the environment
        unsafe { std::env::set_var("CV_SHOW_SEARCH", "true") };

        let source = EnvSource::from_env();

        unsafe { std::env::remove_var("CV_SHOW_SEARCH") };

        assert_eq!(source.lookup("show_search", "base"), Some("true".to_string()));
        assert_eq!(source.lookup("show_search", "requests"), None);
    }

    #[test]
    fn config_path_prefers_explicit_then_local_then_home() {
        let home = PathBuf::from("/home/user");

        assert_eq!(
            config_path_with_home(Some(PathBuf::from("custom.yml")), true, Some(home.clone())),
            PathBuf::from("custom.yml")
        );
        assert_eq!(
            config_path_with_home(None, true, Some(home.clone())),
            PathBuf::from(CONFIG_FILE)
        );
        assert_eq!(
            config_path_with_home(None, false, Some(home.clone())),
            home.join(CONFIG_FILE)
        );
        assert_eq!(
            config_path_with_home(None, false, None),
            PathBuf::from(CONFIG_FILE)
        );
    }
}
