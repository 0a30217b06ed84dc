//! Candidate selection and validation for one repository listing

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime};
use reqwest::StatusCode;
use reqwest::header::LAST_MODIFIED;
use tracing::{info, warn};

use crate::http::HttpClient;
use crate::version::cache::{CacheEntry, VersionCache};
use crate::version::error::CheckError;
use crate::version::semver::{last_entry_is_not_newest, order_candidates};
use crate::version::threshold::FailThreshold;
use crate::version::types::{Coordinate, Listing, display_version};

/// Number of candidates shown in the ordering diagnostic
const DIAGNOSTIC_VERSIONS: usize = 5;

/// Number of candidates shown in a match line
const REPORTED_VERSIONS: usize = 3;

/// Knobs read from the `base` config section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckerSettings {
    /// Accept the declared version without probing when it is listed
    pub skip_current: bool,
    /// Log every candidate whose descriptor is missing
    pub show_invalid: bool,
    /// Order candidates by version instead of reversing the listing
    pub sort_versions: bool,
    /// Abort the run when drift exceeds these bounds
    pub fail_threshold: Option<FailThreshold>,
}

/// Outcome of probing one candidate's descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorProbe {
    /// Descriptor answered 200; `Last-Modified` as `YYYY-MM-DD` when readable
    Found { last_modified: Option<String> },
    Missing,
}

/// Picks the newest candidate of a listing whose descriptor exists
pub struct VersionChecker {
    settings: CheckerSettings,
    cache: Option<Arc<VersionCache>>,
}

impl VersionChecker {
    pub fn new(settings: CheckerSettings, cache: Option<Arc<VersionCache>>) -> Self {
        Self { settings, cache }
    }

    pub fn cache(&self) -> Option<&Arc<VersionCache>> {
        self.cache.as_ref()
    }

    /// Walks the listing newest first and stops at the first candidate that
    /// validates. With `skip_current`, reaching the current version accepts it
    /// without a probe; newer candidates are still probed first.
    ///
    /// Returns `Ok(false)` when no candidate validates; nothing is cached then.
    /// A fail-threshold breach is returned as an error after the cache write.
    pub async fn check_versions(
        &self,
        http: &HttpClient,
        repository_key: &str,
        coordinate: &Coordinate,
        current: Option<&str>,
        listing: &Listing,
    ) -> Result<bool, CheckError> {
        let candidates = order_candidates(&listing.versions, self.settings.sort_versions);
        if candidates.is_empty() {
            return Ok(false);
        }

        if last_entry_is_not_newest(&listing.versions) {
            let shown: Vec<String> = candidates
                .iter()
                .take(DIAGNOSTIC_VERSIONS)
                .cloned()
                .collect();
            warn!("Last versions: {}", quoted_list(&shown));
        }

        let recent: Vec<String> = candidates
            .iter()
            .take(REPORTED_VERSIONS)
            .cloned()
            .collect();
        let mut invalid_seen = false;

        for candidate in &candidates {
            if self.settings.skip_current && current == Some(candidate.as_str()) {
                self.remember(coordinate, candidate, repository_key, None, &recent);
                return Ok(true);
            }

            match probe_descriptor(http, &listing.artifact_path, &coordinate.artifact, candidate)
                .await?
            {
                DescriptorProbe::Found { last_modified } => {
                    info!(
                        "{}",
                        match_line(
                            repository_key,
                            coordinate,
                            current,
                            &recent,
                            last_modified.as_deref()
                        )
                    );

                    self.remember(coordinate, candidate, repository_key, last_modified, &recent);

                    if let Some(threshold) = &self.settings.fail_threshold {
                        threshold.check(candidate, current)?;
                    }
                    return Ok(true);
                }
                DescriptorProbe::Missing => {
                    if self.settings.show_invalid {
                        if !invalid_seen {
                            info!("{}", listing.source_url);
                        }
                        warn!("Invalid: {}:{}", coordinate, candidate);
                    }
                    invalid_seen = true;
                }
            }
        }

        Ok(false)
    }

    fn remember(
        &self,
        coordinate: &Coordinate,
        version: &str,
        repository_key: &str,
        last_modified: Option<String>,
        recent: &[String],
    ) {
        if let Some(cache) = &self.cache {
            cache.insert(
                coordinate,
                CacheEntry::new(version, repository_key, last_modified, recent),
            );
        }
    }
}

/// GET `{artifact_path}/{version}/{artifact}-{version}.pom`
pub async fn probe_descriptor(
    http: &HttpClient,
    artifact_path: &str,
    artifact: &str,
    version: &str,
) -> Result<DescriptorProbe, reqwest::Error> {
    let url = format!("{}/{}/{}-{}.pom", artifact_path, version, artifact, version);
    let response = http.get(&url).await?;

    if response.status() != StatusCode::OK {
        return Ok(DescriptorProbe::Missing);
    }

    let last_modified = response
        .headers()
        .get(LAST_MODIFIED)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_last_modified);

    Ok(DescriptorProbe::Found { last_modified })
}

/// Parses an HTTP date into `YYYY-MM-DD`.
///
/// Dates whose weekday does not match the calendar are still accepted.
pub fn parse_last_modified(value: &str) -> Option<String> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.date_naive().to_string());
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.date_naive().to_string());
    }

    let without_weekday = value.split_once(',').map_or(value, |(_, rest)| rest.trim());
    NaiveDateTime::parse_from_str(without_weekday, "%d %b %Y %H:%M:%S GMT")
        .ok()
        .map(|parsed| parsed.date().to_string())
}

/// `{repo}: {group}:{artifact}, current:{version} ['v1', 'v2', 'v3'] {date}`
pub fn match_line(
    repository_key: &str,
    coordinate: &Coordinate,
    current: Option<&str>,
    recent: &[String],
    last_modified: Option<&str>,
) -> String {
    format!(
        "{}: {}, current:{} {} {}",
        repository_key,
        coordinate,
        display_version(current),
        quoted_list(recent),
        last_modified.unwrap_or_default()
    )
    .trim_end()
    .to_string()
}

/// `['a', 'b']`
fn quoted_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|item| format!("'{}'", item)).collect();
    format!("[{}]", quoted.join(", "))
}
