//! Known-vulnerability lookup through the Sonatype OSS Index component report

use std::collections::HashMap;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::config::Config;
use crate::http::{Credentials, HttpClient};
use crate::version::error::VulnerabilityError;
use crate::version::types::Coordinate;

pub const SECTION: &str = "vulnerability";
pub const DEFAULT_OSS_INDEX_URL: &str = "https://ossindex.sonatype.org/api/v3/component-report";
pub const DEFAULT_BATCH_SIZE: usize = 128;

/// One vulnerability entry of a component report
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vulnerability {
    #[serde(default)]
    pub id: String,
    pub display_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub cvss_score: Option<f64>,
    pub cvss_vector: Option<String>,
    pub cve: Option<String>,
    pub cwe: Option<String>,
    pub reference: Option<String>,
    #[serde(default)]
    pub external_references: Vec<String>,
    #[serde(default)]
    pub version_ranges: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ComponentReport {
    coordinates: String,
    #[serde(default)]
    vulnerabilities: Vec<Vulnerability>,
}

#[derive(Debug, Serialize)]
struct ReportRequest<'a> {
    coordinates: &'a [String],
}

/// Vulnerable components keyed by package URL
pub type VulnerabilityMap = HashMap<String, Vec<Vulnerability>>;

/// `pkg:maven/{group}/{artifact}@{version}`
pub fn purl(coordinate: &Coordinate, version: &str) -> String {
    format!(
        "pkg:maven/{}/{}@{}",
        coordinate.group, coordinate.artifact, version
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct OssIndexSettings {
    pub enabled: bool,
    pub url: String,
    pub user: Option<String>,
    pub token: Option<String>,
    pub batch_size: usize,
    pub fail_score: Option<f64>,
}

impl Default for OssIndexSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            url: DEFAULT_OSS_INDEX_URL.to_string(),
            user: None,
            token: None,
            batch_size: DEFAULT_BATCH_SIZE,
            fail_score: None,
        }
    }
}

impl OssIndexSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            enabled: config.get_or("oss_index_enabled", SECTION, false),
            url: config.get_or("oss_index_url", SECTION, DEFAULT_OSS_INDEX_URL.to_string()),
            user: config.get("oss_index_user", SECTION),
            token: config.get("oss_index_token", SECTION),
            batch_size: config
                .get_or("oss_index_batch_size", SECTION, DEFAULT_BATCH_SIZE)
                .max(1),
            fail_score: config.get("fail-score", SECTION),
        }
    }
}

pub struct OssIndexClient {
    http: HttpClient,
    settings: OssIndexSettings,
}

impl OssIndexClient {
    pub fn new(http: &HttpClient, settings: OssIndexSettings) -> Self {
        let credentials = settings
            .user
            .clone()
            .map(|user| Credentials::new(user, settings.token.clone()));

        Self {
            http: http.with_credentials(credentials),
            settings,
        }
    }

    pub fn settings(&self) -> &OssIndexSettings {
        &self.settings
    }

    /// Looks up `coordinates` (package URLs) batch by batch.
    ///
    /// Failures are logged and leave their batch out of the result.
    pub async fn fetch(&self, coordinates: &[String]) -> VulnerabilityMap {
        let mut result = VulnerabilityMap::new();
        if !self.settings.enabled || coordinates.is_empty() {
            return result;
        }

        for batch in coordinates.chunks(self.settings.batch_size) {
            match self.fetch_batch(batch).await {
                Ok(Some(reports)) => result.extend(
                    reports
                        .into_iter()
                        .filter(|report| !report.vulnerabilities.is_empty())
                        .map(|report| (report.coordinates, report.vulnerabilities)),
                ),
                Ok(None) => {}
                Err(e) => error!("Failed to fetch vulnerability data: {}", e),
            }
        }

        result
    }

    async fn fetch_batch(
        &self,
        batch: &[String],
    ) -> Result<Option<Vec<ComponentReport>>, reqwest::Error> {
        let response = self
            .http
            .post_json(&self.settings.url, &ReportRequest { coordinates: batch })
            .await?;

        if response.status() != StatusCode::OK {
            error!("OSS Index API error: {}", response.status().as_u16());
            return Ok(None);
        }

        Ok(Some(response.json().await?))
    }

    /// Logs every known vulnerability of `coordinate@version` and fails when
    /// the worst score reaches `fail-score`.
    pub fn check(
        &self,
        coordinate: &Coordinate,
        version: &str,
        data: &VulnerabilityMap,
    ) -> Result<(), VulnerabilityError> {
        check_vulnerabilities(coordinate, version, data, self.settings.fail_score)
    }
}

pub fn check_vulnerabilities(
    coordinate: &Coordinate,
    version: &str,
    data: &VulnerabilityMap,
    fail_score: Option<f64>,
) -> Result<(), VulnerabilityError> {
    let Some(vulnerabilities) = data.get(&purl(coordinate, version)) else {
        return Ok(());
    };

    for vulnerability in vulnerabilities {
        warn!(
            "Vulnerability for {}:{}: {}",
            coordinate,
            version,
            describe(vulnerability)
        );
    }

    let Some(fail_score) = fail_score else {
        return Ok(());
    };

    let worst = vulnerabilities
        .iter()
        .filter_map(|v| v.cvss_score)
        .fold(None, |worst: Option<f64>, score| {
            Some(worst.map_or(score, |w| w.max(score)))
        });

    match worst {
        Some(score) if score >= fail_score => {
            let breach = VulnerabilityError { score, fail_score };
            error!("{}", breach);
            Err(breach)
        }
        _ => Ok(()),
    }
}

fn describe(vulnerability: &Vulnerability) -> String {
    fn shown(value: Option<&str>) -> &str {
        value.unwrap_or("None")
    }

    format!(
        "cvssScore={} cve={} cwe={} {} {}",
        vulnerability
            .cvss_score
            .map_or_else(|| "None".to_string(), |s| s.to_string()),
        shown(vulnerability.cve.as_deref()),
        shown(vulnerability.cwe.as_deref()),
        shown(vulnerability.display_name.as_deref()),
        shown(vulnerability.reference.as_deref()),
    )
}
