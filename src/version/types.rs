//! Common types shared by the prober, the checker and the cache

use std::fmt;

use crate::config::{Config, ConfigError};

/// `(group, artifact)` identity of a dependency
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
}

impl Coordinate {
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
        }
    }

    /// Cache key, `group:artifact`
    pub fn key(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }

    /// Repository layout path, `org/example/lib`
    pub fn path(&self) -> String {
        format!("{}/{}", self.group.replace('.', "/"), self.artifact)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

/// Display form of a possibly absent version, as it appears in log lines
pub fn display_version(version: Option<&str>) -> &str {
    version.unwrap_or("None")
}

/// One configured repository, tried in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySection {
    /// Display key printed in log lines and stored in cache entries
    pub key: String,
    pub base: String,
    pub path: Option<String>,
    pub repo: Option<String>,
    pub auth: bool,
    pub service_rest: bool,
}

impl RepositorySection {
    /// Reads the section named `section` and labels it with `key`.
    pub fn from_config(config: &Config, key: &str, section: &str) -> Result<Self, ConfigError> {
        let base: String =
            config
                .get("base", section)
                .ok_or_else(|| ConfigError::MissingKey {
                    section: section.to_string(),
                    key: "base".to_string(),
                })?;

        Ok(Self {
            key: key.to_string(),
            base: base.trim_end_matches('/').to_string(),
            path: config.get("path", section),
            repo: config.get("repo", section),
            auth: config.get_or("auth", section, false),
            service_rest: config.get_or("service_rest", section, false),
        })
    }

    /// `{base}/{path}[/{repo}]/{group-path}/{artifact}`
    pub fn artifact_path(&self, coordinate: &Coordinate) -> String {
        let mut url = self.base.clone();
        if let Some(path) = &self.path {
            url.push('/');
            url.push_str(path.trim_matches('/'));
        }
        if let Some(repo) = &self.repo {
            url.push('/');
            url.push_str(repo);
        }
        format!("{}/{}", url, coordinate.path())
    }

    /// Browse endpoint of the repository manager's REST service
    pub fn browse_path(&self, coordinate: &Coordinate) -> Option<String> {
        self.repo.as_ref().map(|repo| {
            format!(
                "{}/service/rest/repository/browse/{}/{}",
                self.base,
                repo,
                coordinate.path()
            )
        })
    }

    /// Path the repository manager serves artifact files from
    pub fn serving_path(&self, coordinate: &Coordinate) -> Option<String> {
        self.repo.as_ref().map(|repo| {
            format!("{}/repository/{}/{}", self.base, repo, coordinate.path())
        })
    }
}

/// Versions advertised by one tier of one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Raw version strings in document order
    pub versions: Vec<String>,
    /// Directory holding the per-version descriptor files
    pub artifact_path: String,
    /// URL the listing was read from
    pub source_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(path: Option<&str>, repo: Option<&str>) -> RepositorySection {
        RepositorySection {
            key: "central".to_string(),
            base: "https://repo.example.com".to_string(),
            path: path.map(str::to_string),
            repo: repo.map(str::to_string),
            auth: false,
            service_rest: false,
        }
    }

    #[test]
    fn coordinate_key_and_path() {
        let coordinate = Coordinate::new("org.apache.commons", "commons-lang3");

        assert_eq!(coordinate.key(), "org.apache.commons:commons-lang3");
        assert_eq!(coordinate.path(), "org/apache/commons/commons-lang3");
        assert_eq!(coordinate.to_string(), "org.apache.commons:commons-lang3");
    }

    #[test]
    fn artifact_path_includes_optional_segments() {
        let coordinate = Coordinate::new("org.example", "lib");

        assert_eq!(
            section(Some("maven2"), None).artifact_path(&coordinate),
            "https://repo.example.com/maven2/org/example/lib"
        );
        assert_eq!(
            section(Some("repository"), Some("releases")).artifact_path(&coordinate),
            "https://repo.example.com/repository/releases/org/example/lib"
        );
        assert_eq!(
            section(None, None).artifact_path(&coordinate),
            "https://repo.example.com/org/example/lib"
        );
    }

    #[test]
    fn rest_paths_require_repository_name() {
        let coordinate = Coordinate::new("org.example", "lib");

        assert_eq!(section(Some("maven2"), None).browse_path(&coordinate), None);
        assert_eq!(
            section(None, Some("releases")).browse_path(&coordinate),
            Some(
                "https://repo.example.com/service/rest/repository/browse/releases/org/example/lib"
                    .to_string()
            )
        );
        assert_eq!(
            section(None, Some("releases")).serving_path(&coordinate),
            Some("https://repo.example.com/repository/releases/org/example/lib".to_string())
        );
    }

    #[test]
    fn display_version_prints_none_for_absent_version() {
        assert_eq!(display_version(None), "None");
        assert_eq!(display_version(Some("1.0")), "1.0");
    }
}
