use thiserror::Error;

use crate::config::ConfigError;
use crate::pom::PomError;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Cache file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed cache data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid metadata at {url}: {source}")]
    InvalidMetadata {
        url: String,
        #[source]
        source: roxmltree::Error,
    },
}

/// Raised when a located candidate drifts further from the declared version
/// than the configured fail thresholds allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Fail version: {candidate} > {current}")]
pub struct ThresholdExceeded {
    pub candidate: String,
    pub current: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("cvssScore={score} >= fail-score={fail_score}")]
pub struct VulnerabilityError {
    pub score: f64,
    pub fail_score: f64,
}

/// Every way checking a POM or an artifact can abort.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Pom(#[from] PomError),

    #[error(transparent)]
    Threshold(#[from] ThresholdExceeded),

    #[error(transparent)]
    Vulnerability(#[from] VulnerabilityError),

    #[error("{0} parallel task(s) failed")]
    TasksFailed(usize),
}

impl CheckError {
    /// Policy breaches and fan-out task errors are logged where they happen;
    /// the top level only sets the exit code for them.
    pub fn already_logged(&self) -> bool {
        matches!(
            self,
            CheckError::Threshold(_) | CheckError::Vulnerability(_) | CheckError::TasksFailed(_)
        )
    }
}

impl From<reqwest::Error> for CheckError {
    fn from(e: reqwest::Error) -> Self {
        CheckError::Repository(RepositoryError::Network(e))
    }
}
