//! Fail-mode drift policy

use tracing::warn;

use crate::version::error::ThresholdExceeded;
use crate::version::semver::MajorMinor;
use crate::version::types::display_version;

/// Largest tolerated `(major, minor)` drift between the declared version and
/// the newest validated candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailThreshold {
    pub major: i64,
    pub minor: i64,
}

impl FailThreshold {
    pub fn new(major: i64, minor: i64) -> Self {
        Self { major, minor }
    }

    /// Fails when either delta is above its bound.
    pub fn check(&self, candidate: &str, current: Option<&str>) -> Result<(), ThresholdExceeded> {
        let found = MajorMinor::parse(Some(candidate));
        let declared = MajorMinor::parse(current);

        if found.major - declared.major > self.major || found.minor - declared.minor > self.minor
        {
            let breach = ThresholdExceeded {
                candidate: candidate.to_string(),
                current: display_version(current).to_string(),
            };
            warn!("{}", breach);
            return Err(breach);
        }

        Ok(())
    }
}
