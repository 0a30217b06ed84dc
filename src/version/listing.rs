//! Listing trait for discovering the versions a repository advertises

#[cfg(test)]
use mockall::automock;

use crate::version::error::RepositoryError;
use crate::version::types::{Coordinate, Listing};

/// One version-discovery strategy against one repository
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait VersionListing: Send + Sync {
    /// Short name used in debug logs
    fn name(&self) -> &'static str;

    /// Fetches the versions advertised for `coordinate`
    ///
    /// # Returns
    /// * `Ok(Some(Listing))` - Versions in document order, plus where descriptors live
    /// * `Ok(None)` - This strategy has nothing for the coordinate (non-200 response)
    /// * `Err(RepositoryError)` - Transport failure or malformed document
    async fn fetch_versions(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Option<Listing>, RepositoryError>;
}
