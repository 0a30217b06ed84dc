//! Three-tier version discovery against one repository

use tracing::debug;

use crate::http::HttpClient;
use crate::version::checker::VersionChecker;
use crate::version::error::CheckError;
use crate::version::listing::VersionListing;
use crate::version::listings::{BrowseHtmlListing, BrowseMetadataListing, MetadataListing};
use crate::version::types::{Coordinate, RepositorySection};

/// Tries each listing strategy of one repository until the checker accepts a
/// candidate from it.
pub struct RepositoryProber {
    repository: RepositorySection,
    http: HttpClient,
    tiers: Vec<Box<dyn VersionListing>>,
}

impl RepositoryProber {
    /// Metadata tier always; both REST browse tiers when `service_rest` is set.
    ///
    /// `http` should already carry the repository's credentials.
    pub fn new(repository: RepositorySection, http: HttpClient) -> Self {
        let mut tiers: Vec<Box<dyn VersionListing>> = vec![Box::new(MetadataListing::new(
            http.clone(),
            repository.clone(),
        ))];

        if repository.service_rest {
            tiers.push(Box::new(BrowseMetadataListing::new(
                http.clone(),
                repository.clone(),
            )));
            tiers.push(Box::new(BrowseHtmlListing::new(
                http.clone(),
                repository.clone(),
            )));
        }

        Self::with_tiers(repository, http, tiers)
    }

    pub fn with_tiers(
        repository: RepositorySection,
        http: HttpClient,
        tiers: Vec<Box<dyn VersionListing>>,
    ) -> Self {
        Self {
            repository,
            http,
            tiers,
        }
    }

    pub fn key(&self) -> &str {
        &self.repository.key
    }

    /// Returns true as soon as one tier yields a candidate the checker accepts.
    ///
    /// A tier with nothing to offer falls through to the next one; transport
    /// and parse failures propagate.
    pub async fn probe(
        &self,
        coordinate: &Coordinate,
        current: Option<&str>,
        checker: &VersionChecker,
    ) -> Result<bool, CheckError> {
        for tier in &self.tiers {
            let Some(listing) = tier.fetch_versions(coordinate).await? else {
                debug!("{}: {} has no versions for {}", self.key(), tier.name(), coordinate);
                continue;
            };

            if checker
                .check_versions(&self.http, self.key(), coordinate, current, &listing)
                .await?
            {
                return Ok(true);
            }
        }

        Ok(false)
    }
}
