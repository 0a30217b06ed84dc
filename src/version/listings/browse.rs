//! Repository-manager REST browse fallbacks

use reqwest::StatusCode;
use scraper::{Html, Selector};
use tracing::{debug, error};

use crate::http::HttpClient;
use crate::version::error::RepositoryError;
use crate::version::listing::VersionListing;
use crate::version::listings::fetch_metadata;
use crate::version::types::{Coordinate, Listing, RepositorySection};

/// `maven-metadata.xml` read through `{base}/service/rest/repository/browse/{repo}/...`
pub struct BrowseMetadataListing {
    http: HttpClient,
    repository: RepositorySection,
}

impl BrowseMetadataListing {
    pub fn new(http: HttpClient, repository: RepositorySection) -> Self {
        Self { http, repository }
    }
}

#[async_trait::async_trait]
impl VersionListing for BrowseMetadataListing {
    fn name(&self) -> &'static str {
        "browse-metadata"
    }

    async fn fetch_versions(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Option<Listing>, RepositoryError> {
        let Some(browse_path) = self.repository.browse_path(coordinate) else {
            debug!("{}: no repository name for REST browse", self.repository.key);
            return Ok(None);
        };

        Ok(fetch_metadata(&self.http, &browse_path)
            .await?
            .map(|(versions, source_url)| Listing {
                versions,
                artifact_path: browse_path,
                source_url,
            }))
    }
}

/// Version directories scraped from the browse service's HTML listing.
///
/// Descriptors are then probed under `{base}/repository/{repo}/...`, where the
/// repository manager serves files.
pub struct BrowseHtmlListing {
    http: HttpClient,
    repository: RepositorySection,
}

impl BrowseHtmlListing {
    pub fn new(http: HttpClient, repository: RepositorySection) -> Self {
        Self { http, repository }
    }
}

#[async_trait::async_trait]
impl VersionListing for BrowseHtmlListing {
    fn name(&self) -> &'static str {
        "browse-html"
    }

    async fn fetch_versions(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Option<Listing>, RepositoryError> {
        let (Some(browse_path), Some(serving_path)) = (
            self.repository.browse_path(coordinate),
            self.repository.serving_path(coordinate),
        ) else {
            return Ok(None);
        };

        let url = format!("{}/", browse_path);
        let response = self.http.get(&url).await?;

        if response.status() != StatusCode::OK {
            debug!("{} returned status {}", url, response.status());
            return Ok(None);
        }

        let source_url = response.url().to_string();
        let body = response.text().await?;

        let Some(versions) = parse_listing_table(&body) else {
            error!("Failed to parse versions from HTML at {}", browse_path);
            return Ok(None);
        };

        if versions.is_empty() {
            return Ok(None);
        }

        Ok(Some(Listing {
            versions,
            artifact_path: serving_path,
            source_url,
        }))
    }
}

/// Anchor texts inside the first `<table>`, or `None` when the page has no table.
pub fn parse_listing_table(html: &str) -> Option<Vec<String>> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").ok()?;
    let anchor_selector = Selector::parse("a").ok()?;

    let table = document.select(&table_selector).next()?;

    Some(
        table
            .select(&anchor_selector)
            .map(|anchor| anchor.text().collect::<String>())
            .map(|text| text.trim().trim_end_matches('/').to_string())
            .filter(|text| !text.is_empty())
            .collect(),
    )
}
