//! Version-discovery strategies, tried in order for each repository
//!
//! 1. [`MetadataListing`]: `maven-metadata.xml` under the repository layout path
//! 2. [`BrowseMetadataListing`]: the same document through the REST browse service
//! 3. [`BrowseHtmlListing`]: the browse service's HTML directory listing

mod browse;
mod metadata;

pub use browse::{BrowseHtmlListing, BrowseMetadataListing};
pub use metadata::MetadataListing;

use reqwest::StatusCode;
use tracing::debug;

use crate::http::HttpClient;
use crate::version::error::RepositoryError;

const METADATA_FILE: &str = "maven-metadata.xml";

/// Text of every `<version>` element, in document order
pub fn parse_metadata_versions(body: &str, url: &str) -> Result<Vec<String>, RepositoryError> {
    let document =
        roxmltree::Document::parse(body).map_err(|source| RepositoryError::InvalidMetadata {
            url: url.to_string(),
            source,
        })?;

    Ok(document
        .descendants()
        .filter(|node| node.has_tag_name("version"))
        .filter_map(|node| node.text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect())
}

/// GET `{path}/maven-metadata.xml` and parse it; `None` unless the response is
/// a 200 listing at least one version.
async fn fetch_metadata(
    http: &HttpClient,
    path: &str,
) -> Result<Option<(Vec<String>, String)>, RepositoryError> {
    let url = format!("{}/{}", path, METADATA_FILE);
    let response = http.get(&url).await?;

    if response.status() != StatusCode::OK {
        debug!("{} returned status {}", url, response.status());
        return Ok(None);
    }

    let source_url = response.url().to_string();
    let body = response.text().await?;
    let versions = parse_metadata_versions(&body, &url)?;

    if versions.is_empty() {
        debug!("No versions listed at {}", url);
        return Ok(None);
    }

    Ok(Some((versions, source_url)))
}
