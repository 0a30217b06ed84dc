use crate::http::HttpClient;
use crate::version::error::RepositoryError;
use crate::version::listing::VersionListing;
use crate::version::listings::fetch_metadata;
use crate::version::types::{Coordinate, Listing, RepositorySection};

/// `maven-metadata.xml` read from the repository's layout path
pub struct MetadataListing {
    http: HttpClient,
    repository: RepositorySection,
}

impl MetadataListing {
    pub fn new(http: HttpClient, repository: RepositorySection) -> Self {
        Self { http, repository }
    }
}

#[async_trait::async_trait]
impl VersionListing for MetadataListing {
    fn name(&self) -> &'static str {
        "metadata"
    }

    async fn fetch_versions(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Option<Listing>, RepositoryError> {
        let artifact_path = self.repository.artifact_path(coordinate);

        Ok(fetch_metadata(&self.http, &artifact_path)
            .await?
            .map(|(versions, source_url)| Listing {
                versions,
                artifact_path,
                source_url,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn repository(base: &str) -> RepositorySection {
        RepositorySection {
            key: "central".to_string(),
            base: base.to_string(),
            path: Some("maven2".to_string()),
            repo: None,
            auth: false,
            service_rest: false,
        }
    }

    #[tokio::test]
    async fn fetch_versions_returns_versions_in_document_order() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/maven2/org/example/lib/maven-metadata.xml")
            .with_status(200)
            .with_header("content-type", "application/xml")
            .with_body(
                r#"<metadata><versioning><versions>
                    <version>1.0</version>
                    <version>1.1</version>
                </versions></versioning></metadata>"#,
            )
            .create_async()
            .await;

        let listing = MetadataListing::new(HttpClient::new(true).unwrap(), repository(&server.url()));
        let result = listing
            .fetch_versions(&Coordinate::new("org.example", "lib"))
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.versions, vec!["1.0", "1.1"]);
        assert_eq!(
            result.artifact_path,
            format!("{}/maven2/org/example/lib", server.url())
        );
        assert!(result.source_url.ends_with("/maven-metadata.xml"));
    }

    #[tokio::test]
    async fn fetch_versions_returns_none_for_missing_metadata() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/maven2/org/example/lib/maven-metadata.xml")
            .with_status(404)
            .create_async()
            .await;

        let listing = MetadataListing::new(HttpClient::new(true).unwrap(), repository(&server.url()));
        let result = listing
            .fetch_versions(&Coordinate::new("org.example", "lib"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn fetch_versions_fails_on_malformed_metadata() {
        let mut server = Server::new_async().await;

        let _mock = server
            .mock("GET", "/maven2/org/example/lib/maven-metadata.xml")
            .with_status(200)
            .with_body("<metadata><versions>")
            .create_async()
            .await;

        let listing = MetadataListing::new(HttpClient::new(true).unwrap(), repository(&server.url()));
        let result = listing
            .fetch_versions(&Coordinate::new("org.example", "lib"))
            .await;

        assert!(matches!(
            result,
            Err(RepositoryError::InvalidMetadata { .. })
        ));
    }
}
