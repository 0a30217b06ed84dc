//! Mock Maven repository

use mockito::{Matcher, Mock, Server, ServerGuard};

pub const LAST_MODIFIED: &str = "Sat, 18 Jan 2025 12:00:00 GMT";

pub fn metadata_xml(versions: &[&str]) -> String {
    let versions: String = versions
        .iter()
        .map(|v| format!("<version>{}</version>", v))
        .collect();
    format!(
        "<metadata><versioning><versions>{}</versions></versioning></metadata>",
        versions
    )
}

/// Repository laid out under `/maven2`
pub struct TestRepository {
    pub server: ServerGuard,
}

impl TestRepository {
    pub async fn start() -> Self {
        Self {
            server: Server::new_async().await,
        }
    }

    pub fn url(&self) -> String {
        self.server.url()
    }

    /// `maven-metadata.xml` listing `versions`, expected `hits` times
    pub async fn metadata(&mut self, artifact_path: &str, versions: &[&str], hits: usize) -> Mock {
        self.server
            .mock(
                "GET",
                format!("/maven2/{}/maven-metadata.xml", artifact_path).as_str(),
            )
            .with_status(200)
            .with_header("content-type", "application/xml")
            .with_body(metadata_xml(versions))
            .expect(hits)
            .create_async()
            .await
    }

    pub async fn missing_metadata(&mut self, artifact_path: &str, hits: usize) -> Mock {
        self.server
            .mock(
                "GET",
                format!("/maven2/{}/maven-metadata.xml", artifact_path).as_str(),
            )
            .with_status(404)
            .expect(hits)
            .create_async()
            .await
    }

    /// Descriptor of `artifact` at `version`, answering `status`
    pub async fn descriptor(
        &mut self,
        artifact_path: &str,
        artifact: &str,
        version: &str,
        status: usize,
        hits: usize,
    ) -> Mock {
        self.server
            .mock(
                "GET",
                format!(
                    "/maven2/{}/{}/{}-{}.pom",
                    artifact_path, version, artifact, version
                )
                .as_str(),
            )
            .with_status(status)
            .with_header("last-modified", LAST_MODIFIED)
            .expect(hits)
            .create_async()
            .await
    }

    /// Matches every descriptor probe; use with `hits = 0` to forbid probes.
    pub async fn any_descriptor(&mut self, hits: usize) -> Mock {
        self.server
            .mock("GET", Matcher::Regex(r"\.pom$".to_string()))
            .with_status(200)
            .expect(hits)
            .create_async()
            .await
    }

    /// Matches every request; use with `hits = 0` to forbid network access.
    pub async fn any_request(&mut self, hits: usize) -> Mock {
        self.server
            .mock("GET", Matcher::Any)
            .expect(hits)
            .create_async()
            .await
    }
}
