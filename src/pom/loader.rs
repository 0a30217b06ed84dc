use std::path::Path;

use reqwest::StatusCode;

use crate::http::HttpClient;
use crate::pom::{Pom, PomError};

/// Locations starting with `http` are fetched, anything else is read from disk.
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http")
}

/// Reads and parses the POM at `location`.
///
/// `http` carries the `pom_http` credentials, if any.
pub async fn load_pom(http: &HttpClient, location: &str) -> Result<Pom, PomError> {
    let text = if is_remote(location) {
        let response = http.get(location).await?;
        if response.status() != StatusCode::OK {
            return Err(PomError::NotFound(location.to_string()));
        }
        response.text().await?
    } else {
        if !Path::new(location).exists() {
            return Err(PomError::NotFound(location.to_string()));
        }
        tokio::fs::read_to_string(location)
            .await
            .map_err(|source| PomError::Io {
                path: location.to_string(),
                source,
            })?
    };

    Pom::parse(&text, location)
}

/// `<dir of location>/<module>/pom.xml` for every module that is remote or
/// exists on disk
pub fn module_paths(location: &str, modules: &[String]) -> Vec<String> {
    let directory = location
        .rsplit_once('/')
        .map(|(directory, _)| directory)
        .unwrap_or_default();

    modules
        .iter()
        .map(|module| {
            if directory.is_empty() {
                format!("{}/pom.xml", module)
            } else {
                format!("{}/{}/pom.xml", directory, module)
            }
        })
        .filter(|path| is_remote(path) || Path::new(path).exists())
        .collect()
}
