//! Shared HTTP client with optional Basic credentials

use reqwest::{Client, Response};
use serde::Serialize;

/// HTTP Basic credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: Option<String>) -> Self {
        Self {
            user: user.into(),
            password,
        }
    }
}

/// Wraps one connection pool for a whole run; per-repository credentials are
/// layered on top with [`HttpClient::with_credentials`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    credentials: Option<Credentials>,
}

impl HttpClient {
    /// Builds a client; `verify_tls = false` accepts any certificate.
    pub fn new(verify_tls: bool) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("maven-check-versions/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(!verify_tls)
            .build()?;

        Ok(Self {
            client,
            credentials: None,
        })
    }

    /// Same connection pool, different credentials
    pub fn with_credentials(&self, credentials: Option<Credentials>) -> Self {
        Self {
            client: self.client.clone(),
            credentials,
        }
    }

    pub async fn get(&self, url: &str) -> Result<Response, reqwest::Error> {
        let mut request = self.client.get(url);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.user, credentials.password.as_ref());
        }
        request.send().await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<Response, reqwest::Error> {
        let mut request = self.client.post(url).json(body);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.user, credentials.password.as_ref());
        }
        request.send().await
    }
}
