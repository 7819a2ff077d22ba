//! HTTP resource fetcher.
//!
//! Identifiers are usually absolute URLs and are requested as-is. Relative
//! identifiers are joined onto the configured base URL.

use crate::fetcher::{FetchError, ResourceFetcher};
use async_trait::async_trait;
use reqwest::{Certificate, Client};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use waybill_view_core::Identifier;

/// HTTP fetcher configuration.
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Base URL for relative identifiers (e.g., <http://localhost:8080>)
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Optional bearer token sent with every request
    pub bearer_token: Option<String>,
    /// Custom CA certificate path for self-signed server certs (PEM format)
    pub ca_cert_path: Option<PathBuf>,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(30),
            bearer_token: None,
            ca_cert_path: None,
        }
    }
}

/// Fetches JSON resources over HTTP(S).
pub struct HttpFetcher {
    client: Client,
    base_url: Url,
    config: HttpFetcherConfig,
}

impl HttpFetcher {
    /// Create a new HTTP fetcher.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid, the HTTP client cannot be
    /// created, or the CA certificate cannot be read or parsed.
    pub fn new(config: HttpFetcherConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FetchError::Init(format!("invalid base URL {}: {e}", config.base_url)))?;

        let mut builder = Client::builder().timeout(config.timeout);

        if base_url.scheme() == "https" {
            builder = builder.use_rustls_tls();
            if let Some(path) = &config.ca_cert_path {
                builder = builder.add_root_certificate(root_certificate(path)?);
            }
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::Init(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Turn an identifier into the URL to request.
    ///
    /// # Errors
    ///
    /// Returns error if the identifier is neither an absolute URL nor a
    /// path that can be joined onto the base URL.
    pub fn resolve_url(&self, id: &Identifier) -> Result<Url, FetchError> {
        match Url::parse(id.as_str()) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.base_url
                    .join(id.as_str())
                    .map_err(|e| FetchError::InvalidIdentifier {
                        id: id.to_string(),
                        message: e.to_string(),
                    })
            }
            Err(e) => Err(FetchError::InvalidIdentifier {
                id: id.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn auth_header(&self) -> Option<String> {
        self.config
            .bearer_token
            .as_ref()
            .map(|t| format!("Bearer {t}"))
    }
}

/// Read a PEM root certificate to trust alongside the built-in roots.
fn root_certificate(path: &Path) -> Result<Certificate, FetchError> {
    let pem = fs::read(path)
        .map_err(|e| FetchError::Init(format!("cannot read CA file {}: {e}", path.display())))?;
    let cert = Certificate::from_pem(&pem)
        .map_err(|e| FetchError::Init(format!("bad CA file {}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), "Trusting custom CA");
    Ok(cert)
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, id: &Identifier) -> Result<Value, FetchError> {
        let url = self.resolve_url(id)?;

        tracing::debug!(%id, %url, "GET resource");

        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/json");
        if let Some(auth) = self.auth_header() {
            request = request.header("Authorization", auth);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(id.to_string()));
        }

        if !response.status().is_success() {
            return Err(FetchError::ApiError {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default() {
        let config = HttpFetcherConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.bearer_token.is_none());
        assert!(config.ca_cert_path.is_none());
    }

    #[test]
    fn fetcher_creation() {
        assert!(HttpFetcher::new(HttpFetcherConfig::default()).is_ok());
    }

    #[test]
    fn invalid_base_url_fails() {
        let config = HttpFetcherConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        let err = HttpFetcher::new(config).err().unwrap();
        assert!(err.to_string().contains("client init error"));
    }

    #[test]
    fn missing_ca_certificate_fails() {
        let config = HttpFetcherConfig {
            base_url: "https://localhost:8443".to_string(),
            ca_cert_path: Some(PathBuf::from("/nonexistent/ca.pem")),
            ..Default::default()
        };
        assert!(matches!(HttpFetcher::new(config), Err(FetchError::Init(_))));
    }

    #[test]
    fn ca_certificate_only_read_for_https() {
        let config = HttpFetcherConfig {
            base_url: "http://localhost:8080".to_string(),
            ca_cert_path: Some(PathBuf::from("/nonexistent/ca.pem")),
            ..Default::default()
        };
        assert!(HttpFetcher::new(config).is_ok());
    }

    #[test]
    fn missing_ca_file_names_the_path() {
        assert!(matches!(
            root_certificate(Path::new("/nonexistent/ca.pem")),
            Err(FetchError::Init(message)) if message.contains("/nonexistent/ca.pem")
        ));
    }

    #[test]
    fn absolute_identifiers_are_used_as_is() {
        let fetcher = HttpFetcher::new(HttpFetcherConfig::default()).unwrap();
        let url = fetcher
            .resolve_url(&Identifier::new("https://tracking.example.org/shipments/7"))
            .unwrap();
        assert_eq!(url.as_str(), "https://tracking.example.org/shipments/7");
    }

    #[test]
    fn relative_identifiers_join_base() {
        let config = HttpFetcherConfig {
            base_url: "http://localhost:8080/api/".to_string(),
            ..Default::default()
        };
        let fetcher = HttpFetcher::new(config).unwrap();
        let url = fetcher
            .resolve_url(&Identifier::new("sensors/9/measurements"))
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/sensors/9/measurements");
    }

    #[test]
    fn unreachable_server_is_a_fetch_error() {
        let config = HttpFetcherConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(500),
            ..Default::default()
        };
        let fetcher = HttpFetcher::new(config).unwrap();
        let result = tokio_test::block_on(fetcher.fetch(&Identifier::new("shipments/1")));
        assert!(matches!(result, Err(FetchError::Request(_))));
    }
}
