//! Clients for the four upstream APIs.
//!
//! Every call goes through [`ApiClient::get_json`], which folds whatever can
//! go wrong into a [`SourceError`]. The dashboard turns those into rejected
//! slots; nothing here decides how a failure is displayed.

pub mod giphy;
pub mod nasa;
pub mod superhero;
pub mod tmdb;

use crate::config::{ApiKeys, EndpointsConfig};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Which upstream service a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Superhero,
    Nasa,
    Giphy,
    Tmdb,
}

impl Service {
    pub const ALL: [Service; 4] = [
        Service::Superhero,
        Service::Nasa,
        Service::Giphy,
        Service::Tmdb,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Service::Superhero => "Superhero",
            Service::Nasa => "NASA",
            Service::Giphy => "GIPHY",
            Service::Tmdb => "TMDB",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Service::Superhero => "🦸",
            Service::Nasa => "🌌",
            Service::Giphy => "🎬",
            Service::Tmdb => "🍿",
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Broad class of a source failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// A credential is missing; no request was made.
    Configuration,
    /// Network, relay or HTTP status failure.
    Transport,
    /// The response arrived but did not have the expected shape.
    Payload,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{0} API key is not configured")]
    MissingKey(Service),

    #[error("{service} request failed: {message}")]
    Transport { service: Service, message: String },

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: Service,
        status: u16,
        body: String,
    },

    #[error("{service} returned an unexpected payload: {message}")]
    Payload { service: Service, message: String },
}

impl SourceError {
    pub fn fault(&self) -> Fault {
        match self {
            SourceError::MissingKey(_) => Fault::Configuration,
            SourceError::Transport { .. } | SourceError::Status { .. } => Fault::Transport,
            SourceError::Payload { .. } => Fault::Payload,
        }
    }

    pub(crate) fn payload(service: Service, message: impl Into<String>) -> Self {
        SourceError::Payload {
            service,
            message: message.into(),
        }
    }
}

/// Longest response body excerpt kept in a status error.
const BODY_EXCERPT: usize = 200;

/// Shared HTTP client plus a snapshot of endpoints and credentials.
///
/// Cheap to clone: each dashboard task gets its own copy.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    endpoints: EndpointsConfig,
    keys: ApiKeys,
}

impl ApiClient {
    pub fn new(
        endpoints: EndpointsConfig,
        keys: ApiKeys,
        timeout_seconds: u64,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("apidash/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoints,
            keys,
        })
    }

    pub fn endpoints(&self) -> &EndpointsConfig {
        &self.endpoints
    }

    /// The configured key for `service`, or a configuration fault.
    pub fn key(&self, service: Service) -> Result<&str, SourceError> {
        self.keys.get(service).ok_or(SourceError::MissingKey(service))
    }

    /// GET `url` and decode the body as `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        service: Service,
        url: &str,
    ) -> Result<T, SourceError> {
        debug!("GET {} ({})", self.log_url(url), service);

        let response = self.http.get(url).send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "request timed out".to_string()
            } else if e.is_connect() {
                "could not connect".to_string()
            } else {
                e.without_url().to_string()
            };
            SourceError::Transport { service, message }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                service,
                status,
                body: body.chars().take(BODY_EXCERPT).collect(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::payload(service, e.without_url().to_string()))
    }
}

impl ApiClient {
    /// `url` with every configured key masked, in plain and percent-encoded
    /// form. Superhero keys travel in the path, often inside a relayed URL.
    pub(crate) fn log_url(&self, url: &str) -> String {
        let mut logged = redact(url);
        for secret in Service::ALL.iter().filter_map(|s| self.keys.get(*s)) {
            logged = logged.replace(secret, "***");
            let encoded = urlencoding::encode(secret);
            if encoded != secret {
                logged = logged.replace(encoded.as_ref(), "***");
            }
        }
        logged
    }
}

/// Hide `api_key=` values before a URL reaches the log.
fn redact(url: &str) -> String {
    match url.find("api_key=") {
        Some(start) => {
            let value_start = start + "api_key=".len();
            let value_end = url[value_start..]
                .find('&')
                .map(|i| value_start + i)
                .unwrap_or(url.len());
            format!("{}***{}", &url[..value_start], &url[value_end..])
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::Router;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    /// Serve `app` on an ephemeral local port.
    pub async fn start_server(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    /// Endpoints that all point at the local server. The relay is left
    /// empty so superhero URLs are fetched directly.
    pub fn local_endpoints(addr: SocketAddr) -> EndpointsConfig {
        let base = format!("http://{}", addr);
        EndpointsConfig {
            superhero: format!("{}/superhero", base),
            nasa: format!("{}/nasa", base),
            giphy: format!("{}/giphy", base),
            tmdb: format!("{}/tmdb", base),
            relay: String::new(),
            tmdb_images: "https://image.tmdb.org/t/p/w300".to_string(),
        }
    }

    pub fn all_keys() -> ApiKeys {
        ApiKeys {
            superhero: Some("hero-key".to_string()),
            nasa: Some("DEMO_KEY".to_string()),
            giphy: Some("gif-key".to_string()),
            tmdb: Some("movie-key".to_string()),
        }
    }

    pub fn client(addr: SocketAddr, keys: ApiKeys) -> ApiClient {
        ApiClient::new(local_endpoints(addr), keys, 5).unwrap()
    }
}
