//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.apidash.toml` files.

use crate::sources::Service;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".apidash.toml";

/// Public low-volume key NASA publishes for its APIs.
pub const NASA_DEMO_KEY: &str = "DEMO_KEY";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// API credentials.
    #[serde(default)]
    pub keys: ApiKeys,

    /// Upstream base URLs.
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Output format: "markdown" or "json".
    #[serde(default = "default_format")]
    pub format: String,

    /// Show a spinner while requests are in flight.
    #[serde(default = "default_true")]
    pub progress: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            progress: true,
        }
    }
}

fn default_format() -> String {
    "markdown".to_string()
}

fn default_true() -> bool {
    true
}

/// Read-only credential snapshot.
///
/// An empty string counts as unset. Only NASA has a default key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superhero: Option<String>,

    #[serde(default = "default_nasa_key", skip_serializing_if = "Option::is_none")]
    pub nasa: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub giphy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            superhero: None,
            nasa: default_nasa_key(),
            giphy: None,
            tmdb: None,
        }
    }
}

fn default_nasa_key() -> Option<String> {
    Some(NASA_DEMO_KEY.to_string())
}

impl ApiKeys {
    /// The usable key for `service`, if one is set and non-empty.
    pub fn get(&self, service: Service) -> Option<&str> {
        let key = match service {
            Service::Superhero => &self.superhero,
            Service::Nasa => &self.nasa,
            Service::Giphy => &self.giphy,
            Service::Tmdb => &self.tmdb,
        };
        key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    fn slot_mut(&mut self, service: Service) -> &mut Option<String> {
        match service {
            Service::Superhero => &mut self.superhero,
            Service::Nasa => &mut self.nasa,
            Service::Giphy => &mut self.giphy,
            Service::Tmdb => &mut self.tmdb,
        }
    }

    /// Replace the key for `service` when `value` is non-empty.
    pub fn set_if_present(&mut self, service: Service, value: Option<&str>) {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            *self.slot_mut(service) = Some(value.to_string());
        }
    }

    /// Services that have a usable key.
    pub fn configured(&self) -> Vec<Service> {
        Service::ALL
            .into_iter()
            .filter(|s| self.get(*s).is_some())
            .collect()
    }

    /// Services that still need a key.
    pub fn missing(&self) -> Vec<Service> {
        Service::ALL
            .into_iter()
            .filter(|s| self.get(*s).is_none())
            .collect()
    }
}

/// Base URLs for the upstream services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_superhero_url")]
    pub superhero: String,

    #[serde(default = "default_nasa_url")]
    pub nasa: String,

    #[serde(default = "default_giphy_url")]
    pub giphy: String,

    #[serde(default = "default_tmdb_url")]
    pub tmdb: String,

    /// CORS relay prefix the Superhero API is reached through.
    /// The full upstream URL is percent-encoded and appended.
    #[serde(default = "default_relay_url")]
    pub relay: String,

    /// Prefix for TMDB poster paths.
    #[serde(default = "default_tmdb_images_url")]
    pub tmdb_images: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            superhero: default_superhero_url(),
            nasa: default_nasa_url(),
            giphy: default_giphy_url(),
            tmdb: default_tmdb_url(),
            relay: default_relay_url(),
            tmdb_images: default_tmdb_images_url(),
        }
    }
}

fn default_superhero_url() -> String {
    "https://www.superheroapi.com/api.php".to_string()
}

fn default_nasa_url() -> String {
    "https://api.nasa.gov".to_string()
}

fn default_giphy_url() -> String {
    "https://api.giphy.com/v1/gifs".to_string()
}

fn default_tmdb_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_relay_url() -> String {
    "https://corsproxy.io/?".to_string()
}

fn default_tmdb_images_url() -> String {
    "https://image.tmdb.org/t/p/w300".to_string()
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and their environment variables) take precedence over
    /// config file settings. Only explicit, non-empty values override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        self.keys
            .set_if_present(Service::Superhero, args.superhero_key.as_deref());
        self.keys.set_if_present(Service::Nasa, args.nasa_key.as_deref());
        self.keys.set_if_present(Service::Giphy, args.giphy_key.as_deref());
        self.keys.set_if_present(Service::Tmdb, args.tmdb_key.as_deref());

        if let Some(timeout) = args.timeout {
            self.http.timeout_seconds = timeout;
        }

        if let Some(format) = args.format {
            self.general.format = format.as_str().to_string();
        }

        if args.no_progress || args.quiet {
            self.general.progress = false;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        let body = toml::to_string_pretty(&config).unwrap_or_else(|_| String::new());
        format!(
            "# apidash configuration\n\
             # Keys may also come from APIDASH_SUPERHERO_KEY, APIDASH_NASA_KEY,\n\
             # APIDASH_GIPHY_KEY and APIDASH_TMDB_KEY.\n\n{}",
            body
        )
    }
}
