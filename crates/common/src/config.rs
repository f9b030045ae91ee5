//! API client configuration
//!
//! Credentials come from one of three places, in this order:
//!
//! 1. explicit credentials (key, secret and url all set)
//! 2. `CLOUDSTACK_ENDPOINT`, `CLOUDSTACK_KEY` and `CLOUDSTACK_SECRET`
//! 3. a TOML credentials file: `$CLOUDSTACK_CONFIG`, `./cloudstack.toml`
//!    or `~/.cloudstack.toml`, section `$CLOUDSTACK_REGION` (default
//!    `cloudstack`)
//!
//! An explicit HTTP method overrides the method of whichever source won.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::{Error, Result};

/// Default credentials file section
pub const DEFAULT_REGION: &str = "cloudstack";

/// Default interval between job status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// HTTP method used for API calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
}

impl Default for HttpMethod {
    fn default() -> Self {
        Self::Get
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            other => Err(Error::InvalidConfig(format!(
                "api_http_method must be get or post (got '{}')",
                other
            ))),
        }
    }
}

/// Credentials supplied directly by the caller
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub api_url: Option<String>,
    pub method: Option<HttpMethod>,
}

/// Fully resolved API client configuration
#[derive(Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_secret: String,
    pub method: HttpMethod,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("method", &self.method)
            .finish()
    }
}

/// One section of the credentials file
#[derive(Debug, Clone, Deserialize)]
struct FileSection {
    endpoint: String,
    key: String,
    secret: String,
    #[serde(default)]
    method: Option<String>,
}

impl ApiConfig {
    /// Resolve the configuration from the process environment
    pub fn resolve(explicit: &Credentials, region: Option<&str>) -> Result<Self> {
        Self::resolve_with(explicit, region, |key| std::env::var(key).ok(), &default_config_paths())
    }

    /// Resolve with an injected environment and file search list
    pub fn resolve_with<F>(
        explicit: &Credentials,
        region: Option<&str>,
        env: F,
        search: &[PathBuf],
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if let Some(config) = Self::from_explicit(explicit) {
            debug!("Using explicit API credentials");
            config
        } else if let Some(config) = Self::from_env(&env)? {
            debug!("Using API credentials from environment");
            config
        } else {
            let region = region
                .map(str::to_string)
                .or_else(|| env("CLOUDSTACK_REGION"))
                .unwrap_or_else(|| DEFAULT_REGION.to_string());

            let mut paths = Vec::new();
            if let Some(path) = env("CLOUDSTACK_CONFIG") {
                paths.push(PathBuf::from(path));
            }
            paths.extend(search.iter().cloned());

            match paths.iter().find(|p| p.exists()) {
                Some(path) => Self::load(path, &region)?,
                None => {
                    return Err(Error::ClientUnavailable(
                        "no API credentials: set api_key, api_secret and api_url, \
                         the CLOUDSTACK_* environment, or a cloudstack.toml file"
                            .to_string(),
                    ))
                }
            }
        };

        if let Some(method) = explicit.method {
            config.method = method;
        }

        Ok(config)
    }

    /// Load one section of a TOML credentials file
    pub fn load(path: &Path, region: &str) -> Result<Self> {
        debug!("Reading API credentials from {} [{}]", path.display(), region);
        let content = std::fs::read_to_string(path)?;
        let mut sections: HashMap<String, FileSection> = toml::from_str(&content)?;
        let section = sections.remove(region).ok_or_else(|| {
            Error::ClientUnavailable(format!(
                "section [{}] not found in {}",
                region,
                path.display()
            ))
        })?;

        let method = section
            .method
            .as_deref()
            .map(str::parse::<HttpMethod>)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            endpoint: section.endpoint,
            api_key: section.key,
            api_secret: section.secret,
            method,
        })
    }

    fn from_explicit(explicit: &Credentials) -> Option<Self> {
        match (&explicit.api_key, &explicit.api_secret, &explicit.api_url) {
            (Some(key), Some(secret), Some(url)) => Some(Self {
                endpoint: url.clone(),
                api_key: key.clone(),
                api_secret: secret.clone(),
                method: explicit.method.unwrap_or_default(),
            }),
            _ => None,
        }
    }

    fn from_env<F>(env: &F) -> Result<Option<Self>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (Some(endpoint), Some(key), Some(secret)) = (
            env("CLOUDSTACK_ENDPOINT"),
            env("CLOUDSTACK_KEY"),
            env("CLOUDSTACK_SECRET"),
        ) else {
            return Ok(None);
        };

        let method = env("CLOUDSTACK_METHOD")
            .as_deref()
            .map(str::parse::<HttpMethod>)
            .transpose()?
            .unwrap_or_default();

        Ok(Some(Self {
            endpoint,
            api_key: key,
            api_secret: secret,
            method,
        }))
    }
}

/// Credentials files searched after `$CLOUDSTACK_CONFIG`
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("cloudstack.toml")];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".cloudstack.toml"));
    }
    paths
}

/// How long and how often to wait on an async job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    /// Unbounded: poll every two seconds until the job finishes
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
            timeout: None,
        }
    }
}

impl PollPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn is_bounded(&self) -> bool {
        self.max_attempts.is_some() || self.timeout.is_some()
    }
}
