//! Declared parameters
//!
//! The options a configuration-management engine passes in, either as a JSON
//! args file or as individual flags.

use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

use cloudnet_common::{Credentials, DesiredState, Error, HttpMethod, NetworkSpec, PollPolicy, Result};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModuleParams {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub network_offering: Option<String>,
    pub zone: Option<String>,
    pub project: Option<String>,
    pub domain: Option<String>,
    pub state: Option<String>,
    #[serde(alias = "tag")]
    pub tags: Option<Vec<String>>,
    #[serde(deserialize_with = "de_loose_bool")]
    pub poll_async: Option<bool>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub api_url: Option<String>,
    pub api_http_method: Option<String>,
    pub api_region: Option<String>,
    /// Seconds between job polls
    pub poll_interval: Option<u64>,
    pub poll_max_attempts: Option<u32>,
    /// Seconds before giving up on a job
    pub poll_timeout: Option<u64>,
    #[serde(rename = "_ansible_check_mode", deserialize_with = "de_loose_bool")]
    pub check_mode: Option<bool>,
}

macro_rules! overlay {
    ($base:ident, $top:ident, $($field:ident),+ $(,)?) => {
        $( if $top.$field.is_some() { $base.$field = $top.$field; } )+
    };
}

impl ModuleParams {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Values set in `overrides` win
    pub fn merge(mut self, overrides: ModuleParams) -> Self {
        overlay!(
            self,
            overrides,
            name,
            display_name,
            network_offering,
            zone,
            project,
            domain,
            state,
            tags,
            poll_async,
            api_key,
            api_secret,
            api_url,
            api_http_method,
            api_region,
            poll_interval,
            poll_max_attempts,
            poll_timeout,
            check_mode,
        );
        self
    }

    /// Check the required options and build the network spec
    pub fn validate(&self) -> Result<(NetworkSpec, DesiredState)> {
        let spec = NetworkSpec {
            name: required(&self.name, "name")?,
            display_name: self.display_name.clone(),
            network_offering: required(&self.network_offering, "network_offering")?,
            zone: required(&self.zone, "zone")?,
            project: self.project.clone(),
            domain: self.domain.clone(),
            tags: self.tags.clone().unwrap_or_default(),
        };

        let state = match self.state.as_deref() {
            Some(state) => state.parse()?,
            None => DesiredState::default(),
        };

        Ok((spec, state))
    }

    pub fn credentials(&self) -> Result<Credentials> {
        let method = self
            .api_http_method
            .as_deref()
            .map(str::parse::<HttpMethod>)
            .transpose()?;

        Ok(Credentials {
            api_key: self.api_key.clone(),
            api_secret: self.api_secret.clone(),
            api_url: self.api_url.clone(),
            method,
        })
    }

    pub fn poll_async(&self) -> bool {
        self.poll_async.unwrap_or(true)
    }

    pub fn check_mode(&self) -> bool {
        self.check_mode.unwrap_or(false)
    }

    /// Poll policy from the `poll_*` options; a zero interval is rejected
    pub fn poll_policy(&self) -> Result<PollPolicy> {
        let mut policy = PollPolicy::default();
        if let Some(secs) = self.poll_interval {
            if secs == 0 {
                return Err(Error::InvalidConfig(
                    "poll_interval must be at least 1 second".to_string(),
                ));
            }
            policy = policy.with_interval(Duration::from_secs(secs));
        }
        if let Some(attempts) = self.poll_max_attempts {
            policy = policy.with_max_attempts(attempts);
        }
        if let Some(secs) = self.poll_timeout {
            policy = policy.with_timeout(Duration::from_secs(secs));
        }
        Ok(policy)
    }
}

fn required(value: &Option<String>, option: &str) -> Result<String> {
    match value {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(Error::InvalidConfig(format!("missing required argument: {}", option))),
    }
}

/// Accept yes/no, on/off, true/false, 1/0 the way playbooks write booleans
fn de_loose_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    let value = Option::<Loose>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(Loose::Bool(b)) => Ok(Some(b)),
        Some(Loose::Int(i)) => Ok(Some(i != 0)),
        Some(Loose::Text(text)) => match text.to_ascii_lowercase().as_str() {
            "yes" | "on" | "true" | "1" | "y" => Ok(Some(true)),
            "no" | "off" | "false" | "0" | "n" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!("not a boolean: {}", other))),
        },
    }
}
