//! Core types for CloudNet

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declared target state of a network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesiredState {
    Present,
    Absent,
}

impl Default for DesiredState {
    fn default() -> Self {
        Self::Present
    }
}

impl std::fmt::Display for DesiredState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DesiredState::Present => write!(f, "present"),
            DesiredState::Absent => write!(f, "absent"),
        }
    }
}

impl std::str::FromStr for DesiredState {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            other => Err(crate::Error::InvalidConfig(format!(
                "state must be one of present, absent (got '{}')",
                other
            ))),
        }
    }
}

/// The network a run reconciles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Name or id of the network offering
    pub network_offering: String,
    /// Name or id of the zone
    pub zone: String,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NetworkSpec {
    /// Display text sent on create; the platform requires one
    pub fn display_text(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(&self.name)
    }
}

/// Identifiers resolved once per run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIdentifiers {
    pub project_id: Option<String>,
    pub domain_id: Option<String>,
    pub zone_id: String,
    pub network_offering_id: String,
}

/// Project as listed by the platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub displaytext: String,
}

/// Zone as listed by the platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Domain as listed by the platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
}

/// Network offering as listed by the platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkOffering {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Current remote network; the platform owns it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNetwork {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub displaytext: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoneid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Async job status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    /// Terminal; 1 is success and 2 is failure on CloudStack
    Done(i64),
}

impl From<i64> for JobStatus {
    fn from(code: i64) -> Self {
        if code == 0 {
            JobStatus::Pending
        } else {
            JobStatus::Done(code)
        }
    }
}

/// Reply of `queryAsyncJobResult`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AsyncJob {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub jobid: Option<String>,
    #[serde(default)]
    pub jobstatus: i64,
    #[serde(default)]
    pub jobresult: Option<Map<String, Value>>,
}

impl AsyncJob {
    /// A job is only finished once it reports a non-zero status and a result.
    pub fn status(&self) -> JobStatus {
        match self.jobresult {
            Some(_) => JobStatus::from(self.jobstatus),
            None => JobStatus::Pending,
        }
    }

    pub fn error_text(&self) -> Option<&str> {
        self.jobresult
            .as_ref()
            .and_then(|r| r.get("errortext"))
            .and_then(Value::as_str)
    }
}

/// Reply of a mutating call: either the synchronous result object or a
/// handle carrying a `jobid`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationResponse(pub Map<String, Value>);

impl MutationResponse {
    pub fn job_id(&self) -> Option<String> {
        self.0.get("jobid").and_then(value_as_id)
    }

    pub fn error_text(&self) -> Option<&str> {
        self.0.get("errortext").and_then(Value::as_str)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Result document handed back to the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub changed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Ids arrive as strings, but older API versions send numbers
pub fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn de_opt_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_id))
}
