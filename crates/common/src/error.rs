//! Error types for CloudNet

use thiserror::Error;

/// Result type alias using CloudNet Error
pub type Result<T> = std::result::Result<T, Error>;

/// CloudNet error types
///
/// Every variant is fatal for the run that raised it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind} '{reference}' not found")]
    Lookup { kind: String, reference: String },

    #[error("Failed: '{message}' ({command})")]
    RemoteCall { command: String, message: String },

    #[error("Failed: '{message}' (job {job_id})")]
    Job { job_id: String, message: String },

    #[error("Job {job_id} did not complete after {attempts} polls")]
    JobTimeout { job_id: String, attempts: u32 },

    #[error("API client unavailable: {0}")]
    ClientUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Build a lookup failure for an entity kind and the reference that missed
    pub fn lookup(kind: impl Into<String>, reference: impl Into<String>) -> Self {
        Error::Lookup {
            kind: kind.into(),
            reference: reference.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_message_names_reference() {
        let err = Error::lookup("project", "nonexistent");
        assert_eq!(err.to_string(), "project 'nonexistent' not found");
    }

    #[test]
    fn test_job_message_carries_error_text() {
        let err = Error::Job {
            job_id: "j1".to_string(),
            message: "quota exceeded".to_string(),
        };
        assert!(err.to_string().contains("quota exceeded"));
    }
}
