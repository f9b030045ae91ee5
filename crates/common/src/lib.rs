//! CloudNet Common Library
//!
//! Shared types, errors and API configuration for the CloudNet network
//! provider.

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, Credentials, HttpMethod, PollPolicy};
pub use error::{Error, Result};
pub use types::*;
