//! CloudNet Network Provider
//!
//! Declares the existence or absence of a network on a CloudStack-compatible
//! cloud: resolve references, compare against the remote state, issue at most
//! one create or delete, and optionally wait for the async job it started.

pub mod client;
pub mod params;
pub mod poller;
pub mod reconciler;
pub mod resolver;
pub mod signing;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{CreateNetworkPayload, HttpApiClient, ManagementApi, NetworkScope};
pub use params::ModuleParams;
pub use poller::JobPoller;
pub use reconciler::{NetworkReconciler, Outcome};
pub use resolver::{EntityKind, MatchField, Resolver};
