//! Network reconciliation
//!
//! Drives one network toward its declared state with at most one mutating
//! call per run.

use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use cloudnet_common::{
    DesiredState, Error, MutationResponse, NetworkSpec, PollPolicy, RemoteNetwork, Result,
    RunSummary,
};

use crate::client::{CreateNetworkPayload, ManagementApi, NetworkScope};
use crate::poller::JobPoller;
use crate::resolver::{find_first, MatchField, Resolver};

/// Fields that identify an existing network; narrower than the resolver's
/// network lookup, which also accepts the display text
pub const NETWORK_EXISTENCE_FIELDS: &[MatchField] = &[MatchField::Name, MatchField::Id];

/// Result of one reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub network: Option<RemoteNetwork>,
    pub changed: bool,
}

impl Outcome {
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            changed: self.changed,
            ..Default::default()
        };
        if let Some(network) = &self.network {
            summary.id = Some(network.id.clone()).filter(|s| !s.is_empty());
            summary.name = Some(network.name.clone()).filter(|s| !s.is_empty());
            summary.display_name = Some(network.displaytext.clone()).filter(|s| !s.is_empty());
        }
        summary
    }
}

pub struct NetworkReconciler {
    api: Arc<dyn ManagementApi>,
    poller: JobPoller,
    poll_async: bool,
}

impl NetworkReconciler {
    pub fn new(api: Arc<dyn ManagementApi>) -> Self {
        Self {
            poller: JobPoller::new(api.clone(), PollPolicy::default()),
            api,
            poll_async: true,
        }
    }

    pub fn with_poll_async(mut self, poll_async: bool) -> Self {
        self.poll_async = poll_async;
        self
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poller = JobPoller::new(self.api.clone(), policy);
        self
    }

    /// Reconcile `spec` toward `desired`. In dry-run mode the change is
    /// computed but no create or delete call is made.
    pub async fn reconcile(
        &self,
        spec: &NetworkSpec,
        desired: DesiredState,
        dry_run: bool,
    ) -> Result<Outcome> {
        info!("Reconciling network '{}' to {}", spec.name, desired);
        if !spec.tags.is_empty() {
            warn!("Ignoring tags {:?}: tagging networks is not supported", spec.tags);
        }

        let mut resolver = Resolver::new(self.api.clone());
        let scope = NetworkScope {
            project_id: resolver.project_id(spec.project.as_deref()).await?,
            domain_id: resolver.domain_id(spec.domain.as_deref()).await?,
        };
        let current = self.find_network(&spec.name, &scope).await?;

        match desired {
            DesiredState::Present => {
                self.ensure_present(spec, current, &mut resolver, dry_run)
                    .await
            }
            DesiredState::Absent => self.ensure_absent(current, dry_run).await,
        }
    }

    /// Current network matching `name` by name or id
    pub async fn find_network(
        &self,
        name: &str,
        scope: &NetworkScope,
    ) -> Result<Option<RemoteNetwork>> {
        let networks = self.api.list_networks(scope).await?;
        Ok(find_first(&networks, NETWORK_EXISTENCE_FIELDS, name).cloned())
    }

    async fn ensure_present(
        &self,
        spec: &NetworkSpec,
        current: Option<RemoteNetwork>,
        resolver: &mut Resolver,
        dry_run: bool,
    ) -> Result<Outcome> {
        if let Some(network) = current {
            info!("Network '{}' already present ({})", spec.name, network.id);
            return Ok(Outcome {
                network: Some(network),
                changed: false,
            });
        }

        // Project and domain come from the resolver's cache
        let ids = resolver.resolve(spec).await?;
        let payload = CreateNetworkPayload::new(spec, &ids);

        if dry_run {
            warn!("Check mode: not creating network '{}'", spec.name);
            return Ok(Outcome {
                network: None,
                changed: true,
            });
        }

        info!("Creating network '{}' in zone {}", spec.name, ids.zone_id);
        let response = self.api.create_network(&payload).await?;
        let result = self.settle("createNetwork", response).await?;

        Ok(Outcome {
            network: network_from_value(result),
            changed: true,
        })
    }

    async fn ensure_absent(&self, current: Option<RemoteNetwork>, dry_run: bool) -> Result<Outcome> {
        let Some(network) = current else {
            info!("Network already absent");
            return Ok(Outcome::default());
        };

        if dry_run {
            warn!("Check mode: not deleting network '{}' ({})", network.name, network.id);
            return Ok(Outcome {
                network: Some(network),
                changed: true,
            });
        }

        info!("Deleting network '{}' ({})", network.name, network.id);
        let response = self.api.delete_network(&network.id).await?;
        self.settle("deleteNetwork", response).await?;

        Ok(Outcome {
            network: Some(network),
            changed: true,
        })
    }

    /// Fail on an error payload, then wait for the job when polling is on
    async fn settle(&self, command: &str, response: MutationResponse) -> Result<Value> {
        if let Some(message) = response.error_text() {
            return Err(Error::RemoteCall {
                command: command.to_string(),
                message: message.to_string(),
            });
        }

        if self.poll_async {
            self.poller.wait(response, Some("network")).await
        } else {
            Ok(response.into_value())
        }
    }
}

/// The network representation inside a create reply or job result
fn network_from_value(value: Value) -> Option<RemoteNetwork> {
    let candidate = match value {
        Value::Object(mut map) => match map.remove("network") {
            Some(network @ Value::Object(_)) => network,
            _ => Value::Object(map),
        },
        _ => return None,
    };

    if candidate.get("id").is_none() {
        return None;
    }
    serde_json::from_value(candidate).ok()
}
