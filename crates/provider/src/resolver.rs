//! Name-or-id resolution
//!
//! Maps user supplied references to the platform's canonical ids. Each entity
//! kind compares a fixed list of fields, in listing order, with exact
//! case-sensitive equality; the first hit wins. Resolved ids are memoized for
//! the lifetime of the resolver, which is one reconciliation run.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use cloudnet_common::{
    Domain, Error, NetworkOffering, NetworkSpec, Project, RemoteNetwork, ResolvedIdentifiers,
    Result, Zone,
};

use crate::client::{ManagementApi, NetworkScope};

/// A field a reference may match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchField {
    Name,
    DisplayText,
    Path,
    Id,
}

/// Entities that appear in a listing
pub trait Listed {
    fn id(&self) -> &str;

    fn field(&self, field: MatchField) -> Option<&str>;
}

impl Listed for Project {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, field: MatchField) -> Option<&str> {
        match field {
            MatchField::Name => Some(&self.name),
            MatchField::DisplayText => Some(&self.displaytext),
            MatchField::Id => Some(&self.id),
            MatchField::Path => None,
        }
    }
}

impl Listed for Zone {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, field: MatchField) -> Option<&str> {
        match field {
            MatchField::Name => Some(&self.name),
            MatchField::Id => Some(&self.id),
            _ => None,
        }
    }
}

impl Listed for Domain {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, field: MatchField) -> Option<&str> {
        match field {
            MatchField::Name => Some(&self.name),
            MatchField::Path => Some(&self.path),
            MatchField::Id => Some(&self.id),
            MatchField::DisplayText => None,
        }
    }
}

impl Listed for NetworkOffering {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, field: MatchField) -> Option<&str> {
        match field {
            MatchField::Name => Some(&self.name),
            MatchField::Id => Some(&self.id),
            _ => None,
        }
    }
}

impl Listed for RemoteNetwork {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, field: MatchField) -> Option<&str> {
        match field {
            MatchField::Name => Some(&self.name),
            MatchField::DisplayText => Some(&self.displaytext),
            MatchField::Id => Some(&self.id),
            MatchField::Path => None,
        }
    }
}

/// Kinds of entity a reference can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Project,
    Zone,
    Domain,
    NetworkOffering,
    Network,
}

impl EntityKind {
    /// Fields compared against a reference, in order.
    ///
    /// The sets differ between kinds on purpose and must stay that way.
    pub fn match_fields(self) -> &'static [MatchField] {
        match self {
            EntityKind::Project | EntityKind::Network => {
                &[MatchField::Name, MatchField::DisplayText, MatchField::Id]
            }
            EntityKind::Zone | EntityKind::NetworkOffering => &[MatchField::Name, MatchField::Id],
            EntityKind::Domain => &[MatchField::Name, MatchField::Path, MatchField::Id],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Project => "project",
            EntityKind::Zone => "zone",
            EntityKind::Domain => "domain",
            EntityKind::NetworkOffering => "network offering",
            EntityKind::Network => "network",
        }
    }
}

/// First entry whose listed fields equal `reference` exactly
pub fn find_first<'a, T: Listed>(
    items: &'a [T],
    fields: &[MatchField],
    reference: &str,
) -> Option<&'a T> {
    items.iter().find(|item| {
        fields
            .iter()
            .any(|field| item.field(*field) == Some(reference))
    })
}

fn non_empty(reference: Option<&str>) -> Option<&str> {
    reference.filter(|r| !r.is_empty())
}

/// Per-run resolver with memoized lookups
pub struct Resolver {
    api: Arc<dyn ManagementApi>,
    cache: HashMap<(EntityKind, String), Option<String>>,
}

impl Resolver {
    pub fn new(api: Arc<dyn ManagementApi>) -> Self {
        Self {
            api,
            cache: HashMap::new(),
        }
    }

    fn cached(&self, kind: EntityKind, reference: &str) -> Option<Option<String>> {
        self.cache.get(&(kind, reference.to_string())).cloned()
    }

    fn remember(&mut self, kind: EntityKind, reference: &str, id: Option<String>) -> Option<String> {
        debug!("Resolved {} '{}' to {:?}", kind.label(), reference, id);
        self.cache.insert((kind, reference.to_string()), id.clone());
        id
    }

    /// Project id, or none when no project scoping was asked for
    pub async fn project_id(&mut self, reference: Option<&str>) -> Result<Option<String>> {
        let Some(reference) = non_empty(reference) else {
            return Ok(None);
        };
        if let Some(id) = self.cached(EntityKind::Project, reference) {
            return Ok(id);
        }

        let projects = self.api.list_projects().await?;
        let id = lookup(&projects, EntityKind::Project, reference)?;
        Ok(self.remember(EntityKind::Project, reference, Some(id)))
    }

    /// Zone id; an unset reference picks the first listed zone
    pub async fn zone_id(&mut self, reference: Option<&str>) -> Result<String> {
        let reference = non_empty(reference);
        let key = reference.unwrap_or_default();
        if let Some(Some(id)) = self.cached(EntityKind::Zone, key) {
            return Ok(id);
        }

        let zones = self.api.list_zones().await?;
        let id = match reference {
            Some(reference) => lookup(&zones, EntityKind::Zone, reference)?,
            None => zones
                .first()
                .map(|z| z.id.clone())
                .ok_or_else(|| Error::lookup("zone", "<default>"))?,
        };
        self.remember(EntityKind::Zone, key, Some(id.clone()));
        Ok(id)
    }

    /// Domain id, or none when unset
    pub async fn domain_id(&mut self, reference: Option<&str>) -> Result<Option<String>> {
        let Some(reference) = non_empty(reference) else {
            return Ok(None);
        };
        if let Some(id) = self.cached(EntityKind::Domain, reference) {
            return Ok(id);
        }

        let domains = self.api.list_domains().await?;
        let id = lookup(&domains, EntityKind::Domain, reference)?;
        Ok(self.remember(EntityKind::Domain, reference, Some(id)))
    }

    pub async fn network_offering_id(&mut self, reference: &str) -> Result<String> {
        if let Some(Some(id)) = self.cached(EntityKind::NetworkOffering, reference) {
            return Ok(id);
        }

        let offerings = self.api.list_network_offerings().await?;
        let id = lookup(&offerings, EntityKind::NetworkOffering, reference)?;
        self.remember(EntityKind::NetworkOffering, reference, Some(id.clone()));
        Ok(id)
    }

    /// Id of an existing network by name, display text or id
    pub async fn network_id(
        &mut self,
        reference: Option<&str>,
        scope: &NetworkScope,
    ) -> Result<Option<String>> {
        let Some(reference) = non_empty(reference) else {
            return Ok(None);
        };
        if let Some(id) = self.cached(EntityKind::Network, reference) {
            return Ok(id);
        }

        let networks = self.api.list_networks(scope).await?;
        let id = lookup(&networks, EntityKind::Network, reference)?;
        Ok(self.remember(EntityKind::Network, reference, Some(id)))
    }

    /// Resolve every identifier a create needs
    pub async fn resolve(&mut self, spec: &NetworkSpec) -> Result<ResolvedIdentifiers> {
        Ok(ResolvedIdentifiers {
            project_id: self.project_id(spec.project.as_deref()).await?,
            domain_id: self.domain_id(spec.domain.as_deref()).await?,
            zone_id: self.zone_id(Some(&spec.zone)).await?,
            network_offering_id: self.network_offering_id(&spec.network_offering).await?,
        })
    }
}

fn lookup<T: Listed>(items: &[T], kind: EntityKind, reference: &str) -> Result<String> {
    find_first(items, kind.match_fields(), reference)
        .map(|item| item.id().to_string())
        .ok_or_else(|| Error::lookup(kind.label(), reference))
}
