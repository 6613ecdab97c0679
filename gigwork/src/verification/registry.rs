//! Registry of entity kinds exposed to the administrative surface.
//!
//! Built once from [`AdminConfig`] at startup and injected into application state. Every
//! administrative endpoint and the decision operation look up the entity kind and action here
//! before touching any record.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use utoipa::ToSchema;

use crate::config::AdminConfig;
use crate::verification::errors::{Result, WorkflowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Account,
    WorkerProfile,
    Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminAction {
    View,
    Approve,
    Reject,
    Delete,
}

/// One registered entity kind and its permitted actions
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegisteredEntity {
    pub kind: EntityKind,
    pub actions: Vec<AdminAction>,
}

#[derive(Debug, Clone, Default)]
pub struct AdminRegistry {
    entries: BTreeMap<EntityKind, BTreeSet<AdminAction>>,
}

impl AdminRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `actions` for `kind`, merging with anything already registered.
    pub fn register(mut self, kind: EntityKind, actions: impl IntoIterator<Item = AdminAction>) -> Self {
        self.entries.entry(kind).or_default().extend(actions);
        self
    }

    pub fn from_config(config: &AdminConfig) -> Self {
        config
            .entities
            .iter()
            .fold(Self::new(), |registry, entity| registry.register(entity.kind, entity.actions.iter().copied()))
    }

    pub fn allows(&self, kind: EntityKind, action: AdminAction) -> bool {
        self.entries.get(&kind).is_some_and(|actions| actions.contains(&action))
    }

    /// Fail with an authorization error unless `action` is registered for `kind`.
    pub fn require(&self, kind: EntityKind, action: AdminAction) -> Result<()> {
        if self.allows(kind, action) {
            Ok(())
        } else {
            Err(WorkflowError::unauthorized(format!(
                "{action:?} is not an administrative action registered for {kind:?}"
            )))
        }
    }

    pub fn entities(&self) -> Vec<RegisteredEntity> {
        self.entries
            .iter()
            .map(|(kind, actions)| RegisteredEntity {
                kind: *kind,
                actions: actions.iter().copied().collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_registry() {
        let registry = AdminRegistry::from_config(&AdminConfig::default());

        assert!(registry.allows(EntityKind::Document, AdminAction::Approve));
        assert!(registry.allows(EntityKind::Document, AdminAction::Reject));
        assert!(registry.allows(EntityKind::Account, AdminAction::Delete));
        assert!(registry.allows(EntityKind::WorkerProfile, AdminAction::View));
        assert!(!registry.allows(EntityKind::WorkerProfile, AdminAction::Delete));
        assert!(!registry.allows(EntityKind::Account, AdminAction::Approve));
    }

    #[test]
    fn test_unregistered_kind_is_refused() {
        let registry = AdminRegistry::new().register(EntityKind::Account, [AdminAction::View]);

        assert!(registry.require(EntityKind::Account, AdminAction::View).is_ok());
        assert!(matches!(
            registry.require(EntityKind::Document, AdminAction::Approve),
            Err(WorkflowError::Authorization { .. })
        ));
    }

    #[test]
    fn test_register_merges_actions() {
        let registry = AdminRegistry::new()
            .register(EntityKind::Document, [AdminAction::View])
            .register(EntityKind::Document, [AdminAction::Approve, AdminAction::View]);

        let entities = registry.entities();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].actions, vec![AdminAction::View, AdminAction::Approve]);
    }
}
