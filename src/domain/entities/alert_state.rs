use std::collections::{HashMap, HashSet};

use super::sample::Entity;

/// Breach flag and last reading for one entity
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EntityState {
    pub active: bool,
    pub last_usage: Option<f64>,
}

/// Per-entity breach tracking. Owned by the evaluator, which is its only writer.
#[derive(Debug, Clone, Default)]
pub struct AlertState {
    entries: HashMap<Entity, EntityState>,
}

impl AlertState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current breach flag; unseen entities are inactive.
    #[must_use]
    pub fn is_active(&self, entity: &Entity) -> bool {
        self.entries.get(entity).is_some_and(|s| s.active)
    }

    pub fn set_active(&mut self, entity: &Entity, active: bool) {
        self.entries.entry(entity.clone()).or_default().active = active;
    }

    /// Record the latest reading without touching the flag.
    pub fn observe(&mut self, entity: &Entity, usage_percent: f64) {
        self.entries.entry(entity.clone()).or_default().last_usage = Some(usage_percent);
    }

    #[must_use]
    pub fn last_usage(&self, entity: &Entity) -> Option<f64> {
        self.entries.get(entity).and_then(|s| s.last_usage)
    }

    /// Drop every entity not in `known`, e.g. volumes that were unmounted.
    pub fn prune(&mut self, known: &HashSet<Entity>) {
        self.entries.retain(|entity, _| known.contains(entity));
    }

    /// Entities currently in breach, sorted for stable output.
    #[must_use]
    pub fn active_entities(&self) -> Vec<&Entity> {
        let mut active: Vec<&Entity> = self
            .entries
            .iter()
            .filter(|(_, s)| s.active)
            .map(|(e, _)| e)
            .collect();
        active.sort();
        active
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
