//! Which catalog sources take part in a scan.

use serde::{Deserialize, Serialize};

use crate::ingest::types::Source;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SourceSettings {
    enabled: Vec<String>,
}

impl SourceSettings {
    /// Every catalog source enabled.
    pub fn all_enabled(catalog: &[Source]) -> Self {
        Self {
            enabled: catalog.iter().map(|s| s.id.clone()).collect(),
        }
    }

    /// Restore a persisted list, dropping ids the catalog no longer has.
    pub fn from_ids(ids: Vec<String>, catalog: &[Source]) -> Self {
        let mut out = Self::default();
        for id in ids {
            if catalog.iter().any(|s| s.id == id) && !out.is_enabled(&id) {
                out.enabled.push(id);
            }
        }
        out
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.enabled.iter().any(|e| e == id)
    }

    /// Flip membership; returns the new state.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.is_enabled(id) {
            self.enabled.retain(|e| e != id);
            false
        } else {
            self.enabled.push(id.to_string());
            true
        }
    }

    pub fn reset(&mut self, catalog: &[Source]) {
        *self = Self::all_enabled(catalog);
    }

    pub fn enabled_ids(&self) -> &[String] {
        &self.enabled
    }
}
