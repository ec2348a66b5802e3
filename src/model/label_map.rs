//! Class id to display name mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ClassId;

/// Mapping from class id to a human-readable label.
///
/// Unknown ids are not an error: they render as `class_<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassLabelMap {
    names: BTreeMap<ClassId, String>,
}

impl ClassLabelMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            names: BTreeMap::new(),
        }
    }

    /// Set or replace the name for a class id.
    pub fn set(&mut self, class_id: ClassId, name: impl Into<String>) {
        self.names.insert(class_id, name.into());
    }

    /// Remove a class id, returning its previous name.
    pub fn remove(&mut self, class_id: ClassId) -> Option<String> {
        self.names.remove(&class_id)
    }

    /// Name for a class id, if mapped.
    pub fn get(&self, class_id: ClassId) -> Option<&str> {
        self.names.get(&class_id).map(String::as_str)
    }

    /// Name for a class id, falling back to `class_<id>`.
    pub fn resolve(&self, class_id: ClassId) -> String {
        match self.get(class_id) {
            Some(name) => name.to_string(),
            None => format!("class_{}", class_id),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Entries sorted by class id.
    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &str)> {
        self.names.iter().map(|(id, name)| (*id, name.as_str()))
    }
}

impl Default for ClassLabelMap {
    /// The seed map: ids 0 through 3 named after themselves.
    fn default() -> Self {
        let mut map = Self::new();
        for id in 0..4 {
            map.set(id, id.to_string());
        }
        map
    }
}
