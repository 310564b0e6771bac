//! Staged field values.

use std::collections::HashMap;

use crate::storage::models::FieldKey;

/// Per-field staged input not yet applied to the working copy.
///
/// A key present here always holds a value the working copy has not seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBuffer {
    staged: HashMap<FieldKey, String>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `value` for `key`, replacing any earlier staged value.
    pub fn stage(&mut self, key: FieldKey, value: impl Into<String>) {
        self.staged.insert(key, value.into());
    }

    /// Remove and return the staged value for `key`.
    pub fn take(&mut self, key: &FieldKey) -> Option<String> {
        self.staged.remove(key)
    }

    pub fn get(&self, key: &FieldKey) -> Option<&str> {
        self.staged.get(key).map(String::as_str)
    }

    pub fn is_staged(&self, key: &FieldKey) -> bool {
        self.staged.contains_key(key)
    }

    /// The staged value if present, else `fallback`.
    pub fn display_value(&self, key: &FieldKey, fallback: &str) -> String {
        self.get(key).unwrap_or(fallback).to_string()
    }

    /// Staged keys in a stable order.
    pub fn keys(&self) -> Vec<FieldKey> {
        let mut keys: Vec<FieldKey> = self.staged.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn clear(&mut self) {
        self.staged.clear();
    }
}
