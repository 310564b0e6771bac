//! Review-mode multi-select.

use std::collections::BTreeSet;

/// Selected entry and sub-entry ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusSet {
    ids: BTreeSet<String>,
}

impl FocusSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `id`. Returns true when `id` is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
