//! Reference tracker: encoded names of regions that other regions' store
//! files point into.

use std::collections::BTreeSet;

/// Set of referenced region encoded names seen during relocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTracker {
    tokens: BTreeSet<String>,
}

impl ReferenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a referenced region. Returns false if it was already known.
    pub fn record(&mut self, encoded_name: impl Into<String>) -> bool {
        self.tokens.insert(encoded_name.into())
    }

    pub fn contains(&self, encoded_name: &str) -> bool {
        self.tokens.contains(encoded_name)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Recorded names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}
