//! Subscription filters

use serde::{Deserialize, Serialize};

/// A subscription filter: `{kinds, search, limit}`
///
/// Only the fields this client uses; absent fields are omitted from the
/// wire form entirely, which some relays require.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Event kinds to match
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub kinds: Vec<u32>,
    /// Full-text search query
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub search: Option<String>,
    /// Maximum number of records the relay should return
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub limit: Option<usize>,
}

impl Filter {
    /// Empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the given kinds
    pub fn kinds(mut self, kinds: impl IntoIterator<Item = u32>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    /// Set the search query
    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    /// Set the result limit
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
