use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::page::Sort;

/// A store location: a logical collection plus the type name inside it.
///
/// Several document types may share one collection; each keeps its own
/// type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub collection: String,
    pub type_name: String,
}

impl Location {
    pub fn new(collection: &str, type_name: &str) -> Self {
        Self {
            collection: collection.to_string(),
            type_name: type_name.to_string(),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.type_name)
    }
}

/// Filter for bulk deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Universal filter: every document at the location.
    MatchAll,
    /// Documents whose key is in the list.
    Ids(Vec<String>),
}

impl Filter {
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Filter::MatchAll => true,
            Filter::Ids(ids) => ids.iter().any(|id| id == key),
        }
    }
}

/// A document body written under an explicit key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedDocument {
    pub id: String,
    pub source: Value,
}

/// A raw search hit. The key travels beside the body, not inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub id: String,
    pub source: Value,
}

/// Parameters of a store search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub sort: Option<Sort>,
    pub from: Option<usize>,
    pub size: Option<usize>,
}

impl SearchRequest {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn sorted(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn window(mut self, from: usize, size: usize) -> Self {
        self.from = Some(from);
        self.size = Some(size);
        self
    }
}
