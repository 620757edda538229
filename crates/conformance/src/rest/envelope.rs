//! Hypermedia envelopes exchanged with the resource layer, and the
//! navigation links a page is expected to carry.

use std::collections::BTreeSet;

use docket_store::last_page_index;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

impl Link {
    pub fn new(rel: &str, href: &str) -> Self {
        Self {
            rel: rel.to_string(),
            href: href.to_string(),
        }
    }
}

/// A single document with its links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource<T> {
    pub content: T,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl<T> Resource<T> {
    /// The resource a server must return for `content`: a `self` link and a
    /// link named after the document type, both at `{base}/{resource}/{id}`.
    pub fn expected(content: T, base_url: &str, resource: &str, type_name: &str, id: &str) -> Self {
        let href = format!("{base_url}/{resource}/{id}");
        Self {
            content,
            links: vec![Link::new("self", &href), Link::new(type_name, &href)],
        }
        .normalized()
    }

    /// Links sorted, so two resources compare regardless of link order.
    pub fn normalized(mut self) -> Self {
        self.links.sort();
        self
    }

    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.rel == rel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
    pub number: u64,
}

/// One page of resources plus navigation links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResources<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<Resource<T>>,
    #[serde(default)]
    pub links: Vec<Link>,
    pub page: PageMetadata,
}

impl<T> PagedResources<T> {
    pub fn rels(&self) -> BTreeSet<&str> {
        self.links.iter().map(|link| link.rel.as_str()).collect()
    }

    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.rel == rel)
    }

    pub fn into_normalized_content(self) -> Vec<Resource<T>> {
        self.content.into_iter().map(Resource::normalized).collect()
    }
}

/// One entry of a 4xx error payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub entity: String,
    pub message: String,
    #[serde(default)]
    pub invalid_value: Value,
    pub property: String,
}

impl ValidationError {
    pub fn new(entity: &str, property: &str, message: &str, invalid_value: Value) -> Self {
        Self {
            entity: entity.to_string(),
            message: message.to_string(),
            invalid_value,
            property: property.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub errors: Vec<ValidationError>,
}

/// Link relations a page must carry.
///
/// `first`, `last` and `profile` always; `prev` iff `page_index > 0`; `next`
/// iff `page_index` is below the last page index as computed by
/// [`last_page_index`].
pub fn expected_page_links(page_index: usize, total: u64, size: usize) -> BTreeSet<&'static str> {
    let mut rels: BTreeSet<&'static str> = ["first", "last", "profile"].into_iter().collect();
    if page_index > 0 {
        rels.insert("prev");
    }
    if (page_index as i64) < last_page_index(total, size) {
        rels.insert("next");
    }
    rels
}
