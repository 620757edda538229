//! Store-location and identity metadata for document types.
//!
//! A document type declares where it lives (collection and type name) and
//! which body field holds its identity through a one-time [`register`] call.
//! [`resolve`] turns that declaration into an immutable [`DocumentMetadata`],
//! validated once and cached process-wide for the rest of the run.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde_json::Value;

use crate::document::Document;
use crate::error::MetadataError;
use crate::record::Location;

/// Declaration of a document type's store location, identity field and
/// field mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRegistration {
    collection: String,
    type_name: String,
    identity_field: Option<String>,
    mapping: Value,
}

impl DocumentRegistration {
    pub fn new(collection: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            type_name: type_name.into(),
            identity_field: None,
            mapping: Value::Object(Default::default()),
        }
    }

    /// Mark the body field that carries the document identity.
    pub fn identity_field(mut self, field: impl Into<String>) -> Self {
        self.identity_field = Some(field.into());
        self
    }

    /// Field mapping registered when the store location is created.
    pub fn mapping(mut self, mapping: Value) -> Self {
        self.mapping = mapping;
        self
    }
}

/// Resolved metadata for one document type. Immutable after resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMetadata {
    pub collection: String,
    pub type_name: String,
    pub identity_field: String,
    pub mapping: Value,
    /// Rust type name, for diagnostics.
    pub rust_type: &'static str,
}

impl DocumentMetadata {
    pub fn location(&self) -> Location {
        Location::new(&self.collection, &self.type_name)
    }

    /// Read a document's identity through the type's accessor.
    pub fn identity_of<T: Document>(&self, document: &T) -> Option<String> {
        document.id()
    }
}

#[derive(Default)]
struct Registry {
    declared: HashMap<TypeId, DocumentRegistration>,
    resolved: HashMap<TypeId, Arc<DocumentMetadata>>,
}

fn registry() -> &'static RwLock<Registry> {
    static REGISTRY: OnceLock<RwLock<Registry>> = OnceLock::new();
    REGISTRY.get_or_init(Default::default)
}

/// Declare the metadata of document type `T`.
///
/// Registering the same declaration twice is a no-op; registering a different
/// one fails with [`MetadataError::Conflict`].
pub fn register<T: Document>(registration: DocumentRegistration) -> Result<(), MetadataError> {
    let key = TypeId::of::<T>();
    let mut registry = registry().write().unwrap_or_else(PoisonError::into_inner);
    match registry.declared.get(&key) {
        Some(existing) if *existing == registration => Ok(()),
        Some(_) => Err(MetadataError::Conflict {
            type_name: type_name::<T>(),
        }),
        None => {
            tracing::debug!(
                rust_type = type_name::<T>(),
                collection = %registration.collection,
                type_name = %registration.type_name,
                "registered document type"
            );
            registry.declared.insert(key, registration);
            Ok(())
        }
    }
}

/// Resolve the metadata of document type `T`.
///
/// Pure and deterministic: the first successful resolution is cached and
/// every later call returns the same `Arc`.
pub fn resolve<T: Document>() -> Result<Arc<DocumentMetadata>, MetadataError> {
    let key = TypeId::of::<T>();
    let rust_type = type_name::<T>();

    if let Some(cached) = registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .resolved
        .get(&key)
    {
        return Ok(Arc::clone(cached));
    }

    let mut registry = registry().write().unwrap_or_else(PoisonError::into_inner);
    if let Some(cached) = registry.resolved.get(&key) {
        return Ok(Arc::clone(cached));
    }

    let declared = registry
        .declared
        .get(&key)
        .ok_or(MetadataError::NotRegistered {
            type_name: rust_type,
        })?;

    if declared.collection.trim().is_empty() || declared.type_name.trim().is_empty() {
        return Err(MetadataError::MissingLocation {
            type_name: rust_type,
        });
    }
    let identity_field = match declared.identity_field.as_deref() {
        Some(field) if !field.trim().is_empty() => field.to_string(),
        _ => {
            return Err(MetadataError::MissingIdentityField {
                type_name: rust_type,
            })
        }
    };

    let metadata = Arc::new(DocumentMetadata {
        collection: declared.collection.clone(),
        type_name: declared.type_name.clone(),
        identity_field,
        mapping: declared.mapping.clone(),
        rust_type,
    });
    registry.resolved.insert(key, Arc::clone(&metadata));
    Ok(metadata)
}
