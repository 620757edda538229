//! Per-document-type customization of the repository suite.
//!
//! A document type whose repository has extra side effects (denormalized
//! fields, derived timestamps, ...) supplies a [`CrudHooks`] implementation
//! instead of forking the suite. Every method defaults to a no-op.

use async_trait::async_trait;
use docket_store::Document;
use serde_json::Value;

use crate::error::ConformanceError;

#[async_trait]
pub trait CrudHooks<T: Document>: Send + Sync {
    /// Snapshot taken before an update scenario mutates `existing`; handed
    /// back to [`on_updated`](Self::on_updated).
    async fn capture(&self, _existing: &T) -> Result<Value, ConformanceError> {
        Ok(Value::Null)
    }

    /// After a new document was indexed or saved.
    async fn on_saved(&self, _input: &T, _output: &T) -> Result<(), ConformanceError> {
        Ok(())
    }

    /// After an existing document was indexed or saved.
    async fn on_updated(
        &self,
        _input: &T,
        _output: &T,
        _captured: &Value,
    ) -> Result<(), ConformanceError> {
        Ok(())
    }

    /// After a batch save.
    async fn on_saved_all(&self, _input: &[T], _output: &[T]) -> Result<(), ConformanceError> {
        Ok(())
    }

    /// After documents were deleted.
    async fn on_deleted(&self, _deleted: &[T]) -> Result<(), ConformanceError> {
        Ok(())
    }

    /// Adjust the probe's documents before find-all comparisons.
    fn on_find_all_fixture(&self, documents: Vec<T>) -> Vec<T> {
        documents
    }
}

/// Hooks that customize nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl<T: Document> CrudHooks<T> for NoHooks {}
