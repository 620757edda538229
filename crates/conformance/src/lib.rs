//! Conformance test engine for document repositories and their HTTP
//! resource layer.
//!
//! A suite seeds a known fixture straight into the store, drives the system
//! under test, and compares every answer against what the store itself
//! reports through the direct probe. Two entry points share one engine:
//! [`CrudSuite`] certifies a [`DocumentRepository`](docket_store::DocumentRepository)
//! implementation, [`RestSuite`] certifies the resource endpoints in front of it.
//! Concrete suites opt in to scenario categories with a [`Selection`] and
//! customize per-type assertions through [`CrudHooks`].

pub mod compare;
pub mod config;
pub mod context;
pub mod crud;
pub mod error;
pub mod fixture;
pub mod hooks;
pub mod probe;
pub mod report;
pub mod rest;
pub mod selector;
pub mod suite;

pub use compare::ComparisonPair;
pub use config::{RestConfig, SuiteConfig};
pub use context::SuiteContext;
pub use crud::{CrudFixture, CrudSuite};
pub use error::ConformanceError;
pub use fixture::{Fixture, FixtureDocument, FixtureLoader, LoadedFixture};
pub use hooks::{CrudHooks, NoHooks};
pub use probe::{bind_identity, StoreProbe};
pub use report::{ConformanceReport, Outcome, TestResult};
pub use rest::{
    HttpResourceClient, HttpResponse, InvalidDocument, Method, ResourceClient, RestFixture,
    RestSuite, ValidationError,
};
pub use selector::{is_selected, Category, CrudCategory, RestCategory, Selection};
