use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A typed, schema-flexible record addressed by a string identity.
///
/// The identity is carried by the store out-of-band from the body, so the
/// serialized form may omit it. Equality is structural: two documents are
/// equal when every field, identity included, is equal.
pub trait Document:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    /// The identity value, `None` for a document that has not been assigned one.
    fn id(&self) -> Option<String>;
}
