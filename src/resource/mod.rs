//! Resource abstraction layer
//!
//! Each VSTS resource kind (project, repository, service endpoint) describes
//! itself through the [`Resource`] trait: where it lives, how it is created,
//! which of its fields can be written after creation. The generic pieces
//! then drive every kind the same way.
//!
//! # Architecture
//!
//! - [`lookup`] - Resolves a resource by name or id under its parent
//! - [`settle`] - Post-create wait before a new resource is queryable
//! - [`lifecycle`] - Create/read/update/delete state machine per record
//!
//! # Example
//!
//! ```ignore
//! use vsts_reconcile::resource::{Controller, Record};
//! use vsts_reconcile::vsts::repositories::{Repository, RepositorySpec};
//!
//! async fn create_repo(transport: &Transport) -> vsts_reconcile::vsts::Result<()> {
//!     let controller = Controller::<Repository>::new(transport);
//!     let mut record = Record::new(RepositorySpec::new("svc", "proj-1"));
//!     controller.create(&mut record).await?;
//!     println!("bound to {}", record.id().unwrap_or_default());
//!     Ok(())
//! }
//! ```

pub mod lifecycle;
pub mod lookup;
pub mod settle;

pub use lifecycle::{Changes, Controller, Record, Refresh, State};
pub use settle::SettleStrategy;

use crate::vsts::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt::{Debug, Display};

/// How a resource is resolved by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The item endpoint accepts a name or an id
    Direct,
    /// List everything, match the name, then fetch the match by id
    Indirect,
}

/// A VSTS resource kind
pub trait Resource: DeserializeOwned + Serialize + Debug + Clone + Send + Sync {
    /// Human readable kind, used in errors and logs
    const KIND: &'static str;
    const LOOKUP: Lookup;
    /// Creation is acknowledged before the resource can be queried
    const SETTLES: bool;

    /// Desired state supplied by the caller
    type Spec: Debug + Clone + Send + Sync;
    /// Field of the desired state that can change
    type Field: Copy + Debug + Display + PartialEq + Send + Sync;

    fn spec_name(spec: &Self::Spec) -> &str;
    /// Parent container (project) for nested kinds
    fn parent(spec: &Self::Spec) -> Option<&str>;

    /// Reject a spec that cannot address a remote resource
    ///
    /// An empty name or parent would turn item paths into collection paths.
    fn validate(spec: &Self::Spec) -> Result<()> {
        require_identity::<Self>(spec)
    }

    fn collection_path(parent: Option<&str>) -> String;
    fn item_path(parent: Option<&str>, id: &str) -> String;
    fn create_path(parent: Option<&str>) -> String {
        Self::collection_path(parent)
    }

    fn create_payload(spec: &Self::Spec) -> Value;
    /// Whether the API can change this field on an existing resource
    fn is_writable(field: Self::Field) -> bool;
    fn update_payload(spec: &Self::Spec) -> Value;

    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

/// Envelope returned by VSTS list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSet<R> {
    #[serde(default)]
    pub count: usize,
    #[serde(default = "Vec::new")]
    pub value: Vec<R>,
}

pub(crate) fn invalid_spec<R: Resource>(reason: &str) -> Error {
    Error::InvalidSpec {
        kind: R::KIND,
        reason: reason.to_string(),
    }
}

/// Name, and parent for nested kinds, must be non-blank
pub(crate) fn require_identity<R: Resource>(spec: &R::Spec) -> Result<()> {
    if R::spec_name(spec).trim().is_empty() {
        return Err(invalid_spec::<R>("name must not be empty"));
    }
    if R::parent(spec).is_some_and(|parent| parent.trim().is_empty()) {
        return Err(invalid_spec::<R>("project must not be empty"));
    }
    Ok(())
}

/// Percent-encode a user supplied path segment
pub(crate) fn segment(raw: &str) -> Cow<'_, str> {
    urlencoding::encode(raw)
}
