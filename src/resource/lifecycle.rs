//! Lifecycle Controller
//!
//! Drives one resource record through create, read, update and delete.
//! The same controller serves every kind; the [`Resource`] impl supplies
//! paths, payloads and which fields are writable.
//!
//! Operations take the record by `&mut`, so a record only ever sees one
//! operation at a time.

use super::lookup;
use super::settle::SettleStrategy;
use super::{invalid_spec, Resource};
use crate::vsts::error::{Error, Result};
use crate::vsts::http::Transport;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

/// Where a record is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Absent,
    Creating,
    Settling,
    Bound,
    Reading,
    Updating,
    Deleted,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Absent => "absent",
            State::Creating => "creating",
            State::Settling => "settling",
            State::Bound => "bound",
            State::Reading => "reading",
            State::Updating => "updating",
            State::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

/// Outcome of a read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Present,
    /// Deleted out-of-band; the caller should stop tracking it
    Gone,
}

/// Desired state, remote identity and last observed state of one resource
#[derive(Debug, Clone)]
pub struct Record<R: Resource> {
    spec: R::Spec,
    id: Option<String>,
    observed: Option<R>,
    state: State,
}

impl<R: Resource> Record<R> {
    /// A record that does not exist remotely yet
    pub fn new(spec: R::Spec) -> Self {
        Self {
            spec,
            id: None,
            observed: None,
            state: State::Absent,
        }
    }

    /// A record already bound to a remote id, e.g. restored from saved state
    ///
    /// Fails with `InvalidSpec` for a blank id or a spec that does not
    /// validate.
    pub fn bound(spec: R::Spec, id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        R::validate(&spec)?;
        require_id::<R>(&id)?;
        Ok(Self {
            spec,
            id: Some(id),
            observed: None,
            state: State::Bound,
        })
    }

    pub fn spec(&self) -> &R::Spec {
        &self.spec
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn observed(&self) -> Option<&R> {
        self.observed.as_ref()
    }

    pub fn state(&self) -> State {
        self.state
    }

    fn require(&self, expected: State, operation: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::InvalidState {
                kind: R::KIND,
                operation,
                state: self.state.to_string(),
            })
        }
    }

    /// The bound id, or an error naming the operation
    fn bound_id(&self, operation: &'static str) -> Result<String> {
        self.require(State::Bound, operation)?;
        self.id.clone().ok_or_else(|| Error::InvalidState {
            kind: R::KIND,
            operation,
            state: "bound without an id".to_string(),
        })
    }

    fn bind(&mut self, observed: R) -> Result<()> {
        require_id::<R>(observed.id())?;
        self.id = Some(observed.id().to_string());
        self.observed = Some(observed);
        self.state = State::Bound;
        Ok(())
    }

    fn forget(&mut self, state: State) {
        self.id = None;
        self.observed = None;
        self.state = state;
    }
}

fn require_id<R: Resource>(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(invalid_spec::<R>("id must not be empty"));
    }
    Ok(())
}

/// Fields the caller wants changed, split by whether they reached VSTS
#[derive(Debug, Clone, PartialEq)]
pub struct Changes<F> {
    pending: Vec<F>,
    applied: Vec<F>,
}

impl<F: Copy + PartialEq> Changes<F> {
    pub fn new(fields: impl IntoIterator<Item = F>) -> Self {
        let mut pending = Vec::new();
        for field in fields {
            if !pending.contains(&field) {
                pending.push(field);
            }
        }
        Self {
            pending,
            applied: Vec::new(),
        }
    }

    pub fn pending(&self) -> &[F] {
        &self.pending
    }

    pub fn applied(&self) -> &[F] {
        &self.applied
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.applied.is_empty()
    }

    /// Some requested change has not been confirmed by VSTS yet
    pub fn is_partial(&self) -> bool {
        !self.pending.is_empty()
    }

    fn mark_applied(&mut self) {
        self.applied.append(&mut self.pending);
    }
}

/// Lifecycle controller for one resource kind
pub struct Controller<'a, R: Resource> {
    transport: &'a Transport,
    settle: SettleStrategy,
    _kind: PhantomData<fn() -> R>,
}

impl<'a, R: Resource> Controller<'a, R> {
    pub fn new(transport: &'a Transport) -> Self {
        Self {
            transport,
            settle: SettleStrategy::default(),
            _kind: PhantomData,
        }
    }

    pub fn with_settle(mut self, settle: SettleStrategy) -> Self {
        self.settle = settle;
        self
    }

    pub fn settle(&self) -> SettleStrategy {
        self.settle
    }

    /// Create the resource, wait for it to become queryable and bind its id
    ///
    /// On failure the record goes back to `Absent`. A `SettleTimeout` means
    /// the POST succeeded but the resource was not found afterwards; nothing
    /// is rolled back, the next read or create has to reconcile it.
    pub async fn create(&self, record: &mut Record<R>) -> Result<()> {
        record.require(State::Absent, "create")?;

        let spec = record.spec.clone();
        R::validate(&spec)?;
        let name = R::spec_name(&spec);

        record.state = State::Creating;
        tracing::info!("Going to create {} {}", R::KIND, name);

        let payload = R::create_payload(&spec);
        if let Err(e) = self.transport.post(&R::create_path(R::parent(&spec)), &payload).await {
            tracing::warn!("Error when creating {} {}: {}", R::KIND, name, e);
            record.state = State::Absent;
            return Err(e);
        }

        record.state = State::Settling;
        let bound = self.settle_and_find(&spec).await.and_then(|found| record.bind(found));
        if let Err(e) = bound {
            record.state = State::Absent;
            return Err(e);
        }

        tracing::info!("Created {} {}, id {}", R::KIND, name, record.id().unwrap_or_default());
        Ok(())
    }

    async fn settle_and_find(&self, spec: &R::Spec) -> Result<R> {
        let name = R::spec_name(spec);
        let parent = R::parent(spec);

        if !R::SETTLES {
            return match lookup::find::<R>(self.transport, parent, name).await {
                Err(e) if e.is_not_found() => Err(self.settle_timeout(name, Duration::ZERO)),
                other => other,
            };
        }

        tracing::debug!(
            "{} creation is asynchronous, waiting up to {:?}",
            R::KIND,
            self.settle.total_wait()
        );
        let mut waited = Duration::ZERO;
        for attempt in 1..=self.settle.attempts.max(1) {
            tracing::debug!(
                "Waiting {:?} for {} {} to settle (attempt {})",
                self.settle.delay,
                R::KIND,
                name,
                attempt
            );
            tokio::time::sleep(self.settle.delay).await;
            waited = waited.saturating_add(self.settle.delay);

            match lookup::find::<R>(self.transport, parent, name).await {
                Ok(found) => return Ok(found),
                Err(e) if e.is_not_found() => {
                    tracing::warn!("{} {} not visible yet after {:?}", R::KIND, name, waited);
                }
                Err(e) => return Err(e),
            }
        }

        Err(self.settle_timeout(name, waited))
    }

    fn settle_timeout(&self, name: &str, waited: Duration) -> Error {
        Error::SettleTimeout {
            kind: R::KIND,
            name: name.to_string(),
            waited_secs: waited.as_secs(),
        }
    }

    /// Refresh observed fields by id
    ///
    /// A resource deleted out-of-band yields [`Refresh::Gone`] and leaves the
    /// record `Absent`.
    pub async fn read(&self, record: &mut Record<R>) -> Result<Refresh> {
        let id = record.bound_id("read")?;
        record.state = State::Reading;
        tracing::debug!("Reading {} {}", R::KIND, id);

        let result = lookup::fetch::<R>(self.transport, R::parent(&record.spec), &id).await;
        match result {
            Ok(observed) => {
                record.observed = Some(observed);
                record.state = State::Bound;
                Ok(Refresh::Present)
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!("{} {} is gone, dropping it", R::KIND, id);
                record.forget(State::Absent);
                Ok(Refresh::Gone)
            }
            Err(e) => {
                record.state = State::Bound;
                Err(e)
            }
        }
    }

    /// Bind an existing remote resource to an absent record
    pub async fn import(&self, record: &mut Record<R>, id: &str) -> Result<()> {
        record.require(State::Absent, "import")?;
        R::validate(&record.spec)?;
        require_id::<R>(id)?;
        record.id = Some(id.to_string());
        record.state = State::Bound;

        match self.read(record).await {
            Ok(Refresh::Present) => Ok(()),
            Ok(Refresh::Gone) => Err(Error::NotFound {
                kind: R::KIND,
                name: id.to_string(),
                parent: R::parent(&record.spec).map(str::to_string),
            }),
            Err(e) => {
                record.forget(State::Absent);
                Err(e)
            }
        }
    }

    /// Push `changes` from `spec` to VSTS, then refresh
    ///
    /// Fails with `InvalidSpec` or `UnsupportedChange` before any request
    /// when the new spec is malformed or a changed field cannot be written. Fields move to `applied` only once the
    /// PATCH has succeeded.
    pub async fn update(
        &self,
        record: &mut Record<R>,
        spec: R::Spec,
        changes: &mut Changes<R::Field>,
    ) -> Result<Refresh> {
        let id = record.bound_id("update")?;
        R::validate(&spec)?;

        if let Some(field) = changes.pending().iter().find(|f| !R::is_writable(**f)) {
            return Err(Error::UnsupportedChange {
                kind: R::KIND,
                field: field.to_string(),
            });
        }

        if changes.is_partial() {
            record.state = State::Updating;
            tracing::info!("Updating {} {}: {:?}", R::KIND, id, changes.pending());

            let endpoint = R::item_path(R::parent(&record.spec), &id);
            if let Err(e) = self.transport.patch(&endpoint, &R::update_payload(&spec)).await {
                tracing::warn!("Could not update {} {}: {}", R::KIND, id, e);
                record.state = State::Bound;
                return Err(e);
            }
            changes.mark_applied();
            record.state = State::Bound;
        }

        record.spec = spec;
        self.read(record).await
    }

    /// Delete by id
    ///
    /// On failure the record stays `Bound`: the remote state is unknown and
    /// the caller has to retry or re-read.
    pub async fn delete(&self, record: &mut Record<R>) -> Result<()> {
        let id = record.bound_id("delete")?;
        tracing::info!("Going to delete {} {} (id: {})", R::KIND, R::spec_name(&record.spec), id);

        let endpoint = R::item_path(R::parent(&record.spec), &id);
        match self.transport.delete(&endpoint).await {
            Ok(_) => {
                record.forget(State::Deleted);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Could not delete {} {}: {}", R::KIND, id, e);
                Err(e)
            }
        }
    }
}
