//! Resource Lookup
//!
//! Resolves resources by id, or by name under their parent container.

use super::{Lookup, Resource, ResourceSet};
use crate::vsts::error::{Error, Result};
use crate::vsts::http::Transport;
use reqwest::StatusCode;

fn not_found<R: Resource>(name: &str, parent: Option<&str>) -> Error {
    Error::NotFound {
        kind: R::KIND,
        name: name.to_string(),
        parent: parent.map(str::to_string),
    }
}

/// A decoded body without an id cannot be bound: its item path would be
/// the collection path
fn identified<R: Resource>(found: R, endpoint: &str) -> Result<R> {
    if found.id().is_empty() {
        tracing::warn!("{} returned a {} without an id", endpoint, R::KIND);
        return Err(Error::MissingId {
            kind: R::KIND,
            endpoint: endpoint.to_string(),
        });
    }
    Ok(found)
}

/// Fetch a single resource by its id
///
/// A 404 becomes [`Error::NotFound`]; other API errors pass through.
pub async fn fetch<R: Resource>(transport: &Transport, parent: Option<&str>, id: &str) -> Result<R> {
    let endpoint = R::item_path(parent, id);
    tracing::debug!("Fetching {} {}", R::KIND, id);

    match transport.get(&endpoint).await {
        Ok(response) => identified(response.json()?, &endpoint),
        Err(e) if e.is_not_found() => Err(not_found::<R>(id, parent)),
        Err(e) => Err(e),
    }
}

/// List every resource of a kind under its parent
pub async fn list<R: Resource>(transport: &Transport, parent: Option<&str>) -> Result<ResourceSet<R>> {
    tracing::debug!("Listing all {} resources", R::KIND);
    let response = transport.get(&R::collection_path(parent)).await?;
    let set: ResourceSet<R> = response.json()?;
    tracing::debug!("Got {} {} resources", set.value.len(), R::KIND);
    Ok(set)
}

/// First resource in list order whose name matches exactly
///
/// Duplicate names are not resolved here; the earliest entry wins.
pub fn first_match<'a, R: Resource>(items: &'a [R], name: &str) -> Option<&'a R> {
    items.iter().find(|item| item.name() == name)
}

/// Resolve a resource by name (or id, for direct kinds) under its parent
pub async fn find<R: Resource>(transport: &Transport, parent: Option<&str>, name_or_id: &str) -> Result<R> {
    match R::LOOKUP {
        Lookup::Direct => find_direct(transport, parent, name_or_id).await,
        Lookup::Indirect => find_by_listing(transport, parent, name_or_id).await,
    }
}

async fn find_direct<R: Resource>(transport: &Transport, parent: Option<&str>, name_or_id: &str) -> Result<R> {
    let endpoint = R::item_path(parent, name_or_id);

    match transport.get(&endpoint).await {
        Ok(response) if response.status == StatusCode::OK => identified(response.json()?, &endpoint),
        Ok(response) => {
            tracing::debug!("{} lookup of {} returned {}", R::KIND, name_or_id, response.status);
            Err(not_found::<R>(name_or_id, parent))
        }
        Err(Error::Api(api)) => {
            tracing::debug!("{} lookup of {} failed: {}", R::KIND, name_or_id, api);
            Err(not_found::<R>(name_or_id, parent))
        }
        Err(e) => Err(e),
    }
}

async fn find_by_listing<R: Resource>(transport: &Transport, parent: Option<&str>, name: &str) -> Result<R> {
    let all = list::<R>(transport, parent).await?;

    let Some(matched) = first_match(&all.value, name) else {
        return Err(not_found::<R>(name, parent));
    };

    if matched.id().is_empty() {
        return Err(Error::MissingId {
            kind: R::KIND,
            endpoint: R::collection_path(parent),
        });
    }

    // List entries carry fewer fields than the item endpoint
    fetch(transport, parent, matched.id()).await
}
