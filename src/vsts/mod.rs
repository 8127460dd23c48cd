//! VSTS API interaction module
//!
//! This module provides the core functionality for talking to the Visual
//! Studio Team Services REST API: authentication, the HTTP transport with
//! uniform error decoding, and the resource kinds it manages.
//!
//! # Module Structure
//!
//! - [`auth`] - Account and personal access token
//! - [`http`] - Authenticated transport for REST API calls
//! - [`error`] - Error taxonomy and API error decoding
//! - [`projects`] - Team projects
//! - [`repositories`] - Git repositories within a project
//! - [`endpoints`] - Service endpoints within a project
//!
//! # Example
//!
//! ```ignore
//! use vsts_reconcile::vsts::{auth::Credential, http::Transport};
//!
//! async fn example() -> vsts_reconcile::vsts::Result<()> {
//!     let transport = Transport::new(Credential::new("contoso", "my-pat"))?;
//!     let projects = transport.get("_apis/projects").await?;
//!     println!("{}", projects.body);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod projects;
pub mod repositories;

pub use error::{ApiError, Error, Result};
