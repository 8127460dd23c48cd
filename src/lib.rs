//! Reconcile declared VSTS projects, repositories and service endpoints
//! against the VSTS REST API.
//!
//! - [`vsts`] - Transport, error decoding and the resource kinds
//! - [`resource`] - Lookup and the lifecycle controller shared by all kinds
//! - [`config`] - Account and token configuration

pub mod config;
pub mod resource;
pub mod vsts;
