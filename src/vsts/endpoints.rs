//! VSTS service endpoints
//!
//! Service endpoints (service connections) live under a project at
//! `{project}/_apis/serviceendpoint/endpoints`.

use crate::resource::{segment, Lookup, Resource};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceEndpoint {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub endpoint_type: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_ready: bool,
}

/// Desired state of a service endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEndpointSpec {
    pub name: String,
    /// Project name or id
    pub project: String,
    #[serde(rename = "type", default)]
    pub endpoint_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ServiceEndpointSpec {
    pub fn new(name: &str, project: &str) -> Self {
        Self {
            name: name.to_string(),
            project: project.to_string(),
            endpoint_type: None,
            url: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceEndpointField {
    Name,
    Project,
    Type,
    Url,
    Description,
}

impl fmt::Display for ServiceEndpointField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceEndpointField::Name => "name",
            ServiceEndpointField::Project => "project",
            ServiceEndpointField::Type => "type",
            ServiceEndpointField::Url => "url",
            ServiceEndpointField::Description => "description",
        })
    }
}

impl FromStr for ServiceEndpointField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(ServiceEndpointField::Name),
            "project" => Ok(ServiceEndpointField::Project),
            "type" => Ok(ServiceEndpointField::Type),
            "url" => Ok(ServiceEndpointField::Url),
            "description" => Ok(ServiceEndpointField::Description),
            other => Err(format!("unknown service endpoint field: {}", other)),
        }
    }
}

impl Resource for ServiceEndpoint {
    const KIND: &'static str = "service endpoint";
    const LOOKUP: Lookup = Lookup::Direct;
    const SETTLES: bool = false;

    type Spec = ServiceEndpointSpec;
    type Field = ServiceEndpointField;

    fn spec_name(spec: &ServiceEndpointSpec) -> &str {
        &spec.name
    }

    fn parent(spec: &ServiceEndpointSpec) -> Option<&str> {
        Some(&spec.project)
    }

    fn collection_path(parent: Option<&str>) -> String {
        format!("{}/_apis/serviceendpoint/endpoints", segment(parent.unwrap_or_default()))
    }

    fn item_path(parent: Option<&str>, id: &str) -> String {
        format!("{}/{}", Self::collection_path(parent), segment(id))
    }

    fn create_payload(spec: &ServiceEndpointSpec) -> Value {
        let mut payload = Map::new();
        payload.insert("name".into(), json!(spec.name));
        if let Some(endpoint_type) = &spec.endpoint_type {
            payload.insert("type".into(), json!(endpoint_type));
        }
        if let Some(url) = &spec.url {
            payload.insert("url".into(), json!(url));
        }
        if let Some(description) = &spec.description {
            payload.insert("description".into(), json!(description));
        }
        Value::Object(payload)
    }

    fn is_writable(field: ServiceEndpointField) -> bool {
        matches!(field, ServiceEndpointField::Name)
    }

    fn update_payload(spec: &ServiceEndpointSpec) -> Value {
        json!({ "name": spec.name })
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
