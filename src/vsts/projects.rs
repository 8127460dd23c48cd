//! VSTS Projects
//!
//! Projects are top-level and are created through a separate legacy
//! endpoint with its own payload shape. Creation is asynchronous, and the
//! API offers no way to change a project after it exists.

use crate::resource::{invalid_spec, require_identity, segment, Lookup, Resource, ResourceSet};
use crate::vsts::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

/// Process template id of the Agile template
pub const AGILE_TEMPLATE: &str = "adcc42ab-9882-485e-a3ed-7678f01f66bc";
pub const DEFAULT_SOURCE: &str = "NewProjectCreation";

/// Project as returned by `_apis/projects`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    pub state: String,
    pub revision: u64,
    pub visibility: String,
}

pub type ProjectSet = ResourceSet<Project>;

/// Desired state of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Process template type id
    #[serde(rename = "type")]
    pub process_template: String,
    #[serde(default = "default_source")]
    pub source: String,
    /// e.g. `{"VersionControlOption":"Git","ProjectVisibilityOption":null}`
    pub data: String,
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

impl ProjectSpec {
    pub fn new(name: &str, process_template: &str, data: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            process_template: process_template.to_string(),
            source: default_source(),
            data: data.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectField {
    Name,
    Description,
    Type,
    Source,
    Data,
}

impl fmt::Display for ProjectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProjectField::Name => "name",
            ProjectField::Description => "description",
            ProjectField::Type => "type",
            ProjectField::Source => "source",
            ProjectField::Data => "data",
        })
    }
}

impl FromStr for ProjectField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(ProjectField::Name),
            "description" => Ok(ProjectField::Description),
            "type" => Ok(ProjectField::Type),
            "source" => Ok(ProjectField::Source),
            "data" => Ok(ProjectField::Data),
            other => Err(format!("unknown project field: {}", other)),
        }
    }
}

impl Resource for Project {
    const KIND: &'static str = "project";
    const LOOKUP: Lookup = Lookup::Indirect;
    const SETTLES: bool = true;

    type Spec = ProjectSpec;
    type Field = ProjectField;

    fn spec_name(spec: &ProjectSpec) -> &str {
        &spec.name
    }

    fn parent(_spec: &ProjectSpec) -> Option<&str> {
        None
    }

    fn validate(spec: &ProjectSpec) -> Result<()> {
        require_identity::<Self>(spec)?;
        if spec.process_template.trim().is_empty() {
            return Err(invalid_spec::<Self>("type must not be empty"));
        }
        if spec.data.trim().is_empty() {
            return Err(invalid_spec::<Self>("data must not be empty"));
        }
        Ok(())
    }

    fn collection_path(_parent: Option<&str>) -> String {
        "_apis/projects".to_string()
    }

    fn item_path(_parent: Option<&str>, id: &str) -> String {
        format!("_apis/projects/{}", segment(id))
    }

    fn create_path(_parent: Option<&str>) -> String {
        "_api/_project/CreateProject".to_string()
    }

    /// The creation endpoint uses different field names than reads
    fn create_payload(spec: &ProjectSpec) -> Value {
        let mut payload = Map::new();
        payload.insert("projectName".into(), json!(spec.name));
        if let Some(description) = spec.description.as_deref().filter(|d| !d.is_empty()) {
            payload.insert("projectDescription".into(), json!(description));
        }
        payload.insert("processTemplateTypeId".into(), json!(spec.process_template));
        if !spec.source.is_empty() {
            payload.insert("source".into(), json!(spec.source));
        }
        payload.insert("projectData".into(), json!(spec.data));
        Value::Object(payload)
    }

    // No project field has an update endpoint
    fn is_writable(_field: ProjectField) -> bool {
        false
    }

    fn update_payload(spec: &ProjectSpec) -> Value {
        json!({ "name": spec.name })
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
