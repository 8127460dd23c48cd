//! VSTS Git repositories
//!
//! Repositories live under a project and can be addressed by name or id.

use crate::resource::{segment, Lookup, Resource};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Repository {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    pub remote_url: String,
    pub ssh_url: String,
}

/// Desired state of a repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySpec {
    pub name: String,
    /// Project name or id
    pub project: String,
}

impl RepositorySpec {
    pub fn new(name: &str, project: &str) -> Self {
        Self {
            name: name.to_string(),
            project: project.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryField {
    Name,
    Project,
}

impl fmt::Display for RepositoryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RepositoryField::Name => "name",
            RepositoryField::Project => "project",
        })
    }
}

impl FromStr for RepositoryField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(RepositoryField::Name),
            "project" => Ok(RepositoryField::Project),
            other => Err(format!("unknown repository field: {}", other)),
        }
    }
}

impl Resource for Repository {
    const KIND: &'static str = "repository";
    const LOOKUP: Lookup = Lookup::Direct;
    const SETTLES: bool = false;

    type Spec = RepositorySpec;
    type Field = RepositoryField;

    fn spec_name(spec: &RepositorySpec) -> &str {
        &spec.name
    }

    fn parent(spec: &RepositorySpec) -> Option<&str> {
        Some(&spec.project)
    }

    fn collection_path(parent: Option<&str>) -> String {
        format!("{}/_apis/git/repositories", segment(parent.unwrap_or_default()))
    }

    fn item_path(parent: Option<&str>, id: &str) -> String {
        format!("{}/{}", Self::collection_path(parent), segment(id))
    }

    fn create_payload(spec: &RepositorySpec) -> Value {
        json!({ "name": spec.name })
    }

    // Moving a repository to another project is not supported
    fn is_writable(field: RepositoryField) -> bool {
        matches!(field, RepositoryField::Name)
    }

    fn update_payload(spec: &RepositorySpec) -> Value {
        json!({ "name": spec.name })
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_scoped_to_project() {
        assert_eq!(
            Repository::collection_path(Some("proj-1")),
            "proj-1/_apis/git/repositories"
        );
        assert_eq!(
            Repository::item_path(Some("My Project"), "svc"),
            "My%20Project/_apis/git/repositories/svc"
        );
        assert_eq!(
            Repository::create_path(Some("proj-1")),
            Repository::collection_path(Some("proj-1"))
        );
    }

    #[test]
    fn validate_requires_project() {
        assert!(Repository::validate(&RepositorySpec::new("svc", "proj-1")).is_ok());
        let err = Repository::validate(&RepositorySpec::new("svc", "")).unwrap_err();
        assert_eq!(err.to_string(), "invalid repository: project must not be empty");
    }

    #[test]
    fn only_name_is_writable() {
        assert!(Repository::is_writable(RepositoryField::Name));
        assert!(!Repository::is_writable(RepositoryField::Project));
    }

    #[test]
    fn parses_camel_case_response() {
        let repo: Repository = serde_json::from_value(json!({
            "id": "r-1",
            "name": "svc",
            "defaultBranch": "refs/heads/main",
            "remoteUrl": "https://contoso.visualstudio.com/proj-1/_git/svc",
            "sshUrl": "ssh://contoso@vs-ssh.visualstudio.com:22/proj-1/_ssh/svc"
        }))
        .unwrap();

        assert_eq!(repo.default_branch.as_deref(), Some("refs/heads/main"));
        assert!(repo.ssh_url.starts_with("ssh://"));
    }
}
