//! Remote platform seam: the four calls a batch submission needs.

pub mod credentials;
pub mod http;

pub use http::HttpPlatform;

use crate::value::ConfigValue;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned {status}: {body}")]
    Status { status: u16, url: String, body: String },
    #[error("nothing found at {0}")]
    NotFound(String),
    #[error("api key is not a valid header value")]
    InvalidApiKey,
    #[error("project {project} has no file named {name:?}")]
    FileNotFound { project: String, name: String },
}

/// A resolved remote container: group, project, session or gear.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Container {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(default)]
    pub label: Option<String>,

    /// Attached files; only filled in for containers that carry them.
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

impl Container {
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileEntry {
    pub name: String,
}

/// A file attached to a container, as gear inputs reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRef {
    #[serde(rename = "type")]
    pub container_type: String,
    pub id: String,
    pub name: String,
}

/// An analysis already attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Analysis {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InputValue {
    File(FileRef),
    Value(ConfigValue),
}

/// A fully resolved gear run against one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub analysis_label: String,
    pub config: BTreeMap<String, ConfigValue>,
    pub inputs: BTreeMap<String, InputValue>,
    /// Session id the analysis is attached to.
    pub destination: String,
}

pub type JobId = String;

pub trait Platform {
    /// Resolve a path such as `["gears", "fmriprep"]` or `[group, project, subject, session]`.
    fn lookup(&self, path: &[&str]) -> Result<Container, ClientError>;

    fn project_file(&self, project: &Container, name: &str) -> Result<FileRef, ClientError>;

    fn session_analyses(&self, session: &Container) -> Result<Vec<Analysis>, ClientError>;

    /// Queue a gear run; returns the id of the new analysis.
    fn run_gear(&self, gear: &Container, request: &JobRequest) -> Result<JobId, ClientError>;
}

/// Find a file by name in a project's file list.
pub(crate) fn find_project_file(project: &Container, name: &str) -> Result<FileRef, ClientError> {
    project
        .files
        .iter()
        .find(|f| f.name == name)
        .map(|f| FileRef {
            container_type: "project".to_string(),
            id: project.id.clone(),
            name: f.name.clone(),
        })
        .ok_or_else(|| ClientError::FileNotFound {
            project: project.display_name().to_string(),
            name: name.to_string(),
        })
}
