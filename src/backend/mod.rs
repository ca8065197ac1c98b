// src/backend/mod.rs

use std::future::Future;
use reqwest::Url;
use std::path::{Path, PathBuf};

use crate::errors::{ClientError, Result};
use crate::models::{ProjectList, ProjectStatus, ProjectSubmission};

pub mod http;

pub use http::HttpProjectApi;

/// The project generation service as seen from the client.
///
/// The session only talks to the backend through this trait, so tests can
/// swap in an in-memory implementation.
pub trait ProjectApi: Send + Sync {
    /// `POST /assign_project`. Every call creates a new server-side project.
    fn assign_project(
        &self,
        submission: &ProjectSubmission,
    ) -> impl Future<Output = Result<ProjectStatus>> + Send;

    /// `GET /project/{id}/status`
    fn project_status(&self, project_id: &str) -> impl Future<Output = Result<ProjectStatus>> + Send;

    /// `GET /projects`
    fn list_projects(&self) -> impl Future<Output = Result<ProjectList>> + Send;

    /// `GET /download/{id}`, saved as `project_{id}.zip` inside `dest_dir`.
    /// Returns the path written.
    fn download_project(
        &self,
        project_id: &str,
        dest_dir: &Path,
    ) -> impl Future<Output = Result<PathBuf>> + Send;

    /// `GET /health`
    fn health(&self) -> impl Future<Output = Result<serde_json::Value>> + Send;
}

pub fn status_url(api_url: &str, project_id: &str) -> Result<Url> {
    endpoint(api_url, &["project", checked_id(project_id)?, "status"])
}

pub fn download_url(api_url: &str, project_id: &str) -> Result<Url> {
    endpoint(api_url, &["download", checked_id(project_id)?])
}

pub fn archive_file_name(project_id: &str) -> Result<String> {
    Ok(format!("project_{}.zip", checked_id(project_id)?))
}

/// Returns the trimmed id, refusing anything that could escape its path
/// segment or the download directory.
pub fn checked_id(project_id: &str) -> Result<&str> {
    let id = project_id.trim();
    if id.is_empty() {
        return Err(ClientError::MissingProjectId);
    }
    if id.contains(['/', '\\']) || id.contains("..") {
        return Err(ClientError::InvalidProjectId(id.to_string()));
    }
    Ok(id)
}

/// Appends each segment percent-encoded, so `?` or `#` in an id stay in the path.
pub(crate) fn endpoint(api_url: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(api_url)
        .map_err(|e| ClientError::Config(format!("Invalid API URL '{}': {}", api_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| ClientError::Config(format!("API URL '{}' cannot take a path", api_url)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
