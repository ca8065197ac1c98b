// src/backend/http.rs

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::io::AsyncWriteExt;

use crate::backend::{archive_file_name, download_url, endpoint, status_url, ProjectApi};
use crate::errors::{ClientError, Result};
use crate::models::{ProjectList, ProjectStatus, ProjectSubmission};

/// Talks to the project generation service over HTTP.
#[derive(Clone)]
pub struct HttpProjectApi {
    client: Client,
    api_url: String,
}

impl HttpProjectApi {
    /// Creates a new `HttpProjectApi` rooted at `api_url`.
    pub fn new(client: Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    fn url(&self, path: &str) -> Result<Url> {
        endpoint(&self.api_url, &[path])
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        log::debug!("📡 GET {}", url);
        let start = Instant::now();
        let resp = self.client.get(url.clone()).send().await?;
        log::debug!("📥 {} -> {} ({}ms)", url, resp.status(), start.elapsed().as_millis());
        decode(resp).await
    }
}

/// Turns a non-2xx response into `ApiError` and a 2xx body into `T`.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let resp = ensure_success(resp).await?;
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        ClientError::UnexpectedResponse(format!("{} (body: {})", e, String::from_utf8_lossy(&bytes)))
    })
}

async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error body".to_string());
    Err(ClientError::ApiError { status: status.as_u16(), body })
}

impl ProjectApi for HttpProjectApi {
    async fn assign_project(&self, submission: &ProjectSubmission) -> Result<ProjectStatus> {
        let url = self.url("assign_project")?;
        log::info!("📡 Submitting project '{}' to {}", submission.title, url);

        let resp = self.client.post(url.clone()).json(submission).send().await?;
        log::debug!("📥 {} -> {}", url, resp.status());

        decode(resp).await
    }

    async fn project_status(&self, project_id: &str) -> Result<ProjectStatus> {
        let url = status_url(&self.api_url, project_id)?;
        self.get_json(url).await
    }

    async fn list_projects(&self) -> Result<ProjectList> {
        self.get_json(self.url("projects")?).await
    }

    async fn download_project(&self, project_id: &str, dest_dir: &Path) -> Result<PathBuf> {
        let url = download_url(&self.api_url, project_id)?;
        let path = dest_dir.join(archive_file_name(project_id)?);
        log::info!("📡 Downloading {}", url);

        let mut resp = ensure_success(self.client.get(url).send().await?).await?;

        // Stream into a sibling temp file; it is deleted on drop unless persisted.
        tokio::fs::create_dir_all(dest_dir).await?;
        let partial = tempfile::Builder::new()
            .prefix(".project_")
            .suffix(".part")
            .tempfile_in(dest_dir)?;
        let (file, partial_path) = partial.into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut written = 0usize;
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len();
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        partial_path.persist(&path).map_err(|e| e.error)?;

        log::info!("💾 Saved {} bytes to {}", written, path.display());
        Ok(path)
    }

    async fn health(&self) -> Result<serde_json::Value> {
        self.get_json(self.url("health")?).await
    }
}
