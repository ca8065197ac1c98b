// src/models.rs
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::ClientError;

/// Kind of project the backend crew should generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    WebApp,
    AiMl,
    FullStack,
    DataAnalysis,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::WebApp => "web_app",
            ProjectType::AiMl => "ai_ml",
            ProjectType::FullStack => "full_stack",
            ProjectType::DataAnalysis => "data_analysis",
        }
    }
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProjectType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "web_app" => Ok(ProjectType::WebApp),
            "ai_ml" => Ok(ProjectType::AiMl),
            "full_stack" => Ok(ProjectType::FullStack),
            "data_analysis" => Ok(ProjectType::DataAnalysis),
            other => Err(ClientError::Config(format!(
                "Unknown project type '{}' (expected web_app, ai_ml, full_stack or data_analysis)",
                other
            ))),
        }
    }
}

/// Request body for `POST /assign_project`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSubmission {
    pub title: String,
    pub description: String,
    pub project_type: ProjectType,
    pub requirements: Vec<String>,
}

impl ProjectSubmission {
    /// Builds a submission from raw form fields. `requirements` is a free
    /// text block with one requirement per line.
    pub fn from_form(
        title: impl Into<String>,
        description: impl Into<String>,
        project_type: ProjectType,
        requirements: &str,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            project_type,
            requirements: parse_requirements(requirements),
        }
    }
}

/// Splits a requirements block into its non-blank lines, trimmed, in order.
pub fn parse_requirements(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Status snapshot returned by `/assign_project` and `/project/{id}/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub project_id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub download_url: Option<String>,
    pub created_at: String,
}

impl ProjectStatus {
    pub fn kind(&self) -> StatusKind {
        StatusKind::classify(&self.status)
    }
}

/// One row of `GET /projects`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectListItem {
    pub project_id: String,
    pub status: String,
    pub created_at: String,
}

impl ProjectListItem {
    pub fn kind(&self) -> StatusKind {
        StatusKind::classify(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectList {
    #[serde(default)]
    pub projects: Vec<ProjectListItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    InProgress,
    Completed,
    Failed,
}

impl StatusKind {
    /// The server sends the status as a free-form string. Anything other
    /// than `completed` or `failed` is treated as still running.
    pub fn classify(status: &str) -> Self {
        match status {
            "completed" => StatusKind::Completed,
            "failed" => StatusKind::Failed,
            "in_progress" => StatusKind::InProgress,
            other => {
                log::warn!("Unrecognized project status '{}', treating as in progress", other);
                StatusKind::InProgress
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, StatusKind::InProgress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_requirements_keep_non_blank_trimmed_lines_in_order() {
        let text = "  use postgres \n\n\t\nadd login page\n   \n  dark mode";
        assert_eq!(
            parse_requirements(text),
            vec!["use postgres", "add login page", "dark mode"]
        );
    }

    #[test]
    fn test_requirements_handle_crlf_and_empty_input() {
        assert!(parse_requirements("").is_empty());
        assert_eq!(parse_requirements("a\r\nb\r\n"), vec!["a", "b"]);
    }

    #[test]
    fn test_submission_serializes_snake_case_type() {
        let submission =
            ProjectSubmission::from_form("Blog", "A blog", ProjectType::FullStack, "one\n\ntwo");
        let body = serde_json::to_value(&submission).unwrap();
        assert_eq!(
            body,
            json!({
                "title": "Blog",
                "description": "A blog",
                "project_type": "full_stack",
                "requirements": ["one", "two"]
            })
        );
    }

    #[test]
    fn test_project_type_parse() {
        assert_eq!("ai_ml".parse::<ProjectType>().unwrap(), ProjectType::AiMl);
        assert!(matches!(
            "mobile".parse::<ProjectType>(),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_status_without_title_deserializes() {
        let status: ProjectStatus = serde_json::from_value(json!({
            "project_id": "abc123",
            "status": "in_progress",
            "message": "Crew is working",
            "download_url": null,
            "created_at": "2025-03-01T10:00:00.123456"
        }))
        .unwrap();
        assert_eq!(status.title, None);
        assert_eq!(status.kind(), StatusKind::InProgress);
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(StatusKind::classify("completed"), StatusKind::Completed);
        assert_eq!(StatusKind::classify("failed"), StatusKind::Failed);
        assert_eq!(StatusKind::classify("queued"), StatusKind::InProgress);
        assert!(StatusKind::Failed.is_terminal());
        assert!(!StatusKind::InProgress.is_terminal());
    }
}
