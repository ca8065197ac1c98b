// src/view.rs
//! Pure transforms from wire types to what the user sees. Nothing here does
//! I/O; the `render` module decides how a view model reaches the terminal.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

use crate::errors::ClientError;
use crate::models::{ProjectListItem, ProjectStatus, StatusKind};

pub const DEFAULT_STATUS_TITLE: &str = "Generating Project...";
pub const EMPTY_LIST_MESSAGE: &str = "No projects yet. Create your first project above!";

pub const MSG_SUBMITTED: &str = "Project submitted successfully!";
pub const MSG_SUBMIT_FAILED: &str = "Failed to submit project. Please try again.";
pub const MSG_COMPLETED: &str = "Project completed successfully!";
pub const MSG_GENERATION_FAILED: &str = "Project generation failed.";
pub const MSG_DOWNLOAD_STARTED: &str = "Download started!";
pub const MSG_DOWNLOAD_FAILED: &str = "Failed to download project.";
pub const MSG_API_UNREACHABLE: &str = "Cannot connect to API. Please ensure the backend is running.";
pub const MSG_UNEXPECTED: &str = "An unexpected error occurred.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub label: &'static str,
    pub class: &'static str,
}

impl Badge {
    pub fn for_kind(kind: StatusKind) -> Self {
        match kind {
            StatusKind::Completed => Badge { label: "Completed", class: "completed" },
            StatusKind::Failed => Badge { label: "Failed", class: "failed" },
            StatusKind::InProgress => Badge { label: "In Progress", class: "in-progress" },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressView {
    /// Terminal status: the bar is full.
    Full,
    /// Still running: the cosmetic animation drives the bar.
    Animated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusView {
    pub project_id: String,
    pub kind: StatusKind,
    pub title: String,
    pub badge: Badge,
    pub show_download: bool,
    pub progress: ProgressView,
    pub details: Vec<(&'static str, String)>,
}

pub fn status_view(project: &ProjectStatus) -> StatusView {
    let kind = project.kind();
    let title = project
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_STATUS_TITLE)
        .to_string();

    StatusView {
        project_id: project.project_id.clone(),
        kind,
        title,
        badge: Badge::for_kind(kind),
        show_download: kind == StatusKind::Completed,
        progress: if kind.is_terminal() { ProgressView::Full } else { ProgressView::Animated },
        details: vec![
            ("Project ID", project.project_id.clone()),
            ("Status", project.message.clone()),
            ("Created", format_timestamp(&project.created_at)),
        ],
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowAction {
    Download(String),
    Badge(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRow {
    pub heading: String,
    pub status: String,
    pub date: String,
    pub action: RowAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListView {
    Empty(&'static str),
    Rows(Vec<ProjectRow>),
}

pub fn list_view(projects: &[ProjectListItem]) -> ListView {
    if projects.is_empty() {
        return ListView::Empty(EMPTY_LIST_MESSAGE);
    }

    ListView::Rows(projects.iter().map(project_row).collect())
}

fn project_row(project: &ProjectListItem) -> ProjectRow {
    let short_id: String = project.project_id.chars().take(8).collect();
    let action = if project.kind() == StatusKind::Completed {
        RowAction::Download(project.project_id.clone())
    } else {
        RowAction::Badge(project.status.clone())
    };

    ProjectRow {
        heading: format!("Project {}...", short_id),
        status: project.status.clone(),
        date: format_date(&project.created_at),
        action,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
}

/// A transient notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self { message: message.into(), level: ToastLevel::Success }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { message: message.into(), level: ToastLevel::Error }
    }
}

/// What the last-resort handler shows for an error that escaped a command.
/// A crashed tracker has already been reported by the session, so it gets
/// nothing.
pub fn fallback_toast(error: &ClientError) -> Option<Toast> {
    match error {
        ClientError::TaskFailed(_) => None,
        _ => Some(Toast::error(MSG_UNEXPECTED)),
    }
}

/// Parses the backend's timestamps. Timestamps without an offset are read
/// as local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local.from_local_datetime(&naive).earliest()
}

pub fn format_timestamp(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn format_date(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.to_string())
}
