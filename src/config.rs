// src/config.rs
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{ClientError, Result};
use crate::models::{ProjectSubmission, ProjectType};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_PROGRESS_INTERVAL_SECS: u64 = 2;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub poll_interval: Duration,
    pub progress_interval: Duration,
    pub download_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            progress_interval: Duration::from_secs(DEFAULT_PROGRESS_INTERVAL_SECS),
            download_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup("CREW_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();
        if api_url.is_empty() {
            return Err(ClientError::Config("CREW_API_URL must not be empty".to_string()));
        }

        let poll_interval = Duration::from_secs(parse_secs(
            "CREW_POLL_INTERVAL_SECS",
            lookup("CREW_POLL_INTERVAL_SECS"),
            DEFAULT_POLL_INTERVAL_SECS,
        )?);
        let progress_interval = Duration::from_secs(parse_secs(
            "CREW_PROGRESS_INTERVAL_SECS",
            lookup("CREW_PROGRESS_INTERVAL_SECS"),
            DEFAULT_PROGRESS_INTERVAL_SECS,
        )?);

        let download_dir = lookup("CREW_DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(AppConfig { api_url, poll_interval, progress_interval, download_dir })
    }
}

fn parse_secs(key: &str, value: Option<String>, default: u64) -> Result<u64> {
    match value {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(ClientError::Config(format!(
                "{} must be a positive number of seconds, got '{}'",
                key, raw
            ))),
            Ok(secs) => Ok(secs),
        },
    }
}

/// A project request stored on disk as TOML.
///
/// ```toml
/// title = "Recipe site"
/// description = "Share and rate recipes"
/// project_type = "web_app"
/// requirements = """
/// user accounts
/// search by ingredient
/// """
/// ```
#[derive(Deserialize, Debug, Clone)]
pub struct SubmissionFile {
    pub title: String,
    pub description: String,
    pub project_type: ProjectType,

    /// Either a multi-line block or a list of lines.
    #[serde(default)]
    pub requirements: Option<Requirements>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum Requirements {
    Block(String),
    Lines(Vec<String>),
}

impl SubmissionFile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn into_submission(self) -> ProjectSubmission {
        let block = match self.requirements {
            None => String::new(),
            Some(Requirements::Block(text)) => text,
            Some(Requirements::Lines(lines)) => lines.join("\n"),
        };
        ProjectSubmission::from_form(self.title, self.description, self.project_type, &block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_is_empty() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.progress_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_api_url_trailing_slash_trimmed() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("CREW_API_URL", "http://crew:9000/")])).unwrap();
        assert_eq!(config.api_url, "http://crew:9000");
    }

    #[test]
    fn test_bad_interval_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("CREW_POLL_INTERVAL_SECS", "0")]));
        assert!(matches!(err, Err(ClientError::Config(_))));
        let err = AppConfig::from_lookup(lookup_from(&[("CREW_PROGRESS_INTERVAL_SECS", "soon")]));
        assert!(matches!(err, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_submission_file_block_requirements() {
        let file = SubmissionFile::parse(
            r#"
title = "Recipe site"
description = "Share recipes"
project_type = "web_app"
requirements = """
user accounts

  search by ingredient
"""
"#,
        )
        .unwrap();
        let submission = file.into_submission();
        assert_eq!(submission.project_type, ProjectType::WebApp);
        assert_eq!(submission.requirements, vec!["user accounts", "search by ingredient"]);
    }

    #[test]
    fn test_submission_file_list_requirements() {
        let file = SubmissionFile::parse(
            r#"
title = "Churn model"
description = "Predict churn"
project_type = "ai_ml"
requirements = ["  xgboost ", "", "notebook"]
"#,
        )
        .unwrap();
        assert_eq!(file.into_submission().requirements, vec!["xgboost", "notebook"]);
    }

    #[test]
    fn test_submission_file_unknown_type_fails() {
        let err = SubmissionFile::parse(
            "title = \"x\"\ndescription = \"y\"\nproject_type = \"game\"\n",
        );
        assert!(matches!(err, Err(ClientError::TomlParse(_))));
    }
}
