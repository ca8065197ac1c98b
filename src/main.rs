use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crewctl::backend::HttpProjectApi;
use crewctl::config::{AppConfig, SubmissionFile};
use crewctl::errors::{ClientError, Result};
use crewctl::models::{ProjectSubmission, ProjectType};
use crewctl::render::TerminalRenderer;
use crewctl::session::Session;
use crewctl::{banner, view};

#[derive(Parser)]
#[command(name = "crewctl")]
#[command(about = "Submit, track and download generated projects")]
struct Cli {
    /// Base URL of the project API (overrides CREW_API_URL)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Do not print the startup banner
    #[arg(long)]
    no_banner: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a new project and follow it until it finishes
    Submit(SubmitArgs),
    /// Show the current status of a project
    Status { project_id: String },
    /// Poll a project until it completes or fails
    Watch { project_id: String },
    /// List all projects
    List,
    /// Download a generated project archive
    Download {
        project_id: String,

        /// Directory to save the archive in (overrides CREW_DOWNLOAD_DIR)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
    /// Check that the API is reachable
    Health,
}

#[derive(Args)]
struct SubmitArgs {
    /// Load the whole request from a TOML file
    #[arg(long, value_name = "FILE", conflicts_with_all = ["title", "description", "project_type", "requirements", "requirements_file"])]
    from: Option<PathBuf>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// web_app, ai_ml, full_stack or data_analysis
    #[arg(long = "type", value_name = "TYPE")]
    project_type: Option<ProjectType>,

    /// A single requirement (repeatable)
    #[arg(short = 'r', long = "requirement", value_name = "LINE")]
    requirements: Vec<String>,

    /// File with one requirement per line
    #[arg(long, value_name = "FILE")]
    requirements_file: Option<PathBuf>,

    /// Return right after submitting instead of following the status
    #[arg(long)]
    no_watch: bool,
}

impl SubmitArgs {
    fn into_submission(self) -> Result<ProjectSubmission> {
        if let Some(path) = &self.from {
            return Ok(SubmissionFile::load(path)?.into_submission());
        }

        let mut block = self.requirements.join("\n");
        if let Some(path) = &self.requirements_file {
            block.push('\n');
            block.push_str(&std::fs::read_to_string(path)?);
        }

        let title = self.title.ok_or_else(|| missing("--title"))?;
        let description = self.description.ok_or_else(|| missing("--description"))?;
        let project_type = self.project_type.ok_or_else(|| missing("--type"))?;

        Ok(ProjectSubmission::from_form(title, description, project_type, &block))
    }
}

fn missing(flag: &str) -> ClientError {
    ClientError::Config(format!("{} is required unless --from is given", flag))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("⚠️  Warning: Could not load .env file: {}", e);
        }
    }

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));

    install_panic_hook();

    if !cli.no_banner {
        banner::print_banner();
    }

    // Run the command as a task so a panic surfaces here as a JoinError.
    match tokio::spawn(run(cli)).await {
        Ok(Ok(code)) => code,
        Ok(Err(e)) => {
            log::error!("Global error: {}", e);
            report_unexpected(view::fallback_toast(&e));
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("Command task crashed: {}", e);
            report_unexpected(Some(view::Toast::error(view::MSG_UNEXPECTED)));
            ExitCode::FAILURE
        }
    }
}

/// Last-resort handler: anything that escapes a command becomes a generic
/// notification, unless it was already shown.
fn report_unexpected(toast: Option<view::Toast>) {
    if let Some(toast) = toast {
        let _ = TerminalRenderer::stdout().toast(&toast);
    }
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log::error!("Global error: {}", info);
        default_hook(info);
    }));
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = AppConfig::from_env()?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url.trim_end_matches('/').to_string();
    }
    if let Command::Download { out: Some(dir), .. } = &cli.command {
        config.download_dir = dir.clone();
    }

    let api = Arc::new(HttpProjectApi::new(reqwest::Client::new(), config.api_url.clone()));
    let (mut session, mut events) = Session::new(api, config);

    let renderer = tokio::spawn(async move {
        let mut renderer = TerminalRenderer::stdout();
        while let Some(event) = events.recv().await {
            if let Err(e) = renderer.render(&event) {
                log::warn!("Failed to render update: {}", e);
            }
        }
    });

    let outcome = dispatch(&mut session, cli.command).await;

    session.shutdown();
    drop(session);
    if let Err(e) = renderer.await {
        log::warn!("Renderer stopped abnormally: {}", e);
    }

    outcome
}

async fn dispatch(session: &mut Session<HttpProjectApi>, command: Command) -> Result<ExitCode> {
    let ok = match command {
        Command::Submit(args) => {
            let follow_up = !args.no_watch;
            let submission = args.into_submission()?;
            if session.submit_project(&submission).await.is_err() {
                return Ok(ExitCode::FAILURE);
            }
            if follow_up {
                follow(session).await?;
            }
            true
        }
        Command::Status { project_id } => session.fetch_status(&project_id).await.is_ok(),
        Command::Watch { project_id } => {
            let project = match session.fetch_status(&project_id).await {
                Ok(project) => project,
                Err(_) => return Ok(ExitCode::FAILURE),
            };
            if !project.kind().is_terminal() {
                session.watch_project(&project_id)?;
                follow(session).await?;
            }
            true
        }
        Command::List => session.load_projects().await.is_some(),
        Command::Download { project_id, .. } => session.download_project(&project_id).await.is_ok(),
        Command::Health => session.check_api_health().await,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Follows the tracker until it settles or the user hits Ctrl-C.
async fn follow(session: &mut Session<HttpProjectApi>) -> Result<()> {
    tokio::select! {
        outcome = session.wait_for_tracker() => outcome,
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupted, stopping status checks");
            session.new_project();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file_conflicts_with_inline_fields() {
        for extra in [
            vec!["--title", "Blog"],
            vec!["-r", "comments"],
            vec!["--requirements-file", "reqs.txt"],
        ] {
            let mut argv = vec!["crewctl", "submit", "--from", "project.toml"];
            argv.extend(extra);
            let err = Cli::try_parse_from(argv).err().unwrap();
            assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
        }
    }

    #[test]
    fn test_inline_submission() {
        let cli = Cli::try_parse_from([
            "crewctl", "submit", "--title", "Blog", "--description", "A blog",
            "--type", "web_app", "-r", " posts ", "-r", "   ", "-r", "comments",
        ])
        .unwrap();
        let Command::Submit(args) = cli.command else {
            panic!("expected submit");
        };
        let submission = args.into_submission().unwrap();
        assert_eq!(submission.project_type, ProjectType::WebApp);
        assert_eq!(submission.requirements, vec!["posts", "comments"]);
    }

    #[test]
    fn test_missing_title_is_config_error() {
        let cli = Cli::try_parse_from(["crewctl", "submit", "--description", "d", "--type", "ai_ml"]).unwrap();
        let Command::Submit(args) = cli.command else {
            panic!("expected submit");
        };
        assert!(matches!(args.into_submission(), Err(ClientError::Config(_))));
    }
}
