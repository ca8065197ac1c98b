// src/session.rs
//! The client controller. A `Session` owns the current project id and the
//! single status tracker task, turns user actions into backend calls and
//! reports everything the user should see as `UiEvent`s.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::backend::{self, ProjectApi};
use crate::config::AppConfig;
use crate::errors::{ClientError, Result};
use crate::models::{ProjectList, ProjectStatus, ProjectSubmission, StatusKind};
use crate::progress::{random_jitter, ProgressAnimator};
use crate::view::{self, ListView, StatusView, Toast};

/// Everything the session wants shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    StatusShown(StatusView),
    StatusHidden,
    Progress(u8),
    ProjectsLoaded(ListView),
    Toast(Toast),
    Downloaded(PathBuf),
}

/// Sends events on behalf of a tracker task, but only while the session is
/// still in the epoch the task was started in.
#[derive(Clone)]
struct UiSender {
    tx: UnboundedSender<UiEvent>,
    epoch: Arc<AtomicU64>,
    started_in: u64,
}

impl UiSender {
    fn emit(&self, event: UiEvent) -> bool {
        if self.epoch.load(Ordering::SeqCst) != self.started_in {
            log::debug!("Dropping update from a stopped tracker");
            return false;
        }
        self.tx.send(event).is_ok()
    }
}

pub struct Session<A: ProjectApi + 'static> {
    api: Arc<A>,
    config: AppConfig,
    events: UnboundedSender<UiEvent>,
    current_project_id: Option<String>,
    last_shown: Option<(String, StatusKind)>,
    tracker: Option<JoinHandle<()>>,
    epoch: Arc<AtomicU64>,
}

impl<A: ProjectApi + 'static> Session<A> {
    /// Creates a session and the receiving end of its event stream.
    pub fn new(api: Arc<A>, config: AppConfig) -> (Self, UnboundedReceiver<UiEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let session = Self {
            api,
            config,
            events,
            current_project_id: None,
            last_shown: None,
            tracker: None,
            epoch: Arc::new(AtomicU64::new(0)),
        };
        (session, rx)
    }

    pub fn current_project_id(&self) -> Option<&str> {
        self.current_project_id.as_deref()
    }

    /// True while a status tracker is running.
    pub fn is_polling(&self) -> bool {
        self.tracker.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    fn emit(&self, event: UiEvent) {
        if self.events.send(event).is_err() {
            log::debug!("UI event dropped, no receiver");
        }
    }

    fn toast(&self, toast: Toast) {
        self.emit(UiEvent::Toast(toast));
    }

    fn show_status(&mut self, project: &ProjectStatus) {
        let status = view::status_view(project);
        self.last_shown = Some((status.project_id.clone(), status.kind));
        self.emit(UiEvent::StatusShown(status));
    }

    /// Loads the project list and checks the backend's health concurrently.
    pub async fn startup(&self) {
        future::join(self.load_projects(), self.check_api_health()).await;
    }

    /// Submits a new project and starts tracking it. No retry on failure.
    pub async fn submit_project(&mut self, submission: &ProjectSubmission) -> Result<ProjectStatus> {
        match self.api.assign_project(submission).await {
            Ok(project) => {
                self.current_project_id = Some(project.project_id.clone());
                self.show_status(&project);
                self.start_status_checking();
                self.toast(Toast::success(view::MSG_SUBMITTED));
                Ok(project)
            }
            Err(e) => {
                log::error!("Error submitting project: {}", e);
                self.toast(Toast::error(view::MSG_SUBMIT_FAILED));
                Err(e)
            }
        }
    }

    /// Fetches one status snapshot for `project_id` and shows it.
    pub async fn fetch_status(&mut self, project_id: &str) -> Result<ProjectStatus> {
        let outcome = match backend::checked_id(project_id) {
            Ok(id) => self.api.project_status(id).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(project) => {
                self.show_status(&project);
                Ok(project)
            }
            Err(e) => {
                log::error!("Error checking status: {}", e);
                self.toast(Toast::error(format!("Failed to get status for {}.", project_id)));
                Err(e)
            }
        }
    }

    /// Makes `project_id` the current project and starts tracking it.
    pub fn watch_project(&mut self, project_id: &str) -> Result<()> {
        let id = backend::checked_id(project_id)?;
        self.current_project_id = Some(id.to_string());
        self.start_status_checking();
        Ok(())
    }

    /// Starts polling the current project, replacing any running tracker.
    pub fn start_status_checking(&mut self) {
        self.stop_status_checking();

        let Some(project_id) = self.current_project_id.clone() else {
            log::debug!("No current project, not starting status checks");
            return;
        };

        let ui = UiSender {
            tx: self.events.clone(),
            epoch: Arc::clone(&self.epoch),
            started_in: self.epoch.load(Ordering::SeqCst),
        };
        let animating = self
            .last_shown
            .as_ref()
            .is_some_and(|(id, kind)| *id == project_id && !kind.is_terminal());

        log::info!(
            "⏱️  Checking status of {} every {:?}",
            project_id,
            self.config.poll_interval
        );
        self.tracker = Some(tokio::spawn(track_project(
            Arc::clone(&self.api),
            project_id,
            self.config.poll_interval,
            self.config.progress_interval,
            animating,
            ui,
        )));
    }

    /// Stops the tracker and its progress animation. Anything the stopped
    /// tracker had in flight is discarded.
    pub fn stop_status_checking(&mut self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.tracker.take() {
            handle.abort();
        }
    }

    /// Waits for the tracker to reach a terminal status.
    pub async fn wait_for_tracker(&mut self) -> Result<()> {
        let Some(handle) = self.tracker.as_mut() else {
            return Ok(());
        };
        let outcome = handle.await;
        self.tracker = None;

        match outcome {
            Ok(()) => Ok(()),
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => {
                log::error!("Status tracker crashed: {}", e);
                self.toast(Toast::error(view::MSG_UNEXPECTED));
                Err(ClientError::TaskFailed(e.to_string()))
            }
        }
    }

    /// Leaves the current project behind and gets ready for a new one.
    pub fn new_project(&mut self) {
        self.emit(UiEvent::StatusHidden);
        self.current_project_id = None;
        self.last_shown = None;
        self.stop_status_checking();
    }

    /// Fetches `/projects` and replaces the shown list. Failures are logged only.
    pub async fn load_projects(&self) -> Option<ProjectList> {
        match self.api.list_projects().await {
            Ok(list) => {
                self.emit(UiEvent::ProjectsLoaded(view::list_view(&list.projects)));
                Some(list)
            }
            Err(e) => {
                log::error!("Error loading projects: {}", e);
                None
            }
        }
    }

    /// Downloads the archive of `project_id` into the configured directory.
    pub async fn download_project(&self, project_id: &str) -> Result<PathBuf> {
        let outcome = match backend::checked_id(project_id) {
            Ok(id) => self.api.download_project(id, &self.config.download_dir).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(path) => {
                self.toast(Toast::success(view::MSG_DOWNLOAD_STARTED));
                self.emit(UiEvent::Downloaded(path.clone()));
                Ok(path)
            }
            Err(e) => {
                log::error!("Error downloading project: {}", e);
                self.toast(Toast::error(view::MSG_DOWNLOAD_FAILED));
                Err(e)
            }
        }
    }

    /// Downloads the current project, if there is one.
    pub async fn download_current(&self) -> Result<Option<PathBuf>> {
        match self.current_project_id.as_deref() {
            Some(id) => self.download_project(id).await.map(Some),
            None => Ok(None),
        }
    }

    /// One-shot `/health` check.
    pub async fn check_api_health(&self) -> bool {
        match self.api.health().await {
            Ok(report) => {
                log::info!("API Health: {}", report);
                true
            }
            Err(e) => {
                log::error!("API Health Check Failed: {}", e);
                self.toast(Toast::error(view::MSG_API_UNREACHABLE));
                false
            }
        }
    }

    /// Stops every timer the session owns.
    pub fn shutdown(&mut self) {
        self.stop_status_checking();
    }
}

impl<A: ProjectApi + 'static> Drop for Session<A> {
    fn drop(&mut self) {
        self.stop_status_checking();
    }
}

/// Polls one project until it completes or fails, animating the cosmetic
/// progress bar in between. Transient errors are logged and polling goes on.
async fn track_project<A: ProjectApi>(
    api: Arc<A>,
    project_id: String,
    poll_every: Duration,
    progress_every: Duration,
    mut animating: bool,
    ui: UiSender,
) {
    let mut poll = tokio::time::interval_at(Instant::now() + poll_every, poll_every);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut progress = tokio::time::interval_at(Instant::now() + progress_every, progress_every);
    progress.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut animator = ProgressAnimator::new();

    loop {
        tokio::select! {
            _ = poll.tick() => {
                let project = match api.project_status(&project_id).await {
                    Ok(project) => project,
                    Err(e) => {
                        log::error!("Error checking status: {}", e);
                        continue;
                    }
                };

                let status = view::status_view(&project);
                let kind = status.kind;
                if !ui.emit(UiEvent::StatusShown(status)) {
                    return;
                }

                if kind.is_terminal() {
                    let toast = match kind {
                        StatusKind::Completed => Toast::success(view::MSG_COMPLETED),
                        _ => Toast::error(view::MSG_GENERATION_FAILED),
                    };
                    log::info!("🏁 Project {} finished: {}", project_id, project.status);
                    ui.emit(UiEvent::Toast(toast));

                    match api.list_projects().await {
                        Ok(list) => {
                            ui.emit(UiEvent::ProjectsLoaded(view::list_view(&list.projects)));
                        }
                        Err(e) => log::error!("Error loading projects: {}", e),
                    }
                    return;
                }

                animating = true;
            }
            _ = progress.tick(), if animating => {
                let percent = animator.advance(random_jitter());
                if !ui.emit(UiEvent::Progress(percent)) {
                    return;
                }
            }
        }
    }
}
