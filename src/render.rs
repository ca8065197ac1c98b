// src/render.rs
use std::io::{self, Write};

use crate::session::UiEvent;
use crate::view::{ListView, ProgressView, RowAction, StatusView, Toast, ToastLevel};

const BAR_WIDTH: usize = 30;

/// Writes view models to a terminal (or any `Write`).
pub struct TerminalRenderer<W: Write> {
    out: W,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render(&mut self, event: &UiEvent) -> io::Result<()> {
        match event {
            UiEvent::StatusShown(status) => self.status(status),
            UiEvent::StatusHidden => writeln!(self.out, "Ready for a new project."),
            UiEvent::Progress(percent) => self.progress(*percent),
            UiEvent::ProjectsLoaded(list) => self.projects(list),
            UiEvent::Toast(toast) => self.toast(toast),
            UiEvent::Downloaded(path) => writeln!(self.out, "💾 Saved to {}", path.display()),
        }?;
        self.out.flush()
    }

    pub fn status(&mut self, status: &StatusView) -> io::Result<()> {
        let separator = "=".repeat(60);
        writeln!(self.out, "\n{}", separator)?;
        writeln!(self.out, "{}  [{}]", status.title, status.badge.label)?;
        writeln!(self.out, "{}", separator)?;
        for (label, value) in &status.details {
            writeln!(self.out, "{:>12}: {}", label, value)?;
        }
        if status.progress == ProgressView::Full {
            self.progress(100)?;
        }
        if status.show_download {
            writeln!(self.out, "⬇️  Download with: crewctl download {}", status.project_id)?;
        }
        Ok(())
    }

    pub fn progress(&mut self, percent: u8) -> io::Result<()> {
        let percent = percent.min(100) as usize;
        let filled = percent * BAR_WIDTH / 100;
        writeln!(
            self.out,
            "[{}{}] {:>3}%",
            "#".repeat(filled),
            "-".repeat(BAR_WIDTH - filled),
            percent
        )
    }

    pub fn projects(&mut self, list: &ListView) -> io::Result<()> {
        match list {
            ListView::Empty(message) => writeln!(self.out, "{}", message),
            ListView::Rows(rows) => {
                writeln!(self.out, "📊 Projects")?;
                for row in rows {
                    let action = match &row.action {
                        RowAction::Download(id) => format!("download: crewctl download {}", id),
                        RowAction::Badge(status) => format!("[{}]", status),
                    };
                    writeln!(
                        self.out,
                        "  {:<22} Status: {:<12} {:<10}  {}",
                        row.heading, row.status, row.date, action
                    )?;
                }
                Ok(())
            }
        }
    }

    pub fn toast(&mut self, toast: &Toast) -> io::Result<()> {
        let icon = match toast.level {
            ToastLevel::Success => "✅",
            ToastLevel::Error => "❌",
        };
        writeln!(self.out, "{} {}", icon, toast.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectListItem, ProjectStatus};
    use crate::view;

    fn rendered(event: UiEvent) -> String {
        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.render(&event).unwrap();
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn test_progress_bar() {
        let out = rendered(UiEvent::Progress(50));
        assert_eq!(out, format!("[{}{}]  50%\n", "#".repeat(15), "-".repeat(15)));
    }

    #[test]
    fn test_completed_status_offers_download() {
        let project = ProjectStatus {
            project_id: "abc123".to_string(),
            title: Some("Recipe site".to_string()),
            status: "completed".to_string(),
            message: "Done".to_string(),
            download_url: Some("/download/abc123".to_string()),
            created_at: "2025-03-01T10:00:00".to_string(),
        };
        let out = rendered(UiEvent::StatusShown(view::status_view(&project)));
        assert!(out.contains("Recipe site  [Completed]"));
        assert!(out.contains("100%"));
        assert!(out.contains("crewctl download abc123"));
    }

    #[test]
    fn test_empty_project_list() {
        let out = rendered(UiEvent::ProjectsLoaded(view::list_view(&[])));
        assert_eq!(out, format!("{}\n", view::EMPTY_LIST_MESSAGE));
    }

    #[test]
    fn test_project_rows() {
        let items = vec![ProjectListItem {
            project_id: "deadbeefcafe".to_string(),
            status: "failed".to_string(),
            created_at: "2025-03-01T10:00:00".to_string(),
        }];
        let out = rendered(UiEvent::ProjectsLoaded(view::list_view(&items)));
        assert!(out.contains("Project deadbeef..."));
        assert!(out.contains("[failed]"));
        assert!(!out.contains("download"));
    }

    #[test]
    fn test_toast_levels() {
        assert_eq!(rendered(UiEvent::Toast(Toast::error("nope"))), "❌ nope\n");
        assert_eq!(rendered(UiEvent::Toast(Toast::success("yay"))), "✅ yay\n");
    }
}
