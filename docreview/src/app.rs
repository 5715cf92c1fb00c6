//! Central application state for docreview.
//!
//! [`AppState`] owns the document session, the settings store and the job
//! tracker, plus the purely visual state (mode, focus, cursor, scroll). No
//! rendering happens here: the render module reads it and the keybinding
//! dispatcher mutates it through the methods below.

use std::path::PathBuf;

use docreview_core::job::JobProgress;
use docreview_core::logging::LogHandle;
use docreview_core::types::{Adjudication, IssueEntry, IssueKey, ReviewResult};
use docreview_core::{
    ChartFilter, JobApi, JobEvent, JobTracker, SessionState, SettingsStore, Severity,
    ValidationFilter,
};
use ratatui::widgets::ListState;
use tokio::sync::mpsc;

use crate::event::{forward_job_events, AppEvent};
use crate::theme::Theme;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Typing into the search prompt; the filter updates on every keystroke.
    Search,
    HelpOverlay,
    /// Quit requested while a job is still running.
    ConfirmQuit,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    #[default]
    IssueList,
    Detail,
}

impl PanelFocus {
    pub fn toggle(self) -> Self {
        match self {
            PanelFocus::IssueList => PanelFocus::Detail,
            PanelFocus::Detail => PanelFocus::IssueList,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

/// One-line message shown in the status bar until the next action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

pub struct AppState {
    pub mode: Mode,
    pub focus: PanelFocus,
    pub session: SessionState,
    pub settings: SettingsStore,
    pub theme: Theme,

    /// Cursor within the current page of the issue list.
    pub list_state: ListState,
    pub detail_scroll: u16,
    pub help_scroll: u16,
    /// Cached after each render for page-sized scrolling.
    pub detail_viewport_height: u16,

    /// Progress of the running job, if any.
    pub job: Option<JobProgress>,
    pub notice: Option<Notice>,

    tracker: Option<JobTracker<dyn JobApi>>,
    /// Job whose events are still wanted. Cleared on abort and on the
    /// terminal event.
    active_job: Option<String>,
    log: LogHandle,
    export_dir: PathBuf,
}

impl AppState {
    pub fn new(
        session: SessionState,
        settings: SettingsStore,
        theme: Theme,
        log: LogHandle,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            mode: Mode::default(),
            focus: PanelFocus::default(),
            session,
            settings,
            theme,
            list_state: ListState::default().with_selected(Some(0)),
            detail_scroll: 0,
            help_scroll: 0,
            detail_viewport_height: 0,
            job: None,
            notice: None,
            tracker: None,
            active_job: None,
            log,
            export_dir,
        }
    }

    pub fn with_tracker(mut self, tracker: JobTracker<dyn JobApi>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    fn notify(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice { text: text.into(), is_error: false });
    }

    fn notify_error(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice { text: text.into(), is_error: true });
    }

    // -----------------------------------------------------------------------
    // Cursor
    // -----------------------------------------------------------------------

    pub fn cursor(&self) -> usize {
        self.list_state.selected().unwrap_or(0)
    }

    fn page_len(&self) -> usize {
        self.session.current_page_items().len()
    }

    /// Issue under the cursor on the current page.
    pub fn current_issue(&self) -> Option<&IssueEntry> {
        self.session.current_page_items().get(self.cursor()).copied()
    }

    fn current_key(&self) -> Option<IssueKey> {
        self.current_issue().map(|e| e.key.clone())
    }

    fn set_cursor(&mut self, pos: usize) {
        let last = self.page_len().saturating_sub(1);
        self.list_state.select(Some(pos.min(last)));
        self.detail_scroll = 0;
    }

    /// Keeps the cursor on the page after the view changed shape.
    pub fn clamp_cursor(&mut self) {
        self.set_cursor(self.cursor());
    }

    pub fn move_down(&mut self, n: usize) {
        match self.focus {
            PanelFocus::IssueList => self.set_cursor(self.cursor().saturating_add(n)),
            PanelFocus::Detail => {
                self.detail_scroll = self.detail_scroll.saturating_add(n as u16);
            }
        }
    }

    pub fn move_up(&mut self, n: usize) {
        match self.focus {
            PanelFocus::IssueList => self.set_cursor(self.cursor().saturating_sub(n)),
            PanelFocus::Detail => {
                self.detail_scroll = self.detail_scroll.saturating_sub(n as u16);
            }
        }
    }

    pub fn move_top(&mut self) {
        match self.focus {
            PanelFocus::IssueList => self.set_cursor(0),
            PanelFocus::Detail => self.detail_scroll = 0,
        }
    }

    pub fn move_bottom(&mut self) {
        match self.focus {
            PanelFocus::IssueList => self.set_cursor(usize::MAX),
            PanelFocus::Detail => self.detail_scroll = u16::MAX,
        }
    }

    pub fn next_page(&mut self) {
        self.session.next_page();
        self.set_cursor(0);
    }

    pub fn prev_page(&mut self) {
        self.session.prev_page();
        self.set_cursor(0);
    }

    // -----------------------------------------------------------------------
    // Selection and adjudication
    // -----------------------------------------------------------------------

    pub fn toggle_current(&mut self) {
        if let Some(key) = self.current_key() {
            self.session.toggle_selected(&key);
            self.move_down(1);
        }
    }

    pub fn select_all(&mut self) {
        self.session.select_all_filtered();
        self.notify(format!("{} selected", self.session.selection_count()));
    }

    pub fn select_none(&mut self) {
        self.session.select_none();
        self.notice = None;
    }

    pub fn adjudicate_current(&mut self, decision: Adjudication) {
        if let Some(key) = self.current_key() {
            self.session.adjudicate(&key, decision);
            self.move_down(1);
        }
    }

    // -----------------------------------------------------------------------
    // Filters
    // -----------------------------------------------------------------------

    /// Writes the persisted subset of the filter criteria back to settings.
    fn persist_filters(&mut self) {
        let filters = self.session.criteria().to_settings();
        self.settings.update(|s| s.filters = filters);
    }

    /// Toggles the n-th severity (1 = Critical … 5 = Info).
    pub fn toggle_severity(&mut self, n: usize) {
        let Some(severity) = n.checked_sub(1).and_then(|i| Severity::ALL.get(i)).copied() else {
            return;
        };
        self.session.toggle_severity(severity);
        self.persist_filters();
        self.clamp_cursor();
    }

    pub fn chart_filter_by_severity(&mut self) {
        if let Some(sev) = self.current_issue().map(|e| e.issue.severity) {
            self.session.set_chart_filter(Some(ChartFilter::Severity(sev)));
            self.set_cursor(0);
        }
    }

    pub fn chart_filter_by_category(&mut self) {
        if let Some(cat) = self.current_issue().map(|e| e.issue.category.clone()) {
            self.session.set_chart_filter(Some(ChartFilter::Category(cat)));
            self.set_cursor(0);
        }
    }

    pub fn clear_chart_filter(&mut self) {
        self.session.set_chart_filter(None);
        self.clamp_cursor();
    }

    /// All → validated → unvalidated → all.
    pub fn cycle_validation_filter(&mut self) {
        let next = match self.session.criteria().validation_filter {
            None => Some(ValidationFilter::Validated),
            Some(ValidationFilter::Validated) => Some(ValidationFilter::Unvalidated),
            Some(ValidationFilter::Unvalidated) => None,
        };
        self.session.set_validation_filter(next);
        self.persist_filters();
        self.clamp_cursor();
    }

    pub fn cycle_sort(&mut self) {
        let next = self.session.sort().cycled();
        self.session.set_sort(next);
        self.set_cursor(0);
    }

    pub fn begin_search(&mut self) {
        self.mode = Mode::Search;
    }

    pub fn search_push(&mut self, c: char) {
        let mut text = self.session.criteria().search_text.clone();
        text.push(c);
        self.session.set_search_text(text);
        self.set_cursor(0);
    }

    pub fn search_pop(&mut self) {
        let mut text = self.session.criteria().search_text.clone();
        text.pop();
        self.session.set_search_text(text);
        self.set_cursor(0);
    }

    /// Leaves search mode. `keep == false` also clears the search text.
    pub fn end_search(&mut self, keep: bool) {
        if !keep {
            self.session.set_search_text("");
            self.set_cursor(0);
        }
        self.mode = Mode::Normal;
    }

    // -----------------------------------------------------------------------
    // Document and job lifecycle
    // -----------------------------------------------------------------------

    /// Replaces the session contents with a saved result.
    pub fn load_result(&mut self, result: ReviewResult, document_name: Option<String>) {
        self.session.reset_for_new_document(document_name);
        self.session.ingest_result(result);
        self.set_cursor(0);
        self.notify(format!("Loaded {} issues", self.session.issues().len()));
    }

    /// Resets the session and starts polling `job_id`. Events are forwarded to `tx`.
    pub fn start_job(&mut self, job_id: &str, tx: mpsc::UnboundedSender<AppEvent>) {
        let Some(tracker) = self.tracker.as_mut() else {
            self.notify_error("No review server configured");
            return;
        };
        let stream = tracker.start_job_polling(job_id);
        forward_job_events(job_id.to_owned(), stream, tx);
        self.active_job = Some(job_id.to_owned());

        self.session.reset_for_new_document(None);
        self.session.flags.job_active = true;
        self.session.flags.loading = true;
        self.job = None;
        self.notify(format!("Tracking job {job_id}"));
    }

    /// Applies an event from the poll of `job_id`. Events of any other job,
    /// including ones queued before an abort, are dropped.
    pub fn apply_job_event(&mut self, job_id: &str, event: JobEvent) {
        if self.active_job.as_deref() != Some(job_id) {
            tracing::debug!(job_id, "dropping event of inactive job");
            return;
        }
        if event.is_terminal() {
            self.active_job = None;
        }
        match event {
            JobEvent::Progress(progress) => self.job = Some(progress),
            JobEvent::Complete(result) => {
                self.job = None;
                self.session.flags.job_active = false;
                self.session.ingest_result(*result);
                self.set_cursor(0);
                self.notify(format!("Review complete: {} issues", self.session.issues().len()));
            }
            JobEvent::Failed { status, reason } => {
                tracing::warn!(status = ?status, reason = %reason, "review job failed");
                self.job = None;
                self.session.flags.job_active = false;
                self.session.flags.loading = false;
                self.notify_error(reason);
            }
        }
    }

    /// Stops polling and asks the server to cancel the job.
    pub fn abort_job(&mut self) {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.abort();
        }
        self.active_job = None;
        if self.session.flags.job_active {
            self.session.flags.job_active = false;
            self.session.flags.loading = false;
            self.job = None;
            self.notify("Job cancelled");
        }
    }

    /// Stops local polling without notifying the server.
    pub fn stop_polling(&mut self) {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.stop_job_polling();
        }
    }

    /// Returns `true` when the app may exit now.
    pub fn request_quit(&mut self) -> bool {
        if self.session.flags.job_active {
            self.mode = Mode::ConfirmQuit;
            false
        } else {
            true
        }
    }

    // -----------------------------------------------------------------------
    // Misc
    // -----------------------------------------------------------------------

    pub fn export(&mut self, format: ExportFormat) {
        let (ext, body) = match format {
            ExportFormat::Json => match self.session.export_selected_json() {
                Ok(body) => ("json", body),
                Err(e) => {
                    self.notify_error(format!("Export failed: {e}"));
                    return;
                }
            },
            ExportFormat::Csv => ("csv", self.session.export_selected_csv()),
        };
        let short_id: String = self.session.session_id().chars().take(8).collect();
        let path = self.export_dir.join(format!("issues-{short_id}.{ext}"));
        match std::fs::write(&path, body) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "issues exported");
                self.notify(format!("Exported to {}", path.display()));
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "export failed");
                self.notify_error(format!("Export failed: {e}"));
            }
        }
    }

    pub fn toggle_debug(&mut self) {
        let enabled = !self.log.is_debug();
        self.log.set_debug(enabled);
        self.notify(if enabled { "Debug logging on" } else { "Debug logging off" });
    }

    pub fn is_debug(&self) -> bool {
        self.log.is_debug()
    }

    pub fn cycle_theme(&mut self) {
        self.theme = self.theme.next();
        let name = self.theme.name.to_owned();
        self.settings.update(|s| s.ui.theme = name);
    }
}
