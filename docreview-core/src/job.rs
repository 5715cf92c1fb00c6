//! Server-side analysis job: status phases, wire payloads and ETA helpers.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::ReviewResult;

/// Phase of a server-side job. `Complete`, `Failed` and `Cancelled` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Extracting,
    Checking,
    Postprocessing,
    Complete,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed | JobStatus::Cancelled)
    }

    fn phase_index(self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Extracting => 1,
            JobStatus::Checking => 2,
            JobStatus::Postprocessing => 3,
            JobStatus::Complete | JobStatus::Failed | JobStatus::Cancelled => 4,
        }
    }

    /// Whether a polled status may follow `self`.
    ///
    /// Non-terminal phases only move forward (or stay); any non-terminal phase
    /// may end in a terminal one. Nothing follows a terminal status.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next.is_terminal() || next.phase_index() >= self.phase_index()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Extracting => "extracting",
            JobStatus::Checking => "checking",
            JobStatus::Postprocessing => "postprocessing",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Body of `GET /job/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobStatusResponse {
    pub success: bool,
    pub job: Option<JobPayload>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    pub status: JobStatus,
    #[serde(default)]
    pub progress: ProgressPayload,
    /// Seconds since the job started.
    #[serde(default)]
    pub elapsed: Option<f64>,
    /// Server-side estimate of remaining seconds.
    #[serde(default)]
    pub eta: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
    /// Present only with `include_result=true` on a complete job.
    #[serde(default)]
    pub result: Option<ReviewResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressPayload {
    pub phase: Option<String>,
    pub phase_progress: f64,
    pub overall_progress: f64,
    pub current_checker: Option<String>,
    pub checkers_completed: u32,
    pub checkers_total: u32,
    pub last_log: Option<String>,
}

/// Progress snapshot delivered to the UI on every non-terminal tick.
#[derive(Debug, Clone, PartialEq)]
pub struct JobProgress {
    pub status: JobStatus,
    pub phase: String,
    /// 0.0..=1.0 within the current phase.
    pub phase_progress: f64,
    /// 0.0..=1.0 across the whole job.
    pub overall_progress: f64,
    pub current_checker: Option<String>,
    pub checkers_completed: u32,
    pub checkers_total: u32,
    pub last_log: Option<String>,
    pub elapsed: Duration,
    /// Rendered ETA, empty when no estimate is available.
    pub eta: String,
}

impl JobProgress {
    pub fn from_payload(job: &JobPayload) -> Self {
        let p = &job.progress;
        let elapsed = seconds(job.elapsed).unwrap_or_default();
        let eta = seconds(job.eta)
            .or_else(|| estimate_from_fraction(elapsed, p.overall_progress))
            .map(format_eta)
            .unwrap_or_default();
        Self {
            status: job.status,
            phase: p.phase.clone().unwrap_or_else(|| job.status.to_string()),
            phase_progress: p.phase_progress.clamp(0.0, 1.0),
            overall_progress: p.overall_progress.clamp(0.0, 1.0),
            current_checker: p.current_checker.clone(),
            checkers_completed: p.checkers_completed,
            checkers_total: p.checkers_total,
            last_log: p.last_log.clone(),
            elapsed,
            eta,
        }
    }
}

fn seconds(value: Option<f64>) -> Option<Duration> {
    value
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(Duration::from_secs_f64)
}

/// ETA from elapsed time and a fractional progress; none before any progress.
fn estimate_from_fraction(elapsed: Duration, fraction: f64) -> Option<Duration> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return None;
    }
    let per_unit = elapsed.as_secs_f64() / fraction;
    Some(Duration::from_secs_f64(per_unit * (1.0 - fraction)))
}

// ---------------------------------------------------------------------------
// ETA helpers
// ---------------------------------------------------------------------------

/// Remaining time for an item-count based operation.
///
/// Returns `None` while nothing has been processed yet, and zero once
/// `processed >= total`.
pub fn estimate_eta(elapsed: Duration, processed: u64, total: u64) -> Option<Duration> {
    if processed == 0 {
        return None;
    }
    let remaining = total.saturating_sub(processed);
    let per_item = elapsed.as_secs_f64() / processed as f64;
    Some(Duration::from_secs_f64(per_item * remaining as f64))
}

/// "1m 05s", "42s", "1h 02m".
pub fn format_elapsed(d: Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h {m:02}m")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}

/// "~1m 05s remaining".
pub fn format_eta(d: Duration) -> String {
    format!("~{} remaining", format_elapsed(d))
}
