//! Polling tracker for server-side analysis jobs.
//!
//! [`JobTracker::start_job_polling`] spawns a tokio task that fetches the job
//! status on a fixed interval and yields [`JobEvent`]s through a
//! [`JobStream`]. Exactly one terminal event (`Complete` or `Failed`) is sent,
//! after which the stream ends. Closing or dropping the stream stops polling.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;
use crate::job::{JobPayload, JobProgress, JobStatus, JobStatusResponse};
use crate::types::ReviewResult;

/// Default delay between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

const EVENT_BUFFER: usize = 32;

/// The job endpoints consumed by the tracker.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// `GET /job/{id}`, optionally with the full result payload.
    async fn job_status(
        &self,
        job_id: &str,
        include_result: bool,
    ) -> Result<JobStatusResponse, ApiError>;

    /// `POST /job/{id}/cancel`.
    async fn cancel_job(&self, job_id: &str) -> Result<(), ApiError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Progress(JobProgress),
    Complete(Box<ReviewResult>),
    /// Terminal failure. `status` is `None` for transport errors.
    Failed {
        status: Option<JobStatus>,
        reason: String,
    },
}

impl JobEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobEvent::Progress(_))
    }
}

// ---------------------------------------------------------------------------
// JobStream
// ---------------------------------------------------------------------------

/// Receiving end of a polling task.
pub struct JobStream {
    rx: mpsc::Receiver<JobEvent>,
    cancel: CancellationToken,
}

impl JobStream {
    /// Waits for the next event. `None` once the job reached a terminal
    /// state or polling was stopped.
    pub async fn next_event(&mut self) -> Option<JobEvent> {
        self.rx.recv().await
    }

    /// Stops polling. Events already buffered can still be drained.
    pub fn close(&mut self) {
        self.cancel.cancel();
        self.rx.close();
    }
}

impl Stream for JobStream {
    type Item = JobEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<JobEvent>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for JobStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// JobTracker
// ---------------------------------------------------------------------------

pub struct JobTracker<A: JobApi + ?Sized> {
    api: Arc<A>,
    interval: Duration,
    poll_cancel: Option<CancellationToken>,
    current_job: Option<String>,
    abort_token: CancellationToken,
}

impl<A: JobApi + ?Sized + 'static> JobTracker<A> {
    pub fn new(api: Arc<A>, interval: Duration) -> Self {
        Self {
            api,
            interval,
            poll_cancel: None,
            current_job: None,
            abort_token: CancellationToken::new(),
        }
    }

    /// Starts polling `job_id`, cancelling any poll already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_job_polling(&mut self, job_id: impl Into<String>) -> JobStream {
        self.stop_job_polling();

        let job_id = job_id.into();
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        tracing::info!(job_id = %job_id, interval_ms = self.interval.as_millis() as u64, "job polling started");
        tokio::spawn(poll_job(
            Arc::clone(&self.api),
            job_id.clone(),
            self.interval,
            tx,
            cancel.clone(),
        ));

        self.poll_cancel = Some(cancel.clone());
        self.current_job = Some(job_id);
        JobStream { rx, cancel }
    }

    /// Stops the current poll, if any. No server call is made.
    pub fn stop_job_polling(&mut self) {
        if let Some(cancel) = self.poll_cancel.take() {
            if !cancel.is_cancelled() {
                tracing::debug!(job_id = ?self.current_job, "job polling stopped");
            }
            cancel.cancel();
        }
        self.current_job = None;
    }

    /// `true` while a poll task is running.
    pub fn is_polling(&self) -> bool {
        self.poll_cancel.as_ref().is_some_and(|c| !c.is_cancelled())
    }

    /// Id of the job being polled.
    pub fn current_job(&self) -> Option<&str> {
        self.current_job.as_deref().filter(|_| self.is_polling())
    }

    /// Cancels everything in flight.
    ///
    /// Trips the abort token for non-job operations, stops polling, and asks
    /// the server to cancel the running job without waiting for the answer.
    pub fn abort(&mut self) {
        self.abort_token.cancel();
        self.abort_token = CancellationToken::new();

        let active = self.current_job().map(str::to_owned);
        self.stop_job_polling();

        if let Some(job_id) = active {
            tracing::info!(job_id = %job_id, "cancelling job");
            let api = Arc::clone(&self.api);
            tokio::spawn(async move {
                if let Err(e) = api.cancel_job(&job_id).await {
                    tracing::warn!(job_id = %job_id, error = %e, "job cancel request failed");
                }
            });
        }
    }

    /// Token for the next non-job operation. Replaced on every [`abort`](Self::abort).
    pub fn abort_token(&self) -> CancellationToken {
        self.abort_token.clone()
    }
}

async fn poll_job<A: JobApi + ?Sized>(
    api: Arc<A>,
    job_id: String,
    interval: Duration,
    tx: mpsc::Sender<JobEvent>,
    cancel: CancellationToken,
) {
    // Marks the tracker as idle however this task ends.
    let _done = cancel.clone().drop_guard();

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_status: Option<JobStatus> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => return,
            r = api.job_status(&job_id, false) => r,
        };

        let job = match accepted_job(response) {
            Ok(job) => job,
            Err(reason) => {
                tracing::warn!(job_id = %job_id, reason = %reason, "job polling failed");
                let _ = tx.send(JobEvent::Failed { status: None, reason }).await;
                return;
            }
        };

        if let Some(prev) = last_status {
            if !prev.can_transition_to(job.status) {
                tracing::debug!(
                    job_id = %job_id,
                    from = %prev,
                    to = %job.status,
                    "ignoring out-of-order job status"
                );
                continue;
            }
        }
        let status = job.status;
        last_status = Some(status);

        let event = match status {
            JobStatus::Complete => {
                let fetched = tokio::select! {
                    _ = cancel.cancelled() => return,
                    r = api.job_status(&job_id, true) => r,
                };
                complete_event(fetched, job)
            }
            JobStatus::Failed | JobStatus::Cancelled => JobEvent::Failed {
                status: Some(status),
                reason: job.error.unwrap_or_else(|| format!("Job {status}")),
            },
            _ => JobEvent::Progress(JobProgress::from_payload(&job)),
        };

        let terminal = event.is_terminal();
        if terminal {
            tracing::info!(job_id = %job_id, status = %status, "job finished");
        }
        if tx.send(event).await.is_err() || terminal {
            return;
        }
    }
}

/// Unwraps a status response into its job payload, or a user-facing reason.
fn accepted_job(response: Result<JobStatusResponse, ApiError>) -> Result<JobPayload, String> {
    let response = response.map_err(|e| e.user_message())?;
    match response.job {
        Some(job) if response.success => Ok(job),
        _ => Err(response
            .error
            .unwrap_or_else(|| "Job status unavailable".to_owned())),
    }
}

fn complete_event(fetched: Result<JobStatusResponse, ApiError>, first: JobPayload) -> JobEvent {
    let failed = |reason: String| JobEvent::Failed {
        status: Some(JobStatus::Complete),
        reason,
    };
    match accepted_job(fetched) {
        Ok(job) => match job.result.or(first.result) {
            Some(result) => JobEvent::Complete(Box::new(result)),
            None => failed("Job completed without a result".to_owned()),
        },
        Err(reason) => failed(reason),
    }
}
