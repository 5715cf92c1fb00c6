//! Integration test for job polling against a scripted job API.
//!
//! Exercises: JobTracker::start_job_polling, stop_job_polling, abort,
//! JobStream termination, status regression handling.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use docreview_core::job::{JobPayload, JobStatus, JobStatusResponse, ProgressPayload};
use docreview_core::types::{Issue, ReviewResult, Severity};
use docreview_core::{ApiError, JobApi, JobEvent, JobTracker};
use futures::StreamExt;

const TICK: Duration = Duration::from_millis(5);

#[derive(Default)]
struct ScriptedApi {
    statuses: Mutex<VecDeque<Result<JobStatusResponse, ApiError>>>,
    result: Mutex<Option<ReviewResult>>,
    status_calls: AtomicUsize,
    result_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
}

impl ScriptedApi {
    fn new(script: Vec<Result<JobStatusResponse, ApiError>>) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(script.into()),
            ..Self::default()
        })
    }

    fn with_result(self: Arc<Self>, result: ReviewResult) -> Arc<Self> {
        *self.result.lock().unwrap() = Some(result);
        self
    }
}

#[async_trait]
impl JobApi for ScriptedApi {
    async fn job_status(
        &self,
        _job_id: &str,
        include_result: bool,
    ) -> Result<JobStatusResponse, ApiError> {
        if include_result {
            self.result_calls.fetch_add(1, Ordering::SeqCst);
            let mut job = payload(JobStatus::Complete, 1.0);
            job.result = self.result.lock().unwrap().clone();
            return Ok(ok(job));
        }
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.statuses.lock().unwrap();
        match script.len() {
            0 => Ok(ok(payload(JobStatus::Queued, 0.0))),
            1 => script.front().cloned().unwrap_or_else(|| Err(ApiError::Aborted)),
            _ => script.pop_front().unwrap_or(Err(ApiError::Aborted)),
        }
    }

    async fn cancel_job(&self, _job_id: &str) -> Result<(), ApiError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Err(ApiError::Transport("connection refused".into()))
    }
}

fn payload(status: JobStatus, overall: f64) -> JobPayload {
    JobPayload {
        status,
        progress: ProgressPayload {
            phase: Some(status.to_string()),
            overall_progress: overall,
            checkers_total: 4,
            ..ProgressPayload::default()
        },
        elapsed: Some(2.0),
        eta: None,
        error: None,
        result: None,
    }
}

fn ok(job: JobPayload) -> JobStatusResponse {
    JobStatusResponse { success: true, job: Some(job), error: None }
}

fn status(s: JobStatus, overall: f64) -> Result<JobStatusResponse, ApiError> {
    Ok(ok(payload(s, overall)))
}

fn sample_result() -> ReviewResult {
    ReviewResult {
        issues: vec![Issue {
            id: None,
            severity: Severity::High,
            category: "Acronyms".into(),
            message: "Undefined acronym SRR".into(),
            flagged_text: Some("SRR".into()),
            context: None,
            suggestion: None,
            source: None,
        }],
        document_name: Some("plan.docx".into()),
        ..ReviewResult::default()
    }
}

async fn collect(stream: docreview_core::JobStream) -> Vec<JobEvent> {
    tokio::time::timeout(Duration::from_secs(5), stream.collect::<Vec<_>>())
        .await
        .expect("stream should end")
}

#[tokio::test]
async fn progresses_to_completion_and_fetches_result_once() {
    let api = ScriptedApi::new(vec![
        status(JobStatus::Queued, 0.0),
        status(JobStatus::Extracting, 0.2),
        status(JobStatus::Checking, 0.5),
        status(JobStatus::Complete, 1.0),
    ])
    .with_result(sample_result());
    let mut tracker = JobTracker::new(api.clone(), TICK);

    let events = collect(tracker.start_job_polling("job-1")).await;

    let phases: Vec<JobStatus> = events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Progress(p) => Some(p.status),
            _ => None,
        })
        .collect();
    assert_eq!(phases, [JobStatus::Queued, JobStatus::Extracting, JobStatus::Checking]);
    match events.last() {
        Some(JobEvent::Complete(result)) => assert_eq!(result.issues.len(), 1),
        other => panic!("expected completion, got {other:?}"),
    }
    assert_eq!(api.result_calls.load(Ordering::SeqCst), 1);
    assert!(!tracker.is_polling());
}

#[tokio::test]
async fn failed_job_reports_server_reason() {
    let mut failed = payload(JobStatus::Failed, 0.4);
    failed.error = Some("Document could not be parsed".into());
    let api = ScriptedApi::new(vec![status(JobStatus::Checking, 0.4), Ok(ok(failed))]);
    let mut tracker = JobTracker::new(api.clone(), TICK);

    let events = collect(tracker.start_job_polling("job-2")).await;
    assert_eq!(
        events.last(),
        Some(&JobEvent::Failed {
            status: Some(JobStatus::Failed),
            reason: "Document could not be parsed".into(),
        })
    );
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    assert_eq!(api.result_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn transport_error_stops_polling() {
    let api = ScriptedApi::new(vec![
        status(JobStatus::Queued, 0.0),
        Err(ApiError::Transport("reset by peer".into())),
        status(JobStatus::Checking, 0.5),
    ]);
    let mut tracker = JobTracker::new(api.clone(), TICK);

    let events = collect(tracker.start_job_polling("job-3")).await;
    assert!(matches!(
        events.last(),
        Some(JobEvent::Failed { status: None, .. })
    ));
    let calls = api.status_calls.load(Ordering::SeqCst);
    tokio::time::sleep(TICK * 10).await;
    assert_eq!(api.status_calls.load(Ordering::SeqCst), calls);
}

#[tokio::test]
async fn status_regressions_are_ignored() {
    let api = ScriptedApi::new(vec![
        status(JobStatus::Checking, 0.5),
        status(JobStatus::Queued, 0.0),
        status(JobStatus::Postprocessing, 0.9),
        status(JobStatus::Complete, 1.0),
    ])
    .with_result(sample_result());
    let mut tracker = JobTracker::new(api, TICK);

    let events = collect(tracker.start_job_polling("job-4")).await;
    let phases: Vec<JobStatus> = events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Progress(p) => Some(p.status),
            _ => None,
        })
        .collect();
    assert_eq!(phases, [JobStatus::Checking, JobStatus::Postprocessing]);
}

#[tokio::test]
async fn restarting_cancels_the_previous_poll() {
    let api = ScriptedApi::new(vec![status(JobStatus::Checking, 0.3)]);
    let mut tracker = JobTracker::new(api, TICK);

    let mut first = tracker.start_job_polling("job-a");
    assert!(first.next_event().await.is_some());

    let mut second = tracker.start_job_polling("job-b");
    assert_eq!(tracker.current_job(), Some("job-b"));

    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        while first.next_event().await.is_some() {}
    })
    .await;
    assert!(drained.is_ok(), "first stream should end after restart");
    assert!(second.next_event().await.is_some());

    tracker.stop_job_polling();
    assert!(!tracker.is_polling());
}

#[tokio::test]
async fn dropping_the_stream_stops_polling() {
    let api = ScriptedApi::new(vec![status(JobStatus::Checking, 0.3)]);
    let mut tracker = JobTracker::new(api.clone(), TICK);

    let mut stream = tracker.start_job_polling("job-5");
    assert!(stream.next_event().await.is_some());
    drop(stream);

    tokio::time::sleep(TICK * 4).await;
    let calls = api.status_calls.load(Ordering::SeqCst);
    tokio::time::sleep(TICK * 10).await;
    assert_eq!(api.status_calls.load(Ordering::SeqCst), calls);
    assert!(!tracker.is_polling());
}

#[tokio::test]
async fn abort_notifies_server_and_trips_token() {
    let api = ScriptedApi::new(vec![status(JobStatus::Checking, 0.3)]);
    let mut tracker = JobTracker::new(api.clone(), TICK);
    let token = tracker.abort_token();

    let mut stream = tracker.start_job_polling("job-6");
    assert!(stream.next_event().await.is_some());

    tracker.abort();
    assert!(token.is_cancelled());
    assert!(!tracker.abort_token().is_cancelled());
    assert!(!tracker.is_polling());

    // The failing cancel request does not surface anywhere.
    tokio::time::sleep(TICK * 4).await;
    assert_eq!(api.cancel_calls.load(Ordering::SeqCst), 1);

    // Aborting with nothing running makes no server call.
    tracker.abort();
    tokio::time::sleep(TICK * 4).await;
    assert_eq!(api.cancel_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn server_cancellation_is_terminal() {
    let api = ScriptedApi::new(vec![
        status(JobStatus::Checking, 0.4),
        status(JobStatus::Cancelled, 0.4),
    ]);
    let mut tracker = JobTracker::new(api.clone(), TICK);

    let events = collect(tracker.start_job_polling("job-7")).await;
    assert_eq!(
        events.last(),
        Some(&JobEvent::Failed {
            status: Some(JobStatus::Cancelled),
            reason: "Job cancelled".into(),
        })
    );
    assert_eq!(api.result_calls.load(Ordering::SeqCst), 0);
    assert!(!tracker.is_polling());
}

#[tokio::test]
async fn unsuccessful_status_response_surfaces_server_error() {
    let rejected = JobStatusResponse {
        success: false,
        job: None,
        error: Some("Unknown job".into()),
    };
    let api = ScriptedApi::new(vec![status(JobStatus::Queued, 0.0), Ok(rejected)]);
    let mut tracker = JobTracker::new(api.clone(), TICK);

    let events = collect(tracker.start_job_polling("job-8")).await;
    assert_eq!(
        events.last(),
        Some(&JobEvent::Failed { status: None, reason: "Unknown job".into() })
    );
    let calls = api.status_calls.load(Ordering::SeqCst);
    tokio::time::sleep(TICK * 10).await;
    assert_eq!(api.status_calls.load(Ordering::SeqCst), calls);
}
