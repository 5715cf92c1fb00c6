//! HTTP client for the review server.
//!
//! Every request goes through [`HttpJobApi::request`], which attaches the
//! CSRF token, refreshes it once on a 403, and normalises every outcome into
//! either the decoded body or an [`ApiError`]. Nothing above this module sees
//! a `reqwest` error.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use docreview_core::job::JobStatusResponse;
use docreview_core::state::ServerCapabilities;
use docreview_core::{ApiError, JobApi};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

const CSRF_HEADER: &str = "X-CSRF-Token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct HttpJobApi {
    client: reqwest::Client,
    base_url: String,
    csrf_token: Mutex<Option<String>>,
}

#[derive(Deserialize)]
struct CsrfResponse {
    csrf_token: String,
}

/// `{success, error}` envelope of endpoints without a payload.
#[derive(Deserialize)]
struct Ack {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CapabilitiesResponse {
    async_jobs: bool,
    role_extraction: bool,
}

impl HttpJobApi {
    /// # Errors
    ///
    /// `ApiError::Transport` if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            csrf_token: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Asks the server what it supports. Any failure, including `abort`
    /// firing, yields no capabilities.
    pub async fn capabilities(&self, abort: &CancellationToken) -> ServerCapabilities {
        let probe = self.request::<CapabilitiesResponse>(Method::GET, "/api/capabilities", Some(abort));
        let caps = match tokio::time::timeout(PROBE_TIMEOUT, probe).await {
            Ok(Ok(caps)) => caps,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "capabilities probe failed");
                CapabilitiesResponse::default()
            }
            Err(_) => {
                tracing::debug!("capabilities probe timed out");
                CapabilitiesResponse::default()
            }
        };
        ServerCapabilities {
            async_jobs: caps.async_jobs,
            role_extraction: caps.role_extraction,
        }
    }

    async fn refresh_csrf(&self) -> Result<String, ApiError> {
        let response = self
            .client
            .get(self.url("/api/csrf-token"))
            .send()
            .await
            .map_err(transport_error)?;
        let body: CsrfResponse = decode(response).await?;
        *self.csrf_token.lock().await = Some(body.csrf_token.clone());
        tracing::debug!("csrf token refreshed");
        Ok(body.csrf_token)
    }

    async fn current_csrf(&self) -> Result<String, ApiError> {
        if let Some(token) = self.csrf_token.lock().await.clone() {
            return Ok(token);
        }
        self.refresh_csrf().await
    }

    /// Sends a request and decodes the JSON body.
    ///
    /// A 403 is treated as an expired CSRF token: the token is refreshed and
    /// the request retried once. When `abort` fires first the request is
    /// dropped and `ApiError::Aborted` returned.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        abort: Option<&CancellationToken>,
    ) -> Result<T, ApiError> {
        abortable(abort, self.send_with_retry(method, path)).await
    }

    async fn send_with_retry<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
    ) -> Result<T, ApiError> {
        let mut retried = false;
        loop {
            let mut builder = self.client.request(method.clone(), self.url(path));
            if method != Method::GET {
                builder = builder.header(CSRF_HEADER, self.current_csrf().await?);
            }
            let response = builder.send().await.map_err(transport_error)?;

            if response.status() == StatusCode::FORBIDDEN && !retried {
                tracing::debug!(path, "403 from server; refreshing csrf token");
                retried = true;
                self.refresh_csrf().await?;
                continue;
            }
            return decode(response).await;
        }
    }
}

async fn abortable<T>(
    abort: Option<&CancellationToken>,
    fut: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    match abort {
        Some(token) => tokio::select! {
            _ = token.cancelled() => Err(ApiError::Aborted),
            r = fut => r,
        },
        None => fut.await,
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        let message = serde_json::from_str::<Ack>(&body)
            .ok()
            .and_then(|a| a.error)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_owned());
        tracing::warn!(status = status.as_u16(), message = %message, "request failed");
        return Err(ApiError::Status { status: status.as_u16(), message });
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::warn!(error = %e, "response was not the expected JSON");
        ApiError::InvalidResponse(e.to_string())
    })
}

#[async_trait]
impl JobApi for HttpJobApi {
    async fn job_status(
        &self,
        job_id: &str,
        include_result: bool,
    ) -> Result<JobStatusResponse, ApiError> {
        let path = if include_result {
            format!("/job/{job_id}?include_result=true")
        } else {
            format!("/job/{job_id}")
        };
        self.request(Method::GET, &path, None).await
    }

    async fn cancel_job(&self, job_id: &str) -> Result<(), ApiError> {
        let ack: Ack = self.request(Method::POST, &format!("/job/{job_id}/cancel"), None).await?;
        if ack.success {
            Ok(())
        } else {
            Err(ApiError::Server(ack.error.unwrap_or_else(|| "cancel rejected".to_owned())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use docreview_core::JobTracker;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    type Requests = Arc<std::sync::Mutex<Vec<String>>>;

    /// Serves `responses` in order, one per connection, recording each raw
    /// request head. Once the script runs out, connections are held open
    /// without an answer.
    async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Requests) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests: Requests = Arc::default();
        let seen = Arc::clone(&requests);
        let mut script: VecDeque<_> = responses.into();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else { return };
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                seen.lock().unwrap().push(String::from_utf8_lossy(&head).to_lowercase());

                let Some((status, body)) = script.pop_front() else {
                    tokio::spawn(async move {
                        let _held = socket;
                        std::future::pending::<()>().await;
                    });
                    continue;
                };
                let reply = format!(
                    "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        (base, requests)
    }

    #[tokio::test]
    async fn expired_csrf_token_is_refreshed_once() {
        let (base, requests) = serve(vec![
            (200, r#"{"csrf_token":"first"}"#),
            (403, r#"{"error":"csrf"}"#),
            (200, r#"{"csrf_token":"second"}"#),
            (200, r#"{"success":true}"#),
        ])
        .await;
        let api = HttpJobApi::new(&base).unwrap();

        api.cancel_job("j1").await.unwrap();

        let seen = requests.lock().unwrap().clone();
        assert_eq!(seen.len(), 4);
        assert!(seen[0].starts_with("get /api/csrf-token"));
        assert!(seen[1].contains("x-csrf-token: first"));
        assert!(seen[3].starts_with("post /job/j1/cancel"));
        assert!(seen[3].contains("x-csrf-token: second"));
    }

    #[tokio::test]
    async fn second_forbidden_is_returned() {
        let (base, _) = serve(vec![
            (200, r#"{"csrf_token":"a"}"#),
            (403, "{}"),
            (200, r#"{"csrf_token":"b"}"#),
            (403, r#"{"error":"still forbidden"}"#),
        ])
        .await;
        let api = HttpJobApi::new(&base).unwrap();

        let err = api.cancel_job("j2").await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Status { status: 403, ref message } if message == "still forbidden"
        ));
    }

    #[tokio::test]
    async fn non_ok_status_carries_server_or_canonical_message() {
        let (base, _) = serve(vec![(500, r#"{"error":"checker crashed"}"#), (413, "")]).await;
        let api = HttpJobApi::new(&base).unwrap();

        let err = api.job_status("j3", false).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Status { status: 500, ref message } if message == "checker crashed"
        ));

        let err = api.job_status("j3", false).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Status { status: 413, ref message } if message == "Payload Too Large"
        ));
        assert_eq!(err.user_message(), "The document is too large to upload.");
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let (base, requests) = serve(vec![(200, "<html>oops</html>")]).await;
        let api = HttpJobApi::new(&base).unwrap();

        let err = api.job_status("j4", true).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
        assert!(requests.lock().unwrap()[0].starts_with("get /job/j4?include_result=true"));
    }

    #[tokio::test]
    async fn abort_ends_in_flight_request() {
        let (base, _) = serve(Vec::new()).await;
        let api = Arc::new(HttpJobApi::new(&base).unwrap());
        let mut tracker = JobTracker::new(Arc::clone(&api), Duration::from_secs(1));
        let token = tracker.abort_token();

        let pending = tokio::spawn({
            let api = Arc::clone(&api);
            async move { api.request::<Ack>(Method::GET, "/slow", Some(&token)).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        tracker.abort();

        let outcome = tokio::time::timeout(Duration::from_secs(5), pending)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(outcome, Err(ApiError::Aborted)));
    }

    #[tokio::test]
    async fn aborted_probe_yields_no_capabilities() {
        let (base, _) = serve(Vec::new()).await;
        let api = HttpJobApi::new(&base).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let caps = api.capabilities(&token).await;
        assert_eq!(caps, ServerCapabilities::default());
    }
}
