//! RunPod HTTP client implementation.

use courtbatch_core::scheduler::{
    LaunchRequest, SchedulerError, SchedulerResult, TaskId, TaskScheduler, TaskStatus,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::status::JobResponse;
use crate::{Error, Result, RunpodConfig, TRACING_TARGET, TRACING_TARGET_HTTP};

/// HTTP client for a RunPod serverless endpoint.
///
/// # Examples
///
/// ```ignore
/// use courtbatch_runpod::{RunpodClient, RunpodConfig};
///
/// let config = RunpodConfig::new("my-endpoint", std::env::var("RUNPOD_API_KEY")?)?;
/// let client = RunpodClient::new(config)?;
/// ```
#[derive(Debug, Clone)]
pub struct RunpodClient {
    /// HTTP client
    http_client: Client,

    /// Configuration
    config: RunpodConfig,
}

/// Body of a `run` request.
#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    input: RunInput<'a>,
}

#[derive(Debug, Serialize)]
struct RunInput<'a> {
    args: &'a [String],
    pid: usize,
    nprocs: usize,
}

impl RunpodClient {
    /// Create a new RunPod client with the given configuration.
    pub fn new(config: RunpodConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&format!("Bearer {}", config.api_key()))
                .map_err(|e| Error::config(format!("Invalid API key: {}", e)))?,
        );

        let http_client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        debug!(
            target: TRACING_TARGET,
            base_url = %config.base_url(),
            endpoint_id = config.endpoint_id(),
            timeout = ?config.timeout(),
            "RunPod client initialized"
        );

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Get a reference to the client configuration.
    pub fn config(&self) -> &RunpodConfig {
        &self.config
    }

    /// Queues one worker job and returns the job id.
    ///
    /// The request is sent once. A timed out `run` may still have queued a
    /// job, so a failure is reported to the caller instead of retried.
    pub async fn run(&self, request: &LaunchRequest) -> Result<String> {
        let url = self.config.endpoint_url("run")?;
        let body = RunRequest {
            input: RunInput {
                args: &request.args,
                pid: request.pid,
                nprocs: request.nprocs,
            },
        };

        info!(
            target: TRACING_TARGET,
            pid = request.pid,
            nprocs = request.nprocs,
            "Queueing RunPod job"
        );

        let response = self
            .send(self.http_client.post(url).json(&body))
            .await
            .inspect_err(|e| {
                error!(
                    target: TRACING_TARGET_HTTP,
                    pid = request.pid,
                    error = %e,
                    "RunPod run request failed"
                );
            })?;

        Ok(response.id)
    }

    /// Fetches the current status of a job.
    pub(crate) async fn status(&self, job_id: &str) -> Result<JobResponse> {
        let url = self.config.endpoint_url(&format!("status/{job_id}"))?;
        self.send_with_retry(|| self.http_client.get(url.clone()))
            .await
    }

    /// Requests cancellation of a job.
    pub async fn cancel_job(&self, job_id: &str) -> Result<()> {
        let url = self.config.endpoint_url(&format!("cancel/{job_id}"))?;

        info!(target: TRACING_TARGET, job_id = job_id, "Cancelling RunPod job");

        self.send_with_retry(|| self.http_client.post(url.clone()))
            .await?;
        Ok(())
    }

    /// Sends one request and decodes the job response.
    async fn send(&self, request: RequestBuilder) -> Result<JobResponse> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::timeout(self.config.timeout())
            } else {
                Error::Http(e)
            }
        })?;
        self.handle_response(response).await
    }

    /// Execute a request with automatic retry on retryable errors.
    async fn send_with_retry<F>(&self, build: F) -> Result<JobResponse>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        let max_retries = self.config.max_retries();

        loop {
            match self.send(build()).await {
                Ok(job) => {
                    if attempt > 0 {
                        info!(
                            target: TRACING_TARGET_HTTP,
                            attempt = attempt + 1,
                            "Request succeeded after retry"
                        );
                    }
                    return Ok(job);
                }
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    attempt += 1;
                    let backoff = self.config.retry_backoff() * attempt;

                    warn!(
                        target: TRACING_TARGET_HTTP,
                        attempt = attempt,
                        max_retries = max_retries,
                        backoff_ms = backoff.as_millis(),
                        error = %e,
                        "Request failed, retrying"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    error!(
                        target: TRACING_TARGET_HTTP,
                        attempt = attempt + 1,
                        error = %e,
                        "Request failed permanently"
                    );
                    return Err(e);
                }
            }
        }
    }

    /// Handle HTTP response and convert to result.
    async fn handle_response(&self, response: reqwest::Response) -> Result<JobResponse> {
        let status = response.status();

        debug!(
            target: TRACING_TARGET_HTTP,
            status = status.as_u16(),
            "Received response from RunPod"
        );

        let body = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| {
                Error::invalid_response(format!("Failed to parse job response: {}", e), Some(body))
            });
        }

        let error = match status {
            StatusCode::TOO_MANY_REQUESTS => Error::rate_limit("Rate limit exceeded"),
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                Error::service_unavailable("Service temporarily unavailable")
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                Error::timeout(self.config.timeout())
            }
            _ if body.is_empty() => Error::api(status.as_u16(), status.to_string()),
            _ => Error::api(status.as_u16(), body),
        };

        Err(error)
    }
}

#[async_trait::async_trait]
impl TaskScheduler for RunpodClient {
    fn name(&self) -> &str {
        "runpod"
    }

    async fn launch(&self, request: &LaunchRequest) -> SchedulerResult<TaskId> {
        self.run(request)
            .await
            .map(TaskId::new)
            .map_err(|e| SchedulerError::launch_with_source("RunPod run request failed", e))
    }

    async fn poll(&self, tasks: &[TaskId]) -> SchedulerResult<Vec<TaskStatus>> {
        let mut statuses = Vec::with_capacity(tasks.len());

        for task in tasks {
            let job = self.status(task.as_str()).await.map_err(|e| {
                if e.status_code() == Some(404) {
                    SchedulerError::UnknownTask(task.clone())
                } else {
                    SchedulerError::poll_with_source("RunPod status request failed", e)
                }
            })?;

            let mut status = job.to_task_status();
            status.id = task.clone();
            statuses.push(status);
        }

        Ok(statuses)
    }

    async fn cancel(&self, task: &TaskId) -> SchedulerResult<()> {
        self.cancel_job(task.as_str())
            .await
            .map_err(|e| SchedulerError::cancel_with_source("RunPod cancel request failed", e))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    /// Reads one HTTP request and returns its request line.
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return String::new();
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
        let content_length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        while buf.len() < head_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        head.lines().next().unwrap_or_default().to_owned()
    }

    /// Serves `/run` requests, delaying the first reply by `first_delay`.
    /// Returns the base URL and the number of `/run` requests received.
    async fn serve_runs(
        status_line: &'static str,
        first_delay: Duration,
    ) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let counter = Arc::clone(&counter);
                tokio::spawn(async move {
                    let line = read_request(&mut socket).await;
                    if !line.starts_with("POST /v2/endpoint/run ") {
                        return;
                    }
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        tokio::time::sleep(first_delay).await;
                    }
                    let body = format!(r#"{{"id":"job-{n}","status":"IN_QUEUE"}}"#);
                    let response = format!(
                        "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });

        (format!("http://{addr}"), runs)
    }

    fn client_for(base_url: &str) -> RunpodClient {
        let config = RunpodConfig::new("endpoint", "key")
            .unwrap()
            .with_base_url(base_url)
            .unwrap()
            .with_timeout(Duration::from_millis(100))
            .with_max_retries(3)
            .with_retry_backoff(Duration::ZERO);
        RunpodClient::new(config).unwrap()
    }

    fn launch_request() -> LaunchRequest {
        LaunchRequest {
            pid: 0,
            nprocs: 1,
            args: vec!["scrape".to_owned()],
        }
    }

    #[test]
    fn run_body_shape() {
        let args = vec!["scrape".to_owned(), "portal".to_owned()];
        let body = RunRequest {
            input: RunInput {
                args: &args,
                pid: 1,
                nprocs: 4,
            },
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"input": {"args": ["scrape", "portal"], "pid": 1, "nprocs": 4}})
        );
    }

    #[test]
    fn client_builds_from_config() {
        let config = RunpodConfig::new("endpoint", "key").unwrap();
        let client = RunpodClient::new(config).unwrap();

        assert_eq!(client.name(), "runpod");
        assert_eq!(client.config().endpoint_id(), "endpoint");
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_launch() {
        let config = RunpodConfig::new("endpoint", "key")
            .unwrap()
            .with_base_url("http://127.0.0.1:9")
            .unwrap()
            .with_max_retries(0);
        let client = RunpodClient::new(config).unwrap();

        let request = LaunchRequest {
            pid: 0,
            nprocs: 1,
            args: vec!["scrape".to_owned()],
        };
        let err = client.launch(&request).await.unwrap_err();
        assert!(matches!(err, SchedulerError::Launch { .. }));
    }

    #[tokio::test]
    async fn launch_returns_job_id() {
        let (base_url, runs) = serve_runs("HTTP/1.1 200 OK", Duration::ZERO).await;
        let client = client_for(&base_url);

        let task = client.launch(&launch_request()).await.unwrap();

        assert_eq!(task.as_str(), "job-0");
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn timed_out_launch_is_not_resent() {
        let (base_url, runs) = serve_runs("HTTP/1.1 200 OK", Duration::from_millis(500)).await;
        let client = client_for(&base_url);

        let err = client.launch(&launch_request()).await.unwrap_err();

        assert!(matches!(err, SchedulerError::Launch { .. }));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unavailable_launch_is_not_resent() {
        let (base_url, runs) = serve_runs("HTTP/1.1 503 Service Unavailable", Duration::ZERO).await;
        let client = client_for(&base_url);

        let err = client.launch(&launch_request()).await.unwrap_err();

        assert!(matches!(err, SchedulerError::Launch { .. }));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
