//! Dispatch to a remote placement endpoint over HTTP.

use super::{merge, Executor};
use crate::error::PlaceError;
use crate::job::PlacementJob;
use crate::netlist::Placement;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tessera_common::{ClusterId, ContentHash};
use tokio::task::JoinHandle;

/// Posts every job to `<url>/place` and awaits all responses.
///
/// Submission is pipelined: all requests are in flight before the first
/// response is awaited. Transport faults are retried with linear backoff;
/// an error status, an undecodable body or an inconsistent result aborts
/// the run immediately.
#[derive(Debug, Clone)]
pub struct RemoteExecutor {
    url: String,
    timeout: Duration,
    retries: u32,
    backoff: Duration,
}

impl RemoteExecutor {
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
    /// Default number of retries after a transport fault.
    pub const DEFAULT_RETRIES: u32 = 2;
    /// Delay before the first retry; later retries wait proportionally longer.
    pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

    /// Creates an executor for the endpoint at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
            retries: Self::DEFAULT_RETRIES,
            backoff: Self::DEFAULT_BACKOFF,
        }
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry count.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the backoff unit.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    fn place_url(&self) -> String {
        format!("{}/place", self.url.trim_end_matches('/'))
    }

    /// Submits jobs from inside an existing `tokio` runtime.
    pub async fn submit_async(&self, jobs: Vec<PlacementJob>) -> Result<Placement, PlaceError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| PlaceError::Executor(e.to_string()))?;
        let url = self.place_url();
        tracing::info!(jobs = jobs.len(), %url, "dispatching to remote endpoint");

        let mut handles: Vec<(ClusterId, JoinHandle<Result<Placement, PlaceError>>)> =
            Vec::with_capacity(jobs.len());
        for job in &jobs {
            let body = job.encode()?;
            tracing::debug!(
                cluster = %job.cluster,
                job = %ContentHash::from_bytes(&body).short(),
                bytes = body.len(),
                "job submitted"
            );
            let request = Request {
                client: client.clone(),
                url: url.clone(),
                cluster: job.cluster,
                body,
                retries: self.retries,
                backoff: self.backoff,
            };
            handles.push((job.cluster, tokio::spawn(request.send())));
        }

        let mut results = Vec::with_capacity(handles.len());
        let mut pending = handles.into_iter();
        while let Some((cluster, handle)) = pending.next() {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(PlaceError::Remote {
                    cluster,
                    reason: e.to_string(),
                }),
            };
            match outcome {
                Ok(placement) => results.push((cluster, placement)),
                Err(e) => {
                    for (_, rest) in pending {
                        rest.abort();
                    }
                    return Err(e);
                }
            }
        }
        merge(&jobs, results)
    }
}

struct Request {
    client: Client,
    url: String,
    cluster: ClusterId,
    body: Vec<u8>,
    retries: u32,
    backoff: Duration,
}

impl Request {
    async fn send(self) -> Result<Placement, PlaceError> {
        let cluster = self.cluster;
        let remote = |reason: String| PlaceError::Remote { cluster, reason };

        let mut attempt = 0u32;
        let response = loop {
            let sent = self
                .client
                .post(&self.url)
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(self.body.clone())
                .send()
                .await;
            match sent {
                Ok(response) => break response,
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    tracing::warn!(%cluster, attempt, error = %e, "remote request failed, retrying");
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                Err(e) => return Err(remote(format!("request failed: {e}"))),
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(remote(format!("endpoint returned {status}: {text}")));
        }
        response
            .json::<Placement>()
            .await
            .map_err(|e| remote(format!("undecodable response: {e}")))
    }
}

impl Executor for RemoteExecutor {
    fn submit(&self, jobs: Vec<PlacementJob>) -> Result<Placement, PlaceError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| PlaceError::Executor(e.to_string()))?;
        runtime.block_on(self.submit_async(jobs))
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_url_joins_path() {
        assert_eq!(
            RemoteExecutor::new("http://host:8080").place_url(),
            "http://host:8080/place"
        );
        assert_eq!(
            RemoteExecutor::new("http://host:8080/").place_url(),
            "http://host:8080/place"
        );
    }

    #[test]
    fn defaults() {
        let executor = RemoteExecutor::new("http://host");
        assert_eq!(executor.timeout, Duration::from_secs(300));
        assert_eq!(executor.retries, 2);
    }

    #[test]
    fn unreachable_endpoint_fails_after_retries() {
        use crate::anneal::AnnealParams;
        use tessera_common::{BlockId, Coord};

        let job = PlacementJob {
            cluster: ClusterId::from_raw(0),
            members: [BlockId::new("p0").unwrap()].into_iter().collect(),
            compute_cells: [Coord::new(0, 0)].into_iter().collect(),
            register_cells: Default::default(),
            memory_cells: Default::default(),
            netlist: Default::default(),
            fixed: Placement::new(),
            fold_registers: true,
            seed: 0,
            anneal: AnnealParams {
                steps: 1,
                cooling_rate: 0.5,
                moves_per_temperature: 1,
            },
        };
        // Port 9 (discard) on localhost refuses connections.
        let executor = RemoteExecutor::new("http://127.0.0.1:9")
            .with_retries(1)
            .with_backoff(Duration::from_millis(1))
            .with_timeout(Duration::from_secs(2));
        let err = executor.submit(vec![job]).unwrap_err();
        assert!(matches!(err, PlaceError::Remote { .. }));
    }
}
