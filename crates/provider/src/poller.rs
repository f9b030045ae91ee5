//! Async job completion
//!
//! Mutating calls that run server-side hand back a `jobid`. The poller waits
//! on `queryAsyncJobResult` until the job reaches a terminal status, then
//! surfaces its error text or substitutes the keyed result object.

use serde_json::Value;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info};

use cloudnet_common::{Error, JobStatus, MutationResponse, PollPolicy, Result};

use crate::client::ManagementApi;

pub struct JobPoller {
    api: Arc<dyn ManagementApi>,
    policy: PollPolicy,
}

impl JobPoller {
    pub fn new(api: Arc<dyn ManagementApi>, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    /// Wait for the job behind `response`, if there is one.
    ///
    /// Without a `jobid` the call was synchronous and the response body is
    /// returned as is. On success the object under `key` in the job result
    /// replaces the handle when present.
    pub async fn wait(&self, response: MutationResponse, key: Option<&str>) -> Result<Value> {
        let Some(job_id) = response.job_id() else {
            return Ok(response.into_value());
        };

        if !self.policy.is_bounded() {
            debug!("Waiting on job {} without a poll limit", job_id);
        }
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            let job = self.api.query_async_job_result(&job_id).await?;
            attempts += 1;

            match job.status() {
                JobStatus::Pending => {
                    debug!("Job {} pending (poll {})", job_id, attempts);
                }
                JobStatus::Done(code) => {
                    if let Some(message) = job.error_text() {
                        return Err(Error::Job {
                            job_id,
                            message: message.to_string(),
                        });
                    }

                    info!("Job {} finished with status {} after {} polls", job_id, code, attempts);

                    let keyed = key.and_then(|key| {
                        job.jobresult
                            .as_ref()
                            .and_then(|result| result.get(key))
                            .cloned()
                    });
                    return Ok(keyed.unwrap_or_else(|| response.into_value()));
                }
            }

            if let Some(max) = self.policy.max_attempts {
                if attempts >= max {
                    return Err(Error::JobTimeout { job_id, attempts });
                }
            }
            if let Some(timeout) = self.policy.timeout {
                if started.elapsed() + self.policy.interval > timeout {
                    return Err(Error::JobTimeout { job_id, attempts });
                }
            }

            tokio::time::sleep(self.policy.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakePlatform;
    use cloudnet_common::AsyncJob;
    use serde_json::json;
    use std::time::Duration;

    fn fast() -> PollPolicy {
        PollPolicy::default().with_interval(Duration::from_millis(1))
    }

    fn handle(job_id: &str) -> MutationResponse {
        serde_json::from_value(json!({"jobid": job_id})).unwrap()
    }

    fn job(value: Value) -> AsyncJob {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_synchronous_passthrough() {
        let fake = Arc::new(FakePlatform::new());
        let poller = JobPoller::new(fake.clone(), fast());

        let response: MutationResponse =
            serde_json::from_value(json!({"network": {"id": "n1"}})).unwrap();
        let value = poller.wait(response, Some("network")).await.unwrap();

        assert_eq!(value, json!({"network": {"id": "n1"}}));
        assert_eq!(fake.calls("queryAsyncJobResult"), 0);
    }

    #[tokio::test]
    async fn test_keyed_result_replaces_handle() {
        let fake = Arc::new(FakePlatform::new());
        fake.script_job(
            "j1",
            vec![
                job(json!({"jobstatus": 0})),
                job(json!({"jobstatus": 1, "jobresult": {"network": {"id": "n1", "name": "net"}}})),
            ],
        );
        let poller = JobPoller::new(fake.clone(), fast());

        let value = poller.wait(handle("j1"), Some("network")).await.unwrap();

        assert_eq!(value, json!({"id": "n1", "name": "net"}));
        assert_eq!(fake.calls("queryAsyncJobResult"), 2);
    }

    #[tokio::test]
    async fn test_missing_key_keeps_handle() {
        let fake = Arc::new(FakePlatform::new());
        fake.script_job("j1", vec![job(json!({"jobstatus": 1, "jobresult": {"success": true}}))]);
        let poller = JobPoller::new(fake, fast());

        let value = poller.wait(handle("j1"), Some("network")).await.unwrap();
        assert_eq!(value, json!({"jobid": "j1"}));
    }

    #[tokio::test]
    async fn test_error_text_fails() {
        let fake = Arc::new(FakePlatform::new());
        fake.script_job(
            "j1",
            vec![job(json!({"jobstatus": 1, "jobresult": {"errortext": "quota exceeded"}}))],
        );
        let poller = JobPoller::new(fake, fast());

        let err = poller.wait(handle("j1"), Some("network")).await.unwrap_err();
        assert!(matches!(err, Error::Job { .. }));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_max_attempts() {
        let fake = Arc::new(FakePlatform::new());
        fake.script_job("j1", vec![job(json!({"jobstatus": 0}))]);
        let poller = JobPoller::new(fake.clone(), fast().with_max_attempts(3));

        let err = poller.wait(handle("j1"), None).await.unwrap_err();
        assert!(matches!(err, Error::JobTimeout { attempts: 3, .. }));
        assert_eq!(fake.calls("queryAsyncJobResult"), 3);
    }

    #[tokio::test]
    async fn test_timeout() {
        let fake = Arc::new(FakePlatform::new());
        fake.script_job("j1", vec![job(json!({"jobstatus": 0}))]);
        let policy = PollPolicy::default()
            .with_interval(Duration::from_millis(5))
            .with_timeout(Duration::from_millis(20));
        let poller = JobPoller::new(fake, policy);

        let err = poller.wait(handle("j1"), None).await.unwrap_err();
        assert!(matches!(err, Error::JobTimeout { .. }));
    }
}
