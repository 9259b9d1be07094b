use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::RESULTS_PATH;
use crate::error::DeliveryError;
use crate::result::CheckResult;

/// Timeout of one PUT to a remote collector.
pub const REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends results to every configured collector, one after the other.
#[derive(Debug, Clone)]
pub struct RemoteFanout {
    client: Client,
    endpoints: Vec<String>,
}

impl RemoteFanout {
    pub fn new(client: Client, remotes: &[String]) -> Self {
        let endpoints = remotes.iter().map(|remote| endpoint(remote)).collect();
        Self { client, endpoints }
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// PUT `result` to every endpoint and return the failures.
    ///
    /// A failing remote never stops delivery to the others.
    pub async fn deliver(&self, result: &CheckResult) -> Vec<DeliveryError> {
        if self.endpoints.is_empty() {
            return Vec::new();
        }
        let body = match serde_json::to_value(result) {
            Ok(body) => body,
            Err(e) => return vec![DeliveryError::Encode(e)],
        };

        let mut failures = Vec::new();
        for url in &self.endpoints {
            match self.put(url, &body).await {
                Ok(()) => debug!("Delivered result for {}/{} to {}", result.product, result.host, url),
                Err(e) => failures.push(e),
            }
        }
        failures
    }

    async fn put(&self, url: &str, body: &Value) -> Result<(), DeliveryError> {
        let response = self
            .client
            .put(url)
            .timeout(REMOTE_TIMEOUT)
            .json(body)
            .send()
            .await
            .map_err(|source| DeliveryError::Request { url: url.to_string(), source })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(DeliveryError::Status { url: url.to_string(), status: status.as_u16() });
        }
        Ok(())
    }
}

fn endpoint(remote: &str) -> String {
    format!("{}{}", remote.trim_end_matches('/'), RESULTS_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CheckResult {
        CheckResult {
            from: "agent-1".into(),
            host: "web-1".into(),
            product: "shop".into(),
            group: "frontend".into(),
            date: chrono::Utc::now(),
            error: String::new(),
            results: Vec::new(),
        }
    }

    #[test]
    fn test_endpoint_joins_results_path() {
        assert_eq!(endpoint("http://collector:8911"), "http://collector:8911/api/v0/results");
        assert_eq!(endpoint("http://collector:8911/"), "http://collector:8911/api/v0/results");
    }

    #[tokio::test]
    async fn test_no_remotes_delivers_nothing() {
        let fanout = RemoteFanout::new(Client::new(), &[]);
        assert!(fanout.endpoints().is_empty());
        assert!(fanout.deliver(&sample()).await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_remote_is_reported() {
        let fanout = RemoteFanout::new(Client::new(), &["http://127.0.0.1:9".to_string()]);
        let failures = fanout.deliver(&sample()).await;
        assert_eq!(failures.len(), 1);
        assert!(matches!(&failures[0], DeliveryError::Request { url, .. } if url.ends_with(RESULTS_PATH)));
    }
}
