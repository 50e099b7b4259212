use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{ChartSource, ClusterInfo};
use crate::errors::FetchError;

/// HTTP client for the netdata v1 REST API.
pub struct NetdataClient {
    client: reqwest::Client,
    base_url: String,
    timeout_ms: u64,
}

/// Missing or non-numeric info fields default to zero, matching how the
/// upstream reports them on freshly started parents.
fn coerce_u64(value: Option<&Value>) -> u64 {
    match value {
        Some(v) => v
            .as_u64()
            .or_else(|| v.as_f64().map(|f| f as u64))
            .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
            .unwrap_or(0),
        None => 0,
    }
}

impl NetdataClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::MalformedBody {
                url: base_url.to_string(),
                detail: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    fn map_send_error(&self, url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: self.timeout_ms,
            }
        } else {
            FetchError::Connect {
                url: url.to_string(),
                source: err,
            }
        }
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "querying netdata");

        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                url,
                status: status.as_u16(),
            });
        }

        resp.json::<Value>().await.map_err(|e| FetchError::MalformedBody {
            url,
            detail: e.to_string(),
        })
    }

    /// Chart names known to the parent, optionally scoped to one child
    /// host. Used by the connectivity probe.
    pub async fn charts(&self, host: Option<&str>) -> Result<Vec<String>, FetchError> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(h) = host {
            query.push(("host", h));
        }

        let body = self.get_json("/api/v1/charts", &query).await?;
        let mut names: Vec<String> = body
            .get("charts")
            .and_then(Value::as_object)
            .map(|charts| charts.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl ChartSource for NetdataClient {
    async fn cluster_info(&self) -> Result<ClusterInfo, FetchError> {
        let body = self.get_json("/api/v1/info", &[]).await?;
        Ok(ClusterInfo {
            cores_total: coerce_u64(body.get("cores_total")),
            ram_total_bytes: coerce_u64(body.get("ram_total")),
        })
    }

    async fn latest_row(
        &self,
        chart: &str,
        host: Option<&str>,
    ) -> Result<Vec<Option<f64>>, FetchError> {
        let mut query: Vec<(&str, &str)> = vec![("chart", chart), ("points", "1")];
        if let Some(h) = host {
            query.push(("host", h));
        }

        let body = self.get_json("/api/v1/data", &query).await?;
        let row = body
            .get("data")
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .and_then(Value::as_array)
            .ok_or_else(|| FetchError::EmptyData {
                chart: chart.to_string(),
                host: host.unwrap_or("parent").to_string(),
            })?;

        Ok(row.iter().map(Value::as_f64).collect())
    }
}
