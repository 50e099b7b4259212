use thiserror::Error;

//typed errors so per-metric failures stay isolated and testable

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        source: reqwest::Error,
    },

    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("{url} returned status {status}")]
    BadStatus { url: String, status: u16 },

    #[error("failed to decode response from {url}: {detail}")]
    MalformedBody { url: String, detail: String },

    #[error("chart {chart} returned no data rows for host {host}")]
    EmptyData { chart: String, host: String },
}

impl FetchError {
    /// True for connection-level failures, the class that marks the
    /// upstream as unreachable when nothing at all succeeds.
    pub fn is_connect(&self) -> bool {
        matches!(self, FetchError::Connect { .. })
    }
}

/// Outcome of a full aggregation run that could not produce a snapshot.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("monitoring service unreachable")]
    Unreachable,

    #[error("internal aggregation failure: {0}")]
    Internal(String),
}
