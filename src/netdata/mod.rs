pub mod client;
pub mod probe;

use async_trait::async_trait;

use crate::errors::FetchError;

// Charts exposed by the netdata parent for its child nodes. The daemon's
// own charts stand in for whole-node telemetry; see the reduction step
// for the scaling that implies.
pub const CHART_CPU: &str = "netdata.server_cpu";
pub const CHART_MEMORY: &str = "netdata.memory";
pub const CHART_CLIENTS: &str = "netdata.clients";
pub const CHART_REQUESTS: &str = "netdata.requests";

/// Column of the system-CPU dimension in `netdata.server_cpu` rows
/// (column 0 is the timestamp).
pub const CPU_SYSTEM_COLUMN: usize = 2;

/// Column of the single value dimension in the other charts.
pub const VALUE_COLUMN: usize = 1;

/// Cluster-wide sizing reported by `/api/v1/info`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterInfo {
    pub cores_total: u64,
    pub ram_total_bytes: u64,
}

impl ClusterInfo {
    pub fn ram_gb(&self) -> f64 {
        let gb = self.ram_total_bytes as f64 / (1024.0 * 1024.0 * 1024.0);
        (gb * 10.0).round() / 10.0
    }
}

/// Upstream time-series source. The aggregator only ever needs the
/// cluster sizing and the latest row of a chart, optionally scoped to
/// one child host.
#[async_trait]
pub trait ChartSource: Send + Sync {
    async fn cluster_info(&self) -> Result<ClusterInfo, FetchError>;

    /// Latest data row for a chart: column 0 is the timestamp, the rest
    /// are dimension values. Non-numeric cells come back as `None`.
    async fn latest_row(
        &self,
        chart: &str,
        host: Option<&str>,
    ) -> Result<Vec<Option<f64>>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ram_gb_rounds_to_one_decimal() {
        let info = ClusterInfo {
            cores_total: 8,
            ram_total_bytes: 16_512_345_678,
        };
        assert_eq!(info.ram_gb(), 15.4);
    }
}
