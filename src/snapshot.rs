use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Diagnostic entries are capped so a large cluster with a dead upstream
/// cannot grow the payload without bound.
pub const MAX_ERRORS: usize = 16;

/// Memory readings come from the monitoring daemon itself; the observed
/// scale factor maps them to an estimate of whole-cluster usage.
pub const MEMORY_SCALE_FACTOR: f64 = 10.0;

/// Smallest used-memory figure reported when any usage was observed.
pub const MIN_USED_GB: f64 = 0.1;

/// Pods are estimated from active connection counts when no direct
/// pod-state source is available.
pub const PODS_PER_CLIENT: f64 = 0.5;

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    Ok,
    Cached,
    Unavailable,
    Error,
}

/// Cluster-wide resource totals derived from the upstream info endpoint
/// (or the configured fallback constants when it is down).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterTotals {
    pub total_cores: u64,
    pub total_ram_gb: f64,
    pub cores_per_node: u64,
    pub ram_gb_per_node: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuMetrics {
    pub percentage: f64,
    pub total_cores: u64,
    pub description: String,
}

impl CpuMetrics {
    /// Mean of per-node CPU percentages, computed only over nodes that
    /// returned a sample. Zero surviving samples yields a zeroed
    /// placeholder whose description says so.
    pub fn from_samples(samples: &[f64], total_cores: u64) -> Self {
        if samples.is_empty() {
            return Self {
                percentage: 0.0,
                total_cores,
                description: "Cluster CPU Usage (unavailable)".to_string(),
            };
        }
        let avg = samples.iter().sum::<f64>() / samples.len() as f64;
        Self {
            percentage: round1(avg),
            total_cores,
            description: "Cluster CPU Usage".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetrics {
    pub total_gb: f64,
    pub used_gb: f64,
    pub percentage: f64,
    pub description: String,
}

impl MemoryMetrics {
    /// Scale summed per-node daemon memory (MB) into an estimated
    /// cluster-wide used figure against the cluster total.
    pub fn from_samples(samples_mb: &[f64], total_gb: f64) -> Self {
        if samples_mb.is_empty() {
            return Self {
                total_gb,
                used_gb: 0.0,
                percentage: 0.0,
                description: "Cluster Memory (unavailable)".to_string(),
            };
        }
        let summed_mb: f64 = samples_mb.iter().sum();
        let estimated_mb = summed_mb * MEMORY_SCALE_FACTOR;
        let mut used_gb = round1(estimated_mb / 1024.0);
        let total_mb = total_gb * 1024.0;
        let percentage = if total_mb > 0.0 {
            round1(estimated_mb / total_mb * 100.0)
        } else {
            0.0
        };
        // A near-zero reading is never reported as exactly zero when
        // usage was observed.
        if used_gb < MIN_USED_GB {
            used_gb = MIN_USED_GB;
        }
        Self {
            total_gb,
            used_gb,
            percentage,
            description: "Cluster Memory (estimated)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodMetrics {
    pub count: u64,
    pub description: String,
}

impl PodMetrics {
    /// Heuristic pod count derived from active connections. The
    /// description carries the "estimated" label because this is not a
    /// direct measurement.
    pub fn estimate(total_clients: f64, min_pods: u64) -> Self {
        let derived = (total_clients * PODS_PER_CLIENT) as u64;
        Self {
            count: derived.max(min_pods),
            description: "Running Pods (estimated)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub active_connections: u64,
    pub api_requests_ps: f64,
    pub description: String,
}

impl NetworkMetrics {
    pub fn from_totals(total_clients: f64, total_requests_ps: f64, any_sample: bool) -> Self {
        let description = if any_sample {
            "Network Activity".to_string()
        } else {
            "Network Activity (unavailable)".to_string()
        };
        Self {
            active_connections: total_clients as u64,
            api_requests_ps: round1(total_requests_ps),
            description,
        }
    }
}

/// One aggregated result as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub cpu: Option<CpuMetrics>,
    pub memory: Option<MemoryMetrics>,
    pub pods: Option<PodMetrics>,
    pub network: Option<NetworkMetrics>,
    pub status: SnapshotStatus,
    pub cache_hit: bool,
    pub errors: Vec<String>,
    pub nodes_count: usize,
    pub reachable_nodes: usize,
    pub cluster_info: Option<ClusterTotals>,
    pub collected_at: DateTime<Utc>,
}

impl MetricsSnapshot {
    /// Skeleton for a fresh aggregation run.
    pub fn new(nodes_count: usize) -> Self {
        Self {
            cpu: None,
            memory: None,
            pods: None,
            network: None,
            status: SnapshotStatus::Ok,
            cache_hit: false,
            errors: Vec::new(),
            nodes_count,
            reachable_nodes: 0,
            cluster_info: None,
            collected_at: Utc::now(),
        }
    }

    /// Payload for a fully unreachable upstream with no backup to serve.
    pub fn unavailable(nodes_count: usize) -> Self {
        Self {
            status: SnapshotStatus::Unavailable,
            errors: vec!["unable to connect to monitoring service".to_string()],
            ..Self::new(nodes_count)
        }
    }

    /// Payload for an unexpected failure. The message is deliberately
    /// generic; internal error detail never reaches the caller.
    pub fn internal_error(nodes_count: usize) -> Self {
        Self {
            status: SnapshotStatus::Error,
            errors: vec!["internal error".to_string()],
            ..Self::new(nodes_count)
        }
    }

    /// Append a diagnostic entry unless the cap is already reached.
    pub fn push_error(&mut self, entry: String) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(entry);
        }
    }
}

/// Per-host readings consumed during reduction; never serialized into
/// the snapshot.
#[derive(Debug, Clone, Default)]
pub struct NodeSample {
    pub hostname: String,
    pub reachable: bool,
    pub cpu_pct: Option<f64>,
    pub memory_mb: Option<f64>,
    pub clients: Option<f64>,
    pub requests_ps: Option<f64>,
}

impl NodeSample {
    pub fn new(hostname: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_mean_over_surviving_samples() {
        let cpu = CpuMetrics::from_samples(&[20.0, 40.0], 24);
        assert_eq!(cpu.percentage, 30.0);
        assert_eq!(cpu.total_cores, 24);
        assert_eq!(cpu.description, "Cluster CPU Usage");
    }

    #[test]
    fn test_cpu_placeholder_when_no_samples() {
        let cpu = CpuMetrics::from_samples(&[], 24);
        assert_eq!(cpu.percentage, 0.0);
        assert!(cpu.description.contains("unavailable"));
    }

    #[test]
    fn test_memory_scaling_and_percentage() {
        // 512 MB observed -> 5120 MB estimated -> 5.0 GB of 48 GB
        let mem = MemoryMetrics::from_samples(&[256.0, 256.0], 48.0);
        assert_eq!(mem.used_gb, 5.0);
        assert_eq!(mem.total_gb, 48.0);
        assert!((mem.percentage - 10.4).abs() < 0.05);
        assert!(mem.description.contains("estimated"));
    }

    #[test]
    fn test_memory_floor_applies_to_tiny_readings() {
        let mem = MemoryMetrics::from_samples(&[0.5], 48.0);
        assert_eq!(mem.used_gb, MIN_USED_GB);
    }

    #[test]
    fn test_memory_zero_total_does_not_divide() {
        let mem = MemoryMetrics::from_samples(&[100.0], 0.0);
        assert_eq!(mem.percentage, 0.0);
    }

    #[test]
    fn test_pods_floor_and_derivation() {
        assert_eq!(PodMetrics::estimate(10.0, 20).count, 20);
        assert_eq!(PodMetrics::estimate(100.0, 20).count, 50);
        assert!(PodMetrics::estimate(0.0, 20)
            .description
            .contains("estimated"));
    }

    #[test]
    fn test_network_totals() {
        let net = NetworkMetrics::from_totals(12.0, 3.14, true);
        assert_eq!(net.active_connections, 12);
        assert_eq!(net.api_requests_ps, 3.1);
        assert_eq!(net.description, "Network Activity");

        let empty = NetworkMetrics::from_totals(0.0, 0.0, false);
        assert!(empty.description.contains("unavailable"));
    }

    #[test]
    fn test_error_cap() {
        let mut snap = MetricsSnapshot::new(3);
        for i in 0..(MAX_ERRORS + 5) {
            snap.push_error(format!("error {i}"));
        }
        assert_eq!(snap.errors.len(), MAX_ERRORS);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&SnapshotStatus::Unavailable).unwrap();
        assert_eq!(json, "\"unavailable\"");
    }

    #[test]
    fn test_degraded_payloads_have_null_metrics() {
        let snap = MetricsSnapshot::unavailable(3);
        assert!(snap.cpu.is_none());
        assert!(snap.memory.is_none());
        assert!(snap.pods.is_none());
        assert!(snap.network.is_none());
        assert_eq!(snap.status, SnapshotStatus::Unavailable);

        let err = MetricsSnapshot::internal_error(3);
        assert_eq!(err.status, SnapshotStatus::Error);
        assert_eq!(err.errors, vec!["internal error".to_string()]);
    }
}
