use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "cluster_metrics_agent", version, about)]
pub struct Config {
    /// Unique identifier for this agent instance.
    /// if none provided, default to hostname.
    #[arg(long, env = "CLUSTER_METRICS_AGENT_ID")]
    pub agent_id: Option<String>,

    /// Base URL of the netdata parent node.
    #[arg(
        long,
        env = "CLUSTER_METRICS_NETDATA_URL",
        default_value = "http://localhost:19999"
    )]
    pub netdata_url: String,

    /// Comma-separated list of node hostnames to query through the parent.
    #[arg(
        long,
        env = "CLUSTER_METRICS_HOSTS",
        value_delimiter = ',',
        default_value = "wtech7062,wtech7061,wtech7063"
    )]
    pub hosts: Vec<String>,

    /// Per-request timeout in milliseconds for upstream calls.
    #[arg(long, env = "CLUSTER_METRICS_REQUEST_TIMEOUT_MS", default_value_t = 3000)]
    pub request_timeout_ms: u64,

    /// Time-to-live for the primary snapshot cache entry, in seconds.
    #[arg(long, env = "CLUSTER_METRICS_CACHE_TTL_SECS", default_value_t = 30)]
    pub cache_ttl_secs: u64,

    /// Time-to-live for the backup snapshot served when the upstream
    /// is unreachable, in seconds.
    #[arg(long, env = "CLUSTER_METRICS_BACKUP_TTL_SECS", default_value_t = 300)]
    pub backup_ttl_secs: u64,

    /// Cores per node assumed when the cluster info endpoint is down.
    #[arg(long, env = "CLUSTER_METRICS_FALLBACK_CORES_PER_NODE", default_value_t = 4)]
    pub fallback_cores_per_node: u64,

    /// RAM per node in GB assumed when the cluster info endpoint is down.
    #[arg(
        long,
        env = "CLUSTER_METRICS_FALLBACK_RAM_GB_PER_NODE",
        default_value_t = 8.0
    )]
    pub fallback_ram_gb_per_node: f64,

    /// Floor for the estimated running-pod count.
    #[arg(long, env = "CLUSTER_METRICS_MIN_ESTIMATED_PODS", default_value_t = 20)]
    pub min_estimated_pods: u64,

    /// Aggregation interval in milliseconds. 0 runs a single aggregation
    /// and exits.
    #[arg(long, env = "CLUSTER_METRICS_INTERVAL_MS", default_value_t = 0)]
    pub interval_ms: u64,

    /// Run the upstream connectivity probe instead of aggregating.
    #[arg(long, env = "CLUSTER_METRICS_PROBE", default_value_t = false)]
    pub probe: bool,

    /// Enable JSON structured logging.
    #[arg(long, env = "CLUSTER_METRICS_JSON_LOGS", default_value_t = false)]
    pub json_logs: bool,
}

impl Config {
    /// get agent ID, upon failure fallback to hostname.
    pub fn resolved_agent_id(&self) -> String {
        self.agent_id.clone().unwrap_or_else(|| {
            hostname::get()
                .map(|h| h.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "unknown-agent".to_string())
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn backup_ttl(&self) -> Duration {
        Duration::from_secs(self.backup_ttl_secs)
    }

    pub fn interval(&self) -> Option<Duration> {
        if self.interval_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.interval_ms))
        }
    }

    /// Host list with surrounding whitespace stripped and empties dropped,
    /// so CLUSTER_METRICS_HOSTS="a, b ,c" parses cleanly.
    pub fn node_hosts(&self) -> Vec<String> {
        self.hosts
            .iter()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("cluster_metrics_agent").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = parse(&[]);
        assert_eq!(cfg.request_timeout_ms, 3000);
        assert_eq!(cfg.cache_ttl_secs, 30);
        assert_eq!(cfg.backup_ttl_secs, 300);
        assert_eq!(cfg.min_estimated_pods, 20);
        assert_eq!(cfg.node_hosts().len(), 3);
        assert!(cfg.interval().is_none());
    }

    #[test]
    fn test_hosts_are_trimmed() {
        let cfg = parse(&["--hosts", "node-a, node-b ,,node-c"]);
        assert_eq!(cfg.node_hosts(), vec!["node-a", "node-b", "node-c"]);
    }

    #[test]
    fn test_interval_enabled() {
        let cfg = parse(&["--interval-ms", "15000"]);
        assert_eq!(cfg.interval(), Some(Duration::from_secs(15)));
    }
}
