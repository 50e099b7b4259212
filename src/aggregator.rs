use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, error, warn};

use crate::cache::{SnapshotStore, BACKUP_KEY, PRIMARY_KEY};
use crate::config::Config;
use crate::errors::CollectError;
use crate::netdata::{
    ChartSource, CHART_CLIENTS, CHART_CPU, CHART_MEMORY, CHART_REQUESTS, CPU_SYSTEM_COLUMN,
    VALUE_COLUMN,
};
use crate::snapshot::{
    ClusterTotals, CpuMetrics, MemoryMetrics, MetricsSnapshot, NetworkMetrics, NodeSample,
    PodMetrics, SnapshotStatus,
};

/// Everything the aggregator needs from configuration; kept separate so
/// the aggregator can be constructed without a CLI.
#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    pub hosts: Vec<String>,
    pub cache_ttl: Duration,
    pub backup_ttl: Duration,
    pub fallback_cores_per_node: u64,
    pub fallback_ram_gb_per_node: f64,
    pub min_estimated_pods: u64,
}

impl AggregatorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            hosts: config.node_hosts(),
            cache_ttl: config.cache_ttl(),
            backup_ttl: config.backup_ttl(),
            fallback_cores_per_node: config.fallback_cores_per_node,
            fallback_ram_gb_per_node: config.fallback_ram_gb_per_node,
            min_estimated_pods: config.min_estimated_pods,
        }
    }
}

/// A per-metric failure as recorded during the fan-out: the diagnostic
/// line plus whether it was connection-level.
struct FetchFailure {
    message: String,
    connect: bool,
}

/// Cluster metrics aggregator: cache-aside over a fan-out-and-reduce
/// against the upstream monitoring service.
pub struct Aggregator<S, C> {
    source: S,
    store: C,
    settings: AggregatorSettings,
}

impl<S: ChartSource, C: SnapshotStore> Aggregator<S, C> {
    pub fn new(source: S, store: C, settings: AggregatorSettings) -> Self {
        Self {
            source,
            store,
            settings,
        }
    }

    /// Produce a snapshot. Never fails: every failure path terminates in
    /// a schema-conforming payload.
    pub async fn get_metrics(&self) -> MetricsSnapshot {
        if let Some(mut hit) = self.store.get(PRIMARY_KEY) {
            debug!("serving snapshot from cache");
            hit.cache_hit = true;
            return hit;
        }

        match self.collect().await {
            Ok(snapshot) => {
                self.store
                    .set(PRIMARY_KEY, snapshot.clone(), self.settings.cache_ttl);
                self.store
                    .set(BACKUP_KEY, snapshot.clone(), self.settings.backup_ttl);
                snapshot
            }
            Err(CollectError::Unreachable) => {
                warn!("monitoring service unreachable, falling back to backup cache");
                match self.store.get(BACKUP_KEY) {
                    Some(mut backup) => {
                        backup.status = SnapshotStatus::Cached;
                        backup
                    }
                    None => MetricsSnapshot::unavailable(self.settings.hosts.len()),
                }
            }
            Err(CollectError::Internal(detail)) => {
                // The detail stays in the log; the payload is generic.
                error!("unexpected aggregation failure: {detail}");
                MetricsSnapshot::internal_error(self.settings.hosts.len())
            }
        }
    }

    async fn collect(&self) -> Result<MetricsSnapshot, CollectError> {
        let hosts = &self.settings.hosts;
        let mut snapshot = MetricsSnapshot::new(hosts.len());
        let mut any_success = false;
        let mut failures: Vec<FetchFailure> = Vec::new();

        let totals = match self.source.cluster_info().await {
            Ok(info) => {
                any_success = true;
                ClusterTotals {
                    total_cores: info.cores_total * hosts.len() as u64,
                    total_ram_gb: info.ram_gb() * hosts.len() as f64,
                    cores_per_node: info.cores_total,
                    ram_gb_per_node: info.ram_gb(),
                }
            }
            Err(e) => {
                warn!("failed to fetch cluster info: {e}");
                failures.push(FetchFailure {
                    message: format!("failed to fetch cluster info: {e}"),
                    connect: e.is_connect(),
                });
                ClusterTotals {
                    total_cores: self.settings.fallback_cores_per_node * hosts.len() as u64,
                    total_ram_gb: self.settings.fallback_ram_gb_per_node * hosts.len() as f64,
                    cores_per_node: self.settings.fallback_cores_per_node,
                    ram_gb_per_node: self.settings.fallback_ram_gb_per_node,
                }
            }
        };

        // Fan out per host; each (host, metric) fetch is isolated, so a
        // dead node never aborts the rest.
        let node_results = join_all(hosts.iter().map(|h| self.collect_node(h))).await;

        let mut cpu_values = Vec::new();
        let mut memory_values = Vec::new();
        let mut total_clients = 0.0;
        let mut total_requests = 0.0;
        let mut any_network_sample = false;

        for (sample, node_failures) in node_results {
            debug!(?sample, "node readings");
            if sample.reachable {
                any_success = true;
                snapshot.reachable_nodes += 1;
            }
            if let Some(cpu) = sample.cpu_pct {
                cpu_values.push(cpu);
            }
            if let Some(mb) = sample.memory_mb {
                memory_values.push(mb);
            }
            if let Some(clients) = sample.clients {
                total_clients += clients;
                any_network_sample = true;
            }
            if let Some(rps) = sample.requests_ps {
                total_requests += rps;
                any_network_sample = true;
            }
            failures.extend(node_failures);
        }

        // Unreachable only when not a single fetch of any kind succeeded
        // and every failure was connection-level.
        if !any_success && !failures.is_empty() && failures.iter().all(|f| f.connect) {
            return Err(CollectError::Unreachable);
        }

        for failure in failures {
            snapshot.push_error(failure.message);
        }

        snapshot.cpu = Some(CpuMetrics::from_samples(&cpu_values, totals.total_cores));
        snapshot.memory = Some(MemoryMetrics::from_samples(
            &memory_values,
            totals.total_ram_gb,
        ));
        snapshot.pods = Some(PodMetrics::estimate(
            total_clients,
            self.settings.min_estimated_pods,
        ));
        snapshot.network = Some(NetworkMetrics::from_totals(
            total_clients,
            total_requests,
            any_network_sample,
        ));
        snapshot.cluster_info = Some(totals);

        Ok(snapshot)
    }

    /// Gather the four chart readings for one host. A host counts as
    /// reachable if any of them succeeded.
    async fn collect_node(&self, host: &str) -> (NodeSample, Vec<FetchFailure>) {
        let mut sample = NodeSample::new(host);
        let mut failures = Vec::new();

        sample.cpu_pct = self
            .fetch_or_record("cpu", CHART_CPU, CPU_SYSTEM_COLUMN, host, &mut failures)
            .await;

        sample.memory_mb = self
            .fetch_or_record("memory", CHART_MEMORY, VALUE_COLUMN, host, &mut failures)
            .await
            .map(|bytes| bytes / (1024.0 * 1024.0));

        sample.clients = self
            .fetch_or_record("clients", CHART_CLIENTS, VALUE_COLUMN, host, &mut failures)
            .await;

        sample.requests_ps = self
            .fetch_or_record("requests", CHART_REQUESTS, VALUE_COLUMN, host, &mut failures)
            .await;

        sample.reachable = sample.cpu_pct.is_some()
            || sample.memory_mb.is_some()
            || sample.clients.is_some()
            || sample.requests_ps.is_some();

        (sample, failures)
    }

    /// Uniform fetch-or-record-error helper applied per (host, metric)
    /// pair. A missing or non-numeric cell reads as zero, the way the
    /// upstream reports idle dimensions.
    async fn fetch_or_record(
        &self,
        metric: &str,
        chart: &str,
        column: usize,
        host: &str,
        failures: &mut Vec<FetchFailure>,
    ) -> Option<f64> {
        match self.source.latest_row(chart, Some(host)).await {
            Ok(row) => Some(row.get(column).copied().flatten().unwrap_or(0.0)),
            Err(e) => {
                warn!("failed to fetch {metric} for {host}: {e}");
                failures.push(FetchFailure {
                    message: format!("failed to fetch {metric} for {host}: {e}"),
                    connect: e.is_connect(),
                });
                None
            }
        }
    }
}
