//! Upstream connectivity probe.
//!
//! Answers "can we reach the parent, and which charts exist per host"
//! without running a full aggregation. Every sub-query failure becomes a
//! recorded status string; the probe itself never fails.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use super::client::NetdataClient;
use super::ChartSource;

/// Charts listed per bucket are truncated to keep the report readable.
const MAX_CHARTS_PER_BUCKET: usize = 15;
const MAX_GLOBAL_CHARTS: usize = 20;

#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub netdata_url: String,
    pub connectivity: String,
    pub cores_total: u64,
    pub ram_total_gb: f64,
    pub available_charts: Vec<String>,
    pub host_charts: BTreeMap<String, HostCharts>,
}

#[derive(Debug, Serialize)]
pub struct HostCharts {
    pub status: String,
    pub total_charts: usize,
    pub system_charts: Vec<String>,
    pub cpu_related: Vec<String>,
    pub memory_related: Vec<String>,
    pub network_related: Vec<String>,
    pub disk_related: Vec<String>,
}

fn truncated(mut charts: Vec<String>, limit: usize) -> Vec<String> {
    charts.truncate(limit);
    charts
}

/// Bucket chart names by the substrings the dashboard cares about.
fn bucket_charts(charts: &[String]) -> HostCharts {
    let matching = |pred: &dyn Fn(&str) -> bool| -> Vec<String> {
        truncated(
            charts
                .iter()
                .filter(|c| pred(&c.to_lowercase()))
                .cloned()
                .collect(),
            MAX_CHARTS_PER_BUCKET,
        )
    };

    HostCharts {
        status: "OK".to_string(),
        total_charts: charts.len(),
        system_charts: matching(&|c| c.starts_with("system.")),
        cpu_related: matching(&|c| c.contains("cpu")),
        memory_related: matching(&|c| c.contains("mem") || c.contains("ram")),
        network_related: matching(&|c| c.contains("net")),
        disk_related: matching(&|c| c.contains("disk") || c.contains("io")),
    }
}

pub async fn run_probe(client: &NetdataClient, base_url: &str, hosts: &[String]) -> ProbeReport {
    let mut report = ProbeReport {
        netdata_url: base_url.to_string(),
        connectivity: "unknown".to_string(),
        cores_total: 0,
        ram_total_gb: 0.0,
        available_charts: Vec::new(),
        host_charts: BTreeMap::new(),
    };

    match client.cluster_info().await {
        Ok(cluster_info) => {
            report.connectivity = "success".to_string();
            report.cores_total = cluster_info.cores_total;
            report.ram_total_gb = cluster_info.ram_gb();
        }
        Err(e) => {
            report.connectivity = format!("failed: {e}");
        }
    }

    match client.charts(None).await {
        Ok(charts) => {
            report.available_charts = truncated(charts, MAX_GLOBAL_CHARTS);
        }
        Err(e) => {
            info!("global chart listing failed: {e}");
        }
    }

    for host in hosts {
        let entry = match client.charts(Some(host)).await {
            Ok(charts) => bucket_charts(&charts),
            Err(e) => HostCharts {
                status: format!("failed: {e}"),
                total_charts: 0,
                system_charts: Vec::new(),
                cpu_related: Vec::new(),
                memory_related: Vec::new(),
                network_related: Vec::new(),
                disk_related: Vec::new(),
            },
        };
        report.host_charts.insert(host.clone(), entry);
    }

    report
}
