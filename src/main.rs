use clap::Parser;
use tracing::info;

use cluster_metrics_agent::aggregator::{Aggregator, AggregatorSettings};
use cluster_metrics_agent::cache::MemoryStore;
use cluster_metrics_agent::config::Config;
use cluster_metrics_agent::netdata::client::NetdataClient;
use cluster_metrics_agent::netdata::probe::run_probe;

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // Logs to stderr; stdout carries only the snapshot/report JSON.
    if config.json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_logging(&config);

    info!(
        agent_id = %config.resolved_agent_id(),
        upstream = %config.netdata_url,
        nodes = config.node_hosts().len(),
        "starting cluster metrics agent"
    );

    let client = NetdataClient::new(&config.netdata_url, config.request_timeout())?;

    if config.probe {
        let report = run_probe(&client, &config.netdata_url, &config.node_hosts()).await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let settings = AggregatorSettings::from_config(&config);
    let aggregator = Aggregator::new(client, MemoryStore::new(), settings);

    match config.interval() {
        None => {
            let snapshot = aggregator.get_metrics().await;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Some(every) => {
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let snapshot = aggregator.get_metrics().await;
                        println!("{}", serde_json::to_string_pretty(&snapshot)?);
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("shutdown requested");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
