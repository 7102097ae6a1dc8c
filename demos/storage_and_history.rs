//! Storage capacity, recent failed tasks and one day of node history.
//!
//! The endpoint can also be read from a token file passed as the first
//! argument, holding the same `PROXMOX_*` keys as the environment.

use leeca_proxmox_monitor::{
    ClusterEndpoint, ProxmoxGateway, ProxmoxResult, StatsTarget, StorageFilter, TaskFilter,
    TaskStatus, normalize_bytes,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ProxmoxResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let endpoint = match std::env::args().nth(1) {
        Some(path) => ClusterEndpoint::from_token_file(path)?,
        None => {
            dotenvy::dotenv().ok();
            ClusterEndpoint::from_env()?
        }
    };
    let gateway = ProxmoxGateway::new(endpoint)?;

    let storage = gateway.storage_summary(&StorageFilter::default()).await?;
    println!("Storage pools:");
    for pool in &storage.pools {
        let remote = pool
            .remote
            .as_ref()
            .map(|m| format!(" <- {}:{}", m.server, m.export.as_deref().unwrap_or("")))
            .unwrap_or_default();
        println!(
            "  {:<16} {:<8} {} free of {} ({:.1}% used){}",
            pool.id,
            pool.plugin,
            normalize_bytes(pool.available as f64),
            normalize_bytes(pool.total as f64),
            pool.usage_ratio() * 100.0,
            remote
        );
    }

    let failed = gateway
        .recent_tasks(&TaskFilter::default().status(TaskStatus::Error).limit(5))
        .await?;
    println!("\nLast failed tasks:");
    for task in &failed.tasks {
        println!(
            "  {} {} on {}: {}",
            task.task_type,
            task.guest_id.map(|id| id.to_string()).unwrap_or_default(),
            task.node,
            task.exit_status.as_deref().unwrap_or("-")
        );
    }

    let nodes = gateway.list_nodes().await?;
    if let Some(node) = nodes.first() {
        let series = gateway
            .historical_stats(
                StatsTarget::Node {
                    node: node.name.clone(),
                },
                "day",
            )
            .await?;
        println!(
            "\n{} over the last {}: {} points ({} skipped)",
            node.name,
            series.timeframe,
            series.points.len(),
            series.skipped
        );
        if let Some(peak) = series
            .points
            .iter()
            .max_by(|a, b| a.cpu.total_cmp(&b.cpu))
        {
            println!(
                "  peak cpu {:.1}% at {} with {} memory in use",
                peak.cpu * 100.0,
                peak.timestamp,
                normalize_bytes(peak.memory_used as f64)
            );
        }
    }

    for failure in storage.failures.iter().chain(&failed.failures) {
        eprintln!("unavailable: {}", failure);
    }

    Ok(())
}
