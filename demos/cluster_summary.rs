//! Print a health overview of a Proxmox cluster.
//!
//! Reads the connection settings from `PROXMOX_*` environment variables (or
//! a `.env` file), fetches the cluster summary and prints every node with
//! its guests. Members that could not be queried are listed at the end.
//!
//! Run with `RUST_LOG=leeca_proxmox_monitor=debug` to see the fan-out.

use leeca_proxmox_monitor::{
    ClusterEndpoint, ProxmoxGateway, ProxmoxResult, normalize_bytes, normalize_uptime,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ProxmoxResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    dotenvy::dotenv().ok();

    let gateway = ProxmoxGateway::new(ClusterEndpoint::from_env()?)?;
    let version = gateway.version().await?;
    println!("Proxmox VE {} ({})", version.version, version.release);

    let summary = gateway.cluster_summary().await?;
    println!(
        "Cluster {} - quorate: {}",
        summary.cluster_name.as_deref().unwrap_or("(standalone)"),
        match summary.quorate {
            Some(true) => "yes",
            Some(false) => "NO",
            None => "unknown",
        }
    );
    println!(
        "CPU {:.1}% of {} cores, memory {} / {}, disk {} / {}\n",
        summary.cpu.ratio * 100.0,
        summary.cpu.cores,
        normalize_bytes(summary.memory.used as f64),
        normalize_bytes(summary.memory.total as f64),
        normalize_bytes(summary.disk.used as f64),
        normalize_bytes(summary.disk.total as f64),
    );

    for slot in &summary.nodes {
        let node = &slot.node;
        println!(
            "{} [{}] cpu {:.1}% mem {:.1}% up {}",
            node.name,
            node.status,
            node.cpu * 100.0,
            node.memory_ratio() * 100.0,
            node.uptime_display()
        );
        for guest in &slot.guests {
            println!(
                "  {:<10} {:<24} {:<8} {}",
                guest.id,
                guest.name,
                guest.status,
                normalize_uptime(guest.uptime, guest.status)
            );
        }
    }

    let counts = &summary.guest_counts;
    println!(
        "\n{} guests: {} running, {} stopped, {} paused",
        counts.total(),
        counts.running,
        counts.stopped,
        counts.paused
    );

    // Partial results are still results; report what was missing.
    for failure in &summary.failures {
        eprintln!("unavailable: {}", failure);
    }

    Ok(())
}
