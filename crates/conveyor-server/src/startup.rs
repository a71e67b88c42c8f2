//! Server startup output.

use std::net::SocketAddr;
use tracing::info;

/// Logs where the server can be reached.
pub fn print_startup_info(addr: SocketAddr) {
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("REST API:  http://{}/api/v1/jobs", addr);
    info!("Metrics:   http://{}/api/v1/metrics", addr);
    info!("Health:    http://{}/health", addr);
    info!("{}", separator);
}
