//! Local network neighbour listing

use axum::Json;
use tracing::warn;

use crate::monitors::network::{self, Device};

/// GET /api/network/scan
///
/// Entries of the OS neighbour table; empty when `arp` is unavailable
pub async fn scan() -> Json<Vec<Device>> {
    match network::scan().await {
        Ok(devices) => Json(devices),
        Err(e) => {
            warn!("network scan failed: {e:#}");
            Json(Vec::new())
        }
    }
}
