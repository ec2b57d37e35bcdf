//! Checks run against targets and against the local host
//!
//! - [`probe`] - HTTP and ping reachability checks for registered targets
//! - [`system`] - host resource sampling (CPU, memory, disk, network)
//! - [`thresholds`] - fixed-limit anomaly detection over a metrics sample
//! - [`network`] - neighbour table listing via `arp -a`

pub mod network;
pub mod probe;
pub mod system;
pub mod thresholds;
