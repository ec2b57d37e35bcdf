pub mod actors;
pub mod alerts;
#[cfg(feature = "api")]
pub mod api;
pub mod channels;
pub mod config;
pub mod monitors;
pub mod notifications;
pub mod poller;
pub mod registry;
pub mod storage;
pub mod util;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub cpu: f32,
    pub memory: MemoryInformation,
    pub disk: DiskInformation,
    pub network: NetworkOverview,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryInformation {
    pub total: u64,
    pub used: u64,
    pub percent: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiskInformation {
    pub percent: f32,
    pub free: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkOverview {
    pub total: TrafficCounters,
    pub interfaces: BTreeMap<String, InterfaceInformation>,
    pub connections: Vec<ConnectionInformation>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TrafficCounters {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceInformation {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub is_up: bool,
    /// Link speed in Mbit/s, when the OS reports one
    pub speed: Option<u64>,
    pub ip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInformation {
    pub family: String,
    pub laddr: String,
    pub raddr: String,
    pub status: String,
}
