//! Local host resource sampling
//!
//! [`SysinfoSource`] keeps one `sysinfo::System` alive between samples so the
//! reported CPU usage covers the time since the previous sample. Sampling is
//! blocking work and runs on the blocking thread pool.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::anyhow;
use async_trait::async_trait;
use sysinfo::{Disks, Networks, System};
use tracing::{debug, instrument, trace};

use crate::{
    ConnectionInformation, DiskInformation, InterfaceInformation, MemoryInformation,
    NetworkOverview, SystemMetrics,
};

/// Connections reported per sample
const MAX_CONNECTIONS: usize = 15;

/// `st` column value for ESTABLISHED in `/proc/net/tcp`
const TCP_ESTABLISHED: &str = "01";

/// Source of host metrics samples
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn sample(&self) -> anyhow::Result<SystemMetrics>;
}

struct SamplerState {
    system: System,
    last_cpu_refresh: Instant,
}

/// Metrics source reading the local machine through `sysinfo`
#[derive(Clone)]
pub struct SysinfoSource {
    state: Arc<Mutex<SamplerState>>,
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoSource {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();

        Self {
            state: Arc::new(Mutex::new(SamplerState {
                system,
                last_cpu_refresh: Instant::now(),
            })),
        }
    }
}

#[async_trait]
impl MetricsSource for SysinfoSource {
    #[instrument(skip_all)]
    async fn sample(&self) -> anyhow::Result<SystemMetrics> {
        let state = self.state.clone();

        tokio::task::spawn_blocking(move || {
            let mut state = state
                .lock()
                .map_err(|_| anyhow!("metrics sampler lock poisoned"))?;
            Ok(state.collect())
        })
        .await?
    }
}

impl SamplerState {
    fn collect(&mut self) -> SystemMetrics {
        // the first reading after creation is meaningless without a gap
        let since_last = self.last_cpu_refresh.elapsed();
        if since_last < sysinfo::MINIMUM_CPU_UPDATE_INTERVAL {
            std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL - since_last);
        }
        self.system.refresh_cpu_usage();
        self.last_cpu_refresh = Instant::now();

        self.system.refresh_memory();
        let total = self.system.total_memory();
        let used = self.system.used_memory();

        let metrics = SystemMetrics {
            cpu: self.system.global_cpu_usage(),
            memory: MemoryInformation {
                total,
                used,
                percent: percent_of(used, total),
            },
            disk: root_disk(),
            network: network_overview(),
        };

        trace!(
            "sampled cpu {:.1}% memory {:.1}%",
            metrics.cpu, metrics.memory.percent
        );
        metrics
    }
}

fn percent_of(part: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    ((part as f64 / total as f64) * 1000.0).round() as f32 / 10.0
}

/// Usage of the disk mounted at `/`, or the first disk when there is none
fn root_disk() -> DiskInformation {
    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .find(|disk| disk.mount_point() == Path::new("/"))
        .or_else(|| disks.list().first());

    let Some(disk) = disk else {
        debug!("no disks reported");
        return DiskInformation::default();
    };

    let total = disk.total_space();
    let free = disk.available_space();
    DiskInformation {
        percent: percent_of(total.saturating_sub(free), total),
        free,
    }
}

fn network_overview() -> NetworkOverview {
    let networks = Networks::new_with_refreshed_list();
    let mut overview = NetworkOverview::default();

    for (name, data) in networks.list() {
        overview.total.bytes_sent += data.total_transmitted();
        overview.total.bytes_recv += data.total_received();

        let (is_up, speed) = interface_state(name);
        if !is_up {
            continue;
        }

        let ip = data
            .ip_networks()
            .iter()
            .find(|network| network.addr.is_ipv4())
            .map(|network| network.addr.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        overview.interfaces.insert(
            name.clone(),
            InterfaceInformation {
                bytes_sent: data.total_transmitted(),
                bytes_recv: data.total_received(),
                is_up,
                speed,
                ip,
            },
        );
    }

    overview.connections = established_connections();
    overview
}

/// Link state and speed (Mbit/s) from `/sys/class/net`
#[cfg(target_os = "linux")]
fn interface_state(name: &str) -> (bool, Option<u64>) {
    let base = Path::new("/sys/class/net").join(name);

    // virtual links such as loopback report "unknown" while usable
    let is_up = std::fs::read_to_string(base.join("operstate"))
        .map(|state| matches!(state.trim(), "up" | "unknown"))
        .unwrap_or(true);

    let speed = std::fs::read_to_string(base.join("speed"))
        .ok()
        .and_then(|speed| speed.trim().parse::<i64>().ok())
        .filter(|&speed| speed > 0)
        .map(|speed| speed as u64);

    (is_up, speed)
}

#[cfg(not(target_os = "linux"))]
fn interface_state(_name: &str) -> (bool, Option<u64>) {
    (true, None)
}

#[cfg(target_os = "linux")]
fn established_connections() -> Vec<ConnectionInformation> {
    let mut connections = Vec::new();

    for (path, family) in [("/proc/net/tcp", "IPv4"), ("/proc/net/tcp6", "IPv6")] {
        match std::fs::read_to_string(path) {
            Ok(content) => connections.extend(parse_proc_net_tcp(&content, family)),
            Err(e) => debug!("cannot read {path}: {e}"),
        }
        if connections.len() >= MAX_CONNECTIONS {
            break;
        }
    }

    connections.truncate(MAX_CONNECTIONS);
    connections
}

#[cfg(not(target_os = "linux"))]
fn established_connections() -> Vec<ConnectionInformation> {
    Vec::new()
}

/// Parse the ESTABLISHED rows of a `/proc/net/tcp` or `/proc/net/tcp6` table
pub fn parse_proc_net_tcp(content: &str, family: &str) -> Vec<ConnectionInformation> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut columns = line.split_whitespace().skip(1);
            let local = columns.next()?;
            let remote = columns.next()?;
            let state = columns.next()?;

            if state != TCP_ESTABLISHED {
                return None;
            }

            Some(ConnectionInformation {
                family: family.to_string(),
                laddr: decode_socket(local)?,
                raddr: decode_socket(remote)?,
                status: "ESTABLISHED".to_string(),
            })
        })
        .take(MAX_CONNECTIONS)
        .collect()
}

/// Decode `HEXADDR:HEXPORT`; the address words are in host byte order
fn decode_socket(value: &str) -> Option<String> {
    let (addr, port) = value.split_once(':')?;
    let port = u16::from_str_radix(port, 16).ok()?;

    let ip = match addr.len() {
        8 => {
            let word = u32::from_str_radix(addr, 16).ok()?;
            Ipv4Addr::from(word.to_ne_bytes()).to_string()
        }
        32 => {
            let mut bytes = [0u8; 16];
            for (i, chunk) in bytes.chunks_mut(4).enumerate() {
                let word = u32::from_str_radix(addr.get(i * 8..i * 8 + 8)?, 16).ok()?;
                chunk.copy_from_slice(&word.to_ne_bytes());
            }
            Ipv6Addr::from(bytes).to_string()
        }
        _ => return None,
    };

    Some(format!("{ip}:{port}"))
}

/// Fixed sample, for tests and for running without host access
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub metrics: SystemMetrics,
}

#[async_trait]
impl MetricsSource for StaticSource {
    async fn sample(&self) -> anyhow::Result<SystemMetrics> {
        Ok(self.metrics.clone())
    }
}
