//! Neighbour table listing
//!
//! Runs the system `arp -a` command and parses both the Windows layout
//!
//! ```text
//! Interface: 192.168.1.10 --- 0x12
//!   Internet Address      Physical Address      Type
//!   192.168.1.1           00-11-22-33-44-55     dynamic
//! ```
//!
//! and the Linux/BSD layout
//!
//! ```text
//! gateway (192.168.1.1) at 00:11:22:33:44:55 [ether] on eth0
//! ```

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, instrument};

const SCAN_TIMEOUT: Duration = Duration::from_secs(10);

static WINDOWS_INTERFACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Interface:\s+(\S+)").expect("static regex")
});

static WINDOWS_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3}(?:\.\d{1,3}){3})\s+([0-9A-Fa-f]{1,2}(?:-[0-9A-Fa-f]{1,2}){5})\s*(\S+)?")
        .expect("static regex")
});

static UNIX_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\S+\s+\((\d{1,3}(?:\.\d{1,3}){3})\)\s+at\s+([0-9A-Fa-f]{1,2}(?::[0-9A-Fa-f]{1,2}){5})(?:\s+\[(\w+)\])?(?:\s+on\s+(\S+))?",
    )
    .expect("static regex")
});

/// One entry of the neighbour table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub ip: String,
    pub mac: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub interface: String,
}

/// List the neighbour table of the local machine
#[instrument]
pub async fn scan() -> anyhow::Result<Vec<Device>> {
    let output = tokio::time::timeout(
        SCAN_TIMEOUT,
        Command::new("arp").arg("-a").kill_on_drop(true).output(),
    )
    .await
    .context("arp -a timed out")?
    .context("failed to run arp -a")?;

    if !output.status.success() {
        bail!("arp -a exited with {}", output.status);
    }

    let devices = parse_arp_output(&String::from_utf8_lossy(&output.stdout));
    debug!("found {} devices", devices.len());
    Ok(devices)
}

/// Parse `arp -a` output, dropping multicast and broadcast entries
pub fn parse_arp_output(output: &str) -> Vec<Device> {
    let mut devices = Vec::new();
    let mut current_interface = String::new();

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(captures) = WINDOWS_INTERFACE.captures(line) {
            current_interface = captures[1].to_string();
            continue;
        }

        let device = if let Some(captures) = WINDOWS_ENTRY.captures(line) {
            Device {
                ip: captures[1].to_string(),
                mac: captures[2].to_string(),
                kind: captures
                    .get(3)
                    .map_or("unknown", |m| m.as_str())
                    .to_string(),
                interface: current_interface.clone(),
            }
        } else if let Some(captures) = UNIX_ENTRY.captures(line) {
            Device {
                ip: captures[1].to_string(),
                mac: captures[2].to_string(),
                kind: captures
                    .get(3)
                    .map_or("unknown", |m| m.as_str())
                    .to_string(),
                interface: captures
                    .get(4)
                    .map_or(String::new(), |m| m.as_str().to_string()),
            }
        } else {
            continue;
        };

        if is_unicast(&device.ip) {
            devices.push(device);
        }
    }

    devices
}

fn is_unicast(ip: &str) -> bool {
    !(ip.starts_with("224.") || ip.starts_with("239.") || ip == "255.255.255.255")
}
