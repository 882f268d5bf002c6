//! Process and host statistics snapshots.
//!
//! A [`Snapshot`] combines two kinds of data: identity facts captured once
//! when the snapshot is first taken, and usage numbers refreshed on every
//! read. The split is structural. Identity lives in [`ProcessIdentity`] and
//! [`SystemIdentity`], usage in [`ProcessUsage`] and [`SystemUsage`], so a
//! refresh cannot touch the fields that must stay constant.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use sysinfo::{Pid, Process, ProcessesToUpdate, System};

/// Milliseconds since the Unix epoch.
fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

/// Descriptor for a single CPU core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuInfo {
    /// Core name as reported by the OS (e.g. `cpu0`).
    pub name: String,
    /// CPU brand string.
    pub brand: String,
    /// Vendor identifier.
    pub vendor_id: String,
    /// Advertised frequency in MHz.
    pub frequency_mhz: u64,
}

/// Library release that produced a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub name: String,
    pub version: String,
}

impl Default for Release {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Memory in use by the current process, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    /// Resident set size.
    pub rss_bytes: u64,
    /// Virtual memory size.
    pub virtual_bytes: u64,
}

/// Identity facts about the current process, captured once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessIdentity {
    /// Process title as reported by the OS.
    pub title: String,
    /// Process id.
    pub pid: u32,
    /// Library name and version.
    pub release: Release,
    /// Invocation arguments.
    pub argv: Vec<String>,
    /// Path to the running executable, when the OS exposes it.
    pub exec_path: Option<PathBuf>,
}

/// Live process usage, refreshed on every read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessUsage {
    /// Current memory usage.
    pub memory: MemoryUsage,
    /// Seconds since the process started.
    pub uptime_secs: u64,
}

/// Process sub-record of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStats {
    pub identity: ProcessIdentity,
    pub usage: ProcessUsage,
}

/// Identity facts about the host, captured once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemIdentity {
    /// Per-core CPU descriptors.
    pub cpus: Vec<CpuInfo>,
    /// Host name, when the OS exposes it.
    pub hostname: Option<String>,
    /// OS name (e.g. `Ubuntu`).
    pub os_name: Option<String>,
    /// OS version string.
    pub os_version: Option<String>,
    /// Kernel version string.
    pub kernel_version: Option<String>,
    /// Compile-time platform identifier (e.g. `linux`).
    pub platform: String,
    /// Compile-time architecture identifier (e.g. `x86_64`).
    pub arch: String,
}

/// Live host usage, refreshed on every read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemUsage {
    /// Seconds since the host booted.
    pub uptime_secs: u64,
    /// Free physical memory in bytes.
    pub free_memory_bytes: u64,
}

/// System sub-record of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStats {
    pub identity: SystemIdentity,
    pub usage: SystemUsage,
}

/// A point-in-time record of process and host metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Milliseconds since the Unix epoch at the last refresh.
    pub timestamp_ms: u64,
    /// Labels from the sampler configuration.
    pub tags: Vec<String>,
    /// Process metrics.
    pub process: ProcessStats,
    /// Host metrics.
    pub system: SystemStats,
}

impl Snapshot {
    /// Capture a full snapshot, identity and usage alike.
    pub(crate) fn capture(tags: Vec<String>, sys: &mut System) -> Self {
        refresh_sources(sys);

        let pid = std::process::id();
        let process = sys.process(Pid::from_u32(pid));

        Self {
            timestamp_ms: epoch_millis(),
            tags,
            process: ProcessStats {
                identity: ProcessIdentity {
                    title: process
                        .map(|p| p.name().to_string_lossy().into_owned())
                        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string()),
                    pid,
                    release: Release::default(),
                    argv: std::env::args().collect(),
                    exec_path: std::env::current_exe().ok(),
                },
                usage: process_usage(process),
            },
            system: SystemStats {
                identity: SystemIdentity {
                    cpus: sys
                        .cpus()
                        .iter()
                        .map(|cpu| CpuInfo {
                            name: cpu.name().to_string(),
                            brand: cpu.brand().to_string(),
                            vendor_id: cpu.vendor_id().to_string(),
                            frequency_mhz: cpu.frequency(),
                        })
                        .collect(),
                    hostname: System::host_name(),
                    os_name: System::name(),
                    os_version: System::os_version(),
                    kernel_version: System::kernel_version(),
                    platform: std::env::consts::OS.to_string(),
                    arch: std::env::consts::ARCH.to_string(),
                },
                usage: SystemUsage {
                    uptime_secs: System::uptime(),
                    free_memory_bytes: sys.free_memory(),
                },
            },
        }
    }

    /// Refresh the live fields in place. Identity fields are untouched.
    pub(crate) fn refresh(&mut self, sys: &mut System) {
        refresh_sources(sys);

        self.timestamp_ms = epoch_millis();
        self.process.usage = process_usage(sys.process(Pid::from_u32(self.process.identity.pid)));
        self.system.usage = SystemUsage {
            uptime_secs: System::uptime(),
            free_memory_bytes: sys.free_memory(),
        };
    }
}

fn refresh_sources(sys: &mut System) {
    sys.refresh_memory();
    sys.refresh_processes(
        ProcessesToUpdate::Some(&[Pid::from_u32(std::process::id())]),
        true,
    );
}

fn process_usage(process: Option<&Process>) -> ProcessUsage {
    process
        .map(|p| ProcessUsage {
            memory: MemoryUsage {
                rss_bytes: p.memory(),
                virtual_bytes: p.virtual_memory(),
            },
            uptime_secs: p.run_time(),
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_capture_populates_identity() {
        let mut sys = System::new_all();
        let snapshot = Snapshot::capture(vec!["svc".to_string()], &mut sys);

        assert_eq!(snapshot.tags, vec!["svc"]);
        assert_eq!(snapshot.process.identity.pid, std::process::id());
        assert!(!snapshot.process.identity.argv.is_empty());
        assert_eq!(snapshot.process.identity.release.name, "relay-stats");
        assert_eq!(snapshot.system.identity.platform, std::env::consts::OS);
        assert_eq!(snapshot.system.identity.arch, std::env::consts::ARCH);
        assert!(snapshot.timestamp_ms > 0);
    }

    #[test]
    fn test_refresh_touches_only_usage() {
        let mut sys = System::new_all();
        let mut snapshot = Snapshot::capture(Vec::new(), &mut sys);

        let process_identity = snapshot.process.identity.clone();
        let system_identity = snapshot.system.identity.clone();
        let timestamp = snapshot.timestamp_ms;
        let process_uptime = snapshot.process.usage.uptime_secs;
        let system_uptime = snapshot.system.usage.uptime_secs;

        std::thread::sleep(Duration::from_millis(5));
        snapshot.refresh(&mut sys);

        assert_eq!(snapshot.process.identity, process_identity);
        assert_eq!(snapshot.system.identity, system_identity);
        assert!(snapshot.timestamp_ms > timestamp);
        assert!(snapshot.process.usage.uptime_secs >= process_uptime);
        assert!(snapshot.system.usage.uptime_secs >= system_uptime);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut sys = System::new_all();
        let snapshot = Snapshot::capture(vec!["svc".to_string()], &mut sys);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["tags"][0], "svc");
        assert_eq!(
            json["process"]["identity"]["pid"],
            u64::from(std::process::id())
        );
    }
}
