//! Host process probe backed by `sysinfo`.
//!
//! One `HostProcess` is created at startup and shared by the CPU backend and
//! the memory probe. Each read refreshes only the current process, under a
//! short lock around sysinfo's refresh buffer.

use std::sync::Mutex;

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Memory figures for the current process, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessMemory {
    /// Resident set size (shared and private pages).
    pub working_set_bytes: u64,
    /// Memory that cannot be shared with other processes.
    pub private_bytes: u64,
}

/// Source of process memory figures. Failed reads report zeros.
pub trait MemoryProbe: Send + Sync {
    fn read(&self) -> ProcessMemory;
}

pub struct HostProcess {
    pid: Pid,
    system: Mutex<System>,
}

impl HostProcess {
    /// Probe handle for the running process.
    pub fn current() -> Self {
        Self {
            pid: Pid::from_u32(std::process::id()),
            system: Mutex::new(System::new()),
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid.as_u32()
    }

    fn refresh<T>(&self, kind: ProcessRefreshKind, read: impl FnOnce(&sysinfo::Process) -> T) -> Option<T> {
        let mut sys = self.system.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        sys.refresh_processes_specifics(ProcessesToUpdate::Some(&[self.pid]), true, kind);
        sys.process(self.pid).map(read)
    }

    /// Cumulative processor time consumed by the process across all cores.
    pub fn cpu_time_ms(&self) -> Option<u64> {
        self.refresh(ProcessRefreshKind::nothing().with_cpu(), |p| p.accumulated_cpu_time())
    }

    fn resident_and_virtual(&self) -> Option<(u64, u64)> {
        self.refresh(ProcessRefreshKind::nothing().with_memory(), |p| {
            (p.memory(), p.virtual_memory())
        })
    }
}

impl MemoryProbe for HostProcess {
    fn read(&self) -> ProcessMemory {
        let Some((resident, virt)) = self.resident_and_virtual() else {
            tracing::warn!(pid = self.pid(), "process memory query failed; reporting zeros");
            return ProcessMemory::default();
        };
        ProcessMemory {
            working_set_bytes: resident,
            private_bytes: private_bytes().unwrap_or(virt),
        }
    }
}

/// Private data segment size (`VmData`) on Linux.
#[cfg(target_os = "linux")]
fn private_bytes() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_data(&status)
}

#[cfg(not(target_os = "linux"))]
fn private_bytes() -> Option<u64> {
    None
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_vm_data(status: &str) -> Option<u64> {
    let line = status.lines().find(|l| l.starts_with("VmData:"))?;
    let kb: u64 = line
        .trim_start_matches("VmData:")
        .trim()
        .trim_end_matches("kB")
        .trim()
        .parse()
        .ok()?;
    Some(kb * 1024)
}
