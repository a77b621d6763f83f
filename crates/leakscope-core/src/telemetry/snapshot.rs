use serde::Serialize;

/// Point-in-time read of process memory, heap and derived counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    pub pid: u32,
    /// Live bytes allocated on the managed heap.
    pub allocated_bytes: u64,
    /// Resident set, shared and private pages.
    pub working_set_bytes: u64,
    /// Memory not shareable with other processes.
    pub private_bytes: u64,
    pub gen0_collections: u64,
    pub gen1_collections: u64,
    pub gen2_collections: u64,
    pub cpu_percent: f64,
    pub rps: f64,
}
