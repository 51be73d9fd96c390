use crate::events::{TelemetrySample, Timestamp};
use log::info;
use std::sync::Mutex;
use sysinfo::{Networks, System};

/// Source of raw telemetry samples for one endpoint
///
/// The pipeline treats the source as a pure function with no side effects
/// on the core; implementations may keep internal state (e.g. previous CPU
/// counters) to compute usage deltas.
pub trait TelemetrySource: Send + Sync {
    /// Take one sample for the given endpoint at the given time
    fn sample(&self, endpoint_id: &str, now: Timestamp) -> TelemetrySample;
}

/// Telemetry source backed by the local machine's system counters
///
/// Reads CPU, memory, disk, network and process counters via `sysinfo`.
/// GPU usage is reported as 0; no portable GPU counter source is wired in.
pub struct SysinfoSource {
    system: Mutex<System>,
    networks: Mutex<Networks>,
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoSource {
    /// Create a source over the local machine
    pub fn new() -> Self {
        let mut system = System::new_all();
        // First CPU reading is meaningless without a prior refresh
        system.refresh_all();
        info!("Local telemetry source initialized");
        Self {
            system: Mutex::new(system),
            networks: Mutex::new(Networks::new_with_refreshed_list()),
        }
    }
}

impl TelemetrySource for SysinfoSource {
    fn sample(&self, endpoint_id: &str, now: Timestamp) -> TelemetrySample {
        let mut system = self.system.lock().unwrap();
        system.refresh_all();

        let cpu_pct = f64::from(system.global_cpu_info().cpu_usage());
        let mem_pct = if system.total_memory() > 0 {
            system.used_memory() as f64 / system.total_memory() as f64 * 100.0
        } else {
            0.0
        };

        let (disk_read_bytes, disk_write_bytes) = system
            .processes()
            .values()
            .map(|p| p.disk_usage())
            .fold((0.0, 0.0), |(r, w), usage| {
                (r + usage.total_read_bytes as f64, w + usage.total_written_bytes as f64)
            });

        let process_count = system.processes().len() as u64;

        let mut networks = self.networks.lock().unwrap();
        networks.refresh_list();
        let (net_recv_bytes, net_sent_bytes) =
            networks.iter().fold((0.0, 0.0), |(rx, tx), (_, data)| {
                (rx + data.total_received() as f64, tx + data.total_transmitted() as f64)
            });

        TelemetrySample {
            endpoint_id: endpoint_id.to_string(),
            timestamp: now,
            cpu_pct,
            mem_pct,
            disk_read_bytes,
            disk_write_bytes,
            net_sent_bytes,
            net_recv_bytes,
            gpu_pct: 0.0,
            process_count,
        }
    }
}
