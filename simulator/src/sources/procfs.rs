use hudcore::channels::{SystemTelemetry, Temperature};
use hudcore::prelude::{ServiceError, ServiceResult};
use hudcore::services::TelemetrySource;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Aggregate CPU jiffies from the first line of `/proc/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CpuTimes {
    idle: u64,
    total: u64,
}

fn parse_cpu_times(stat: &str) -> Option<CpuTimes> {
    let line = stat.lines().find(|line| line.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|field| field.parse().ok())
        .collect();
    if fields.len() < 4 {
        return None;
    }
    // idle + iowait
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    Some(CpuTimes {
        idle,
        total: fields.iter().sum(),
    })
}

fn cpu_percent(previous: CpuTimes, current: CpuTimes) -> f64 {
    let total = current.total.saturating_sub(previous.total);
    if total == 0 {
        return 0.0;
    }
    let idle = current.idle.saturating_sub(previous.idle);
    (total.saturating_sub(idle)) as f64 / total as f64 * 100.0
}

fn meminfo_kb(meminfo: &str, key: &str) -> Option<f64> {
    meminfo
        .lines()
        .find_map(|line| line.strip_prefix(key))
        .and_then(|rest| rest.trim_start_matches(':').split_whitespace().next())
        .and_then(|value| value.parse().ok())
}

fn ram_percent(meminfo: &str) -> Option<f64> {
    let total = meminfo_kb(meminfo, "MemTotal")?;
    let available = meminfo_kb(meminfo, "MemAvailable")?;
    if total <= 0.0 {
        return None;
    }
    Some((total - available) / total * 100.0)
}

/// Received and sent kilobytes summed over every interface except loopback.
fn network_kb(net_dev: &str) -> (f64, f64) {
    let mut received = 0u64;
    let mut sent = 0u64;
    for line in net_dev.lines().skip(2) {
        let Some((name, counters)) = line.split_once(':') else {
            continue;
        };
        if name.trim() == "lo" {
            continue;
        }
        let fields: Vec<u64> = counters
            .split_whitespace()
            .filter_map(|field| field.parse().ok())
            .collect();
        if fields.len() >= 9 {
            received += fields[0];
            sent += fields[8];
        }
    }
    (received as f64 / 1024.0, sent as f64 / 1024.0)
}

fn parse_millidegrees(text: &str) -> Temperature {
    text.trim()
        .parse::<f64>()
        .map(|milli| Temperature::Celsius(milli / 1000.0))
        .unwrap_or(Temperature::Unavailable)
}

/// Host telemetry from the Linux proc and sys filesystems.
pub struct ProcfsTelemetry {
    proc_root: PathBuf,
    thermal_zone: PathBuf,
    previous_cpu: Option<CpuTimes>,
}

impl ProcfsTelemetry {
    pub fn new() -> Self {
        Self::with_paths("/proc", "/sys/class/thermal/thermal_zone0/temp")
    }

    pub fn with_paths(proc_root: impl Into<PathBuf>, thermal_zone: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            thermal_zone: thermal_zone.into(),
            previous_cpu: None,
        }
    }

    fn read(&self, name: &str) -> ServiceResult<String> {
        let path = self.proc_root.join(name);
        fs::read_to_string(&path).map_err(|err| read_error(&path, err))
    }
}

impl Default for ProcfsTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

fn read_error(path: &Path, err: std::io::Error) -> ServiceError {
    match err.kind() {
        ErrorKind::NotFound => ServiceError::Unavailable(format!("{} missing", path.display())),
        _ => ServiceError::Transient(format!("reading {}: {}", path.display(), err)),
    }
}

impl TelemetrySource for ProcfsTelemetry {
    fn sample(&mut self) -> ServiceResult<SystemTelemetry> {
        let stat = self.read("stat")?;
        let current = parse_cpu_times(&stat)
            .ok_or_else(|| ServiceError::Transient("unreadable cpu line in stat".into()))?;
        // The first sample has no interval to measure over.
        let cpu = self
            .previous_cpu
            .map(|previous| cpu_percent(previous, current))
            .unwrap_or(0.0);
        self.previous_cpu = Some(current);

        let ram = ram_percent(&self.read("meminfo")?).unwrap_or(0.0);
        let (recv_kb, sent_kb) = self
            .read("net/dev")
            .map(|text| network_kb(&text))
            .unwrap_or((0.0, 0.0));
        let temp = fs::read_to_string(&self.thermal_zone)
            .map(|text| parse_millidegrees(&text))
            .unwrap_or(Temperature::Unavailable);

        Ok(SystemTelemetry {
            cpu_percent: cpu,
            ram_percent: ram,
            temp_celsius: temp,
            net_sent_kb: sent_kb,
            net_recv_kb: recv_kb,
        })
    }
}
