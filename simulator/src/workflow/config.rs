use anyhow::Context;
use hudcore::processing::direction::{DirectionParams, DEFAULT_INTERVAL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Where sensor readings come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Synthetic,
    Hardware,
}

/// Estimator tuning plus its cycle period.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionConfig {
    #[serde(flatten)]
    pub params: DirectionParams,
    pub interval_secs: f64,
}

impl Default for DirectionConfig {
    fn default() -> Self {
        Self {
            params: DirectionParams::default(),
            interval_secs: DEFAULT_INTERVAL.as_secs_f64(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudConfig {
    pub enable_system_metrics: bool,
    pub enable_gps: bool,
    pub enable_imu: bool,
    pub enable_wifi_scanner: bool,
    pub enable_wifi_locator: bool,
    pub wifi_scan_interface: String,
    pub wifi_left_interface: String,
    pub wifi_right_interface: String,
    pub adapter_separation_m: f64,
    pub source: SourceKind,
    pub gpsd_address: String,
    pub frame_rate_hz: f64,
    pub bridge_port: u16,
    pub seed: u64,
    pub direction: DirectionConfig,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            enable_system_metrics: true,
            enable_gps: false,
            enable_imu: false,
            enable_wifi_scanner: true,
            enable_wifi_locator: false,
            wifi_scan_interface: "wlan1".into(),
            wifi_left_interface: "wlan1".into(),
            wifi_right_interface: "wlan2".into(),
            adapter_separation_m: 0.15,
            source: SourceKind::Synthetic,
            gpsd_address: "127.0.0.1:2947".into(),
            frame_rate_hz: 10.0,
            bridge_port: 9000,
            seed: 0,
            direction: DirectionConfig::default(),
        }
    }
}

/// One service the binary should launch, in launch order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlannedService {
    SystemMetrics,
    GpsTracker,
    ImuTracker,
    WifiScanner(String),
    WifiLocator { left: String, right: String },
}

impl HudConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading HUD config {}", path_ref.display()))?;
        let config: HudConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing HUD config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Command-line overrides applied on top of the file or the defaults.
    pub fn apply_overrides(&mut self, synthetic: bool, seed: Option<u64>) {
        if synthetic {
            self.source = SourceKind::Synthetic;
        }
        if let Some(seed) = seed {
            self.seed = seed;
        }
    }

    /// Interfaces that need a scanner, without duplicates, in first-use order.
    pub fn scan_interfaces(&self) -> Vec<String> {
        let mut interfaces: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            if !name.is_empty() && !interfaces.iter().any(|known| known == name) {
                interfaces.push(name.to_string());
            }
        };
        if self.enable_wifi_scanner {
            push(&self.wifi_scan_interface);
        }
        if self.enable_wifi_locator {
            push(&self.wifi_left_interface);
            push(&self.wifi_right_interface);
        }
        interfaces
    }

    pub fn service_plan(&self) -> Vec<PlannedService> {
        let mut plan = Vec::new();
        if self.enable_system_metrics {
            plan.push(PlannedService::SystemMetrics);
        }
        if self.enable_gps {
            plan.push(PlannedService::GpsTracker);
        }
        if self.enable_imu {
            plan.push(PlannedService::ImuTracker);
        }
        plan.extend(
            self.scan_interfaces()
                .into_iter()
                .map(PlannedService::WifiScanner),
        );
        if self.enable_wifi_locator {
            plan.push(PlannedService::WifiLocator {
                left: self.wifi_left_interface.clone(),
                right: self.wifi_right_interface.clone(),
            });
        }
        plan
    }

    /// Problems worth a warning. None of them stop the HUD from running.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.enable_wifi_scanner && self.wifi_scan_interface.is_empty() {
            warnings.push("wifi scanner enabled without an interface".to_string());
        }
        for interface in self.scan_interfaces() {
            if is_onboard_interface(&interface) {
                warnings.push(format!(
                    "{} looks like the onboard adapter; scanning on it may drop the network link",
                    interface
                ));
            }
        }

        if self.enable_wifi_locator {
            if self.wifi_left_interface.is_empty() || self.wifi_right_interface.is_empty() {
                warnings.push("wifi locator needs both a left and a right interface".to_string());
            } else if self.wifi_left_interface == self.wifi_right_interface {
                warnings.push(format!(
                    "wifi locator left and right interfaces are both {}; bearings will stay at heading",
                    self.wifi_left_interface
                ));
            }
            if !self.enable_gps && !self.enable_imu {
                warnings.push(
                    "wifi locator enabled without GPS or IMU; no heading means no estimates"
                        .to_string(),
                );
            }
            if !(0.05..=0.5).contains(&self.adapter_separation_m) {
                warnings.push(format!(
                    "adapter separation {:.2} m is outside the usual 0.05-0.5 m range",
                    self.adapter_separation_m
                ));
            }
        }

        if self.frame_rate_hz <= 0.0 {
            warnings.push(format!(
                "frame rate {} Hz is not positive; falling back to 10 Hz",
                self.frame_rate_hz
            ));
        }
        if self.direction.interval_secs <= 0.0 {
            warnings.push("direction interval must be positive; using 5 s".to_string());
        }

        warnings
    }

    pub fn frame_period_secs(&self) -> f64 {
        if self.frame_rate_hz > 0.0 {
            1.0 / self.frame_rate_hz
        } else {
            0.1
        }
    }

    pub fn direction_interval_secs(&self) -> f64 {
        if self.direction.interval_secs > 0.0 {
            self.direction.interval_secs
        } else {
            DEFAULT_INTERVAL.as_secs_f64()
        }
    }
}

fn is_onboard_interface(name: &str) -> bool {
    name == "wlan0" || name.starts_with("wlp")
}
