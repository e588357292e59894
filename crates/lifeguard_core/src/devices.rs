//! crates/lifeguard_core/src/devices.rs
//!
//! The "Connect Devices" modal: a fixed list of nearby wearables, a simulated
//! scan that runs on a timer, and per-device connect toggles.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const SCAN_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceKind {
    Smartwatch,
    FitnessTracker,
    Phone,
    HealthMonitor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStrength {
    Strong,
    Fair,
    Weak,
}

impl SignalStrength {
    pub fn from_percent(signal: u8) -> Self {
        match signal {
            80.. => SignalStrength::Strong,
            60..=79 => SignalStrength::Fair,
            _ => SignalStrength::Weak,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryLevel {
    High,
    Medium,
    Low,
}

impl BatteryLevel {
    pub fn from_percent(battery: u8) -> Self {
        match battery {
            51.. => BatteryLevel::High,
            21..=50 => BatteryLevel::Medium,
            _ => BatteryLevel::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub kind: DeviceKind,
    pub brand: String,
    pub signal: u8,
    pub connected: bool,
    pub battery: Option<u8>,
}

impl Device {
    fn new(
        id: &str,
        name: &str,
        kind: DeviceKind,
        brand: &str,
        signal: u8,
        connected: bool,
        battery: Option<u8>,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            brand: brand.to_string(),
            signal,
            connected,
            battery,
        }
    }

    pub fn signal_strength(&self) -> SignalStrength {
        SignalStrength::from_percent(self.signal)
    }

    pub fn battery_level(&self) -> Option<BatteryLevel> {
        self.battery.map(BatteryLevel::from_percent)
    }
}

fn known_devices() -> Vec<Device> {
    use DeviceKind::*;
    vec![
        Device::new("1", "Apple Watch Series 9", Smartwatch, "Apple", 95, false, Some(78)),
        Device::new("2", "Fitbit Charge 6", FitnessTracker, "Fitbit", 88, false, Some(62)),
        Device::new("3", "Samsung Galaxy Watch 6", Smartwatch, "Samsung", 82, false, Some(91)),
        Device::new("4", "iPhone 15 Pro", Phone, "Apple", 100, true, Some(85)),
        Device::new("5", "Garmin Forerunner 265", FitnessTracker, "Garmin", 76, false, Some(45)),
        Device::new("6", "Withings Body+ Scale", HealthMonitor, "Withings", 70, false, None),
    ]
}

/// State of an open "Connect Devices" modal. Closing or dropping it stops the scan timer.
pub struct DeviceScanner {
    devices: Vec<Device>,
    scanning: Arc<watch::Sender<bool>>,
    lifecycle: CancellationToken,
}

impl DeviceScanner {
    pub fn new(lifecycle: CancellationToken) -> Self {
        let (scanning, _) = watch::channel(false);
        Self {
            devices: known_devices(),
            scanning: Arc::new(scanning),
            lifecycle,
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn is_scanning(&self) -> bool {
        *self.scanning.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.scanning.subscribe()
    }

    /// Starts a timed scan. Returns `false` if one is already running.
    pub fn start_scan(&mut self) -> bool {
        if self.is_scanning() {
            return false;
        }
        info!("Scanning for devices");
        self.scanning.send_replace(true);

        let scanning = self.scanning.clone();
        let token = self.lifecycle.child_token();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Device scan cancelled");
                }
                _ = tokio::time::sleep(SCAN_DURATION) => {
                    scanning.send_replace(false);
                    debug!("Device scan finished");
                }
            }
        });
        true
    }

    /// Flips the connection of a device. Returns the new state, or `None` for an unknown id.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let device = self.devices.iter_mut().find(|d| d.id == id)?;
        device.connected = !device.connected;
        info!(
            "{} {}",
            device.name,
            if device.connected { "connected" } else { "disconnected" }
        );
        Some(device.connected)
    }

    pub fn close(&mut self) {
        self.lifecycle.cancel();
    }
}

impl Drop for DeviceScanner {
    fn drop(&mut self) {
        self.close();
    }
}
