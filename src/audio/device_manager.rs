use std::fmt;
use cpal::{Device, Host};
use cpal::traits::{DeviceTrait, HostTrait};

#[derive(Debug, Clone, PartialEq)]
pub struct OutputDeviceInfo {
    pub name: String,
    pub is_default: bool,
}

impl fmt::Display for OutputDeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default {
            write!(f, "{} (default)", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// Tag each device name with whether it is the host default.
fn describe(names: impl IntoIterator<Item = String>, default_name: Option<&str>) -> Vec<OutputDeviceInfo> {
    names
        .into_iter()
        .map(|name| OutputDeviceInfo {
            is_default: default_name == Some(name.as_str()),
            name,
        })
        .collect()
}

/// Output device lookup on the default cpal host. Devices are enumerated on
/// every call since they come and go while the player runs.
pub struct OutputDeviceManager {
    host: Host,
}

impl OutputDeviceManager {
    pub fn new() -> Self {
        Self { host: cpal::default_host() }
    }

    pub fn devices(&self) -> anyhow::Result<Vec<OutputDeviceInfo>> {
        let default_name = self.host.default_output_device()
            .and_then(|device| device.name().ok());

        let names: Vec<String> = self.host.output_devices()
            .map_err(|e| anyhow::anyhow!("Failed to enumerate output devices: {}", e))?
            .filter_map(|device| match device.name() {
                Ok(name) => Some(name),
                Err(e) => {
                    log::warn!("Failed to get device name: {}", e);
                    None
                }
            })
            .collect();

        let devices = describe(names, default_name.as_deref());
        log::debug!("Enumerated {} audio output devices", devices.len());
        Ok(devices)
    }

    fn find(&self, name: &str) -> anyhow::Result<Option<Device>> {
        let mut devices = self.host.output_devices()
            .map_err(|e| anyhow::anyhow!("Failed to enumerate output devices: {}", e))?;
        Ok(devices.find(|device| device.name().map(|n| n == name).unwrap_or(false)))
    }

    /// The configured device if it exists, the default device otherwise.
    pub fn resolve(&self, configured: Option<&str>) -> anyhow::Result<Device> {
        if let Some(name) = configured {
            match self.find(name) {
                Ok(Some(device)) => {
                    log::debug!("Using audio device: {}", name);
                    return Ok(device);
                }
                Ok(None) => log::warn!("Audio device '{}' not found, falling back to default", name),
                Err(e) => log::warn!("{}, falling back to default", e),
            }
        }

        self.host.default_output_device()
            .ok_or_else(|| anyhow::anyhow!("No default audio output device available"))
    }
}
