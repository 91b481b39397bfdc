use cpal::traits::{DeviceTrait, HostTrait};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub id: cpal::HostId,
    pub name: String,
    pub is_default: bool,
}

impl fmt::Display for HostInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, if self.is_default { "default" } else { "available" })
    }
}

/// Output capabilities of one device.
#[derive(Clone, Debug)]
pub struct DeviceInfo {
    pub name: String,
    pub host_id: cpal::HostId,
    pub is_default: bool,

    pub min_sample_rate: u32,
    pub max_sample_rate: u32,
    pub default_sample_rate: u32,

    pub supported_channels: Vec<u16>,
    pub max_channels: u16,
    pub default_channels: u16,

    pub supported_sample_formats: Vec<cpal::SampleFormat>,
    pub default_sample_format: cpal::SampleFormat,

    pub(crate) device_index: usize,
}

impl DeviceInfo {
    pub fn supports_sample_rate(&self, rate: u32) -> bool {
        rate >= self.min_sample_rate && rate <= self.max_sample_rate
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}ch @ {}Hz{}]",
            self.name,
            self.default_channels,
            self.default_sample_rate,
            if self.is_default { " (default)" } else { "" }
        )
    }
}

pub type EnumResult<T> = Result<T, EnumError>;

#[derive(Debug)]
pub enum EnumError {
    NoDevicesFound,
    DeviceNotFound(String),
    QueryFailed(String),
    InvalidDeviceIndex(usize),
}

impl fmt::Display for EnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDevicesFound => write!(f, "No output devices found"),
            Self::DeviceNotFound(name) => write!(f, "Device not found: {}", name),
            Self::QueryFailed(msg) => write!(f, "Device query failed: {}", msg),
            Self::InvalidDeviceIndex(idx) => write!(f, "Invalid device index: {}", idx),
        }
    }
}

impl std::error::Error for EnumError {}

/// Output devices across every host cpal can open on this platform.
pub struct DeviceEnumerator {
    hosts: Vec<HostInfo>,
    devices: Vec<(cpal::Device, DeviceInfo)>,
}

impl DeviceEnumerator {
    pub fn new() -> EnumResult<Self> {
        let hosts = Self::enumerate_hosts();
        let devices = Self::scan_output_devices(&hosts)?;
        Ok(Self { hosts, devices })
    }

    pub fn enumerate_hosts() -> Vec<HostInfo> {
        let default_host_id = cpal::default_host().id();
        cpal::available_hosts()
            .into_iter()
            .map(|id| HostInfo {
                id,
                name: id.name().to_string(),
                is_default: id == default_host_id,
            })
            .collect()
    }

    fn scan_output_devices(hosts: &[HostInfo]) -> EnumResult<Vec<(cpal::Device, DeviceInfo)>> {
        let mut all_devices = Vec::new();

        for host_info in hosts {
            let host = match cpal::host_from_id(host_info.id) {
                Ok(h) => h,
                Err(_) => continue,
            };

            let default_name = host.default_output_device().and_then(|d| d.name().ok());

            let Ok(devices) = host.output_devices() else {
                continue;
            };
            for device in devices {
                let device_name = device.name().unwrap_or_else(|_| "Unknown Device".to_string());
                // Only the default host's default device counts as "the" default.
                let is_default = host_info.is_default && default_name.as_deref() == Some(device_name.as_str());

                match Self::query_device_info(&device, host_info.id, is_default, all_devices.len()) {
                    Ok(info) => all_devices.push((device, info)),
                    Err(e) => log::debug!("skipping output device {device_name}: {e}"),
                }
            }
        }

        if all_devices.is_empty() {
            return Err(EnumError::NoDevicesFound);
        }
        Ok(all_devices)
    }

    fn query_device_info(
        device: &cpal::Device,
        host_id: cpal::HostId,
        is_default: bool,
        device_index: usize,
    ) -> EnumResult<DeviceInfo> {
        let name = device
            .name()
            .map_err(|e| EnumError::QueryFailed(format!("Failed to get device name: {}", e)))?;

        let default_config = device
            .default_output_config()
            .map_err(|e| EnumError::QueryFailed(format!("Failed to get default config: {}", e)))?;

        let mut min_sample_rate = u32::MAX;
        let mut max_sample_rate = 0u32;
        let mut supported_channels = Vec::new();
        let mut max_channels = 0u16;
        let mut sample_formats = Vec::new();

        let configs = device
            .supported_output_configs()
            .map_err(|e| EnumError::QueryFailed(format!("Failed to get supported configs: {}", e)))?;
        for config_range in configs {
            min_sample_rate = min_sample_rate.min(config_range.min_sample_rate().0);
            max_sample_rate = max_sample_rate.max(config_range.max_sample_rate().0);

            let channels = config_range.channels();
            if !supported_channels.contains(&channels) {
                supported_channels.push(channels);
            }
            max_channels = max_channels.max(channels);

            let format = config_range.sample_format();
            if !sample_formats.contains(&format) {
                sample_formats.push(format);
            }
        }
        supported_channels.sort_unstable();

        Ok(DeviceInfo {
            name,
            host_id,
            is_default,
            min_sample_rate,
            max_sample_rate,
            default_sample_rate: default_config.sample_rate().0,
            supported_channels,
            max_channels,
            default_channels: default_config.channels(),
            supported_sample_formats: sample_formats,
            default_sample_format: default_config.sample_format(),
            device_index,
        })
    }

    pub fn hosts(&self) -> &[HostInfo] {
        &self.hosts
    }

    pub fn output_devices(&self) -> Vec<&DeviceInfo> {
        self.devices.iter().map(|(_, info)| info).collect()
    }

    /// Default device of the default host, or the first device found.
    pub fn default_output_device(&self) -> EnumResult<&DeviceInfo> {
        self.devices
            .iter()
            .map(|(_, info)| info)
            .find(|info| info.is_default)
            .or_else(|| self.devices.first().map(|(_, info)| info))
            .ok_or(EnumError::NoDevicesFound)
    }

    /// Find a device by name (case-insensitive, exact match first, then partial).
    pub fn find_device_by_name(&self, name: &str) -> EnumResult<&DeviceInfo> {
        let name_lower = name.to_lowercase();
        let infos = || self.devices.iter().map(|(_, info)| info);

        infos()
            .find(|info| info.name.to_lowercase() == name_lower)
            .or_else(|| infos().find(|info| info.name.to_lowercase().contains(&name_lower)))
            .ok_or_else(|| EnumError::DeviceNotFound(name.to_string()))
    }

    /// The cpal handle behind `device_info`.
    pub fn select_device(&self, device_info: &DeviceInfo) -> EnumResult<cpal::Device> {
        self.devices
            .iter()
            .find(|(_, info)| info.device_index == device_info.device_index)
            .map(|(device, _)| device.clone())
            .ok_or(EnumError::InvalidDeviceIndex(device_info.device_index))
    }

    pub fn log_device_list(&self) {
        for host in &self.hosts {
            log::info!("audio host: {host}");
        }
        for (idx, device) in self.output_devices().iter().enumerate() {
            log::info!(
                "  [{idx}] {device} rates {}-{} Hz, max {} channels",
                device.min_sample_rate,
                device.max_sample_rate,
                device.max_channels
            );
        }
    }
}
