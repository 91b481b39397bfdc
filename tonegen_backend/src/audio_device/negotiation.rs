use crate::audio_device::enumeration::DeviceInfo;
use cpal::{BufferSize, SampleFormat, SampleRate, StreamConfig};
use std::fmt;

/// Stream formats the host output can render into.
pub const RENDERABLE_FORMATS: [SampleFormat; 3] = [SampleFormat::F32, SampleFormat::I16, SampleFormat::U16];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRatePriority {
    /// Requested rate or fail.
    Exact,
    /// Requested rate if possible, else the nearest one the device allows.
    Closest,
}

#[derive(Debug, Clone)]
pub struct ConfigurationRequest {
    pub sample_rate: Option<u32>,
    pub sample_rate_priority: SampleRatePriority,
    pub channels: Option<u16>,
    pub buffer_size: Option<u32>,
}

impl ConfigurationRequest {
    pub fn new() -> Self {
        Self {
            sample_rate: None,
            sample_rate_priority: SampleRatePriority::Closest,
            // one channel per output path
            channels: Some(2),
            buffer_size: None,
        }
    }

    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = Some(rate);
        self
    }

    pub fn with_sample_rate_priority(mut self, priority: SampleRatePriority) -> Self {
        self.sample_rate_priority = priority;
        self
    }

    pub fn with_buffer_size(mut self, size: u32) -> Self {
        self.buffer_size = Some(size);
        self
    }

    /// Reference-design rate, falling back to the nearest the device can do.
    pub fn reference_design() -> Self {
        Self::new().with_sample_rate(40_000)
    }
}

impl Default for ConfigurationRequest {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct NegotiatedConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_format: SampleFormat,
    pub stream_config: StreamConfig,
    pub sample_rate_matched: bool,
}

impl fmt::Display for NegotiatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}ch @ {}Hz, buffer: {:?}, format: {:?}",
            self.channels, self.sample_rate, self.stream_config.buffer_size, self.sample_format
        )
    }
}

#[derive(Debug, Clone)]
pub enum NegotiationError {
    SampleRateNotSupported { requested: u32, min: u32, max: u32 },
    FormatNotSupported { available: Vec<SampleFormat> },
    NoCompatibleConfiguration,
}

impl fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SampleRateNotSupported { requested, min, max } => {
                write!(f, "Sample rate {} not supported. Device range: {}-{}", requested, min, max)
            }
            Self::FormatNotSupported { available } => {
                write!(f, "No renderable sample format. Available: {:?}", available)
            }
            Self::NoCompatibleConfiguration => {
                write!(f, "No compatible configuration found for device")
            }
        }
    }
}

impl std::error::Error for NegotiationError {}

pub type NegotiationResult<T> = Result<T, NegotiationError>;

pub struct ConfigNegotiator;

impl ConfigNegotiator {
    pub fn negotiate(
        device_info: &DeviceInfo,
        request: &ConfigurationRequest,
    ) -> NegotiationResult<NegotiatedConfig> {
        let sample_rate = Self::negotiate_sample_rate(device_info, request)?;
        let channels = Self::negotiate_channels(device_info, request);
        let sample_format = Self::negotiate_sample_format(device_info)?;
        let buffer_size = request.buffer_size.map_or(BufferSize::Default, BufferSize::Fixed);

        Ok(NegotiatedConfig {
            sample_rate,
            channels,
            sample_format,
            stream_config: StreamConfig {
                channels,
                sample_rate: SampleRate(sample_rate),
                buffer_size,
            },
            sample_rate_matched: request.sample_rate.is_none_or(|r| r == sample_rate),
        })
    }

    fn negotiate_sample_rate(
        device_info: &DeviceInfo,
        request: &ConfigurationRequest,
    ) -> NegotiationResult<u32> {
        let Some(requested) = request.sample_rate else {
            return Ok(device_info.default_sample_rate);
        };
        if device_info.supports_sample_rate(requested) {
            return Ok(requested);
        }

        match request.sample_rate_priority {
            SampleRatePriority::Exact => Err(NegotiationError::SampleRateNotSupported {
                requested,
                min: device_info.min_sample_rate,
                max: device_info.max_sample_rate,
            }),
            SampleRatePriority::Closest => {
                if device_info.min_sample_rate > device_info.max_sample_rate {
                    return Err(NegotiationError::NoCompatibleConfiguration);
                }
                Ok(requested.clamp(device_info.min_sample_rate, device_info.max_sample_rate))
            }
        }
    }

    fn negotiate_channels(device_info: &DeviceInfo, request: &ConfigurationRequest) -> u16 {
        match request.channels {
            Some(requested) if requested <= device_info.max_channels => requested,
            _ => device_info.default_channels,
        }
    }

    fn negotiate_sample_format(device_info: &DeviceInfo) -> NegotiationResult<SampleFormat> {
        if RENDERABLE_FORMATS.contains(&device_info.default_sample_format)
            && device_info.supported_sample_formats.contains(&device_info.default_sample_format)
        {
            return Ok(device_info.default_sample_format);
        }

        RENDERABLE_FORMATS
            .into_iter()
            .find(|format| device_info.supported_sample_formats.contains(format))
            .ok_or_else(|| NegotiationError::FormatNotSupported {
                available: device_info.supported_sample_formats.clone(),
            })
    }

    pub fn calculate_latency_ms(sample_rate: u32, buffer_size: u32) -> f32 {
        (buffer_size as f32 / sample_rate as f32) * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(min: u32, max: u32) -> DeviceInfo {
        DeviceInfo {
            name: "test".into(),
            host_id: cpal::default_host().id(),
            is_default: true,
            min_sample_rate: min,
            max_sample_rate: max,
            default_sample_rate: 48_000,
            supported_channels: vec![1, 2],
            max_channels: 2,
            default_channels: 2,
            supported_sample_formats: vec![SampleFormat::I32, SampleFormat::I16],
            default_sample_format: SampleFormat::I32,
            device_index: 0,
        }
    }

    #[test]
    fn reference_rate_is_kept_when_supported() {
        let config = ConfigNegotiator::negotiate(&device(8_000, 192_000), &ConfigurationRequest::reference_design())
            .unwrap();
        assert_eq!(config.sample_rate, 40_000);
        assert!(config.sample_rate_matched);
        assert_eq!(config.sample_format, SampleFormat::I16);
        assert_eq!(config.channels, 2);
    }

    #[test]
    fn closest_rate_clamps_into_device_range() {
        let config = ConfigNegotiator::negotiate(&device(44_100, 48_000), &ConfigurationRequest::reference_design())
            .unwrap();
        assert_eq!(config.sample_rate, 44_100);
        assert!(!config.sample_rate_matched);
    }

    #[test]
    fn exact_rate_fails_outside_range() {
        let request = ConfigurationRequest::reference_design().with_sample_rate_priority(SampleRatePriority::Exact);
        assert!(matches!(
            ConfigNegotiator::negotiate(&device(44_100, 48_000), &request),
            Err(NegotiationError::SampleRateNotSupported { requested: 40_000, .. })
        ));
    }

    #[test]
    fn fixed_buffer_size_reaches_stream_config() {
        let request = ConfigurationRequest::reference_design().with_buffer_size(400);
        let config = ConfigNegotiator::negotiate(&device(8_000, 192_000), &request).unwrap();
        assert_eq!(config.stream_config.buffer_size, BufferSize::Fixed(400));

        let config = ConfigNegotiator::negotiate(&device(8_000, 192_000), &ConfigurationRequest::new()).unwrap();
        assert_eq!(config.stream_config.buffer_size, BufferSize::Default);
        assert_eq!(config.sample_rate, 48_000);
    }

    #[test]
    fn latency_in_ms() {
        assert_eq!(ConfigNegotiator::calculate_latency_ms(40_000, 400), 10.0);
    }
}
