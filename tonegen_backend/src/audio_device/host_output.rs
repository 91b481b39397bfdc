//! Host sound device standing in for the PWM output stage.
//!
//! The stream callback doubles as the sample clock: for every device frame it
//! runs one tick and writes path A to channel 0 and path B to channel 1. While
//! production is disabled it keeps rendering the held level, so the suspend
//! ramp is heard as it happens.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample, StreamConfig};
use tonegen_core::{CENTER_LEVEL, OutputFrame, ToneError, ToneResult};

use super::enumeration::DeviceEnumerator;
use super::negotiation::{ConfigNegotiator, ConfigurationRequest, NegotiatedConfig};
use crate::rt_processing::callback::{CallbackSlot, SampleClock};

pub struct HostClock {
    device: cpal::Device,
    device_name: String,
    negotiated: NegotiatedConfig,

    /// Live while started. Dropping it stops the callback.
    stream: Option<cpal::Stream>,
}

impl HostClock {
    /// Open `device_name` (or the default output) and negotiate a stream.
    ///
    /// Build the generator with [`HostClock::sample_rate`]: the device rate is
    /// the sample rate the mixer actually runs at.
    pub fn open(device_name: Option<&str>, request: &ConfigurationRequest) -> ToneResult<Self> {
        let enumerator = DeviceEnumerator::new()?;
        enumerator.log_device_list();

        let info = match device_name {
            Some(name) => enumerator.find_device_by_name(name)?,
            None => enumerator.default_output_device()?,
        };
        let negotiated = ConfigNegotiator::negotiate(info, request)?;
        if !negotiated.sample_rate_matched {
            log::warn!(
                "device {} cannot run at {:?} Hz, using {} Hz",
                info.name,
                request.sample_rate,
                negotiated.sample_rate
            );
        }
        log::info!("host output on {}: {}", info.name, negotiated);

        Ok(Self {
            device: enumerator.select_device(info)?,
            device_name: info.name.clone(),
            negotiated,
            stream: None,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.negotiated.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.negotiated.channels
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Output latency of one device buffer; `None` when the host picks the size.
    pub fn buffer_latency_ms(&self) -> Option<f32> {
        match self.negotiated.stream_config.buffer_size {
            cpal::BufferSize::Fixed(frames) => {
                Some(ConfigNegotiator::calculate_latency_ms(self.negotiated.sample_rate, frames))
            }
            cpal::BufferSize::Default => None,
        }
    }

    fn build_stream<T>(&self, slot: Arc<CallbackSlot>) -> Result<cpal::Stream, cpal::BuildStreamError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let config: &StreamConfig = &self.negotiated.stream_config;
        let channels = config.channels.max(1) as usize;

        self.device.build_output_stream(
            config,
            move |output: &mut [T], _: &cpal::OutputCallbackInfo| {
                for frame in output.chunks_mut(channels) {
                    let rendered = slot.tick().unwrap_or_else(|| slot.held_frame());
                    write_frame(frame, rendered);
                }
            },
            |err| log::error!("host output stream error: {err}"),
            None,
        )
    }
}

impl SampleClock for HostClock {
    fn start(&mut self, slot: Arc<CallbackSlot>) -> ToneResult<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let stream = match self.negotiated.sample_format {
            cpal::SampleFormat::F32 => self.build_stream::<f32>(slot),
            cpal::SampleFormat::I16 => self.build_stream::<i16>(slot),
            cpal::SampleFormat::U16 => self.build_stream::<u16>(slot),
            other => return Err(ToneError::Device(format!("unsupported sample format {other}"))),
        }
        .map_err(|e| ToneError::ClockStart(e.to_string()))?;

        stream.play().map_err(|e| ToneError::ClockStart(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::warn!("failed to pause host output: {e}");
            }
            log::info!("host output on {} stopped", self.device_name);
        }
    }
}

/// One path level as a centered sample in [-1, 1); an idle path is silent.
#[inline(always)]
fn path_sample(level: Option<u8>) -> f32 {
    level.map_or(0.0, |l| (l as f32 - CENTER_LEVEL as f32) / 128.0)
}

#[inline(always)]
fn write_frame<T: Sample + FromSample<f32>>(frame: &mut [T], rendered: OutputFrame) {
    if let [mono] = frame {
        *mono = T::from_sample(path_sample(rendered.a.or(rendered.b)));
        return;
    }
    let (a, b) = (path_sample(rendered.a), path_sample(rendered.b));
    for (channel, out) in frame.iter_mut().enumerate() {
        *out = T::from_sample(match channel {
            0 => a,
            1 => b,
            _ => 0.0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonegen_core::OutputMode;

    #[test]
    fn paths_map_to_channels() {
        let mut frame = [1.0f32; 3];
        write_frame(&mut frame, OutputMode::SingleEndedB.route(255));
        assert_eq!(frame, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn center_is_silence() {
        let mut frame = [1.0f32; 2];
        write_frame(&mut frame, OutputMode::Differential.route(CENTER_LEVEL));
        assert_eq!(frame[0], 0.0);
        // complement of 127 is 128: one step above center
        assert_eq!(frame[1], 1.0 / 128.0);
    }

    #[test]
    fn mono_takes_active_path() {
        let mut frame = [0.0f32; 1];
        write_frame(&mut frame, OutputMode::SingleEndedB.route(CENTER_LEVEL - 64));
        assert_eq!(frame[0], -0.5);
    }
}
