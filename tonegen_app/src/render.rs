//! Offline rendering to a WAV file.

use std::path::Path;

use anyhow::Context;
use tonegen_backend::{CENTER_LEVEL, FrameRecorder, GeneratorConfig, ManualClock, OutputFrame, ToneGenerator};

use crate::Voices;

/// One output path as a 16-bit sample; an idle path is silent.
///
/// A wrapped mix can reach 255, one step past full scale above center, so the
/// top level saturates at `i16::MAX`.
fn path_to_i16(level: Option<u8>) -> i16 {
    level.map_or(0, |l| {
        ((l as i32 - CENTER_LEVEL as i32) * 256).clamp(i16::MIN as i32, i16::MAX as i32) as i16
    })
}

pub fn render_wav(voices: &Voices, seconds: f32, fade_out: bool, path: &Path) -> anyhow::Result<()> {
    let config = GeneratorConfig::default();
    let periods = (seconds.max(0.0) * config.sample_rate_hz as f32).round() as usize;

    let recorder = FrameRecorder::with_capacity(periods + 256);
    let clock = ManualClock::new();
    let mut generator = ToneGenerator::new(config.clone(), recorder.clone(), clock.clone())?;
    generator.begin_with_mode(voices.mode)?;
    voices.apply(&generator);

    clock.run(periods);
    if fade_out {
        generator.suspend();
    }
    let frames = recorder.take();

    let wav_spec = hound::WavSpec {
        channels: 2,
        sample_rate: config.sample_rate_hz,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, wav_spec)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for OutputFrame { a, b } in &frames {
        writer.write_sample(path_to_i16(*a))?;
        writer.write_sample(path_to_i16(*b))?;
    }
    writer.finalize()?;

    log::info!("wrote {} frames ({seconds} s, {}) to {}", frames.len(), voices.mode, path.display());
    Ok(())
}
