//! `tonegen` command-line front end.
//!
//! `render` drives the generator offline and writes both output paths to a
//! stereo WAV file. `play` (feature `host-audio`) paces the generator from a
//! host audio device.

mod logging;
mod render;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tonegen_backend::{OutputMode, ToneGenerator, VOICE_COUNT, WaveformKind};

#[derive(Parser)]
#[command(name = "tonegen", version, about = "Four-voice additive wavetable tone generator")]
struct Cli {
    #[command(flatten)]
    voices: VoiceArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render to a stereo WAV file (path A left, path B right)
    Render {
        #[arg(short, long, default_value = "tonegen.wav")]
        out: PathBuf,
        #[arg(short, long, default_value_t = 2.0)]
        seconds: f32,
        /// Keep the tail unramped instead of suspending at the end
        #[arg(long)]
        no_fade: bool,
    },
    /// Play through a host audio device
    #[cfg(feature = "host-audio")]
    Play {
        #[arg(short, long, default_value_t = 2.0)]
        seconds: f32,
        /// Output device name; the default device otherwise
        #[arg(short, long)]
        device: Option<String>,
        /// Fixed device buffer in frames; the host default otherwise
        #[arg(short, long)]
        buffer: Option<u32>,
        /// Fail instead of falling back when the device cannot run at 40 kHz
        #[arg(long)]
        exact_rate: bool,
        /// List output devices and exit
        #[arg(long)]
        list: bool,
    },
}

#[derive(Args)]
struct VoiceArgs {
    /// Output mode: a, b or diff
    #[arg(short, long, default_value = "a", global = true)]
    mode: String,
    /// Comma separated waveforms per voice: sine, square, ramp
    #[arg(short, long, value_delimiter = ',', default_value = "sine", global = true)]
    wave: Vec<String>,
    /// Comma separated frequencies in Hz per voice
    #[arg(short, long, value_delimiter = ',', default_value = "440", global = true)]
    freq: Vec<f32>,
    /// Comma separated amplitudes (0..=255) per voice
    #[arg(short, long, value_delimiter = ',', default_value = "120", global = true)]
    volume: Vec<u8>,
}

/// Voice settings resolved from the command line, padded to the voice count.
pub struct Voices {
    pub mode: OutputMode,
    pub waves: [WaveformKind; VOICE_COUNT],
    pub frequencies: [f32; VOICE_COUNT],
    pub volumes: [u8; VOICE_COUNT],
}

impl Voices {
    fn from_args(args: &VoiceArgs) -> Self {
        let mut waves = [WaveformKind::default(); VOICE_COUNT];
        let mut frequencies = [0.0; VOICE_COUNT];
        let mut volumes = [0u8; VOICE_COUNT];
        for (slot, name) in waves.iter_mut().zip(&args.wave) {
            *slot = WaveformKind::from_name(name);
        }
        for (slot, hz) in frequencies.iter_mut().zip(&args.freq) {
            *slot = *hz;
        }
        for (slot, amp) in volumes.iter_mut().zip(&args.volume) {
            *slot = *amp;
        }
        if args.wave.len() > VOICE_COUNT || args.freq.len() > VOICE_COUNT || args.volume.len() > VOICE_COUNT {
            log::warn!("only {VOICE_COUNT} voices available; extra values ignored");
        }
        Self {
            mode: OutputMode::from_name(&args.mode),
            waves,
            frequencies,
            volumes,
        }
    }

    pub fn apply(&self, generator: &ToneGenerator) {
        let [w0, w1, w2, w3] = self.waves;
        generator.set_wave(w0, w1, w2, w3);
        for (voice, hz) in self.frequencies.iter().enumerate() {
            generator.set_frequency(voice, *hz);
        }
        let [a0, a1, a2, a3] = self.volumes;
        generator.set_volume(a0, a1, a2, a3);
    }
}

fn main() -> anyhow::Result<()> {
    logging::init_logger();
    let cli = Cli::parse();
    let voices = Voices::from_args(&cli.voices);

    match cli.command {
        Command::Render { out, seconds, no_fade } => render::render_wav(&voices, seconds, !no_fade, &out),
        #[cfg(feature = "host-audio")]
        Command::Play { seconds, device, buffer, exact_rate, list } => {
            if list {
                tonegen_backend::DeviceEnumerator::new()?.log_device_list();
                return Ok(());
            }
            let mut request = tonegen_backend::ConfigurationRequest::reference_design();
            if let Some(frames) = buffer {
                request = request.with_buffer_size(frames);
            }
            if exact_rate {
                request = request.with_sample_rate_priority(tonegen_backend::SampleRatePriority::Exact);
            }
            play(&voices, seconds, device.as_deref(), &request)
        }
    }
}

#[cfg(feature = "host-audio")]
fn play(
    voices: &Voices,
    seconds: f32,
    device: Option<&str>,
    request: &tonegen_backend::ConfigurationRequest,
) -> anyhow::Result<()> {
    use std::time::Duration;
    use tonegen_backend::{GeneratorConfig, HostClock, NullDriver};

    let clock = HostClock::open(device, request)?;
    let config = GeneratorConfig::default().with_sample_rate(clock.sample_rate());
    log::info!("playing on '{}' at {} Hz", clock.device_name(), clock.sample_rate());
    if let Some(latency) = clock.buffer_latency_ms() {
        log::info!("buffer latency {latency:.2} ms");
    }

    let mut generator = ToneGenerator::new(config, NullDriver, clock)?;
    generator.begin_with_mode(voices.mode)?;
    voices.apply(&generator);

    std::thread::sleep(Duration::from_secs_f32(seconds.max(0.0)));
    generator.suspend();
    // Let the device drain the ramped-down tail.
    std::thread::sleep(Duration::from_millis(50));
    Ok(())
}
