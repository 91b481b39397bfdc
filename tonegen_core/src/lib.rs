//! Shared vocabulary for the four-voice wavetable tone generator.
//!
//! Nothing in here touches the real-time path directly; the backend crate
//! builds the engine on top of these types.

pub mod config;
pub mod error;
pub mod output;
pub mod waveform;

pub use config::GeneratorConfig;
pub use error::{ToneError, ToneResult};
pub use output::{OutputFrame, OutputMode, OutputPaths};
pub use waveform::WaveformKind;

/// Number of simultaneously sounding voices.
pub const VOICE_COUNT: usize = 4;

/// Entries in one wavetable cycle. Indexed by the top 8 bits of a phase accumulator.
pub const TABLE_LEN: usize = 256;

/// Neutral output level (silence).
pub const CENTER_LEVEL: u8 = 127;

/// Largest summed excursion around [`CENTER_LEVEL`] that stays clear of wraparound.
pub const MIX_HEADROOM: i32 = 123;
