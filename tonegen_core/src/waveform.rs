use serde::{Deserialize, Serialize};

/// Shape of one voice's wavetable.
///
/// Raw ids follow the classic numbering (0 = sine, 1 = square, 2 = ramp).
/// Anything else resolves to [`WaveformKind::Sine`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum WaveformKind {
    #[default]
    Sine = 0,
    Square = 1,
    Ramp = 2,
}

impl WaveformKind {
    pub fn from_id(id: u8) -> Self {
        match id {
            1 => WaveformKind::Square,
            2 => WaveformKind::Ramp,
            _ => WaveformKind::Sine,
        }
    }

    /// Lenient name lookup used by front ends; unknown names fall back to sine.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "square" | "sq" => WaveformKind::Square,
            "ramp" | "saw" | "sawtooth" => WaveformKind::Ramp,
            _ => WaveformKind::Sine,
        }
    }
}

impl From<u8> for WaveformKind {
    fn from(id: u8) -> Self {
        WaveformKind::from_id(id)
    }
}
