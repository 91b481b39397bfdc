//! Everything the sample clock touches, plus the foreground pieces that share
//! state with it.

pub mod callback;
pub mod clock;
pub mod mixer;
pub mod performance;
pub mod routing;
pub mod state;
pub mod suspend;
pub mod waveform;
