//! Real-time engine of the four-voice wavetable tone generator.
//!
//! A [`ToneGenerator`] owns the shared [`GeneratorState`], hands a
//! [`CallbackSlot`] to an external [`SampleClock`], and renders each mixed level
//! through an [`OutputDriver`] according to the selected output mode.

#[cfg(feature = "host-audio")]
pub mod audio_device;
pub mod generator;
pub mod rt_processing;

#[cfg(feature = "host-audio")]
pub use audio_device::{ConfigurationRequest, DeviceEnumerator, HostClock, SampleRatePriority};
pub use generator::{GeneratorControls, ToneGenerator};
pub use rt_processing::callback::{CallbackSlot, SampleClock};
pub use rt_processing::clock::{ManualClock, ThreadedClock};
pub use rt_processing::performance::{DeadlineMonitor, DeadlineSnapshot};
pub use rt_processing::routing::{FrameRecorder, NullDriver, OutputDriver};
pub use rt_processing::state::{GeneratorState, TransportState};
pub use rt_processing::suspend::SuspendController;

pub use tonegen_core::{
    CENTER_LEVEL, GeneratorConfig, OutputFrame, OutputMode, OutputPaths, ToneError, ToneResult,
    VOICE_COUNT, WaveformKind,
};
