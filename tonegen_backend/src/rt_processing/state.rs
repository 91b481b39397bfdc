//! State shared between the sample path and the foreground.

use std::sync::atomic::{AtomicU8, Ordering};

use crossbeam::atomic::AtomicCell;
use tonegen_core::{CENTER_LEVEL, GeneratorConfig, OutputMode};

use super::waveform::OscillatorBank;

/// Where the generator is in its mute/unmute cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum TransportState {
    /// Created, `begin` not yet called.
    #[default]
    Stopped,
    /// Mixer invoked every sample period.
    Running,
    /// Mixer gated while the held level walks back to center.
    RampingDown,
    /// Level at center, phases zeroed, waiting for `resume`.
    Suspended,
}

/// Everything the sample path and the foreground share.
///
/// Lives for the whole run; configuration calls mutate fields in place.
#[derive(Debug)]
pub struct GeneratorState {
    /// Fixed for the life of the generator.
    config: GeneratorConfig,

    /// The four voices. Phases are written by the sample path only.
    bank: OscillatorBank,

    /// Routing of the mixed level, set by `begin`.
    output_mode: AtomicCell<OutputMode>,

    /// Gates the mixer: only `Running` produces samples.
    transport: AtomicCell<TransportState>,

    // Level last handed to the output paths. Normally the mixer's output; the
    // suspend ramp walks it back to center.
    level: AtomicU8,
}

impl GeneratorState {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            bank: OscillatorBank::new(),
            output_mode: AtomicCell::new(OutputMode::default()),
            transport: AtomicCell::new(TransportState::Stopped),
            level: AtomicU8::new(CENTER_LEVEL),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn bank(&self) -> &OscillatorBank {
        &self.bank
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode.load()
    }

    pub(crate) fn set_output_mode(&self, mode: OutputMode) {
        self.output_mode.store(mode);
    }

    pub fn transport(&self) -> TransportState {
        self.transport.load()
    }

    pub(crate) fn set_transport(&self, transport: TransportState) {
        self.transport.store(transport);
    }

    /// Sample production enabled.
    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.transport.load() == TransportState::Running
    }

    #[inline(always)]
    pub fn level(&self) -> u8 {
        self.level.load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub(crate) fn store_level(&self, level: u8) {
        self.level.store(level, Ordering::Relaxed);
    }
}

impl Default for GeneratorState {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}
