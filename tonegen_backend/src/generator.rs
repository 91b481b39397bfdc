//! Foreground configuration surface.

use std::sync::Arc;

use tonegen_core::{
    GeneratorConfig, MIX_HEADROOM, OutputMode, ToneResult, VOICE_COUNT, WaveformKind,
};

use crate::rt_processing::callback::{CallbackSlot, SampleClock};
use crate::rt_processing::routing::OutputDriver;
use crate::rt_processing::state::{GeneratorState, TransportState};
use crate::rt_processing::suspend::SuspendController;
use crate::rt_processing::waveform::init_tables;

/// Cloneable, thread-safe handle to every configuration call.
///
/// Each call commits its fields one at a time; the sample path may see a new
/// waveform a sample before the matching new amplitude.
#[derive(Clone)]
pub struct GeneratorControls {
    slot: Arc<CallbackSlot>,
    suspender: Arc<SuspendController>,
}

impl GeneratorControls {
    /// Per-voice waveform; unknown raw ids become sine.
    pub fn set_wave(
        &self,
        w0: impl Into<WaveformKind>,
        w1: impl Into<WaveformKind>,
        w2: impl Into<WaveformKind>,
        w3: impl Into<WaveformKind>,
    ) {
        let kinds = [w0.into(), w1.into(), w2.into(), w3.into()];
        self.state().bank().configure_waveforms(kinds);
        log::debug!("waveforms {kinds:?}");
    }

    /// Tune `voice` (0..=3). Out-of-range ids are ignored.
    pub fn set_frequency(&self, voice: usize, frequency_hz: f32) {
        let state = self.state();
        if !state.bank().set_frequency(voice, frequency_hz, state.config()) {
            log::warn!("set_frequency: no voice {voice} (have {VOICE_COUNT}), ignored");
            return;
        }
        log::debug!("voice {voice} -> {frequency_hz} Hz");
    }

    /// All four amplitudes. Keeping the sum inside the mix headroom is up to the caller.
    pub fn set_volume(&self, a0: u8, a1: u8, a2: u8, a3: u8) {
        let bank = self.state().bank();
        bank.set_volume([a0, a1, a2, a3]);

        let peak = bank.peak_excursion();
        if peak > MIX_HEADROOM {
            log::warn!("amplitudes {a0}/{a1}/{a2}/{a3} can swing ±{peak}, beyond headroom ±{MIX_HEADROOM}; output will wrap");
        }
    }

    /// Ramp the outputs to center and stop sample production. Blocks for the
    /// length of the ramp (at most 128 steps). Never call from the sample path.
    pub fn suspend(&self) {
        self.suspender.suspend(&self.slot);
    }

    /// Restart sample production after [`suspend`](Self::suspend).
    pub fn resume(&self) {
        self.suspender.resume(&self.slot);
    }

    pub fn transport(&self) -> TransportState {
        self.state().transport()
    }

    pub fn output_mode(&self) -> OutputMode {
        self.state().output_mode()
    }

    /// Level currently held on the outputs.
    pub fn level(&self) -> u8 {
        self.state().level()
    }

    pub fn waveform(&self, voice: usize) -> Option<WaveformKind> {
        self.state().bank().voice(voice).map(|v| v.waveform())
    }

    pub fn tuning_word(&self, voice: usize) -> Option<u32> {
        self.state().bank().voice(voice).map(|v| v.tuning_word())
    }

    /// Frequency the voice actually produces, from its tuning word.
    pub fn frequency(&self, voice: usize) -> Option<f64> {
        self.tuning_word(voice).map(|word| self.state().config().frequency_of(word))
    }

    pub fn amplitude(&self, voice: usize) -> Option<u8> {
        self.state().bank().voice(voice).map(|v| v.amplitude())
    }

    pub fn phase(&self, voice: usize) -> Option<u32> {
        self.state().bank().voice(voice).map(|v| v.phase())
    }

    pub fn config(&self) -> &GeneratorConfig {
        self.state().config()
    }

    pub fn state(&self) -> &Arc<GeneratorState> {
        self.slot.state()
    }

    pub fn slot(&self) -> &Arc<CallbackSlot> {
        &self.slot
    }
}

/// Four-voice wavetable tone generator bound to a sample clock and an output driver.
pub struct ToneGenerator {
    controls: GeneratorControls,
    clock: Box<dyn SampleClock>,
    clock_started: bool,
}

impl ToneGenerator {
    pub fn new(
        config: GeneratorConfig,
        driver: impl OutputDriver,
        clock: impl SampleClock + 'static,
    ) -> ToneResult<Self> {
        config.validate()?;
        let suspender = Arc::new(SuspendController::new(config.ramp_step()));
        let state = Arc::new(GeneratorState::new(config));
        let slot = Arc::new(CallbackSlot::new(state, Box::new(driver)));

        Ok(Self {
            controls: GeneratorControls { slot, suspender },
            clock: Box::new(clock),
            clock_started: false,
        })
    }

    /// Start with both defaults: single-ended output on path A.
    pub fn begin(&mut self) -> ToneResult<()> {
        self.begin_with_mode(OutputMode::default())
    }

    /// Configure the output paths for `mode` and start sample production.
    ///
    /// Unknown raw mode ids become [`OutputMode::SingleEndedA`]. Calling again
    /// reconfigures the outputs and re-enables production.
    pub fn begin_with_mode(&mut self, mode: impl Into<OutputMode>) -> ToneResult<()> {
        let mode = mode.into();
        init_tables();

        let slot = Arc::clone(self.controls.slot());
        slot.configure_output(mode);

        if !self.clock_started {
            self.clock.start(Arc::clone(&slot))?;
            self.clock_started = true;
        }
        slot.state().set_transport(TransportState::Running);

        let config = slot.state().config();
        log::info!(
            "tone generator running: {mode} output, {} Hz sampling, {:.6} Hz resolution",
            config.sample_rate_hz,
            config.frequency_resolution()
        );
        Ok(())
    }

    /// Handle for other threads.
    pub fn controls(&self) -> GeneratorControls {
        self.controls.clone()
    }

    pub fn set_wave(
        &self,
        w0: impl Into<WaveformKind>,
        w1: impl Into<WaveformKind>,
        w2: impl Into<WaveformKind>,
        w3: impl Into<WaveformKind>,
    ) {
        self.controls.set_wave(w0, w1, w2, w3);
    }

    pub fn set_frequency(&self, voice: usize, frequency_hz: f32) {
        self.controls.set_frequency(voice, frequency_hz);
    }

    pub fn set_volume(&self, a0: u8, a1: u8, a2: u8, a3: u8) {
        self.controls.set_volume(a0, a1, a2, a3);
    }

    pub fn suspend(&self) {
        self.controls.suspend();
    }

    pub fn resume(&self) {
        self.controls.resume();
    }

    pub fn transport(&self) -> TransportState {
        self.controls.transport()
    }

    pub fn output_mode(&self) -> OutputMode {
        self.controls.output_mode()
    }

    pub fn level(&self) -> u8 {
        self.controls.level()
    }

    pub fn config(&self) -> &GeneratorConfig {
        self.controls.config()
    }
}

impl Drop for ToneGenerator {
    fn drop(&mut self) {
        if self.clock_started {
            self.clock.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rt_processing::clock::ManualClock;
    use crate::rt_processing::routing::{FrameRecorder, NullDriver};
    use tonegen_core::{CENTER_LEVEL, ToneError};

    #[test]
    fn new_rejects_invalid_config() {
        let config = GeneratorConfig::default().with_sample_rate(0);
        let result = ToneGenerator::new(config, NullDriver, ManualClock::new());
        assert!(matches!(result, Err(ToneError::InvalidConfig(_))));
    }

    #[test]
    fn nothing_plays_before_begin() {
        let clock = ManualClock::new();
        let generator = ToneGenerator::new(GeneratorConfig::default(), NullDriver, clock.clone()).unwrap();
        assert_eq!(generator.transport(), TransportState::Stopped);
        assert_eq!(clock.tick(), None);
    }

    #[test]
    fn begin_with_unknown_mode_uses_path_a() {
        let recorder = FrameRecorder::new();
        let mut generator =
            ToneGenerator::new(GeneratorConfig::default(), recorder.clone(), ManualClock::new()).unwrap();
        generator.begin_with_mode(99u8).unwrap();
        assert_eq!(generator.output_mode(), OutputMode::SingleEndedA);
        assert!(recorder.paths().a && !recorder.paths().b);
        assert_eq!(recorder.frames()[0].a, Some(CENTER_LEVEL));
    }

    #[test]
    fn controls_outlive_borrow_and_report_settings() {
        let mut generator =
            ToneGenerator::new(GeneratorConfig::default(), NullDriver, ManualClock::new()).unwrap();
        generator.begin().unwrap();
        let controls = generator.controls();

        let worker = std::thread::spawn(move || {
            controls.set_wave(WaveformKind::Ramp, 1u8, 200u8, WaveformKind::Sine);
            controls.set_frequency(1, 440.0);
            controls.set_volume(10, 20, 30, 40);
            controls
        });
        let controls = worker.join().unwrap();

        assert_eq!(controls.waveform(0), Some(WaveformKind::Ramp));
        assert_eq!(controls.waveform(1), Some(WaveformKind::Square));
        assert_eq!(controls.waveform(2), Some(WaveformKind::Sine));
        assert_eq!(controls.amplitude(3), Some(40));
        assert!((controls.frequency(1).unwrap() - 440.0).abs() < 1e-3);
        assert_eq!(controls.frequency(4), None);
    }

    #[test]
    fn out_of_range_voice_changes_nothing() {
        let generator = ToneGenerator::new(GeneratorConfig::default(), NullDriver, ManualClock::new()).unwrap();
        generator.set_frequency(7, 1000.0);
        let controls = generator.controls();
        assert!((0..VOICE_COUNT).all(|v| controls.tuning_word(v) == Some(0)));
    }
}
