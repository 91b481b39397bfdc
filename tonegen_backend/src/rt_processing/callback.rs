//! Lock-conscious sample slot shared by the sample clock and the foreground.
//!
//! - The sample path never waits: it `try_lock`s the output driver and skips the
//!   period if the foreground holds it.
//! - The foreground takes the driver lock only for one-time output setup and for
//!   the suspend ramp, which also shuts out a tick already in flight.
//! - Nothing here allocates on the sample path.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use spin::{Mutex, MutexGuard};
use tonegen_core::{OutputFrame, OutputMode, ToneResult};

use super::mixer;
use super::routing::{self, OutputDriver};
use super::state::GeneratorState;

/// External timing source that invokes [`CallbackSlot::tick`] at the sample rate.
///
/// A clock keeps calling `tick` for as long as it is started; whether a tick
/// actually produces a sample is decided by the slot's transport state.
pub trait SampleClock {
    fn start(&mut self, slot: Arc<CallbackSlot>) -> ToneResult<()>;

    fn stop(&mut self);
}

/// Holds the generator state and the output driver for the sample clock.
pub struct CallbackSlot {
    state: Arc<GeneratorState>,

    /// Output driver. `spin::Mutex` so the sample path can try without an OS call.
    driver: Mutex<Box<dyn OutputDriver>>,

    /// Samples produced so far.
    sample_clock: AtomicU64,
}

impl CallbackSlot {
    pub fn new(state: Arc<GeneratorState>, driver: Box<dyn OutputDriver>) -> Self {
        Self {
            state,
            driver: Mutex::new(driver),
            sample_clock: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> &Arc<GeneratorState> {
        &self.state
    }

    /// Sample production currently enabled.
    #[inline(always)]
    pub fn is_enabled(&self) -> bool {
        self.state.is_running()
    }

    /// One sample period: mix, route, write.
    ///
    /// Returns `None` when production is disabled or the foreground holds the
    /// driver; nothing is written then and no phase advances.
    #[inline]
    pub fn tick(&self) -> Option<OutputFrame> {
        let mut driver = self.driver.try_lock()?;
        if !self.state.is_running() {
            return None;
        }

        let level = mixer::produce_sample(&self.state);
        let frame = self.state.output_mode().route(level);
        driver.write(frame);
        self.sample_clock.fetch_add(1, Ordering::Relaxed);
        Some(frame)
    }

    /// Frame for the level currently held on the outputs, without mixing.
    #[inline]
    pub fn held_frame(&self) -> OutputFrame {
        self.state.output_mode().route(self.state.level())
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_clock.load(Ordering::Relaxed)
    }

    /// Playback time in seconds at the configured sample rate.
    pub fn playback_time(&self) -> f64 {
        self.sample_count() as f64 / self.state.config().sample_rate_hz.max(1) as f64
    }

    /// Enable the paths for `mode` and park them on center. Foreground only.
    pub(crate) fn configure_output(&self, mode: OutputMode) {
        let mut driver = self.driver.lock();
        self.state.set_output_mode(mode);
        self.state.store_level(tonegen_core::CENTER_LEVEL);
        routing::select_output(&mut **driver, mode);
    }

    /// Exclusive driver access for the foreground; spins past an in-flight tick.
    pub(crate) fn lock_driver(&self) -> MutexGuard<'_, Box<dyn OutputDriver>> {
        self.driver.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rt_processing::routing::FrameRecorder;
    use crate::rt_processing::state::TransportState;
    use tonegen_core::CENTER_LEVEL;

    fn slot_with_recorder() -> (Arc<CallbackSlot>, FrameRecorder) {
        let recorder = FrameRecorder::new();
        let state = Arc::new(GeneratorState::default());
        let slot = Arc::new(CallbackSlot::new(state, Box::new(recorder.clone())));
        (slot, recorder)
    }

    #[test]
    fn tick_is_gated_by_transport() {
        let (slot, recorder) = slot_with_recorder();
        assert_eq!(slot.tick(), None);

        slot.state().set_transport(TransportState::Running);
        assert!(slot.tick().is_some());
        assert_eq!(slot.sample_count(), 1);

        slot.state().set_transport(TransportState::Suspended);
        assert_eq!(slot.tick(), None);
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn tick_skips_while_foreground_holds_driver() {
        let (slot, recorder) = slot_with_recorder();
        slot.state().set_transport(TransportState::Running);
        {
            let _guard = slot.lock_driver();
            assert_eq!(slot.tick(), None);
        }
        assert!(slot.tick().is_some());
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn configure_output_parks_on_center() {
        let (slot, recorder) = slot_with_recorder();
        slot.configure_output(OutputMode::SingleEndedB);
        assert_eq!(slot.state().output_mode(), OutputMode::SingleEndedB);
        assert_eq!(slot.held_frame().b, Some(CENTER_LEVEL));
        assert_eq!(recorder.frames().len(), 1);
        assert!(recorder.paths().b && !recorder.paths().a);
    }

    #[test]
    fn playback_time_follows_sample_count() {
        let (slot, _recorder) = slot_with_recorder();
        slot.state().set_transport(TransportState::Running);
        for _ in 0..40 {
            slot.tick();
        }
        assert!((slot.playback_time() - 0.001).abs() < 1e-12);
    }
}
