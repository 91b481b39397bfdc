//! Click-free mute and unmute.
//!
//! Suspending stops the mixer, then walks the held output level back to center
//! one unit per step so the outputs never jump. Resuming just re-enables the
//! mixer: every phase was zeroed on the way down, so all voices restart from
//! the same reference point instead of mid-cycle.

use std::time::Duration;

use quanta::Clock;
use tonegen_core::CENTER_LEVEL;

use super::callback::CallbackSlot;
use super::clock::busy_wait;
use super::state::TransportState;

pub struct SuspendController {
    clock: Clock,

    /// Delay between two one-unit ramp steps.
    step: Duration,
}

impl SuspendController {
    pub fn new(step: Duration) -> Self {
        Self {
            clock: Clock::new(),
            step,
        }
    }

    /// Ramp to center and disable sample production. Blocks until done and
    /// returns the number of ramp steps taken.
    ///
    /// Must not be called from the sample path: it waits out an in-flight tick.
    pub fn suspend(&self, slot: &CallbackSlot) -> u32 {
        let state = slot.state();
        if !state.is_running() && state.level() == CENTER_LEVEL {
            return 0;
        }

        state.set_transport(TransportState::RampingDown);
        let mut driver = slot.lock_driver();

        let mode = state.output_mode();
        let mut level = state.level();
        let mut steps = 0;
        while level != CENTER_LEVEL {
            if level > CENTER_LEVEL {
                level -= 1;
            } else {
                level += 1;
            }
            state.store_level(level);
            driver.write(mode.route(level));
            steps += 1;
            busy_wait(&self.clock, self.step);
        }

        state.bank().reset_phases();
        state.set_transport(TransportState::Suspended);
        log::debug!("suspended after {steps} ramp steps");
        steps
    }

    /// Re-enable sample production after a suspend. Non-blocking.
    pub fn resume(&self, slot: &CallbackSlot) {
        let state = slot.state();
        match state.transport() {
            TransportState::Suspended => {
                state.set_transport(TransportState::Running);
                log::debug!("resumed");
            }
            TransportState::Running => {}
            TransportState::Stopped => log::warn!("resume before begin ignored"),
            TransportState::RampingDown => log::warn!("resume while ramping down ignored"),
        }
    }
}

impl Default for SuspendController {
    fn default() -> Self {
        Self::new(Duration::from_micros(8))
    }
}
