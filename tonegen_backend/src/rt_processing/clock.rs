//! Software sample clocks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use quanta::Clock;
use spin::RwLock;
use tonegen_core::{OutputFrame, ToneError, ToneResult};

use super::callback::{CallbackSlot, SampleClock};
use super::performance::{DeadlineMonitor, DeadlineSnapshot};

/// Spin until `duration` has passed on `clock`.
pub(crate) fn busy_wait(clock: &Clock, duration: Duration) {
    if duration.is_zero() {
        return;
    }
    let start = clock.now();
    while clock.now().saturating_duration_since(start) < duration {
        std::hint::spin_loop();
    }
}

/// Clock stepped by the caller, one sample per [`ManualClock::tick`].
///
/// Cloning yields another handle to the same clock, so a copy can be kept
/// after handing one to the generator.
#[derive(Clone, Default)]
pub struct ManualClock {
    slot: Arc<RwLock<Option<Arc<CallbackSlot>>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.slot.read().is_some()
    }

    /// Run one sample period. `None` while detached or while production is disabled.
    pub fn tick(&self) -> Option<OutputFrame> {
        self.slot.read().as_ref()?.tick()
    }

    /// Run `periods` sample periods and collect the frames produced.
    pub fn run(&self, periods: usize) -> Vec<OutputFrame> {
        (0..periods).filter_map(|_| self.tick()).collect()
    }
}

impl SampleClock for ManualClock {
    fn start(&mut self, slot: Arc<CallbackSlot>) -> ToneResult<()> {
        *self.slot.write() = Some(slot);
        Ok(())
    }

    fn stop(&mut self) {
        self.slot.write().take();
    }
}

/// Dedicated thread paced at the sample rate by a busy-wait on a quanta clock.
///
/// Burns one core. A late tick is counted as a missed deadline and the
/// schedule restarts from now rather than bursting to catch up.
pub struct ThreadedClock {
    sample_rate_hz: u32,

    /// Set by `stop`; the thread checks it once per period.
    shutdown: Arc<AtomicBool>,

    handle: Option<JoinHandle<()>>,

    /// Shared with the clock thread.
    monitor: Arc<DeadlineMonitor>,
}

impl ThreadedClock {
    pub fn new(sample_rate_hz: u32) -> Self {
        Self {
            sample_rate_hz,
            shutdown: Arc::new(AtomicBool::new(false)),
            handle: None,
            monitor: Arc::new(DeadlineMonitor::new(sample_rate_hz, 0.01)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn deadline_snapshot(&self, reset_peaks: bool) -> DeadlineSnapshot {
        self.monitor.snapshot(reset_peaks)
    }

    pub fn monitor(&self) -> Arc<DeadlineMonitor> {
        Arc::clone(&self.monitor)
    }
}

impl SampleClock for ThreadedClock {
    fn start(&mut self, slot: Arc<CallbackSlot>) -> ToneResult<()> {
        if self.handle.is_some() {
            return Ok(());
        }
        if self.sample_rate_hz == 0 {
            return Err(ToneError::ClockStart("sample rate must be non-zero".into()));
        }

        let period = Duration::from_secs_f64(1.0 / self.sample_rate_hz as f64);
        let shutdown = Arc::clone(&self.shutdown);
        let monitor = Arc::clone(&self.monitor);
        shutdown.store(false, Ordering::Relaxed);

        let handle = thread::Builder::new()
            .name("tonegen-sample-clock".into())
            .spawn(move || {
                let clock = Clock::new();
                let mut deadline = clock.now() + period;
                while !shutdown.load(Ordering::Relaxed) {
                    if slot.is_enabled() {
                        let _tick = monitor.scoped_tick();
                        slot.tick();
                    }

                    let now = clock.now();
                    if now > deadline {
                        monitor.record_missed_deadline();
                        deadline = now + period;
                        continue;
                    }
                    while clock.now() < deadline {
                        std::hint::spin_loop();
                    }
                    deadline = deadline + period;
                }
            })
            .map_err(|e| ToneError::ClockStart(e.to_string()))?;

        log::info!("sample clock thread started at {} Hz", self.sample_rate_hz);
        self.handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.shutdown.store(true, Ordering::Relaxed);
        if handle.join().is_err() {
            log::error!("sample clock thread panicked");
        }
        let snapshot = self.monitor.snapshot(false);
        if snapshot.missed_deadlines > 0 {
            log::warn!("sample clock stopped: {snapshot}");
        } else {
            log::info!("sample clock stopped: {snapshot}");
        }
    }
}

impl Drop for ThreadedClock {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rt_processing::routing::NullDriver;
    use crate::rt_processing::state::{GeneratorState, TransportState};

    fn running_slot() -> Arc<CallbackSlot> {
        let state = Arc::new(GeneratorState::default());
        state.set_transport(TransportState::Running);
        Arc::new(CallbackSlot::new(state, Box::new(NullDriver)))
    }

    #[test]
    fn manual_clock_ticks_only_when_attached() {
        let mut clock = ManualClock::new();
        assert_eq!(clock.tick(), None);

        let handle = clock.clone();
        clock.start(running_slot()).unwrap();
        assert!(handle.is_attached());
        assert_eq!(handle.run(10).len(), 10);

        clock.stop();
        assert!(!handle.is_attached());
        assert!(handle.run(10).is_empty());
    }

    #[test]
    fn threaded_clock_produces_samples() {
        let slot = running_slot();
        let mut clock = ThreadedClock::new(40_000);
        clock.start(Arc::clone(&slot)).unwrap();
        thread::sleep(Duration::from_millis(20));
        clock.stop();

        assert!(!clock.is_running());
        assert!(slot.sample_count() > 0);
        assert!(clock.deadline_snapshot(false).tick_count > 0);
    }

    #[test]
    fn threaded_clock_rejects_zero_rate() {
        let mut clock = ThreadedClock::new(0);
        assert!(matches!(clock.start(running_slot()), Err(ToneError::ClockStart(_))));
    }

    #[test]
    fn busy_wait_waits_at_least_duration() {
        let clock = Clock::new();
        let start = clock.now();
        busy_wait(&clock, Duration::from_micros(200));
        assert!(clock.now().saturating_duration_since(start) >= Duration::from_micros(200));
    }
}
