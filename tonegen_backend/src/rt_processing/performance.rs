//! Sample-path deadline accounting.
//!
//! Counters are plain atomics so the clock thread can record without locking;
//! snapshots are read and logged from the foreground.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use quanta::{Clock, Instant};

/// Snapshot of sample-path timing, for logging off the real-time path.
#[derive(Debug, Clone)]
pub struct DeadlineSnapshot {
    /// Sample periods in which the mixer ran.
    pub tick_count: u64,
    /// Periods whose deadline had already passed when the tick finished.
    pub missed_deadlines: u64,
    /// Cheapest tick observed (ns).
    pub min_tick_nanos: Option<u64>,
    /// Most expensive tick observed (ns).
    pub max_tick_nanos: Option<u64>,
    /// EMA of tick cost in nanoseconds.
    pub ema_tick_nanos: f64,
    /// Length of one sample period (ns).
    pub period_nanos: f64,
    /// EMA tick cost as a share of the period.
    pub avg_load_percent: f64,
}

impl fmt::Display for DeadlineSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks, {} missed, max {} ns, load {:.1}%",
            self.tick_count,
            self.missed_deadlines,
            self.max_tick_nanos.unwrap_or(0),
            self.avg_load_percent
        )
    }
}

/// Real-time-safe monitor of the per-sample deadline.
///
/// On the sample path only use `scoped_tick()` and `record_missed_deadline()`;
/// both touch atomics only. `snapshot` belongs on a foreground thread.
pub struct DeadlineMonitor {
    clock: Clock,
    period_nanos: f64,

    tick_count: AtomicU64,
    missed_deadlines: AtomicU64,

    min_tick_nanos: AtomicU64,
    max_tick_nanos: AtomicU64,
    /// EMA stored as f64 bits
    ema_tick_bits: AtomicU64,

    ema_alpha: f64,
}

impl DeadlineMonitor {
    /// `ema_alpha` in (0, 1]; around 0.01 smooths over a few hundred samples.
    pub fn new(sample_rate_hz: u32, ema_alpha: f64) -> Self {
        assert!(ema_alpha > 0.0 && ema_alpha <= 1.0);
        Self {
            clock: Clock::new(),
            period_nanos: 1_000_000_000.0 / sample_rate_hz.max(1) as f64,
            tick_count: AtomicU64::new(0),
            missed_deadlines: AtomicU64::new(0),
            min_tick_nanos: AtomicU64::new(u64::MAX),
            max_tick_nanos: AtomicU64::new(0),
            ema_tick_bits: AtomicU64::new(0),
            ema_alpha,
        }
    }

    pub fn period(&self) -> Duration {
        Duration::from_nanos(self.period_nanos as u64)
    }

    #[inline(always)]
    pub fn record_missed_deadline(&self) {
        self.missed_deadlines.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one tick's cost. Updates min, max and EMA with CAS loops.
    #[inline(always)]
    pub fn record_tick_nanos(&self, nanos: u64) {
        self.tick_count.fetch_add(1, Ordering::Relaxed);
        self.min_tick_nanos.fetch_min(nanos, Ordering::Relaxed);
        self.max_tick_nanos.fetch_max(nanos, Ordering::Relaxed);

        // EMA_new = alpha * x + (1 - alpha) * EMA_old
        let alpha = self.ema_alpha;
        let mut old_bits = self.ema_tick_bits.load(Ordering::Relaxed);
        loop {
            let old = f64::from_bits(old_bits);
            let new = alpha * nanos as f64 + (1.0 - alpha) * old;
            match self.ema_tick_bits.compare_exchange_weak(
                old_bits,
                new.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(found) => old_bits = found,
            }
        }
    }

    /// Guard that records the tick cost when dropped.
    #[inline(always)]
    pub fn scoped_tick(&self) -> TickGuard<'_> {
        TickGuard {
            monitor: self,
            start: self.clock.now(),
        }
    }

    /// Read the counters. With `reset_peaks`, min/max/EMA start over afterwards.
    pub fn snapshot(&self, reset_peaks: bool) -> DeadlineSnapshot {
        let min_raw = self.min_tick_nanos.load(Ordering::Relaxed);
        let max_raw = self.max_tick_nanos.load(Ordering::Relaxed);
        let ema = f64::from_bits(self.ema_tick_bits.load(Ordering::Relaxed));

        if reset_peaks {
            self.min_tick_nanos.store(u64::MAX, Ordering::Relaxed);
            self.max_tick_nanos.store(0, Ordering::Relaxed);
            self.ema_tick_bits.store(0, Ordering::Relaxed);
        }

        DeadlineSnapshot {
            tick_count: self.tick_count.load(Ordering::Relaxed),
            missed_deadlines: self.missed_deadlines.load(Ordering::Relaxed),
            min_tick_nanos: (min_raw != u64::MAX).then_some(min_raw),
            max_tick_nanos: (max_raw != 0).then_some(max_raw),
            ema_tick_nanos: ema,
            period_nanos: self.period_nanos,
            avg_load_percent: if self.period_nanos > 0.0 { ema / self.period_nanos * 100.0 } else { 0.0 },
        }
    }

}

/// Records the elapsed time between construction and drop.
pub struct TickGuard<'a> {
    monitor: &'a DeadlineMonitor,
    start: Instant,
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        let elapsed = self.monitor.clock.now().saturating_duration_since(self.start);
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.monitor.record_tick_nanos(nanos);
    }
}
