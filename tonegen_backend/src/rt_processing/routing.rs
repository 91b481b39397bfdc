//! Output stage seam.
//!
//! - [`OutputDriver`] is what the generator writes levels into: PWM pins on a
//!   board, a sound device, or a recording.
//! - Path enabling happens once per `begin`; after that only `write` is called,
//!   from the sample path.
//! - [`FrameRecorder`] keeps every frame for offline rendering and tests.

use std::sync::Arc;

use spin::Mutex;
use tonegen_core::{CENTER_LEVEL, OutputFrame, OutputMode, OutputPaths};

/// Analog output stage that turns levels into voltage on physical paths.
///
/// `write` is called from the sample path and must return in bounded time
/// without blocking or allocating. `enable_paths` happens once, at `begin`.
pub trait OutputDriver: Send + 'static {
    fn enable_paths(&mut self, paths: OutputPaths);

    fn write(&mut self, frame: OutputFrame);
}

/// Enable the paths `mode` needs and park them on the center level.
pub fn select_output(driver: &mut dyn OutputDriver, mode: OutputMode) {
    driver.enable_paths(mode.paths());
    driver.write(mode.route(CENTER_LEVEL));
}

/// Driver for setups where the sample clock consumes the frames itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDriver;

impl OutputDriver for NullDriver {
    fn enable_paths(&mut self, _paths: OutputPaths) {}

    fn write(&mut self, _frame: OutputFrame) {}
}

/// Captures every frame written, for offline inspection.
///
/// Pushes into a `Vec`, so it allocates as it grows: fine for offline rendering
/// and tests, not for a hard real-time clock.
#[derive(Debug, Default, Clone)]
pub struct FrameRecorder {
    inner: Arc<Mutex<Recording>>,
}

#[derive(Debug, Default)]
struct Recording {
    paths: OutputPaths,
    frames: Vec<OutputFrame>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(frames: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Recording {
                paths: OutputPaths::default(),
                frames: Vec::with_capacity(frames),
            })),
        }
    }

    pub fn paths(&self) -> OutputPaths {
        self.inner.lock().paths
    }

    pub fn frames(&self) -> Vec<OutputFrame> {
        self.inner.lock().frames.clone()
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<OutputFrame> {
        std::mem::take(&mut self.inner.lock().frames)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OutputDriver for FrameRecorder {
    fn enable_paths(&mut self, paths: OutputPaths) {
        self.inner.lock().paths = paths;
    }

    fn write(&mut self, frame: OutputFrame) {
        self.inner.lock().frames.push(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_output_enables_paths_and_centers() {
        let recorder = FrameRecorder::new();
        let mut driver = recorder.clone();
        select_output(&mut driver, OutputMode::Differential);

        assert_eq!(recorder.paths(), OutputPaths { a: true, b: true });
        assert_eq!(
            recorder.frames(),
            vec![OutputFrame { a: Some(CENTER_LEVEL), b: Some(u8::MAX - CENTER_LEVEL) }]
        );
    }

    #[test]
    fn recorder_take_drains() {
        let mut recorder = FrameRecorder::with_capacity(4);
        recorder.write(OutputMode::SingleEndedB.route(3));
        assert_eq!(recorder.take().len(), 1);
        assert!(recorder.is_empty());
    }
}
