use serde::{Deserialize, Serialize};
use std::fmt;

/// How the single mixed level is routed to the two physical output paths.
///
/// Raw ids use the classic numbering: 1 = differential, 2 = path A, 3 = path B.
/// Anything unrecognized resolves to [`OutputMode::SingleEndedA`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OutputMode {
    Differential = 1,
    #[default]
    SingleEndedA = 2,
    SingleEndedB = 3,
}

impl OutputMode {
    pub fn from_id(id: u8) -> Self {
        match id {
            1 => OutputMode::Differential,
            3 => OutputMode::SingleEndedB,
            _ => OutputMode::SingleEndedA,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "b" | "single-b" | "single_ended_b" => OutputMode::SingleEndedB,
            "diff" | "differential" => OutputMode::Differential,
            _ => OutputMode::SingleEndedA,
        }
    }

    /// Physical paths the output driver has to enable for this mode.
    pub fn paths(self) -> OutputPaths {
        match self {
            OutputMode::SingleEndedA => OutputPaths { a: true, b: false },
            OutputMode::SingleEndedB => OutputPaths { a: false, b: true },
            OutputMode::Differential => OutputPaths { a: true, b: true },
        }
    }

    /// Spread one level over the active paths.
    ///
    /// Differential drives path B with the complementary level so the pair
    /// swings twice as far as a single path. The complement is taken around
    /// 255, as an inverted PWM compare output does, so at the silent center
    /// path B rests at 128, one step above path A. The bridged swing is still
    /// zero only up to that one-step offset.
    #[inline(always)]
    pub fn route(self, level: u8) -> OutputFrame {
        match self {
            OutputMode::SingleEndedA => OutputFrame { a: Some(level), b: None },
            OutputMode::SingleEndedB => OutputFrame { a: None, b: Some(level) },
            OutputMode::Differential => OutputFrame { a: Some(level), b: Some(u8::MAX - level) },
        }
    }
}

impl From<u8> for OutputMode {
    fn from(id: u8) -> Self {
        OutputMode::from_id(id)
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::SingleEndedA => write!(f, "single-ended A"),
            OutputMode::SingleEndedB => write!(f, "single-ended B"),
            OutputMode::Differential => write!(f, "differential"),
        }
    }
}

/// Which output paths are driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputPaths {
    pub a: bool,
    pub b: bool,
}

/// Levels for one sample period; `None` for a path the current mode leaves idle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputFrame {
    pub a: Option<u8>,
    pub b: Option<u8>,
}

impl OutputFrame {
    /// Effective signed swing of the frame around the center.
    ///
    /// For differential output this is the difference of the two paths, which
    /// is what a load bridged across both pins sees.
    pub fn swing(&self) -> i32 {
        match (self.a, self.b) {
            (Some(a), Some(b)) => a as i32 - b as i32,
            (Some(level), None) | (None, Some(level)) => level as i32 - crate::CENTER_LEVEL as i32,
            (None, None) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CENTER_LEVEL;

    #[test]
    fn unknown_mode_falls_back_to_path_a() {
        assert_eq!(OutputMode::from_id(0), OutputMode::SingleEndedA);
        assert_eq!(OutputMode::from_id(42), OutputMode::SingleEndedA);
        assert_eq!(OutputMode::from_id(1), OutputMode::Differential);
        assert_eq!(OutputMode::from_id(3), OutputMode::SingleEndedB);
        assert_eq!(OutputMode::default(), OutputMode::SingleEndedA);
    }

    #[test]
    fn paths_follow_mode() {
        assert_eq!(OutputMode::SingleEndedA.paths(), OutputPaths { a: true, b: false });
        assert_eq!(OutputMode::SingleEndedB.paths(), OutputPaths { a: false, b: true });
        assert_eq!(OutputMode::Differential.paths(), OutputPaths { a: true, b: true });
    }

    #[test]
    fn differential_is_complementary() {
        let frame = OutputMode::Differential.route(200);
        assert_eq!(frame, OutputFrame { a: Some(200), b: Some(55) });

        let single = OutputMode::SingleEndedA.route(200);
        // Bridged across both pins, differential doubles the swing of one path.
        assert!(frame.swing() > single.swing());
        assert_eq!(single.swing(), 200 - CENTER_LEVEL as i32);
    }

    #[test]
    fn differential_center_offsets_b_by_one_step() {
        let frame = OutputMode::Differential.route(CENTER_LEVEL);
        assert_eq!(frame, OutputFrame { a: Some(127), b: Some(128) });
        assert_eq!(frame.swing(), -1);
    }

    #[test]
    fn single_ended_b_leaves_a_idle() {
        let frame = OutputMode::SingleEndedB.route(10);
        assert_eq!(frame.a, None);
        assert_eq!(frame.b, Some(10));
    }
}
