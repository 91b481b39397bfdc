use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ToneError, ToneResult};

/// 2^32, the modulus of every phase accumulator.
const PHASE_MODULUS: f64 = 4_294_967_296.0;

/// Runtime parameters of one generator instance.
///
/// Defaults describe the reference design: 40 kHz sampling derived from a
/// 16 MHz timer clock, 8 µs per ramp step when muting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Rate at which the sample clock invokes the mixer.
    pub sample_rate_hz: u32,
    /// Clock the sample timer divides down from.
    pub timer_clock_hz: u32,
    /// Delay between ramp steps while suspending.
    pub ramp_step_micros: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 40_000,
            timer_clock_hz: 16_000_000,
            ramp_step_micros: 8,
        }
    }
}

impl GeneratorConfig {
    pub fn with_sample_rate(mut self, sample_rate_hz: u32) -> Self {
        self.sample_rate_hz = sample_rate_hz;
        self
    }

    pub fn with_timer_clock(mut self, timer_clock_hz: u32) -> Self {
        self.timer_clock_hz = timer_clock_hz;
        self
    }

    pub fn with_ramp_step_micros(mut self, micros: u64) -> Self {
        self.ramp_step_micros = micros;
        self
    }

    /// Reject configs no sample clock could honor.
    ///
    /// A rate that does not divide the timer clock is accepted: the timer
    /// period gets rounded and every pitch is off by the same small ratio.
    pub fn validate(&self) -> ToneResult<()> {
        if self.sample_rate_hz == 0 {
            return Err(ToneError::InvalidConfig("sample rate must be non-zero".into()));
        }
        if self.sample_rate_hz > self.timer_clock_hz {
            return Err(ToneError::InvalidConfig(format!(
                "sample rate {} Hz exceeds timer clock {} Hz",
                self.sample_rate_hz, self.timer_clock_hz
            )));
        }
        if self.timer_clock_hz % self.sample_rate_hz != 0 {
            log::warn!(
                "sample rate {} Hz does not divide timer clock {} Hz; timer period rounds to {}",
                self.sample_rate_hz,
                self.timer_clock_hz,
                self.timer_divisor()
            );
        }
        Ok(())
    }

    /// Timer compare value producing the sample rate.
    pub fn timer_divisor(&self) -> u32 {
        self.timer_clock_hz / self.sample_rate_hz.max(1)
    }

    pub fn sample_period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.sample_rate_hz.max(1) as u64)
    }

    pub fn ramp_step(&self) -> Duration {
        Duration::from_micros(self.ramp_step_micros)
    }

    /// Smallest representable pitch step: sample rate / 2^32.
    pub fn frequency_resolution(&self) -> f64 {
        self.sample_rate_hz as f64 / PHASE_MODULUS
    }

    /// Phase increment per sample for `frequency_hz`.
    ///
    /// Rounded to nearest. Frequencies at or above the sample rate wrap modulo
    /// 2^32 like any other fixed-width value; negative or NaN input yields 0.
    pub fn tuning_word(&self, frequency_hz: f32) -> u32 {
        let word = (frequency_hz as f64 * PHASE_MODULUS / self.sample_rate_hz.max(1) as f64).round();
        // f64 -> u64 saturates below zero and for NaN; u64 -> u32 keeps the low 32 bits.
        (word as u64) as u32
    }

    /// Frequency actually produced by `tuning_word`.
    pub fn frequency_of(&self, tuning_word: u32) -> f64 {
        tuning_word as f64 * self.frequency_resolution()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_design() {
        let config = GeneratorConfig::default();
        assert_eq!(config.sample_rate_hz, 40_000);
        assert_eq!(config.timer_divisor(), 400);
        assert_eq!(config.ramp_step(), Duration::from_micros(8));
        assert_eq!(config.sample_period(), Duration::from_micros(25));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn tuning_word_rounds_to_nearest() {
        let config = GeneratorConfig::default();
        // 440 * 2^32 / 40000 = 47244640.0...
        let expected = (440.0f64 * 4_294_967_296.0 / 40_000.0).round() as u32;
        assert_eq!(config.tuning_word(440.0), expected);
        assert_eq!(config.tuning_word(0.0), 0);
        // fs / 256 advances exactly one table entry per sample.
        assert_eq!(config.tuning_word(156.25), 1 << 24);
    }

    #[test]
    fn tuning_word_wraps_at_sample_rate() {
        let config = GeneratorConfig::default();
        assert_eq!(config.tuning_word(40_000.0), 0);
        assert_eq!(config.tuning_word(40_000.0 + 156.25), 1 << 24);
        assert_eq!(config.tuning_word(-5.0), 0);
        assert_eq!(config.tuning_word(f32::NAN), 0);
    }

    #[test]
    fn frequency_round_trips_within_resolution() {
        let config = GeneratorConfig::default();
        let word = config.tuning_word(1234.5);
        assert!((config.frequency_of(word) - 1234.5).abs() <= config.frequency_resolution());
    }

    #[test]
    fn validate_rejects_impossible_rates() {
        assert!(GeneratorConfig::default().with_sample_rate(0).validate().is_err());
        assert!(
            GeneratorConfig::default()
                .with_sample_rate(20_000_000)
                .validate()
                .is_err()
        );
        // Non-divisor is only a warning.
        assert!(GeneratorConfig::default().with_sample_rate(44_100).validate().is_ok());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: GeneratorConfig = serde_json::from_str(r#"{"sample_rate_hz": 48000}"#).unwrap();
        assert_eq!(config.sample_rate_hz, 48_000);
        assert_eq!(config.ramp_step_micros, 8);
    }
}
