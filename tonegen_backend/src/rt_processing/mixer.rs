//! Per-sample mixing. Everything here runs on the sample path: fixed cost, no
//! locks, no allocation, no validity branches.

use tonegen_core::CENTER_LEVEL;

use super::state::GeneratorState;
use super::waveform::{OscillatorBank, Voice};

/// Advance all four voices once and bias their sum.
///
/// The sum is not clamped. A total outside the 8-bit range wraps, exactly like
/// the output register it feeds.
#[inline(always)]
pub fn mix(bank: &OscillatorBank, bias: u8) -> u8 {
    let sum: i32 = bank.voices().iter().map(Voice::next_sample).sum();
    (bias as i32 + sum) as u8
}

/// Produce the next output level and remember it as the held level.
#[inline(always)]
pub fn produce_sample(state: &GeneratorState) -> u8 {
    let level = mix(state.bank(), CENTER_LEVEL);
    state.store_level(level);
    level
}
