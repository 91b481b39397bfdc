use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use crossbeam::atomic::AtomicCell;
use tonegen_core::{GeneratorConfig, VOICE_COUNT, WaveformKind};

use super::tables::{table_for, table_index};

/// One phase-accumulator tone source.
///
/// Every field is its own atomic: the foreground writes a field as one unit and
/// the sample path sees the latest committed value of each field it reads.
/// Two fields changed back to back may be observed one sample apart.
#[derive(Debug, Default)]
pub struct Voice {
    phase: AtomicU32,
    tuning_word: AtomicU32,
    waveform: AtomicCell<WaveformKind>,
    amplitude: AtomicU8,
}

impl Voice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the phase and return this voice's scaled contribution.
    ///
    /// Fixed cost, no branches on input validity.
    #[inline(always)]
    pub fn next_sample(&self) -> i32 {
        let step = self.tuning_word.load(Ordering::Relaxed);
        // Only the sample path writes the phase; the foreground resets it while production is gated.
        let phase = self.phase.load(Ordering::Relaxed).wrapping_add(step);
        self.phase.store(phase, Ordering::Relaxed);

        let raw = table_for(self.waveform.load())[table_index(phase)] as i32;
        // arithmetic shift keeps the sign: full scale times amplitude / 256
        (raw * self.amplitude.load(Ordering::Relaxed) as i32) >> 8
    }

    pub fn set_waveform(&self, kind: WaveformKind) {
        self.waveform.store(kind);
    }

    pub fn set_tuning_word(&self, word: u32) {
        self.tuning_word.store(word, Ordering::Relaxed);
    }

    pub fn set_amplitude(&self, amplitude: u8) {
        self.amplitude.store(amplitude, Ordering::Relaxed);
    }

    pub fn reset_phase(&self) {
        self.phase.store(0, Ordering::Relaxed);
    }

    pub fn waveform(&self) -> WaveformKind {
        self.waveform.load()
    }

    pub fn tuning_word(&self) -> u32 {
        self.tuning_word.load(Ordering::Relaxed)
    }

    pub fn amplitude(&self) -> u8 {
        self.amplitude.load(Ordering::Relaxed)
    }

    pub fn phase(&self) -> u32 {
        self.phase.load(Ordering::Relaxed)
    }

    /// Largest magnitude this voice can add to the mix at its current amplitude.
    pub fn peak_contribution(&self) -> i32 {
        (128 * self.amplitude() as i32) >> 8
    }
}

/// The four voices, indexed 0..=3 for the life of the generator.
#[derive(Debug, Default)]
pub struct OscillatorBank {
    voices: [Voice; VOICE_COUNT],
}

impl OscillatorBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    pub fn voices(&self) -> &[Voice; VOICE_COUNT] {
        &self.voices
    }

    /// Assign every voice its shape; raw ids outside the known set become sine.
    pub fn configure_waveforms(&self, kinds: [WaveformKind; VOICE_COUNT]) {
        for (voice, kind) in self.voices.iter().zip(kinds) {
            voice.set_waveform(kind);
        }
    }

    /// Store the tuning word for `frequency_hz`. Returns `false` for a voice id
    /// outside the bank, in which case nothing is written.
    ///
    /// No range check on the frequency: anything that aliases above Nyquist is
    /// the caller's business.
    pub fn set_frequency(&self, voice: usize, frequency_hz: f32, config: &GeneratorConfig) -> bool {
        match self.voices.get(voice) {
            Some(v) => {
                v.set_tuning_word(config.tuning_word(frequency_hz));
                true
            }
            None => false,
        }
    }

    pub fn set_volume(&self, amplitudes: [u8; VOICE_COUNT]) {
        for (voice, amplitude) in self.voices.iter().zip(amplitudes) {
            voice.set_amplitude(amplitude);
        }
    }

    pub fn reset_phases(&self) {
        self.voices.iter().for_each(Voice::reset_phase);
    }

    /// Worst-case summed excursion around the center at the current amplitudes.
    pub fn peak_excursion(&self) -> i32 {
        self.voices.iter().map(Voice::peak_contribution).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rt_processing::waveform::tables::get_square_table;

    #[test]
    fn phase_wraps_modulo_2_pow_32() {
        let voice = Voice::new();
        let step = 0x9E37_79B9u32;
        voice.set_tuning_word(step);
        for _ in 0..1000 {
            voice.next_sample();
        }
        assert_eq!(voice.phase(), step.wrapping_mul(1000));
    }

    #[test]
    fn silent_voice_contributes_nothing() {
        let voice = Voice::new();
        voice.set_waveform(WaveformKind::Square);
        voice.set_tuning_word(1 << 24);
        assert!((0..512).all(|_| voice.next_sample() == 0));
    }

    #[test]
    fn full_amplitude_scales_by_255_over_256() {
        let voice = Voice::new();
        voice.set_waveform(WaveformKind::Square);
        voice.set_amplitude(255);
        voice.set_tuning_word(1 << 24);
        let square = get_square_table();
        for step in 1..=256usize {
            let expected = (square[step % 256] as i32 * 255) >> 8;
            assert_eq!(voice.next_sample(), expected);
        }
        // -128 * 255 / 256 floors toward negative infinity
        assert_eq!((-128i32 * 255) >> 8, -128);
    }

    #[test]
    fn configure_waveforms_assigns_each_voice() {
        let bank = OscillatorBank::new();
        bank.configure_waveforms([
            WaveformKind::Ramp,
            WaveformKind::from_id(7),
            WaveformKind::Square,
            WaveformKind::Sine,
        ]);
        assert_eq!(bank.voice(0).unwrap().waveform(), WaveformKind::Ramp);
        assert_eq!(bank.voice(1).unwrap().waveform(), WaveformKind::Sine);
        assert_eq!(bank.voice(2).unwrap().waveform(), WaveformKind::Square);
    }

    #[test]
    fn set_frequency_ignores_unknown_voice() {
        let bank = OscillatorBank::new();
        let config = GeneratorConfig::default();
        assert!(bank.set_frequency(3, 440.0, &config));
        assert!(!bank.set_frequency(4, 440.0, &config));
        assert_eq!(bank.voice(3).unwrap().tuning_word(), config.tuning_word(440.0));
    }

    #[test]
    fn reset_phases_zeroes_every_voice() {
        let bank = OscillatorBank::new();
        bank.set_frequency(0, 1000.0, &GeneratorConfig::default());
        bank.set_frequency(2, 300.0, &GeneratorConfig::default());
        for voice in bank.voices() {
            voice.next_sample();
        }
        bank.reset_phases();
        assert!(bank.voices().iter().all(|v| v.phase() == 0));
    }

    #[test]
    fn peak_excursion_sums_amplitudes() {
        let bank = OscillatorBank::new();
        bank.set_volume([255, 255, 0, 0]);
        assert_eq!(bank.peak_excursion(), 127 * 2);
        bank.set_volume([60, 60, 60, 60]);
        assert_eq!(bank.peak_excursion(), 30 * 4);
    }
}
