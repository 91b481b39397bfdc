use std::f64::consts::PI;
use std::sync::OnceLock;

use tonegen_core::{TABLE_LEN, WaveformKind};

/// One full cycle of a waveform as signed 8-bit samples.
pub type WaveTable = [i8; TABLE_LEN];

// Static lookup tables - built once, read-only afterwards
static SINE_TABLE: OnceLock<WaveTable> = OnceLock::new();
static SQUARE_TABLE: OnceLock<WaveTable> = OnceLock::new();
static RAMP_TABLE: OnceLock<WaveTable> = OnceLock::new();

/// Build all waveform tables.
///
/// Call from the foreground before sample production starts so the sample
/// path only ever sees initialized tables.
pub fn init_tables() {
    let _ = get_sine_table();
    let _ = get_square_table();
    let _ = get_ramp_table();
}

/// Sine, scaled to ±127.
pub fn get_sine_table() -> &'static WaveTable {
    SINE_TABLE.get_or_init(|| {
        std::array::from_fn(|i| {
            let phase = 2.0 * PI * i as f64 / TABLE_LEN as f64;
            (127.0 * phase.sin()).round() as i8
        })
    })
}

/// High for the first half cycle, low for the second.
pub fn get_square_table() -> &'static WaveTable {
    SQUARE_TABLE.get_or_init(|| {
        std::array::from_fn(|i| if i < TABLE_LEN / 2 { i8::MAX } else { i8::MIN })
    })
}

/// Linear rise from -128 to 127 over one cycle.
pub fn get_ramp_table() -> &'static WaveTable {
    RAMP_TABLE.get_or_init(|| std::array::from_fn(|i| (i as i32 - 128) as i8))
}

/// Table for `kind`.
#[inline(always)]
pub fn table_for(kind: WaveformKind) -> &'static WaveTable {
    match kind {
        WaveformKind::Square => get_square_table(),
        WaveformKind::Ramp => get_ramp_table(),
        WaveformKind::Sine => get_sine_table(),
    }
}

/// Table for a raw waveform id; unknown ids get the sine table.
pub fn table_for_id(id: u8) -> &'static WaveTable {
    table_for(WaveformKind::from_id(id))
}

/// Index into a table from the top 8 bits of a phase accumulator.
#[inline(always)]
pub fn table_index(phase: u32) -> usize {
    (phase >> 24) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_initialization() {
        init_tables();
        assert_eq!(get_sine_table().len(), TABLE_LEN);
        assert_eq!(get_square_table().len(), TABLE_LEN);
        assert_eq!(get_ramp_table().len(), TABLE_LEN);
    }

    #[test]
    fn test_sine_wave_properties() {
        let sine = get_sine_table();
        assert_eq!(sine[0], 0);
        assert_eq!(sine[64], 127);
        assert_eq!(sine[128], 0);
        assert_eq!(sine[192], -127);
        // odd symmetry around the half cycle
        for i in 1..128 {
            assert_eq!(sine[i], -sine[256 - i]);
        }
    }

    #[test]
    fn test_square_has_two_levels() {
        let square = get_square_table();
        assert!(square[..128].iter().all(|&s| s == 127));
        assert!(square[128..].iter().all(|&s| s == -128));
    }

    #[test]
    fn test_ramp_rises_linearly() {
        let ramp = get_ramp_table();
        assert_eq!(ramp[0], -128);
        assert_eq!(ramp[255], 127);
        assert!(ramp.windows(2).all(|w| w[1] as i16 - w[0] as i16 == 1));
    }

    #[test]
    fn test_unknown_id_resolves_to_sine() {
        assert!(std::ptr::eq(table_for_id(9), get_sine_table()));
        assert!(std::ptr::eq(table_for_id(1), get_square_table()));
        assert!(std::ptr::eq(table_for_id(2), get_ramp_table()));
    }

    #[test]
    fn test_index_uses_top_byte() {
        assert_eq!(table_index(0), 0);
        assert_eq!(table_index(0x00FF_FFFF), 0);
        assert_eq!(table_index(0x0100_0000), 1);
        assert_eq!(table_index(u32::MAX), 255);
    }
}
