pub mod oscillators;
pub mod tables;

pub use oscillators::{OscillatorBank, Voice};
pub use tables::{WaveTable, init_tables, table_for, table_for_id};
