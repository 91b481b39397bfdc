//! Host sound device as sample clock and output stage.

pub mod enumeration;
pub mod host_output;
pub mod negotiation;

pub use enumeration::{DeviceEnumerator, DeviceInfo, EnumError};
pub use host_output::HostClock;
pub use negotiation::{ConfigNegotiator, ConfigurationRequest, NegotiationError, SampleRatePriority};

use tonegen_core::ToneError;

impl From<EnumError> for ToneError {
    fn from(err: EnumError) -> Self {
        ToneError::Device(err.to_string())
    }
}

impl From<NegotiationError> for ToneError {
    fn from(err: NegotiationError) -> Self {
        ToneError::Device(err.to_string())
    }
}
