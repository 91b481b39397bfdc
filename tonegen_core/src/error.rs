use thiserror::Error;

pub type ToneResult<T> = Result<T, ToneError>;

/// Failures at the boundary with external collaborators.
///
/// The configuration calls and the sample path never fail; these only come
/// from validating a config or bringing up a sample clock / sound device.
#[derive(Debug, Error)]
pub enum ToneError {
    #[error("invalid generator config: {0}")]
    InvalidConfig(String),

    #[error("sample clock failed to start: {0}")]
    ClockStart(String),

    #[error("audio device error: {0}")]
    Device(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
