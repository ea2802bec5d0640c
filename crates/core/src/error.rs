/// Result alias that carries the custom [`SpectrumVizError`] type.
pub type Result<T> = std::result::Result<T, SpectrumVizError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum SpectrumVizError {
    /// Free-form error used where a dedicated variant would add nothing, for
    /// example failures reported by collaborator implementations the core
    /// only knows through a trait.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Failure while executing the spectral transform.
    #[error("spectral transform failed: {0}")]
    Fft(#[from] realfft::FftError),
    /// Failure reported by the playback sink.
    #[error("playback sink: {0}")]
    Sink(String),
}

impl SpectrumVizError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Creates an error describing a playback sink failure.
    pub fn sink<T: Into<String>>(msg: T) -> Self {
        Self::Sink(msg.into())
    }
}

impl From<&str> for SpectrumVizError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for SpectrumVizError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
