use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error is the common wire-level error type shared by the `rtp` and `rtcp`
/// crates.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    #[error("buffer too short")]
    BufferTooShort,
    #[error("marshal_to output size {0}, but expect {1}")]
    UnexpectedMarshalSize(usize, usize),
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn other(message: impl Into<String>) -> Self {
        Error::Other(message.into())
    }
}
