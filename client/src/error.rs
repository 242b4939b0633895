use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("nack scheduler: {0}")]
    NackScheduler(#[from] nack::Error),
    #[error("jitter buffer: {0}")]
    JitterBuffer(#[from] jitter_buffer::Error),
}
