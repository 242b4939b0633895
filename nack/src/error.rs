use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("the scheduler's close channel was already taken")]
    AlreadyStarted,
    #[error("rtcp write failed: {0}")]
    Write(String),
}
