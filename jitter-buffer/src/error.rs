use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error carries configuration mistakes only — `push`/`pop` themselves
/// never fail; loss is surfaced as a level-triggered callback, not an
/// error path.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    #[error("clock rate must be non-zero")]
    ZeroClockRate,
}
