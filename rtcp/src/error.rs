use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    #[error("packet contains an invalid header")]
    InvalidHeader,
    #[error("packet is shorter than its declared length")]
    PacketTooShort,
    #[error("{0}")]
    Util(#[from] util::Error),
}
