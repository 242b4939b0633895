use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    #[error("packet is too short to contain an RTP header")]
    HeaderTooSmall,
    #[error("invalid RTP version {0}, expected 2")]
    InvalidVersion(u8),
    #[error("header extension declared but payload is too short to contain it")]
    HeaderExtensionTooShort,
    #[error("{0}")]
    Util(#[from] util::Error),
}
