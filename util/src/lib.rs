#![warn(rust_2018_idioms)]

pub mod error;
pub mod marshal;
pub mod sync;

pub use error::Error;
pub use marshal::{Marshal, MarshalSize, Unmarshal};
