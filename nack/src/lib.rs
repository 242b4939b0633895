#![warn(rust_2018_idioms)]

//! A NACK-generating RTCP interceptor: watches a received RTP sequence
//! number stream for gaps and assembles RFC 4585 `TransportLayerNack`
//! feedback packets, throttled by RTT so a loss is never re-requested
//! before the previous request could plausibly have been answered.

pub mod error;
mod generator;
mod window;

pub use error::Error;
pub use generator::{NackGenerator, NackGeneratorBuilder, RtcpWriter, SchedulerHandle};

#[cfg(test)]
mod test;
