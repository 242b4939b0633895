//! Minimal RTCP codec: just enough of RFC 3550/4585 to carry a
//! `TransportLayerNack` feedback packet over the wire.

pub mod error;
pub mod header;
pub mod packet;
pub mod transport_feedbacks;
mod util;

pub use error::{Error, Result};
pub use packet::Packet;
pub use transport_feedbacks::transport_layer_nack::{
    nack_pairs_from_sequence_numbers, NackPair, TransportLayerNack,
};
