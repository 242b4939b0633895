use std::any::Any;
use std::fmt;

use util::marshal::{Marshal, Unmarshal};

use crate::header::Header;

/// Packet represents an RTCP packet: out-of-band statistics and control
/// information for an RTP session. The core only ever produces
/// `TransportLayerNack` packets, but the trait is kept general so a
/// `RtcpWriter` can accept a heterogeneous compound list
/// (`&[Box<dyn Packet + Send + Sync>]`).
pub trait Packet: Marshal + Unmarshal + fmt::Display + fmt::Debug {
    fn header(&self) -> Header;
    fn destination_ssrc(&self) -> Vec<u32>;
    fn raw_size(&self) -> usize;
    fn as_any(&self) -> &(dyn Any + Send + Sync);
}
