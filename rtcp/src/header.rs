use bytes::{Buf, BufMut};
use util::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::error::{Error, Result};

pub const HEADER_LENGTH: usize = 4;
const VERSION_SHIFT: u8 = 6;
const VERSION_MASK: u8 = 0x3;
const PADDING_SHIFT: u8 = 5;
const PADDING_MASK: u8 = 0x1;
const COUNT_MASK: u8 = 0x1f;
const RTP_VERSION: u8 = 2;

/// FORMAT_TLN is the feedback message type (FMT) for TransportLayerNack,
/// overloading the header's `count` field (RFC 4585 §6.2.1).
pub const FORMAT_TLN: u8 = 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    Unsupported = 0,
    TransportSpecificFeedback = 205,
}

impl Default for PacketType {
    fn default() -> Self {
        PacketType::Unsupported
    }
}

impl From<u8> for PacketType {
    fn from(b: u8) -> Self {
        match b {
            205 => PacketType::TransportSpecificFeedback,
            _ => PacketType::Unsupported,
        }
    }
}

/// Header is the common 4-byte header shared by all RTCP packets (RFC 3550
/// §6.1), trimmed to the one packet type this crate implements.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct Header {
    pub padding: bool,
    pub count: u8,
    pub packet_type: PacketType,
    pub length: u16,
}

impl MarshalSize for Header {
    fn marshal_size(&self) -> usize {
        HEADER_LENGTH
    }
}

impl Marshal for Header {
    fn marshal_to(&self, buf: &mut bytes::BytesMut) -> Result<usize> {
        if buf.len() < HEADER_LENGTH {
            return Err(Error::Util(util::Error::BufferTooShort));
        }

        let mut b0 = (RTP_VERSION << VERSION_SHIFT) | (self.count & COUNT_MASK);
        if self.padding {
            b0 |= 1 << PADDING_SHIFT;
        }

        let mut out = bytes::BytesMut::with_capacity(HEADER_LENGTH);
        out.put_u8(b0);
        out.put_u8(self.packet_type as u8);
        out.put_u16(self.length);

        buf[..HEADER_LENGTH].copy_from_slice(&out);
        Ok(HEADER_LENGTH)
    }
}

impl Unmarshal for Header {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        if raw_packet.remaining() < HEADER_LENGTH {
            return Err(Error::InvalidHeader);
        }

        let b0 = raw_packet.get_u8();
        let padding = (b0 >> PADDING_SHIFT) & PADDING_MASK != 0;
        let count = b0 & COUNT_MASK;
        let packet_type = PacketType::from(raw_packet.get_u8());
        let length = raw_packet.get_u16();

        Ok(Header {
            padding,
            count,
            packet_type,
            length,
        })
    }
}
