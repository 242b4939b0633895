use bytes::{Buf, BufMut, BytesMut};
use util::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::error::{Error, Result};

const HEADER_LENGTH: usize = 12;
const VERSION_SHIFT: u8 = 6;
const VERSION_MASK: u8 = 0x3;
const PADDING_SHIFT: u8 = 5;
const PADDING_MASK: u8 = 0x1;
const EXTENSION_SHIFT: u8 = 4;
const EXTENSION_MASK: u8 = 0x1;
const CC_MASK: u8 = 0xF;
const MARKER_SHIFT: u8 = 7;
const MARKER_MASK: u8 = 0x1;
const PT_MASK: u8 = 0x7F;
const RTP_VERSION: u8 = 2;

/// Header is the fixed RTP header (RFC 3550 §5.1), trimmed to the fields
/// the jitter buffer and NACK interceptor consume: sequence number,
/// timestamp, SSRC and the marker bit. CSRC identifiers round-trip through
/// marshal/unmarshal so the header size stays wire-correct; header
/// extensions (RFC 8285) are skipped over rather than parsed, since
/// nothing in the core reads them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub version: u8,
    pub padding: bool,
    pub extension: bool,
    pub marker: bool,
    pub payload_type: u8,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    pub csrc: Vec<u32>,
}

impl MarshalSize for Header {
    fn marshal_size(&self) -> usize {
        HEADER_LENGTH + self.csrc.len() * 4
    }
}

impl Marshal for Header {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        if buf.len() < self.marshal_size() {
            return Err(Error::Util(util::Error::BufferTooShort));
        }

        let mut b0 = (RTP_VERSION << VERSION_SHIFT) | (self.csrc.len() as u8 & CC_MASK);
        if self.padding {
            b0 |= 1 << PADDING_SHIFT;
        }
        if self.extension {
            b0 |= 1 << EXTENSION_SHIFT;
        }

        let mut out = BytesMut::with_capacity(self.marshal_size());
        out.put_u8(b0);
        out.put_u8(((self.marker as u8) << MARKER_SHIFT) | (self.payload_type & PT_MASK));
        out.put_u16(self.sequence_number);
        out.put_u32(self.timestamp);
        out.put_u32(self.ssrc);
        for csrc in &self.csrc {
            out.put_u32(*csrc);
        }

        buf[..out.len()].copy_from_slice(&out);
        Ok(out.len())
    }
}

impl Unmarshal for Header {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        if raw_packet.remaining() < HEADER_LENGTH {
            return Err(Error::HeaderTooSmall);
        }

        let b0 = raw_packet.get_u8();
        let version = (b0 >> VERSION_SHIFT) & VERSION_MASK;
        if version != RTP_VERSION {
            return Err(Error::InvalidVersion(version));
        }
        let padding = (b0 >> PADDING_SHIFT) & PADDING_MASK != 0;
        let extension = (b0 >> EXTENSION_SHIFT) & EXTENSION_MASK != 0;
        let cc = (b0 & CC_MASK) as usize;

        let b1 = raw_packet.get_u8();
        let marker = (b1 >> MARKER_SHIFT) & MARKER_MASK != 0;
        let payload_type = b1 & PT_MASK;

        let sequence_number = raw_packet.get_u16();
        let timestamp = raw_packet.get_u32();
        let ssrc = raw_packet.get_u32();

        if raw_packet.remaining() < cc * 4 {
            return Err(Error::HeaderTooSmall);
        }
        let mut csrc = Vec::with_capacity(cc);
        for _ in 0..cc {
            csrc.push(raw_packet.get_u32());
        }

        if extension {
            if raw_packet.remaining() < 4 {
                return Err(Error::HeaderExtensionTooShort);
            }
            let _profile = raw_packet.get_u16();
            let len_words = raw_packet.get_u16() as usize;
            if raw_packet.remaining() < len_words * 4 {
                return Err(Error::HeaderExtensionTooShort);
            }
            raw_packet.advance(len_words * 4);
        }

        Ok(Header {
            version,
            padding,
            extension,
            marker,
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
            csrc,
        })
    }
}

#[cfg(test)]
mod test {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn test_basic_header_round_trip() {
        let header = Header {
            version: RTP_VERSION,
            marker: true,
            payload_type: 96,
            sequence_number: 27023,
            timestamp: 3653407706,
            ssrc: 476325762,
            ..Default::default()
        };

        let raw = header.marshal().expect("marshal");
        let decoded = Header::unmarshal(&mut raw.clone()).expect("unmarshal");
        assert_eq!(header, decoded);

        let mut b: Bytes = raw;
        assert_eq!(b.remaining(), header.marshal_size());
    }

    #[test]
    fn test_rejects_wrong_version() {
        let data = [0x70u8, 0x60, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1];
        let mut buf = Bytes::copy_from_slice(&data);
        let err = Header::unmarshal(&mut buf).unwrap_err();
        assert_eq!(err, Error::InvalidVersion(1));
    }

    #[test]
    fn test_too_short() {
        let data = [0x80u8, 0x60, 0, 1];
        let mut buf = Bytes::copy_from_slice(&data);
        assert_eq!(Header::unmarshal(&mut buf).unwrap_err(), Error::HeaderTooSmall);
    }
}
