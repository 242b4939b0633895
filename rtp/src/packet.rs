use bytes::{Buf, Bytes, BytesMut};
use util::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::error::Result;
use crate::header::Header;

/// Packet represents an RTP packet: a fixed header plus an opaque payload.
/// `Raw` is intentionally not retained — callers that need the original
/// bytes keep them separately; the jitter buffer and NACK interceptor only
/// ever need the parsed header plus the payload slice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Packet {
    pub header: Header,
    pub payload: Bytes,
}

impl MarshalSize for Packet {
    fn marshal_size(&self) -> usize {
        self.header.marshal_size() + self.payload.len()
    }
}

impl Marshal for Packet {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        let n = self.header.marshal_to(buf)?;
        buf[n..n + self.payload.len()].copy_from_slice(&self.payload);
        Ok(n + self.payload.len())
    }
}

impl Unmarshal for Packet {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        let header = Header::unmarshal(raw_packet)?;
        let payload = raw_packet.copy_to_bytes(raw_packet.remaining());
        Ok(Packet { header, payload })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_packet_round_trip() {
        let packet = Packet {
            header: Header {
                version: 2,
                marker: true,
                payload_type: 96,
                sequence_number: 100,
                timestamp: 1000,
                ssrc: 0x1234,
                ..Default::default()
            },
            payload: Bytes::from_static(&[1, 2, 3, 4]),
        };

        let raw = packet.marshal().expect("marshal");
        let decoded = Packet::unmarshal(&mut raw.clone()).expect("unmarshal");
        assert_eq!(packet, decoded);
    }
}
