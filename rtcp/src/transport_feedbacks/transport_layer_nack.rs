use std::any::Any;
use std::fmt;

use bytes::{Buf, BufMut, BytesMut};
use util::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::error::{Error, Result};
use crate::header::{Header, PacketType, FORMAT_TLN, HEADER_LENGTH};
use crate::packet::Packet;
use crate::util::get_padding_size;

/// PacketBitmap is the "next sixteen losses" bitmap of a [`NackPair`].
type PacketBitmap = u16;

/// NackPair is the wire representation of one run of lost RTP sequence
/// numbers: a base `packet_id` plus a bitmap of up to 16 further losses
/// immediately following it (RFC 4585 §6.2.1).
#[derive(Debug, PartialEq, Eq, Default, Clone, Copy)]
pub struct NackPair {
    pub packet_id: u16,
    pub lost_packets: PacketBitmap,
}

impl NackPair {
    pub fn new(seq: u16) -> Self {
        Self {
            packet_id: seq,
            lost_packets: 0,
        }
    }

    /// Returns every sequence number expressed by this pair, base first.
    pub fn packet_list(&self) -> Vec<u16> {
        self.into_iter().collect()
    }
}

pub struct NackIterator {
    packet_id: u16,
    bitfield: PacketBitmap,
    has_yielded_packet_id: bool,
}

impl Iterator for NackIterator {
    type Item = u16;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_yielded_packet_id {
            self.has_yielded_packet_id = true;
            return Some(self.packet_id);
        }

        let mut i = 0;
        while self.bitfield != 0 {
            if (self.bitfield & (1 << i)) != 0 {
                self.bitfield &= !(1 << i);
                return Some(self.packet_id.wrapping_add(i + 1));
            }
            i += 1;
        }
        None
    }
}

impl IntoIterator for NackPair {
    type Item = u16;
    type IntoIter = NackIterator;

    fn into_iter(self) -> Self::IntoIter {
        NackIterator {
            packet_id: self.packet_id,
            bitfield: self.lost_packets,
            has_yielded_packet_id: false,
        }
    }
}

/// Groups a sorted slice of missing sequence numbers into `NackPair`s: a
/// base sequence number plus a bitmap of up to 16 more losses immediately
/// following it. A run that can't fit the next loss in 16 bits starts a
/// new pair.
pub fn nack_pairs_from_sequence_numbers(seq_nos: &[u16]) -> Vec<NackPair> {
    if seq_nos.is_empty() {
        return vec![];
    }

    let mut nack_pair = NackPair::new(seq_nos[0]);
    let mut pairs = vec![];

    for &seq in seq_nos.iter().skip(1) {
        if seq == nack_pair.packet_id {
            continue;
        }
        if seq <= nack_pair.packet_id || seq > nack_pair.packet_id.saturating_add(16) {
            pairs.push(nack_pair);
            nack_pair = NackPair::new(seq);
            continue;
        }

        // Safe: the checks above guarantee seq > nack_pair.packet_id.
        nack_pair.lost_packets |= 1 << (seq - nack_pair.packet_id - 1);
    }
    pairs.push(nack_pair);

    pairs
}

const NACK_OFFSET: usize = 8;

/// TransportLayerNack informs the sender about the loss of one or more
/// transport (RTP) packets (RFC 4585 §6.2.1).
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct TransportLayerNack {
    pub sender_ssrc: u32,
    pub media_ssrc: u32,
    pub nacks: Vec<NackPair>,
}

impl fmt::Display for TransportLayerNack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TransportLayerNack from {:x}", self.sender_ssrc)?;
        writeln!(f, "\tMedia Ssrc {:x}", self.media_ssrc)?;
        writeln!(f, "\tID\tLostPackets")?;
        for nack in &self.nacks {
            writeln!(f, "\t{}\t{:b}", nack.packet_id, nack.lost_packets)?;
        }
        Ok(())
    }
}

impl Packet for TransportLayerNack {
    fn header(&self) -> Header {
        Header {
            padding: get_padding_size(self.raw_size()) != 0,
            count: FORMAT_TLN,
            packet_type: PacketType::TransportSpecificFeedback,
            length: ((self.marshal_size() / 4) - 1) as u16,
        }
    }

    fn destination_ssrc(&self) -> Vec<u32> {
        vec![self.media_ssrc]
    }

    fn raw_size(&self) -> usize {
        HEADER_LENGTH + NACK_OFFSET + self.nacks.len() * 4
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}

impl MarshalSize for TransportLayerNack {
    fn marshal_size(&self) -> usize {
        let l = self.raw_size();
        l + get_padding_size(l)
    }
}

impl Marshal for TransportLayerNack {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        if buf.len() < self.marshal_size() {
            return Err(Error::Util(util::Error::BufferTooShort));
        }

        let header = self.header();
        let mut out = BytesMut::with_capacity(self.marshal_size());
        let mut header_buf = BytesMut::zeroed(HEADER_LENGTH);
        header.marshal_to(&mut header_buf)?;
        out.put(&header_buf[..]);

        out.put_u32(self.sender_ssrc);
        out.put_u32(self.media_ssrc);
        for nack in &self.nacks {
            out.put_u16(nack.packet_id);
            out.put_u16(nack.lost_packets);
        }

        let padding = get_padding_size(self.raw_size());
        for i in 0..padding {
            if i == padding - 1 {
                out.put_u8(padding as u8);
            } else {
                out.put_u8(0);
            }
        }

        buf[..out.len()].copy_from_slice(&out);
        Ok(out.len())
    }
}

impl Unmarshal for TransportLayerNack {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_packet.remaining() < HEADER_LENGTH + NACK_OFFSET {
            return Err(Error::PacketTooShort);
        }

        let header = Header::unmarshal(raw_packet)?;
        if header.packet_type != PacketType::TransportSpecificFeedback || header.count != FORMAT_TLN
        {
            return Err(Error::InvalidHeader);
        }

        let sender_ssrc = raw_packet.get_u32();
        let media_ssrc = raw_packet.get_u32();

        let mut nacks = vec![];
        // `length` counts 32-bit words after the first, minus 1 (the
        // fixed SSRC pair already consumed above).
        let nack_word_count = (header.length as usize + 1).saturating_sub(3);
        for _ in 0..nack_word_count {
            if raw_packet.remaining() < 4 {
                break;
            }
            nacks.push(NackPair {
                packet_id: raw_packet.get_u16(),
                lost_packets: raw_packet.get_u16(),
            });
        }

        Ok(TransportLayerNack {
            sender_ssrc,
            media_ssrc,
            nacks,
        })
    }
}
