use std::time::Duration;

use rtp::packet::Packet;
use rtp::packetizer::Depacketizer;
use rtp::seq::{outside_range, precedes, PROXIMITY};
use util::sync::Mutex;

use crate::arena::Arena;

struct Inner {
    arena: Arena,
    size: usize,
    initialized: bool,
    prev_sn: u16,
    head: Option<usize>,
    tail: Option<usize>,
    max_late: u32,
    max_sample_size: u32,
    min_ts: u32,
}

impl Inner {
    fn new_node(&mut self, start: bool, end: bool, packet: Packet) -> usize {
        self.size += 1;
        self.arena.alloc(crate::arena::Node {
            prev: None,
            next: None,
            start,
            end,
            reset: false,
            packet,
        })
    }

    fn free_node(&mut self, idx: usize) -> Packet {
        self.size -= 1;
        self.arena.free(idx).packet
    }

    fn push(&mut self, start: bool, end: bool, pkt: Packet) {
        let sn = pkt.header.sequence_number;
        let ts = pkt.header.timestamp;
        let p = self.new_node(start, end, pkt);

        let tail_idx = match self.tail {
            Some(idx) => idx,
            None => {
                self.arena.get_mut(p).reset = if self.initialized {
                    start && outside_range(self.prev_sn, sn)
                } else {
                    self.initialized = true;
                    start
                };
                self.min_ts = ts.wrapping_sub(self.max_late);
                self.head = Some(p);
                self.tail = Some(p);
                return;
            }
        };

        let tail_sn = self.arena.get(tail_idx).packet.header.sequence_number;
        let head_sn = self.arena.get(self.head.unwrap()).packet.header.sequence_number;

        if precedes(sn, tail_sn) && (tail_sn.wrapping_sub(sn) < PROXIMITY || !outside_range(head_sn, sn))
        {
            // pkt is at or before the tail and within range of the window; walk
            // backward from the tail to find its insertion point.
            let mut c_opt = self.arena.get(tail_idx).prev;
            while let Some(c) = c_opt {
                let c_sn = self.arena.get(c).packet.header.sequence_number;
                if precedes(c_sn, sn) {
                    if start && outside_range(c_sn, sn) {
                        self.arena.get_mut(p).reset = true;
                    } else if sn == c_sn.wrapping_add(1) {
                        let c_ts = self.arena.get(c).packet.header.timestamp;
                        let delta = ts.wrapping_sub(c_ts);
                        if delta > self.max_sample_size {
                            self.max_sample_size = delta;
                        }
                    }

                    let c_next = self.arena.get(c).next;
                    if let Some(next_idx) = c_next {
                        self.arena.get_mut(next_idx).prev = Some(p);
                    }
                    self.arena.get_mut(p).next = c_next;
                    self.arena.get_mut(p).prev = Some(c);
                    self.arena.get_mut(c).next = Some(p);
                    return;
                }
                c_opt = self.arena.get(c).prev;
            }

            // nothing to insert after: prepend
            self.arena.get_mut(p).reset = start && outside_range(self.prev_sn, sn);
            let head_idx = self.head.unwrap();
            self.arena.get_mut(head_idx).prev = Some(p);
            self.arena.get_mut(p).next = Some(head_idx);
            self.head = Some(p);
            return;
        }

        // append after tail
        if start && outside_range(tail_sn, sn) {
            self.arena.get_mut(p).reset = true;
            self.min_ts = self.min_ts.wrapping_add(self.max_sample_size);
        } else {
            let tail_ts = self.arena.get(tail_idx).packet.header.timestamp;
            self.min_ts = self.min_ts.wrapping_add(ts.wrapping_sub(tail_ts));
            if sn == tail_sn.wrapping_add(1) {
                let delta = ts.wrapping_sub(tail_ts);
                if delta > self.max_sample_size {
                    self.max_sample_size = delta;
                }
            }
        }
        self.arena.get_mut(p).prev = Some(tail_idx);
        self.arena.get_mut(tail_idx).next = Some(p);
        self.tail = Some(p);
    }

    fn force_pop(&mut self) -> Vec<Packet> {
        let mut packets = Vec::with_capacity(self.size);
        let mut c = self.head;
        while let Some(idx) = c {
            c = self.arena.get(idx).next;
            packets.push(self.free_node(idx));
        }
        self.head = None;
        self.tail = None;
        packets
    }

    /// Drops packets whose timestamp has fallen below `min_ts`, stopping at
    /// the next sample head. Fires `on_packet_dropped` at most once,
    /// regardless of how many packets were evicted.
    fn evict(&mut self, on_packet_dropped: Option<&(dyn Fn() + Send + Sync)>) {
        let mut dropped = false;

        loop {
            let Some(cur) = self.head else { break };
            let ts = self.arena.get(cur).packet.header.timestamp;
            if ts > self.min_ts || (ts.wrapping_sub(self.min_ts) & 0x8000_0000) == 0 {
                break;
            }

            dropped = true;
            loop {
                let cur = self.head.expect("outer loop just confirmed head is Some");
                let sn = self.arena.get(cur).packet.header.sequence_number;
                let ts = self.arena.get(cur).packet.header.timestamp;
                log::debug!("packet dropped: sequence_number={sn} timestamp={ts}");

                let next = self.arena.get(cur).next;
                self.head = next;
                match next {
                    None => self.tail = None,
                    Some(next_idx) => {
                        self.arena.get_mut(next_idx).prev = None;
                        let next_sn = self.arena.get(next_idx).packet.header.sequence_number;
                        if outside_range(next_sn, sn) {
                            let next_ts = self.arena.get(next_idx).packet.header.timestamp;
                            self.min_ts = self
                                .min_ts
                                .wrapping_add(next_ts.wrapping_sub(ts))
                                .wrapping_sub(self.max_sample_size);
                        }
                    }
                }
                self.free_node(cur);

                match self.head {
                    None => break,
                    Some(next_idx) => {
                        if self.arena.get(next_idx).start {
                            let start_sn = self.arena.get(next_idx).packet.header.sequence_number;
                            self.prev_sn = start_sn.wrapping_sub(1);
                            break;
                        }
                    }
                }
            }
        }

        if dropped {
            if let Some(f) = on_packet_dropped {
                f();
            }
        }
    }

    fn pop(&mut self, on_packet_dropped: Option<&(dyn Fn() + Send + Sync)>) -> Vec<Packet> {
        self.evict(on_packet_dropped);

        if self.tail.is_none() {
            return vec![];
        }

        let mut prev_sn = self.prev_sn;
        let mut start_required = true;
        let mut end_idx = None;
        let mut c = self.head;
        while let Some(idx) = c {
            let node = self.arena.get(idx);
            let sn = node.packet.header.sequence_number;
            if sn != prev_sn.wrapping_add(1) && (!start_required || !node.reset) {
                break;
            }
            if start_required {
                if !node.start {
                    break;
                }
                start_required = false;
            }
            if node.end {
                end_idx = Some(idx);
                start_required = true;
            }
            prev_sn = sn;
            c = node.next;
        }

        let Some(end_idx) = end_idx else {
            return vec![];
        };

        let mut packets = Vec::with_capacity(self.size);
        let mut c = self.head.expect("tail is Some implies head is Some");
        loop {
            let next = self.arena.get(c).next;
            let c_sn = self.arena.get(c).packet.header.sequence_number;
            let c_ts = self.arena.get(c).packet.header.timestamp;

            if let Some(next_idx) = next {
                let next_sn = self.arena.get(next_idx).packet.header.sequence_number;
                if outside_range(next_sn, c_sn) {
                    let next_ts = self.arena.get(next_idx).packet.header.timestamp;
                    self.min_ts = self
                        .min_ts
                        .wrapping_add(next_ts.wrapping_sub(c_ts))
                        .wrapping_sub(self.max_sample_size);
                }
                self.arena.get_mut(next_idx).prev = None;
            }

            let is_end = c == end_idx;
            packets.push(self.free_node(c));

            if is_end {
                self.prev_sn = c_sn;
                self.head = next;
                if next.is_none() {
                    self.tail = None;
                }
                return packets;
            }

            c = next.expect("sample must reach its recorded end node");
        }
    }
}

fn ticks(d: Duration, clock_rate: u32) -> u32 {
    (d.as_secs_f64() * clock_rate as f64) as u32
}

/// JitterBuffer reassembles a stream of out-of-order RTP packets, for one
/// SSRC, into complete depacketized samples. `push`/`pop` never block
/// beyond the internal mutex and never fail; loss is surfaced only
/// through the drop callback and gaps in the emitted sequence.
pub struct JitterBuffer<T: Depacketizer> {
    depacketizer: T,
    clock_rate: u32,
    on_packet_dropped: Option<Box<dyn Fn() + Send + Sync>>,
    inner: Mutex<Inner>,
}

impl<T: Depacketizer> JitterBuffer<T> {
    pub fn new(depacketizer: T, clock_rate: u32, max_latency: Duration) -> crate::error::Result<Self> {
        if clock_rate == 0 {
            return Err(crate::error::Error::ZeroClockRate);
        }

        Ok(JitterBuffer {
            depacketizer,
            clock_rate,
            on_packet_dropped: None,
            inner: Mutex::new(Inner {
                arena: Arena::default(),
                size: 0,
                initialized: false,
                prev_sn: 0,
                head: None,
                tail: None,
                max_late: ticks(max_latency, clock_rate),
                max_sample_size: 0,
                min_ts: 0,
            }),
        })
    }

    pub fn with_on_packet_dropped<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_packet_dropped = Some(Box::new(f));
        self
    }

    /// Number of packets currently retained.
    pub fn len(&self) -> usize {
        self.inner.lock().size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Atomically adjusts the retention window; `min_ts` shifts by the
    /// delta so the effective eviction horizon moves consistently.
    pub fn update_max_latency(&self, max_latency: Duration) {
        let max_late = ticks(max_latency, self.clock_rate);
        let mut inner = self.inner.lock();
        inner.min_ts = inner.min_ts.wrapping_add(inner.max_late.wrapping_sub(max_late));
        inner.max_late = max_late;
    }

    /// Inserts an RTP packet. Never blocks; never fails; tolerant of
    /// duplicates, reordering, and sequence-number/timestamp wraparound.
    pub fn push(&self, pkt: Packet) {
        let (start, end) = if pkt.payload.is_empty() {
            (true, true)
        } else {
            (
                self.depacketizer.is_partition_head(&pkt.payload),
                self.depacketizer
                    .is_partition_tail(pkt.header.marker, &pkt.payload),
            )
        };

        self.inner.lock().push(start, end, pkt);
    }

    /// Returns the packets of zero or more complete samples. With
    /// `force = true`, drains the entire buffer regardless of whether any
    /// sample is complete (used on teardown).
    pub fn pop(&self, force: bool) -> Vec<Packet> {
        let mut inner = self.inner.lock();
        if force {
            inner.force_pop()
        } else {
            inner.pop(self.on_packet_dropped.as_deref())
        }
    }
}
