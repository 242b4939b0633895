use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use rtp::header::Header;
use rtp::packet::Packet;
use rtp::packetizer::Depacketizer;

use crate::JitterBuffer;

/// A depacketizer whose start/end flags are carried directly in the
/// payload so tests can control sample boundaries explicitly.
struct FlagDepacketizer;

impl Depacketizer for FlagDepacketizer {
    fn is_partition_head(&self, payload: &Bytes) -> bool {
        payload.first().copied() == Some(1)
    }

    fn is_partition_tail(&self, _marker: bool, payload: &Bytes) -> bool {
        payload.get(1).copied() == Some(1)
    }
}

fn pkt(sn: u16, ts: u32, start: bool, end: bool) -> Packet {
    Packet {
        header: Header {
            version: 2,
            sequence_number: sn,
            timestamp: ts,
            ..Default::default()
        },
        payload: Bytes::from(vec![start as u8, end as u8]),
    }
}

fn sns(packets: &[Packet]) -> Vec<u16> {
    packets.iter().map(|p| p.header.sequence_number).collect()
}

#[test]
fn in_order_single_sample() {
    let jb = JitterBuffer::new(FlagDepacketizer, 90_000, Duration::from_secs(1)).unwrap();
    jb.push(pkt(100, 1000, true, false));
    jb.push(pkt(101, 1000, false, false));
    jb.push(pkt(102, 1000, false, true));

    let out = jb.pop(false);
    assert_eq!(sns(&out), vec![100, 101, 102]);
    assert!(jb.is_empty());
}

#[test]
fn out_of_order_reassembly() {
    let jb = JitterBuffer::new(FlagDepacketizer, 90_000, Duration::from_secs(1)).unwrap();
    // Prime the stream so `prev_sn` lands on 99: the out-of-order packets
    // that follow then chain off it by plain contiguity.
    jb.push(pkt(99, 900, true, true));
    assert_eq!(sns(&jb.pop(false)), vec![99]);

    jb.push(pkt(101, 1000, false, false));
    jb.push(pkt(100, 1000, true, false));
    jb.push(pkt(102, 1000, false, true));

    assert_eq!(sns(&jb.pop(false)), vec![100, 101, 102]);
}

#[test]
fn gap_then_fill_coalesces_samples() {
    let jb = JitterBuffer::new(FlagDepacketizer, 90_000, Duration::from_secs(1)).unwrap();
    jb.push(pkt(100, 1000, true, true));
    jb.push(pkt(102, 1200, true, true));

    // Only the complete [100] sample is ready; 102 is missing its
    // predecessor.
    assert_eq!(sns(&jb.pop(false)), vec![100]);

    jb.push(pkt(101, 1100, true, true));

    // Both now-contiguous samples are emitted in one call.
    assert_eq!(sns(&jb.pop(false)), vec![101, 102]);
}

#[test]
fn eviction_fires_drop_callback_once() {
    let dropped = Arc::new(AtomicUsize::new(0));
    let dropped_clone = dropped.clone();

    // clock_rate * max_latency == 900 ticks of retention.
    let jb = JitterBuffer::new(FlagDepacketizer, 900, Duration::from_secs(1))
        .unwrap()
        .with_on_packet_dropped(move || {
            dropped_clone.fetch_add(1, Ordering::SeqCst);
        });

    jb.push(pkt(10, 1000, true, true));
    jb.push(pkt(11, 1100, true, true));
    jb.push(pkt(12, 2500, true, true));

    let out = jb.pop(false);
    assert_eq!(sns(&out), vec![12]);
    assert_eq!(dropped.load(Ordering::SeqCst), 1);
    assert!(jb.is_empty());
}

#[test]
fn sequence_number_reset_anchors_a_new_stream() {
    let jb = JitterBuffer::new(FlagDepacketizer, 90_000, Duration::from_secs(10)).unwrap();
    jb.push(pkt(10, 1000, true, true));
    jb.push(pkt(20000, 2000, true, true));

    let out = jb.pop(false);
    assert_eq!(sns(&out), vec![10, 20000]);

    // Subsequent packets chain off the post-reset anchor by contiguity.
    jb.push(pkt(20001, 2100, true, true));
    assert_eq!(sns(&jb.pop(false)), vec![20001]);
}

#[test]
fn force_pop_drains_incomplete_buffer() {
    let jb = JitterBuffer::new(FlagDepacketizer, 90_000, Duration::from_secs(1)).unwrap();
    jb.push(pkt(100, 1000, true, false));
    jb.push(pkt(101, 1000, false, false));

    assert!(jb.pop(false).is_empty());
    assert_eq!(jb.len(), 2);

    let out = jb.pop(true);
    assert_eq!(sns(&out), vec![100, 101]);
    assert!(jb.is_empty());
}

#[test]
fn update_max_latency_shifts_the_eviction_horizon() {
    let jb = JitterBuffer::new(FlagDepacketizer, 1000, Duration::from_secs(1)).unwrap();
    jb.push(pkt(1, 5000, true, true));
    // Shrinking the window pulls minTS forward without touching retained
    // packets until the next push/pop cycle evaluates it.
    jb.update_max_latency(Duration::from_millis(10));
    jb.push(pkt(2, 5100, true, true));

    let out = jb.pop(false);
    assert_eq!(sns(&out), vec![2]);
}
