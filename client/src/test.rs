use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use nack::RtcpWriter;
use rtcp::Packet as RtcpPacket;
use rtp::header::Header;
use rtp::packet::Packet;
use rtp::packetizer::Depacketizer;

use crate::TrackReceiver;

struct FlagDepacketizer;

impl Depacketizer for FlagDepacketizer {
    fn is_partition_head(&self, payload: &Bytes) -> bool {
        payload.first().copied() == Some(1)
    }

    fn is_partition_tail(&self, _marker: bool, payload: &Bytes) -> bool {
        payload.get(1).copied() == Some(1)
    }
}

fn pkt(sn: u16, ts: u32) -> Packet {
    Packet {
        header: Header {
            version: 2,
            sequence_number: sn,
            timestamp: ts,
            ..Default::default()
        },
        payload: Bytes::from(vec![1u8, 1]),
    }
}

struct RecordingWriter {
    writes: Arc<AtomicUsize>,
}

#[async_trait]
impl RtcpWriter for RecordingWriter {
    async fn write_rtcp(&self, _pkts: &[Box<dyn RtcpPacket + Send + Sync>]) -> nack::error::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn evicted_packets_trigger_an_out_of_cycle_nack_sweep() {
    let writes = Arc::new(AtomicUsize::new(0));
    let writer: Arc<dyn RtcpWriter> = Arc::new(RecordingWriter {
        writes: writes.clone(),
    });

    let receiver =
        TrackReceiver::new(FlagDepacketizer, 900, Duration::from_secs(1), 1, 2, writer).unwrap();

    // A gap at SN 11 followed by enough traffic to push SN 10's sample
    // past the jitter buffer's retention horizon.
    receiver.push_rtp(pkt(10, 1000)).await;
    receiver.push_rtp(pkt(12, 2500)).await;
    receiver.pop_samples(false);

    // Let the drop callback's spawned task run and actually write the NACK
    // it assembles, rather than only updating the retry table.
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    let after_drop = writes.load(Ordering::SeqCst);
    assert!(after_drop >= 1, "the drop-triggered sweep should have written a nack");

    receiver.set_rtt(Duration::from_millis(1)).await;
    tokio::time::sleep(Duration::from_millis(2)).await;

    let handle = receiver.run_nack_scheduler();
    tokio::time::sleep(Duration::from_millis(150)).await;
    handle.stop().await.expect("scheduler should stop cleanly");

    assert!(
        writes.load(Ordering::SeqCst) > after_drop,
        "the periodic scheduler should have retried the still-missing sequence number"
    );
}
