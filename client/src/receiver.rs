use std::sync::Arc;
use std::time::Duration;

use jitter_buffer::JitterBuffer;
use nack::{NackGenerator, NackGeneratorBuilder, RtcpWriter, SchedulerHandle};
use rtp::packet::Packet;
use rtp::packetizer::Depacketizer;

/// TrackReceiver is the receive-side pipeline for one subscribed remote
/// track: RTP packets go in through `push`, depacketized samples come out
/// through `pop`, and every packet the jitter buffer gives up on is fed
/// straight back into the NACK generator as a loss-recovery signal.
pub struct TrackReceiver<T: Depacketizer + 'static> {
    jitter_buffer: Arc<JitterBuffer<T>>,
    nack: Arc<NackGenerator>,
    writer: Arc<dyn RtcpWriter>,
}

impl<T: Depacketizer + 'static> TrackReceiver<T> {
    pub fn new(
        depacketizer: T,
        clock_rate: u32,
        max_latency: Duration,
        sender_ssrc: u32,
        media_ssrc: u32,
        writer: Arc<dyn RtcpWriter>,
    ) -> crate::error::Result<Self> {
        let nack = Arc::new(NackGeneratorBuilder::new().build(sender_ssrc, media_ssrc));
        let nack_for_drop = nack.clone();
        let writer_for_drop = writer.clone();

        let jitter_buffer = Arc::new(
            JitterBuffer::new(depacketizer, clock_rate, max_latency)?.with_on_packet_dropped(
                move || {
                    let nack = nack_for_drop.clone();
                    let writer = writer_for_drop.clone();
                    tokio::spawn(async move {
                        // An evicted packet is the strongest loss signal the
                        // buffer has; sweep now rather than waiting for the
                        // next scheduled interval.
                        if let Some(report) = nack.force_check().await {
                            let pkts: Vec<Box<dyn rtcp::Packet + Send + Sync>> =
                                vec![Box::new(report)];
                            if let Err(err) = writer.write_rtcp(&pkts).await {
                                log::warn!("nack write failed: {err}");
                            }
                        }
                    });
                },
            ),
        );

        Ok(TrackReceiver {
            jitter_buffer,
            nack,
            writer,
        })
    }

    pub async fn push_rtp(&self, pkt: Packet) {
        self.nack.push(pkt.header.sequence_number).await;
        self.jitter_buffer.push(pkt);
    }

    pub fn pop_samples(&self, force: bool) -> Vec<Packet> {
        self.jitter_buffer.pop(force)
    }

    pub async fn set_rtt(&self, rtt: Duration) {
        self.nack.set_rtt(rtt).await;
    }

    /// Starts the NACK generator's periodic retry scheduler, writing any
    /// assembled feedback through the same writer the drop-callback sweep
    /// uses.
    pub fn run_nack_scheduler(&self) -> SchedulerHandle {
        self.nack.clone().run(self.writer.clone())
    }

    pub fn len(&self) -> usize {
        self.jitter_buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jitter_buffer.is_empty()
    }
}
