use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rtcp::packet::Packet as RtcpPacket;
use rtcp::{nack_pairs_from_sequence_numbers, TransportLayerNack};
use tokio::sync::{mpsc, Mutex};

use crate::error::{Error, Result};
use crate::window::Window;

/// RtcpWriter is the one seam between a generator and the outside world: it
/// ships assembled feedback packets out over whatever RTCP transport the
/// caller has. Implementations should not block the scheduler for long.
#[async_trait]
pub trait RtcpWriter: Send + Sync {
    async fn write_rtcp(&self, pkts: &[Box<dyn RtcpPacket + Send + Sync>]) -> Result<()>;
}

/// Tracks, per missing sequence number, when it was first noticed missing
/// and the last time (if any) a NACK covering it was sent.
struct RetryRecord {
    last_sent: Option<Instant>,
    count: u32,
}

const DEFAULT_LOG2_WINDOW_SIZE: u8 = 8;
const DEFAULT_SKIP_LAST_N: u16 = 0;
const DEFAULT_MAX_RETRIES: u32 = 10;
const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// NackGeneratorBuilder configures a [`NackGenerator`] before it starts
/// tracking a stream.
#[derive(Default)]
pub struct NackGeneratorBuilder {
    log2_window_size: Option<u8>,
    skip_last_n: Option<u16>,
    max_retries: Option<u32>,
    interval: Option<Duration>,
}

impl NackGeneratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the window size to `1 << (log2_size + 6)` sequence numbers.
    pub fn with_log2_window_size(mut self, log2_size: u8) -> Self {
        self.log2_window_size = Some(log2_size);
        self
    }

    /// Sequence numbers within this distance of the window's leading edge
    /// are never reported missing; they may simply not have arrived yet.
    pub fn with_skip_last_n(mut self, n: u16) -> Self {
        self.skip_last_n = Some(n);
        self
    }

    /// Stop retrying a sequence number after this many NACKs for it.
    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n);
        self
    }

    /// How often `run`'s background scheduler checks for new losses.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn build(self, sender_ssrc: u32, media_ssrc: u32) -> NackGenerator {
        NackGenerator {
            sender_ssrc,
            media_ssrc,
            skip_last_n: self.skip_last_n.unwrap_or(DEFAULT_SKIP_LAST_N),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            interval: self.interval.unwrap_or(DEFAULT_INTERVAL),
            state: Mutex::new(State {
                window: Window::new(self.log2_window_size.unwrap_or(DEFAULT_LOG2_WINDOW_SIZE)),
                retries: HashMap::new(),
                rtt: Duration::from_millis(100),
            }),
        }
    }
}

struct State {
    window: Window,
    retries: HashMap<u16, RetryRecord>,
    rtt: Duration,
}

/// NackGenerator watches a single incoming RTP stream's sequence numbers,
/// detects gaps, and assembles RFC 4585 `TransportLayerNack` packets for
/// the ones worth re-requesting, throttled by the current RTT estimate.
pub struct NackGenerator {
    sender_ssrc: u32,
    media_ssrc: u32,
    skip_last_n: u16,
    max_retries: u32,
    interval: Duration,
    state: Mutex<State>,
}

impl NackGenerator {
    /// Records that `seq` has arrived, clearing it out of the retry table
    /// if it was pending.
    pub async fn push(&self, seq: u16) {
        let mut state = self.state.lock().await;
        state.window.add(seq);
        state.retries.remove(&seq);
    }

    /// Replaces the RTT estimate used to throttle retries.
    pub async fn set_rtt(&self, rtt: Duration) {
        self.state.lock().await.rtt = rtt;
    }

    /// Evaluates the current window against the retry table and returns a
    /// `TransportLayerNack` for whichever missing sequence numbers are due
    /// a (re)request, or `None` if nothing qualifies right now.
    ///
    /// Synchronous with respect to wall-clock time: a sequence number that
    /// has never been requested (`last_sent: None`) is always eligible, so
    /// this can be driven deterministically in tests without waiting out
    /// an actual RTT.
    pub async fn force_check(&self) -> Option<TransportLayerNack> {
        let mut state = self.state.lock().await;
        let missing = state.window.missing_seq_numbers(self.skip_last_n);
        let now = Instant::now();
        let rtt = state.rtt;
        let max_retries = self.max_retries;

        let mut due = Vec::with_capacity(missing.len());
        for seq in missing {
            let record = state.retries.entry(seq).or_insert(RetryRecord {
                last_sent: None,
                count: 0,
            });

            if record.count >= max_retries {
                continue;
            }

            let eligible = match record.last_sent {
                None => true,
                Some(last) => now.duration_since(last) >= rtt,
            };

            if eligible {
                record.last_sent = Some(now);
                record.count += 1;
                due.push(seq);
            }
        }

        let window = &state.window;
        state.retries.retain(|seq, _| window.in_range(*seq));

        if due.is_empty() {
            return None;
        }

        Some(TransportLayerNack {
            sender_ssrc: self.sender_ssrc,
            media_ssrc: self.media_ssrc,
            nacks: nack_pairs_from_sequence_numbers(&due),
        })
    }

    /// Spawns a background task that calls `force_check` on a fixed
    /// interval and writes out any resulting NACK through `writer`, until
    /// the returned handle is dropped or `stop` is called.
    pub fn run(self: std::sync::Arc<Self>, writer: std::sync::Arc<dyn RtcpWriter>) -> SchedulerHandle {
        let (close_tx, mut close_rx) = mpsc::channel::<()>(1);
        let generator = self.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(generator.interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Some(nack) = generator.force_check().await {
                            let pkts: Vec<Box<dyn RtcpPacket + Send + Sync>> = vec![Box::new(nack)];
                            if let Err(err) = writer.write_rtcp(&pkts).await {
                                log::warn!("nack write failed: {err}");
                            }
                        }
                    }
                    _ = close_rx.recv() => {
                        return;
                    }
                }
            }
        });

        SchedulerHandle { close_tx }
    }
}

/// A handle to a running [`NackGenerator::run`] scheduler task.
pub struct SchedulerHandle {
    close_tx: mpsc::Sender<()>,
}

impl SchedulerHandle {
    pub async fn stop(self) -> Result<()> {
        self.close_tx.send(()).await.map_err(|_| Error::AlreadyStarted)
    }
}
