use bytes::Bytes;

/// Depacketizer detects sample (media frame) boundaries in a stream of RTP
/// payloads. It is the one codec-specific seam the core depends on; no
/// codec-specific parsing lives in the core itself — an implementation
/// lives in the caller's codec package (VP8, H264, Opus, ...) and is
/// injected into the jitter buffer.
///
/// Implementations must be pure and side-effect free: the jitter buffer
/// may call `is_partition_head`/`is_partition_tail` on packets in any
/// order as it reorders the stream.
pub trait Depacketizer: Send + Sync {
    /// Returns true if `payload` is the first packet of a sample. Should
    /// return `false` if this cannot be determined from `payload` alone,
    /// in which case the caller falls back to timestamp-discontinuity
    /// detection.
    fn is_partition_head(&self, payload: &Bytes) -> bool;

    /// Returns true if `payload` is the last packet of a sample. `marker`
    /// is the RTP marker bit from the packet's header.
    fn is_partition_tail(&self, marker: bool, payload: &Bytes) -> bool;
}
