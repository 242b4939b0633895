/// Event hooks a caller can set on a participant (local or remote). Every
/// field starts `None`; `merge` lets a caller layer partial overrides on
/// top of an existing set without clobbering hooks it didn't mention.
#[derive(Default)]
pub struct ParticipantCallback {
    pub on_track_muted: Option<Box<dyn Fn() + Send + Sync>>,
    pub on_track_unmuted: Option<Box<dyn Fn() + Send + Sync>>,
    pub on_connection_quality_changed: Option<Box<dyn Fn(ConnectionQuality) + Send + Sync>>,
    pub on_data_received: Option<Box<dyn Fn(&[u8]) + Send + Sync>>,
}

impl ParticipantCallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlays every `Some` field of `other` onto `self`, leaving fields
    /// `other` left `None` untouched.
    pub fn merge(&mut self, other: ParticipantCallback) {
        if other.on_track_muted.is_some() {
            self.on_track_muted = other.on_track_muted;
        }
        if other.on_track_unmuted.is_some() {
            self.on_track_unmuted = other.on_track_unmuted;
        }
        if other.on_connection_quality_changed.is_some() {
            self.on_connection_quality_changed = other.on_connection_quality_changed;
        }
        if other.on_data_received.is_some() {
            self.on_data_received = other.on_data_received;
        }
    }
}

/// A coarse, locally-estimated signal of how well a subscribed track is
/// being received; driven by jitter-buffer drop rate and NACK retry
/// exhaustion rather than any wire-level quality report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionQuality {
    Excellent,
    Good,
    Poor,
}

/// Room-scoped event hooks. Participant events also flow through here, the
/// way a single listener can subscribe to everything happening in a room.
#[derive(Default)]
pub struct RoomCallback {
    pub on_participant_connected: Option<Box<dyn Fn() + Send + Sync>>,
    pub on_participant_disconnected: Option<Box<dyn Fn() + Send + Sync>>,
    pub on_disconnected: Option<Box<dyn Fn() + Send + Sync>>,
    pub participant: ParticipantCallback,
}

impl RoomCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, other: RoomCallback) {
        if other.on_participant_connected.is_some() {
            self.on_participant_connected = other.on_participant_connected;
        }
        if other.on_participant_disconnected.is_some() {
            self.on_participant_disconnected = other.on_participant_disconnected;
        }
        if other.on_disconnected.is_some() {
            self.on_disconnected = other.on_disconnected;
        }
        self.participant.merge(other.participant);
    }
}
