use std::time::Duration;
use thiserror::Error;

/// Failure modes of the recording core.
///
/// Every variant is machine-distinguishable so the command surface can
/// render a specific message instead of a generic failure.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// A start was rejected because the room already has an active session.
    #[error("room {0} already has an active recording session")]
    AlreadyRecording(String),

    /// An add/end was rejected because the room has no active session.
    #[error("room {0} has no active recording session")]
    NoActiveSession(String),

    /// A write to one track's storage unit failed. Fatal to that track
    /// only; other tracks in the session are unaffected.
    #[error("storage write failed for speaker {speaker_id}: {source}")]
    CaptureWriteFailure {
        speaker_id: String,
        #[source]
        source: std::io::Error,
    },

    /// A capture task ended without producing a result (panic or abort).
    #[error("capture task for speaker {0} ended abnormally: {1}")]
    CaptureAborted(String, String),

    /// The platform refused to hand out a subscription for a speaker.
    #[error("could not subscribe to speaker {speaker_id}: {source}")]
    SubscriptionFailure {
        speaker_id: String,
        #[source]
        source: anyhow::Error,
    },

    /// Closing a subscription failed. The in-crate handle closes
    /// infallibly; this variant is reserved for platform integrations
    /// whose unsubscribe path can fail. Logged and treated as
    /// best-effort; the track still counts as stopped.
    #[error("failed to close subscription for speaker {0}")]
    SubscriptionCloseFailure(String),

    /// Finalize found zero storage units for the session. The muxer is
    /// never invoked in this case.
    #[error("no tracks found for session {session_id} in room {room_id}")]
    NoTracksFound { room_id: String, session_id: u64 },

    /// The external muxer process failed (spawn error or non-zero exit).
    /// Per-speaker raw data stays on disk for manual recovery.
    #[error("muxer failed: {0}")]
    MuxerFailure(String),

    /// The external muxer process exceeded the configured deadline.
    #[error("muxer timed out after {0:?}")]
    MuxerTimeout(Duration),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type RecorderResult<T> = Result<T, RecorderError>;

impl RecorderError {
    pub fn capture_write(speaker_id: impl Into<String>, source: std::io::Error) -> Self {
        Self::CaptureWriteFailure {
            speaker_id: speaker_id.into(),
            source,
        }
    }
}
