use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capture::StreamCapture;

/// Identity and display name of a recorded participant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpeakerInfo {
    /// Stable platform identifier; used for paths and identity
    pub id: String,
    /// Display name; used only for artifact metadata and log lines
    pub label: String,
}

impl SpeakerInfo {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// One recording effort scoped to a room.
///
/// Tracks keep insertion order: the order speakers were added is the order
/// their streams appear in the final artifact.
pub struct Session {
    pub room_id: String,
    /// Creation timestamp in milliseconds since epoch; correlates all
    /// speaker tracks of this session and names the final artifact
    pub session_id: u64,
    pub started_at: DateTime<Utc>,
    pub tracks: Vec<StreamCapture>,
}

impl Session {
    pub fn new(room_id: impl Into<String>, session_id: u64) -> Self {
        Self {
            room_id: room_id.into(),
            session_id,
            started_at: Utc::now(),
            tracks: Vec::new(),
        }
    }

    pub fn speakers(&self) -> Vec<SpeakerInfo> {
        self.tracks.iter().map(|t| t.speaker().clone()).collect()
    }
}

/// What a caller gets back from `add_speaker`: enough to reference the
/// track without owning its capture
#[derive(Debug, Clone)]
pub struct TrackHandle {
    pub speaker: SpeakerInfo,
    pub storage_path: PathBuf,
    pub started_at: DateTime<Utc>,
}

/// A per-track failure collected while stopping captures. The session
/// still finalizes; the artifact covers whatever the failed track wrote
/// before failing.
#[derive(Debug, Clone)]
pub struct TrackError {
    pub speaker: SpeakerInfo,
    pub message: String,
}

/// Result of a successful finalize, handed to the delivery collaborator
#[derive(Debug, Clone)]
pub struct FinalizedSession {
    pub room_id: String,
    pub session_id: u64,
    /// The muxed multi-track artifact
    pub artifact_path: PathBuf,
    /// JSON provenance manifest written next to the artifact
    pub manifest_path: PathBuf,
    /// Contributing speakers, in track order
    pub speakers: Vec<SpeakerInfo>,
    /// Byte length every padded track ended up with
    pub track_bytes: u64,
    /// Tracks that failed during stop, for partial-track reporting
    pub track_errors: Vec<TrackError>,
}

/// Provenance manifest persisted next to the artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionManifest {
    pub session_id: u64,
    pub room_id: String,
    pub started_at: DateTime<Utc>,
    pub artifact: String,
    pub container: String,
    pub created_at: DateTime<Utc>,
    pub speakers: Vec<SpeakerInfo>,
    pub track_bytes: u64,
}
