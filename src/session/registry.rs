use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::types::Session;
use crate::capture::StreamCapture;
use crate::error::{RecorderError, RecorderResult};

/// Process-wide map of active sessions, keyed by room id.
///
/// All mutations run under one lock; that single critical section is what
/// enforces at-most-one-session-per-room and closes the race between a
/// late-arriving add and a concurrent end. Frame writes never touch this
/// lock, so contention stays bounded by command traffic, not audio rate.
pub struct SessionRegistry {
    state: Mutex<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    sessions: HashMap<String, Session>,
    /// Last id handed out per room. A stop/start inside one millisecond
    /// must not reuse an id, or the restarted session's storage units
    /// would truncate the previous session's retained raw data.
    last_session_ids: HashMap<String, u64>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Create a session for the room. Rejected with `AlreadyRecording`
    /// when one is active.
    pub async fn start_session(&self, room_id: &str) -> RecorderResult<u64> {
        let mut state = self.state.lock().await;

        if state.sessions.contains_key(room_id) {
            warn!("Start rejected: room {} is already recording", room_id);
            return Err(RecorderError::AlreadyRecording(room_id.to_string()));
        }

        let mut session_id = Utc::now().timestamp_millis() as u64;
        if let Some(&last) = state.last_session_ids.get(room_id) {
            if session_id <= last {
                session_id = last + 1;
            }
        }
        state.last_session_ids.insert(room_id.to_string(), session_id);
        state
            .sessions
            .insert(room_id.to_string(), Session::new(room_id, session_id));

        info!("Session {} started in room {}", session_id, room_id);
        Ok(session_id)
    }

    /// Session id of the room's active session, if any
    pub async fn active_session(&self, room_id: &str) -> RecorderResult<u64> {
        let state = self.state.lock().await;
        state
            .sessions
            .get(room_id)
            .map(|s| s.session_id)
            .ok_or_else(|| RecorderError::NoActiveSession(room_id.to_string()))
    }

    pub async fn is_recording(&self, room_id: &str) -> bool {
        self.state.lock().await.sessions.contains_key(room_id)
    }

    /// Append a track to the room's active session.
    ///
    /// The capture is built before this call, so the session may have
    /// ended in between; in that case the capture is handed back so the
    /// caller can tear it down.
    pub async fn add_track(
        &self,
        room_id: &str,
        capture: StreamCapture,
    ) -> Result<(), StreamCapture> {
        let mut state = self.state.lock().await;

        match state.sessions.get_mut(room_id) {
            Some(session) => {
                info!(
                    "Track for {} added to session {} in room {}",
                    capture.speaker().id,
                    session.session_id,
                    room_id
                );
                session.tracks.push(capture);
                Ok(())
            }
            None => Err(capture),
        }
    }

    /// Atomically remove and return the room's session for finalization.
    /// Subsequent calls fail with `NoActiveSession` until a new start.
    pub async fn end_session(&self, room_id: &str) -> RecorderResult<Session> {
        let mut state = self.state.lock().await;

        match state.sessions.remove(room_id) {
            Some(session) => {
                info!(
                    "Session {} removed from registry for room {} ({} tracks)",
                    session.session_id,
                    room_id,
                    session.tracks.len()
                );
                Ok(session)
            }
            None => Err(RecorderError::NoActiveSession(room_id.to_string())),
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
