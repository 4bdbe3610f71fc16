// Integration tests for the session registry invariants:
// at most one session per room, and no operations against idle rooms.

mod common;

use std::sync::Arc;

use common::{RecordingMuxer, ScriptedReceiver};
use multitrack_recorder::{Recorder, RecorderConfig, RecorderError, SpeakerInfo};
use tempfile::TempDir;

fn recorder(data_root: &TempDir) -> (Recorder, Arc<RecordingMuxer>) {
    let muxer = Arc::new(RecordingMuxer::new());
    let config = RecorderConfig {
        data_root: data_root.path().to_path_buf(),
        ..RecorderConfig::default()
    };
    let rec = Recorder::new(Arc::new(ScriptedReceiver::new()), muxer.clone(), config);
    (rec, muxer)
}

#[tokio::test]
async fn second_start_in_same_room_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (recorder, _) = recorder(&dir);

    recorder.start_session("room-1").await.unwrap();

    let err = recorder.start_session("room-1").await.unwrap_err();
    assert!(matches!(err, RecorderError::AlreadyRecording(room) if room == "room-1"));
}

#[tokio::test]
async fn different_rooms_record_independently() {
    let dir = TempDir::new().unwrap();
    let (recorder, _) = recorder(&dir);

    recorder.start_session("room-1").await.unwrap();
    recorder.start_session("room-2").await.unwrap();

    assert!(recorder.is_recording("room-1").await);
    assert!(recorder.is_recording("room-2").await);
}

#[tokio::test]
async fn add_speaker_without_session_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (recorder, _) = recorder(&dir);

    let err = recorder
        .add_speaker("idle-room", SpeakerInfo::new("alice", "Alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, RecorderError::NoActiveSession(room) if room == "idle-room"));
}

#[tokio::test]
async fn end_without_session_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (recorder, _) = recorder(&dir);

    let err = recorder.end_session("idle-room").await.unwrap_err();
    assert!(matches!(err, RecorderError::NoActiveSession(_)));
}

#[tokio::test]
async fn restarted_room_never_reuses_a_session_id() {
    let dir = TempDir::new().unwrap();
    let (recorder, _) = recorder(&dir);

    // End-then-start inside one millisecond must still produce a fresh
    // id, or the new session's storage units would overwrite the old ones
    let first = recorder.start_session("room-1").await.unwrap();
    let _ = recorder.end_session("room-1").await;
    let second = recorder.start_session("room-1").await.unwrap();

    assert!(second > first);
}

#[tokio::test]
async fn session_is_removed_even_when_finalize_fails() {
    let dir = TempDir::new().unwrap();
    let (recorder, muxer) = recorder(&dir);

    recorder.start_session("room-1").await.unwrap();

    // No speakers were added, so finalize finds nothing to mux
    let err = recorder.end_session("room-1").await.unwrap_err();
    assert!(matches!(err, RecorderError::NoTracksFound { .. }));
    assert_eq!(muxer.call_count(), 0);

    // The session is gone either way; a second end hits an idle room
    let err = recorder.end_session("room-1").await.unwrap_err();
    assert!(matches!(err, RecorderError::NoActiveSession(_)));

    // And a fresh start gets a brand-new session
    recorder.start_session("room-1").await.unwrap();
}
