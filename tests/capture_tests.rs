// Integration tests for per-speaker stream capture: chronological writes,
// gap-fill placement, and idempotent shutdown.

mod common;

use std::fs;

use common::{frame, FRAME_SIZE_BYTES, SAMPLES_PER_FRAME};
use multitrack_recorder::{
    AudioFrame, SilenceCompensator, SpeakerInfo, SpeakerSubscription, StreamCapture,
    SubscriptionHandle,
};
use tempfile::TempDir;
use tokio::sync::mpsc;

fn compensator() -> SilenceCompensator {
    SilenceCompensator::new(20, FRAME_SIZE_BYTES as usize, 15_000)
}

fn subscription() -> (mpsc::Sender<AudioFrame>, SpeakerSubscription) {
    let (tx, rx) = mpsc::channel(100);
    let handle = SubscriptionHandle::new();
    (tx, SpeakerSubscription { frames: rx, handle })
}

#[tokio::test]
async fn contiguous_frames_produce_no_fill() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("room").join("alice").join("1000.raw");

    let (tx, sub) = subscription();
    let capture = StreamCapture::spawn(
        path.clone(),
        SpeakerInfo::new("alice", "Alice"),
        sub,
        compensator(),
    )
    .unwrap();

    for t in [0u64, 20, 40] {
        tx.send(frame(t)).await.unwrap();
    }
    drop(tx);

    let stats = capture.stop().await.unwrap();
    assert_eq!(stats.frames_written, 3);
    assert_eq!(stats.silence_frames, 0);
    assert_eq!(stats.bytes_written, 3 * FRAME_SIZE_BYTES);
    assert_eq!(fs::metadata(&path).unwrap().len(), 3 * FRAME_SIZE_BYTES);
}

#[tokio::test]
async fn first_frame_never_triggers_fill_regardless_of_timestamp() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("r").join("s").join("1.raw");

    let (tx, sub) = subscription();
    let capture =
        StreamCapture::spawn(path.clone(), SpeakerInfo::new("s", "S"), sub, compensator()).unwrap();

    // Large absolute arrival time on the very first frame
    tx.send(frame(987_654_321)).await.unwrap();
    drop(tx);

    let stats = capture.stop().await.unwrap();
    assert_eq!(stats.frames_written, 1);
    assert_eq!(stats.silence_frames, 0);
    assert_eq!(fs::metadata(&path).unwrap().len(), FRAME_SIZE_BYTES);
}

#[tokio::test]
async fn gap_fill_is_written_before_the_real_frame() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("r").join("bob").join("1.raw");

    let (tx, sub) = subscription();
    let capture = StreamCapture::spawn(
        path.clone(),
        SpeakerInfo::new("bob", "Bob"),
        sub,
        compensator(),
    )
    .unwrap();

    // 100ms between arrivals: floor(100/20) - 1 = 4 synthetic frames
    tx.send(frame(0)).await.unwrap();
    tx.send(frame(100)).await.unwrap();
    drop(tx);

    let stats = capture.stop().await.unwrap();
    assert_eq!(stats.frames_written, 2);
    assert_eq!(stats.silence_frames, 4);

    let data = fs::read(&path).unwrap();
    assert_eq!(data.len() as u64, 6 * FRAME_SIZE_BYTES);

    let frame_bytes = FRAME_SIZE_BYTES as usize;
    // First real frame, then four zero frames, then the second real frame
    assert!(data[..frame_bytes].iter().any(|&b| b != 0));
    assert!(data[frame_bytes..5 * frame_bytes].iter().all(|&b| b == 0));
    assert!(data[5 * frame_bytes..].iter().any(|&b| b != 0));
}

#[tokio::test]
async fn closing_the_subscription_twice_is_a_noop() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("r").join("s").join("1.raw");

    let (tx, sub) = subscription();
    let outer_handle = sub.handle.clone();
    let capture =
        StreamCapture::spawn(path, SpeakerInfo::new("s", "S"), sub, compensator()).unwrap();

    tx.send(frame(0)).await.unwrap();

    assert!(outer_handle.close());
    assert!(!outer_handle.close());

    // stop() closes again internally; still fine
    let stats = capture.stop().await.unwrap();
    assert!(stats.frames_written <= 1);
}

#[tokio::test]
async fn stream_end_from_platform_finishes_the_track() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("r").join("s").join("1.raw");

    let (tx, sub) = subscription();
    let capture =
        StreamCapture::spawn(path.clone(), SpeakerInfo::new("s", "S"), sub, compensator()).unwrap();

    tx.send(frame(0)).await.unwrap();
    tx.send(frame(20)).await.unwrap();
    // Speaker inactivity: the platform drops the sender
    drop(tx);

    // stop() on an already-finished loop just collects the result
    let stats = capture.stop().await.unwrap();
    assert_eq!(stats.frames_written, 2);
    assert_eq!(stats.bytes_written, fs::metadata(&path).unwrap().len());
}

#[tokio::test]
async fn capped_gap_degrades_to_bounded_fill() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("r").join("s").join("1.raw");

    let cap = 10;
    let (tx, sub) = subscription();
    let capture = StreamCapture::spawn(
        path.clone(),
        SpeakerInfo::new("s", "S"),
        sub,
        SilenceCompensator::new(20, FRAME_SIZE_BYTES as usize, cap),
    )
    .unwrap();

    tx.send(frame(0)).await.unwrap();
    // A ten-minute hole wants tens of thousands of frames
    tx.send(frame(600_000)).await.unwrap();
    drop(tx);

    let stats = capture.stop().await.unwrap();
    assert_eq!(stats.silence_frames, cap as u64);
    assert_eq!(
        fs::metadata(&path).unwrap().len(),
        (2 + cap as u64) * FRAME_SIZE_BYTES
    );
}
