use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::storage::TrackWriter;
use crate::audio::{AudioFrame, SilenceCompensator, SpeakerSubscription, SubscriptionHandle};
use crate::error::{RecorderError, RecorderResult};
use crate::session::SpeakerInfo;

/// Counters reported by a finished capture loop
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureStats {
    /// Real frames received from the platform
    pub frames_written: u64,
    /// Synthetic silence frames inserted for gap-fill
    pub silence_frames: u64,
    /// Total bytes in the storage unit, fill included
    pub bytes_written: u64,
}

/// Owns one speaker's live subscription for the duration of a track.
///
/// A spawned single-writer loop drains the subscription channel, runs each
/// arrival through the [`SilenceCompensator`], and appends fill plus the
/// real frame to the track's storage unit in chronological order. The loop
/// ends when the platform drops the sender (speaker inactivity) or the
/// subscription handle is closed.
pub struct StreamCapture {
    speaker: SpeakerInfo,
    storage_path: PathBuf,
    started_at: DateTime<Utc>,
    handle: SubscriptionHandle,
    task: JoinHandle<RecorderResult<CaptureStats>>,
}

impl StreamCapture {
    /// Open the storage unit and start the capture loop
    pub fn spawn(
        storage_path: PathBuf,
        speaker: SpeakerInfo,
        subscription: SpeakerSubscription,
        compensator: SilenceCompensator,
    ) -> RecorderResult<Self> {
        let writer = TrackWriter::create(storage_path.clone())
            .map_err(|e| RecorderError::capture_write(&speaker.id, e))?;

        info!(
            "Capture started for {} ({}) -> {}",
            speaker.label,
            speaker.id,
            storage_path.display()
        );

        let handle = subscription.handle.clone();
        let speaker_id = speaker.id.clone();
        let task = tokio::spawn(capture_loop(
            subscription.frames,
            subscription.handle,
            writer,
            compensator,
            speaker_id,
        ));

        Ok(Self {
            speaker,
            storage_path,
            started_at: Utc::now(),
            handle,
            task,
        })
    }

    pub fn speaker(&self) -> &SpeakerInfo {
        &self.speaker
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }

    /// Close the subscription and wait for the capture loop to drain.
    ///
    /// Idempotent at the subscription level: closing an already-closed
    /// subscription is a no-op. Terminal for the track.
    pub async fn stop(self) -> RecorderResult<CaptureStats> {
        if self.handle.close() {
            debug!("Closing subscription for {}", self.speaker.id);
        } else {
            debug!("Subscription for {} already closed", self.speaker.id);
        }

        match self.task.await {
            Ok(result) => result,
            Err(e) => {
                warn!("Capture task for {} did not complete: {}", self.speaker.id, e);
                Err(RecorderError::CaptureAborted(
                    self.speaker.id.clone(),
                    e.to_string(),
                ))
            }
        }
    }
}

/// Single-writer loop: frames (synthetic fill first, then the real frame)
/// land in strict chronological arrival order.
async fn capture_loop(
    mut frames: mpsc::Receiver<AudioFrame>,
    handle: SubscriptionHandle,
    mut writer: TrackWriter,
    compensator: SilenceCompensator,
    speaker_id: String,
) -> RecorderResult<CaptureStats> {
    let mut stats = CaptureStats::default();
    let mut last_arrival: Option<u64> = None;

    loop {
        tokio::select! {
            // Buffered frames drain before a close is acted on
            biased;

            maybe_frame = frames.recv() => {
                let Some(frame) = maybe_frame else {
                    debug!("Stream ended for {}", speaker_id);
                    break;
                };

                let fill = compensator.compensate(last_arrival, frame.arrival_ms);
                if !fill.is_empty() {
                    let missing = fill.len() / compensator.frame_size_bytes();
                    debug!(
                        "Gap-fill for {}: {} synthetic frames before {}ms",
                        speaker_id, missing, frame.arrival_ms
                    );
                    writer
                        .write_silence(&fill)
                        .map_err(|e| RecorderError::capture_write(&speaker_id, e))?;
                    stats.silence_frames += missing as u64;
                }

                writer
                    .write_frame(&frame.samples)
                    .map_err(|e| RecorderError::capture_write(&speaker_id, e))?;
                stats.frames_written += 1;
                last_arrival = Some(frame.arrival_ms);
            }

            _ = handle.closed() => {
                debug!("Subscription closed for {}", speaker_id);
                break;
            }
        }
    }

    stats.bytes_written = writer
        .finish()
        .map_err(|e| RecorderError::capture_write(&speaker_id, e))?;

    info!(
        "Capture finished for {}: {} frames, {} silence frames, {} bytes",
        speaker_id, stats.frames_written, stats.silence_frames, stats.bytes_written
    );

    Ok(stats)
}
