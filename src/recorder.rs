//! Public surface of the recording core
//!
//! Three calls cover everything the command surface needs:
//! `start_session`, `add_speaker`, `end_session`. Everything behind them
//! (registry, captures, finalize) stays internal.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::audio::{SilenceCompensator, VoiceReceiver};
use crate::capture::StreamCapture;
use crate::config::Config;
use crate::error::{RecorderError, RecorderResult};
use crate::finalize::{FfmpegMuxer, FinalizeConfig, Muxer, SessionFinalizer};
use crate::session::{FinalizedSession, SessionRegistry, SpeakerInfo, TrackHandle};

/// Everything the core needs to know about the audio format and layout
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Root of the local data area
    pub data_root: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    pub frame_duration_ms: u64,
    /// Ceiling on synthetic frames per gap
    pub max_gap_frames: usize,
    /// Artifact container extension
    pub container: String,
    /// Also write a standalone WAV per track at finalize
    pub export_track_wavs: bool,
}

impl RecorderConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            data_root: PathBuf::from(&cfg.audio.data_root),
            sample_rate: cfg.audio.sample_rate,
            channels: cfg.audio.channels,
            frame_duration_ms: cfg.audio.frame_duration_ms,
            max_gap_frames: cfg.audio.max_gap_frames,
            container: cfg.muxer.container.clone(),
            export_track_wavs: cfg.audio.export_track_wavs,
        }
    }

    /// Bytes in one frame of interleaved 16-bit PCM
    pub fn frame_size_bytes(&self) -> usize {
        (self.sample_rate as usize / 1000)
            * self.frame_duration_ms as usize
            * self.channels as usize
            * 2
    }

    pub fn compensator(&self) -> SilenceCompensator {
        SilenceCompensator::new(
            self.frame_duration_ms,
            self.frame_size_bytes(),
            self.max_gap_frames,
        )
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            sample_rate: 48000,
            channels: 2,
            frame_duration_ms: crate::audio::DEFAULT_FRAME_DURATION_MS,
            max_gap_frames: crate::audio::DEFAULT_MAX_GAP_FRAMES,
            container: "mka".to_string(),
            export_track_wavs: false,
        }
    }
}

/// Multi-track session recorder
pub struct Recorder {
    registry: SessionRegistry,
    receiver: Arc<dyn VoiceReceiver>,
    finalizer: SessionFinalizer,
    config: RecorderConfig,
}

impl Recorder {
    pub fn new(
        receiver: Arc<dyn VoiceReceiver>,
        muxer: Arc<dyn Muxer>,
        config: RecorderConfig,
    ) -> Self {
        let finalizer = SessionFinalizer::new(
            muxer,
            FinalizeConfig {
                data_root: config.data_root.clone(),
                sample_rate: config.sample_rate,
                channels: config.channels,
                container: config.container.clone(),
                export_track_wavs: config.export_track_wavs,
            },
        );

        Self {
            registry: SessionRegistry::new(),
            receiver,
            finalizer,
            config,
        }
    }

    /// Wire up the default ffmpeg muxer from file configuration
    pub fn with_ffmpeg(receiver: Arc<dyn VoiceReceiver>, cfg: &Config) -> Self {
        let recorder_config = RecorderConfig::from_config(cfg);
        let muxer = Arc::new(FfmpegMuxer::new(
            cfg.muxer.clone(),
            recorder_config.sample_rate,
            recorder_config.channels,
        ));
        Self::new(receiver, muxer, recorder_config)
    }

    /// Begin a recording session in a room. At most one session per room;
    /// a second start is rejected with `AlreadyRecording`.
    pub async fn start_session(&self, room_id: &str) -> RecorderResult<u64> {
        self.registry.start_session(room_id).await
    }

    /// Start capturing one speaker into the room's active session
    pub async fn add_speaker(
        &self,
        room_id: &str,
        speaker: SpeakerInfo,
    ) -> RecorderResult<TrackHandle> {
        let session_id = self.registry.active_session(room_id).await?;

        let subscription = self
            .receiver
            .subscribe(&speaker.id)
            .await
            .map_err(|e| RecorderError::SubscriptionFailure {
                speaker_id: speaker.id.clone(),
                source: e,
            })?;

        let storage_path = self
            .config
            .data_root
            .join(room_id)
            .join(&speaker.id)
            .join(format!("{}.raw", session_id));

        let capture = StreamCapture::spawn(
            storage_path,
            speaker,
            subscription,
            self.config.compensator(),
        )?;

        let handle = TrackHandle {
            speaker: capture.speaker().clone(),
            storage_path: capture.storage_path().to_path_buf(),
            started_at: capture.started_at(),
        };

        // The session can end between the check above and this insert;
        // tear the orphan capture down and report the room as idle.
        if let Err(orphan) = self.registry.add_track(room_id, capture).await {
            warn!(
                "Session in room {} ended while adding {}; discarding capture",
                room_id, handle.speaker.id
            );
            let path = orphan.storage_path().to_path_buf();
            if let Err(e) = orphan.stop().await {
                warn!("Orphan capture teardown: {}", e);
            }
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!("Could not remove orphan storage unit {}: {}", path.display(), e);
            }
            return Err(RecorderError::NoActiveSession(room_id.to_string()));
        }

        info!(
            "Speaker {} recording in room {} (session {})",
            handle.speaker.id, room_id, session_id
        );
        Ok(handle)
    }

    /// Stop the room's session, finalize all tracks, and return the
    /// artifact hand-off for delivery
    pub async fn end_session(&self, room_id: &str) -> RecorderResult<FinalizedSession> {
        let session = self.registry.end_session(room_id).await?;
        self.finalizer.finalize(session).await
    }

    pub async fn is_recording(&self, room_id: &str) -> bool {
        self.registry.is_recording(room_id).await
    }
}
