//! Session finalization
//!
//! One-way trip per session: stop every capture, discover the session's
//! storage units on disk, pad them to a common length, hand them to the
//! muxer, and persist a provenance manifest. Each step is best-effort but
//! strictly sequential; a failed finalize leaves the padded raw tracks on
//! disk for manual recovery.

pub mod export;
pub mod muxer;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::error::{RecorderError, RecorderResult};
use crate::session::{FinalizedSession, Session, SessionManifest, SpeakerInfo, TrackError};

pub use export::export_track_wav;
pub use muxer::{FfmpegMuxer, MuxInput, Muxer, MuxerConfig};

/// Zero-block size used when appending padding
const PAD_CHUNK_BYTES: usize = 8192;

#[derive(Debug, Clone)]
pub struct FinalizeConfig {
    /// Root of the local data area (`<root>/<room>/<speaker>/<session>.raw`)
    pub data_root: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    /// Container extension for the artifact (`combined_<session>.<ext>`)
    pub container: String,
    /// Also write a standalone WAV per padded track
    pub export_track_wavs: bool,
}

/// A storage unit found on disk during finalize
#[derive(Debug, Clone)]
struct DiscoveredUnit {
    speaker_id: String,
    path: PathBuf,
}

/// Drives a session through `Finalizing` into `Closed` (artifact produced)
/// or `FinalizeFailed` (error surfaced, raw tracks kept).
pub struct SessionFinalizer {
    muxer: Arc<dyn Muxer>,
    config: FinalizeConfig,
}

impl SessionFinalizer {
    pub fn new(muxer: Arc<dyn Muxer>, config: FinalizeConfig) -> Self {
        Self { muxer, config }
    }

    pub async fn finalize(&self, session: Session) -> RecorderResult<FinalizedSession> {
        let room_id = session.room_id.clone();
        let session_id = session.session_id;
        let started_at = session.started_at;
        info!("Finalizing session {} in room {}", session_id, room_id);

        let (speakers, track_errors) = self.stop_all_tracks(session).await;

        match self
            .produce_artifact(&room_id, session_id, started_at, &speakers, track_errors)
            .await
        {
            Ok(finalized) => {
                info!(
                    "Session {} closed: artifact {}",
                    session_id,
                    finalized.artifact_path.display()
                );
                Ok(finalized)
            }
            Err(e) => {
                error!("Finalize failed for session {}: {}", session_id, e);
                Err(e)
            }
        }
    }

    /// Stop every capture. Individual stop failures are collected and the
    /// remaining tracks still stop.
    async fn stop_all_tracks(&self, session: Session) -> (Vec<SpeakerInfo>, Vec<TrackError>) {
        let mut speakers = Vec::with_capacity(session.tracks.len());
        let mut errors = Vec::new();

        for capture in session.tracks {
            let speaker = capture.speaker().clone();
            match capture.stop().await {
                Ok(stats) => {
                    debug!(
                        "Track stopped for {}: {} frames ({} silence), {} bytes",
                        speaker.id, stats.frames_written, stats.silence_frames, stats.bytes_written
                    );
                }
                Err(e) => {
                    warn!("Track for {} failed during stop: {}", speaker.id, e);
                    errors.push(TrackError {
                        speaker: speaker.clone(),
                        message: e.to_string(),
                    });
                }
            }
            speakers.push(speaker);
        }

        (speakers, errors)
    }

    /// Discover, pad, mux, manifest
    async fn produce_artifact(
        &self,
        room_id: &str,
        session_id: u64,
        started_at: DateTime<Utc>,
        speakers: &[SpeakerInfo],
        track_errors: Vec<TrackError>,
    ) -> RecorderResult<FinalizedSession> {
        let room_dir = self.config.data_root.join(room_id);

        let units = discover_units(&room_dir, session_id)?;
        if units.is_empty() {
            return Err(RecorderError::NoTracksFound {
                room_id: room_id.to_string(),
                session_id,
            });
        }
        info!(
            "Discovered {} storage units for session {}",
            units.len(),
            session_id
        );

        let ordered = label_and_order(units, speakers);
        let contributing: Vec<SpeakerInfo> = ordered.iter().map(|(s, _)| s.clone()).collect();
        let inputs: Vec<MuxInput> = ordered
            .into_iter()
            .map(|(speaker, path)| MuxInput {
                path,
                label: speaker.label,
            })
            .collect();

        let paths: Vec<PathBuf> = inputs.iter().map(|i| i.path.clone()).collect();
        let track_bytes = pad_to_longest(&paths).await?;
        info!(
            "Padded {} tracks to {} bytes each",
            paths.len(),
            track_bytes
        );

        if self.config.export_track_wavs {
            for path in &paths {
                if let Err(e) = export_track_wav(path, self.config.sample_rate, self.config.channels)
                {
                    warn!("WAV export failed for {}: {}", path.display(), e);
                }
            }
        }

        let artifact_path =
            room_dir.join(format!("combined_{}.{}", session_id, self.config.container));
        self.muxer.mux(&inputs, &artifact_path).await?;

        let manifest = SessionManifest {
            session_id,
            room_id: room_id.to_string(),
            started_at,
            artifact: artifact_path.display().to_string(),
            container: self.config.container.clone(),
            created_at: Utc::now(),
            speakers: contributing.clone(),
            track_bytes,
        };
        let manifest_path = write_manifest(&room_dir, &manifest)?;

        Ok(FinalizedSession {
            room_id: room_id.to_string(),
            session_id,
            artifact_path,
            manifest_path,
            speakers: contributing,
            track_bytes,
            track_errors,
        })
    }
}

/// Find every `<room>/<speaker>/<session_id>.raw` on disk.
///
/// Goes through the filesystem rather than in-memory track records so that
/// units whose record was lost (e.g. after a restart) still make it into
/// the artifact.
fn discover_units(room_dir: &Path, session_id: u64) -> RecorderResult<Vec<DiscoveredUnit>> {
    let mut units = Vec::new();

    if !room_dir.exists() {
        return Ok(units);
    }

    for entry in fs::read_dir(room_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let unit_path = entry.path().join(format!("{}.raw", session_id));
        if unit_path.is_file() {
            units.push(DiscoveredUnit {
                speaker_id: entry.file_name().to_string_lossy().into_owned(),
                path: unit_path,
            });
        }
    }

    // Deterministic base order before session order is applied
    units.sort_by(|a, b| a.speaker_id.cmp(&b.speaker_id));
    Ok(units)
}

/// Order units by speaker insertion order, orphans (units with no
/// in-memory record) last, labeled by their directory name.
fn label_and_order(
    mut units: Vec<DiscoveredUnit>,
    speakers: &[SpeakerInfo],
) -> Vec<(SpeakerInfo, PathBuf)> {
    let mut ordered = Vec::with_capacity(units.len());

    for speaker in speakers {
        if let Some(pos) = units.iter().position(|u| u.speaker_id == speaker.id) {
            let unit = units.remove(pos);
            ordered.push((speaker.clone(), unit.path));
        }
    }

    for orphan in units {
        debug!(
            "Storage unit for {} has no in-memory track record",
            orphan.speaker_id
        );
        ordered.push((
            SpeakerInfo::new(orphan.speaker_id.clone(), orphan.speaker_id),
            orphan.path,
        ));
    }

    ordered
}

/// Pad every unit with trailing zero bytes up to the longest one.
///
/// Padding at the end keeps all tracks aligned to the same session start
/// without rewriting gap-filled content already on disk. Returns the
/// common byte length.
pub async fn pad_to_longest(paths: &[PathBuf]) -> RecorderResult<u64> {
    let mut max_len = 0u64;
    for path in paths {
        let len = tokio::fs::metadata(path).await?.len();
        max_len = max_len.max(len);
    }

    for path in paths {
        let len = tokio::fs::metadata(path).await?.len();
        if len == max_len {
            continue;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(path)
            .await?;

        let mut remaining = (max_len - len) as usize;
        let zeros = [0u8; PAD_CHUNK_BYTES];
        while remaining > 0 {
            let n = remaining.min(PAD_CHUNK_BYTES);
            file.write_all(&zeros[..n]).await?;
            remaining -= n;
        }
        file.flush().await?;

        debug!(
            "Padded {} from {} to {} bytes",
            path.display(),
            len,
            max_len
        );
    }

    Ok(max_len)
}

fn write_manifest(room_dir: &Path, manifest: &SessionManifest) -> RecorderResult<PathBuf> {
    let manifest_path = room_dir.join(format!("combined_{}.json", manifest.session_id));
    let json = serde_json::to_vec_pretty(manifest)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    fs::write(&manifest_path, json)?;

    debug!("Manifest written: {}", manifest_path.display());
    Ok(manifest_path)
}
