use anyhow::Result;
use serde::Deserialize;

use crate::finalize::MuxerConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub muxer: MuxerConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    /// Root directory for per-speaker storage units and artifacts
    pub data_root: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub frame_duration_ms: u64,
    /// Ceiling on synthetic silence frames per gap
    pub max_gap_frames: usize,
    /// Write a standalone WAV per track at finalize
    pub export_track_wavs: bool,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
