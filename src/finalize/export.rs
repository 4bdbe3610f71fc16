use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

/// Write a standalone WAV next to a raw storage unit.
///
/// Runs after padding, so per-track WAVs come out equal-length too. The
/// raw unit is left untouched.
pub fn export_track_wav(raw_path: &Path, sample_rate: u32, channels: u16) -> Result<PathBuf> {
    let wav_path = raw_path.with_extension("wav");

    let data = fs::read(raw_path)
        .with_context(|| format!("Failed to read raw track {}", raw_path.display()))?;

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(&wav_path, spec)
        .with_context(|| format!("Failed to create WAV file {}", wav_path.display()))?;

    for chunk in data.chunks_exact(2) {
        let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
        writer
            .write_sample(sample)
            .context("Failed to write sample to WAV")?;
    }

    writer.finalize().context("Failed to finalize WAV file")?;

    info!("Exported track WAV: {}", wav_path.display());
    Ok(wav_path)
}
