use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Append-only raw PCM storage unit for a single track
///
/// Owned exclusively by the track's capture loop while active; nothing
/// else writes to the file until finalize takes over the path read-only.
pub struct TrackWriter {
    writer: Option<BufWriter<File>>,
    path: PathBuf,
    bytes_written: u64,
}

impl TrackWriter {
    pub fn create(path: PathBuf) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&path)?;
        info!("Track storage opened: {}", path.display());

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            path,
            bytes_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Write one real frame of interleaved i16 samples as little-endian PCM
    pub fn write_frame(&mut self, samples: &[i16]) -> io::Result<()> {
        if let Some(writer) = &mut self.writer {
            for &sample in samples {
                writer.write_all(&sample.to_le_bytes())?;
            }
            self.bytes_written += samples.len() as u64 * 2;
        }
        Ok(())
    }

    /// Write pre-built synthetic silence ahead of the next real frame
    pub fn write_silence(&mut self, fill: &[u8]) -> io::Result<()> {
        if let Some(writer) = &mut self.writer {
            writer.write_all(fill)?;
            self.bytes_written += fill.len() as u64;
        }
        Ok(())
    }

    /// Flush and close the storage unit, returning total bytes written
    pub fn finish(mut self) -> io::Result<u64> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        info!(
            "Track storage closed: {} ({} bytes)",
            self.path.display(),
            self.bytes_written
        );
        Ok(self.bytes_written)
    }
}

impl Drop for TrackWriter {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                warn!("Failed to flush track storage on drop: {}", e);
            }
        }
    }
}
