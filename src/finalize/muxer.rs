use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{RecorderError, RecorderResult};

/// One labeled input track for the muxer
#[derive(Debug, Clone)]
pub struct MuxInput {
    /// Raw PCM storage unit, already padded to the common length
    pub path: PathBuf,
    /// Speaker label, attached to the stream as metadata
    pub label: String,
}

/// External-process boundary: combines N equal-length raw tracks into one
/// container with one encoded stream per input. No reordering, no silent
/// truncation; success is exit code 0, anything else is failure.
#[async_trait::async_trait]
pub trait Muxer: Send + Sync {
    async fn mux(&self, inputs: &[MuxInput], output: &Path) -> RecorderResult<()>;
}

/// Codec and invocation settings for the ffmpeg muxer.
///
/// These are configuration, not invariants: any voice-suitable codec works
/// as long as every input is fed at the declared sample format.
#[derive(Debug, Clone, Deserialize)]
pub struct MuxerConfig {
    pub ffmpeg_path: String,
    /// Target encoding; default is voice-optimized Opus, downmixed to mono
    pub codec: String,
    pub bitrate: String,
    /// Container extension (e.g. "mka")
    pub container: String,
    /// Hard deadline for the external process
    pub timeout_secs: u64,
}

impl Default for MuxerConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            codec: "libopus".to_string(),
            bitrate: "64k".to_string(),
            container: "mka".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Muxes raw PCM tracks with an external ffmpeg process
pub struct FfmpegMuxer {
    config: MuxerConfig,
    sample_rate: u32,
    channels: u16,
}

impl FfmpegMuxer {
    pub fn new(config: MuxerConfig, sample_rate: u32, channels: u16) -> Self {
        Self {
            config,
            sample_rate,
            channels,
        }
    }

    /// Build the full ffmpeg argument list for a set of labeled inputs
    fn build_args(&self, inputs: &[MuxInput], output: &Path) -> Vec<String> {
        let mut args: Vec<String> = vec!["-hide_banner".into(), "-y".into()];

        // Each raw unit is headerless PCM, so the input format must be
        // declared per input
        for input in inputs {
            args.push("-f".into());
            args.push("s16le".into());
            args.push("-ar".into());
            args.push(self.sample_rate.to_string());
            args.push("-ac".into());
            args.push(self.channels.to_string());
            args.push("-i".into());
            args.push(input.path.display().to_string());
        }

        // One audio stream per input, in input order
        for i in 0..inputs.len() {
            args.push("-map".into());
            args.push(format!("{}:a", i));
        }

        args.push("-c:a".into());
        args.push(self.config.codec.clone());
        args.push("-b:a".into());
        args.push(self.config.bitrate.clone());
        args.push("-ac".into());
        args.push("1".into());

        for (i, input) in inputs.iter().enumerate() {
            args.push(format!("-metadata:s:a:{}", i));
            args.push(format!("title={}", input.label));
        }

        args.push(output.display().to_string());
        args
    }
}

#[async_trait::async_trait]
impl Muxer for FfmpegMuxer {
    async fn mux(&self, inputs: &[MuxInput], output: &Path) -> RecorderResult<()> {
        if inputs.is_empty() {
            return Err(RecorderError::MuxerFailure(
                "no input tracks given".to_string(),
            ));
        }

        let args = self.build_args(inputs, output);
        debug!("Invoking {} {}", self.config.ffmpeg_path, args.join(" "));

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                RecorderError::MuxerFailure(format!(
                    "failed to spawn {}: {}",
                    self.config.ffmpeg_path, e
                ))
            })?;

        // Drain stderr concurrently so a chatty ffmpeg cannot stall on a
        // full pipe
        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_end(&mut buf).await;
            }
            String::from_utf8_lossy(&buf).into_owned()
        });

        let deadline = Duration::from_secs(self.config.timeout_secs);
        let status = match tokio::time::timeout(deadline, child.wait()).await {
            Ok(waited) => waited.map_err(|e| {
                RecorderError::MuxerFailure(format!("failed to wait for muxer: {}", e))
            })?,
            Err(_) => {
                warn!("Muxer exceeded {:?}, killing", deadline);
                let _ = child.kill().await;
                return Err(RecorderError::MuxerTimeout(deadline));
            }
        };

        let stderr_text = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let tail: String = stderr_text
                .lines()
                .rev()
                .take(5)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("\n");
            return Err(RecorderError::MuxerFailure(format!(
                "{} exited with {}: {}",
                self.config.ffmpeg_path, status, tail
            )));
        }

        info!(
            "Muxed {} tracks into {}",
            inputs.len(),
            output.display()
        );
        Ok(())
    }
}
