#![allow(dead_code)]

// Shared test doubles: a scripted voice platform and muxer stand-ins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use multitrack_recorder::{
    AudioFrame, MuxInput, Muxer, RecorderError, RecorderResult, SpeakerSubscription,
    SubscriptionHandle, VoiceReceiver,
};
use tokio::sync::mpsc;

/// Samples in one 20ms frame at 48kHz stereo
pub const SAMPLES_PER_FRAME: usize = 1920;

/// Bytes in one 20ms frame at 48kHz stereo, 16-bit
pub const FRAME_SIZE_BYTES: u64 = 3840;

pub fn frame(arrival_ms: u64) -> AudioFrame {
    AudioFrame {
        samples: vec![100i16; SAMPLES_PER_FRAME],
        arrival_ms,
    }
}

/// Voice platform double: hands each speaker a pre-scripted frame
/// sequence, fully buffered at subscribe time so tests are deterministic.
/// The dropped sender ends the stream like real speaker inactivity.
pub struct ScriptedReceiver {
    scripts: Mutex<HashMap<String, Vec<AudioFrame>>>,
}

impl ScriptedReceiver {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
        }
    }

    pub fn script(&self, speaker_id: &str, frames: Vec<AudioFrame>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(speaker_id.to_string(), frames);
    }
}

#[async_trait::async_trait]
impl VoiceReceiver for ScriptedReceiver {
    async fn subscribe(&self, speaker_id: &str) -> Result<SpeakerSubscription> {
        let frames = self
            .scripts
            .lock()
            .unwrap()
            .remove(speaker_id)
            .unwrap_or_default();

        // Capacity covers the whole script, so every send completes here
        // and the capture loop sees a closed sender after the last frame.
        let (tx, rx) = mpsc::channel(frames.len().max(1));
        let handle = SubscriptionHandle::new();

        for f in frames {
            tx.send(f).await.expect("scripted channel closed early");
        }
        drop(tx);

        Ok(SpeakerSubscription { frames: rx, handle })
    }
}

/// Muxer double that records every invocation and fakes the artifact
pub struct RecordingMuxer {
    pub calls: Mutex<Vec<(Vec<MuxInput>, PathBuf)>>,
}

impl RecordingMuxer {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn labels(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .last()
            .map(|(inputs, _)| inputs.iter().map(|i| i.label.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Muxer for RecordingMuxer {
    async fn mux(&self, inputs: &[MuxInput], output: &Path) -> RecorderResult<()> {
        std::fs::write(output, b"muxed")?;
        self.calls
            .lock()
            .unwrap()
            .push((inputs.to_vec(), output.to_path_buf()));
        Ok(())
    }
}

/// Muxer double that always fails, like a missing external tool
pub struct FailingMuxer;

#[async_trait::async_trait]
impl Muxer for FailingMuxer {
    async fn mux(&self, _inputs: &[MuxInput], _output: &Path) -> RecorderResult<()> {
        Err(RecorderError::MuxerFailure(
            "simulated muxer failure".to_string(),
        ))
    }
}
