use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, Notify};

/// One decoded audio frame delivered by the voice platform (16-bit PCM,
/// interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Arrival time in milliseconds on a monotonic clock
    pub arrival_ms: u64,
}

/// Handle for closing a live per-speaker subscription.
///
/// Clones share the same underlying state. Closing is idempotent: the
/// first `close` wins, later calls are no-ops.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    inner: Arc<HandleInner>,
}

#[derive(Debug)]
struct HandleInner {
    closed: AtomicBool,
    notify: Notify,
}

impl SubscriptionHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HandleInner {
                closed: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Ask the subscription to close. Returns `false` if it was already
    /// closed.
    pub fn close(&self) -> bool {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.inner.notify.notify_waiters();
        true
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Resolves once the handle has been closed.
    pub async fn closed(&self) {
        let notified = self.inner.notify.notified();
        if self.is_closed() {
            return;
        }
        notified.await;
    }
}

impl Default for SubscriptionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// One speaker's live decoded-audio feed: a frame channel plus the handle
/// that closes it.
///
/// The sender side belongs to the platform; it stops producing once the
/// handle is closed or the speaker goes inactive, and signals end-of-stream
/// by dropping the sender.
pub struct SpeakerSubscription {
    pub frames: mpsc::Receiver<AudioFrame>,
    pub handle: SubscriptionHandle,
}

/// Voice platform boundary
///
/// Hands out per-speaker subscriptions yielding already-decoded audio.
/// Implementations wrap whatever gateway is in use; tests script frames
/// through a plain channel.
#[async_trait::async_trait]
pub trait VoiceReceiver: Send + Sync {
    async fn subscribe(&self, speaker_id: &str) -> Result<SpeakerSubscription>;
}
