pub mod silence;
pub mod subscription;

pub use silence::{
    SilenceCompensator, DEFAULT_FRAME_DURATION_MS, DEFAULT_FRAME_SIZE_BYTES, DEFAULT_MAX_GAP_FRAMES,
};
pub use subscription::{AudioFrame, SpeakerSubscription, SubscriptionHandle, VoiceReceiver};
