pub mod audio;
pub mod capture;
pub mod config;
pub mod error;
pub mod finalize;
pub mod recorder;
pub mod session;

pub use audio::{
    AudioFrame, SilenceCompensator, SpeakerSubscription, SubscriptionHandle, VoiceReceiver,
};
pub use capture::{CaptureStats, StreamCapture, TrackWriter};
pub use config::Config;
pub use error::{RecorderError, RecorderResult};
pub use finalize::{
    FfmpegMuxer, FinalizeConfig, MuxInput, Muxer, MuxerConfig, SessionFinalizer,
};
pub use recorder::{Recorder, RecorderConfig};
pub use session::{
    FinalizedSession, Session, SessionManifest, SessionRegistry, SpeakerInfo, TrackError,
    TrackHandle,
};
