//! Per-speaker stream capture
//!
//! Each active speaker gets one [`StreamCapture`]: a subscription to the
//! platform's decoded audio, a silence compensator, and an append-only
//! storage unit. Captures are independent; one track failing never takes
//! down the rest of the session.

pub mod storage;
pub mod stream;

pub use storage::TrackWriter;
pub use stream::{CaptureStats, StreamCapture};
