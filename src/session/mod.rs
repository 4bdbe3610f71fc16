//! Session state and the process-wide registry
//!
//! A `Session` is one recording effort in one room; the `SessionRegistry`
//! owns the room → session mapping and is the only shared mutable state in
//! the core. Everything else (subscriptions, storage units) is exclusively
//! owned per track.

mod registry;
mod types;

pub use registry::SessionRegistry;
pub use types::{FinalizedSession, Session, SessionManifest, SpeakerInfo, TrackError, TrackHandle};
