//! Video output surface.
//!
//! A [`VideoSurface`] is the media element the embedding layer hands to the
//! runtime through `mount`. It is shared, not owned: only the active adapter
//! drives it, and the engine guarantees that by destroying the previous
//! adapter before attaching a new one.

mod simulated;

pub use simulated::{MediaInfo, SimulatedSurface};

use crate::error::{AdapterError, AdapterResult};
use crate::event::ErrorKind;
use crate::observer::{Listener, Subscription};
use crate::types::{Resolution, TimeSnapshot};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Media element notifications, named after their HTML media counterparts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaEvent {
    LoadStart,
    Progress { progress: f64 },
    LoadedMetadata,
    TimeUpdate,
    Playing,
    Pause,
    Waiting,
    Seeked,
    Ended,
    VolumeChange { volume: f64, muted: bool },
    Error { code: MediaErrorCode, message: String },
}

/// Media element error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaErrorCode {
    Aborted,
    Network,
    Decode,
    SrcNotSupported,
}

impl MediaErrorCode {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MediaErrorCode::Aborted => ErrorKind::Aborted,
            MediaErrorCode::Network => ErrorKind::Network,
            MediaErrorCode::Decode => ErrorKind::Decode,
            MediaErrorCode::SrcNotSupported => ErrorKind::NotSupported,
        }
    }

    pub fn into_error(self, message: impl Into<String>) -> AdapterError {
        let message = message.into();
        match self {
            MediaErrorCode::Aborted => AdapterError::Aborted(message),
            MediaErrorCode::Network => AdapterError::network(message),
            MediaErrorCode::Decode => AdapterError::Decode(message),
            MediaErrorCode::SrcNotSupported => AdapterError::NotSupported { message, codec: None },
        }
    }
}

/// The media element an adapter renders into
#[async_trait]
pub trait VideoSurface: Send + Sync {
    /// Label for logs
    fn id(&self) -> &str;

    /// Start loading `url`; load failures arrive as [`MediaEvent::Error`]
    async fn set_source(&self, url: &str) -> AdapterResult<()>;

    async fn play(&self) -> AdapterResult<()>;

    async fn pause(&self) -> AdapterResult<()>;

    async fn seek(&self, time: f64) -> AdapterResult<()>;

    fn set_volume(&self, volume: f64);

    fn set_muted(&self, muted: bool);

    /// Drop the current source and return to an empty element
    fn reset(&self);

    fn snapshot(&self) -> TimeSnapshot;

    fn video_size(&self) -> Option<Resolution>;

    fn subscribe(&self, listener: Listener<MediaEvent>) -> Subscription;
}
