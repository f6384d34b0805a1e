//! Inputs accepted by the state machine
//!
//! Intents come from callers, engine events from the active adapter, and
//! backend events report HLS/DASH/native specific progress.

use crate::types::{PlaybackType, Rendition, TimeSnapshot};
use serde::{Deserialize, Serialize};

/// Everything the reducer can be fed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    Intent(Intent),
    Engine(EngineEvent),
    Native(NativeEvent),
    Hls(HlsEvent),
    Dash(DashEvent),
}

/// Caller intents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    LoadRequested { url: String },
    PlayRequested,
    PauseRequested,
    SeekRequested { time: f64 },
    SetVolumeRequested { volume: f64 },
    SetMutedRequested { muted: bool },
    /// Reload the source of a recoverable error
    RetryRequested,
    /// Drop the source and return to `Idle`
    ResetRequested,
}

/// Notifications pushed by the active adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineEvent {
    Mounted,
    MetadataLoaded {
        playback_type: PlaybackType,
        url: String,
        duration: f64,
        width: u32,
        height: u32,
    },
    TimeUpdated(TimeSnapshot),
    Playing(TimeSnapshot),
    Paused(TimeSnapshot),
    Waiting(TimeSnapshot),
    Seeked(TimeSnapshot),
    Ended(TimeSnapshot),
    VolumeChanged { volume: f64 },
    MutedChanged { muted: bool },
    Error {
        kind: ErrorKind,
        message: String,
        url: Option<String>,
        codec: Option<String>,
    },
}

impl EngineEvent {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        EngineEvent::Error {
            kind,
            message: message.into(),
            url: None,
            codec: None,
        }
    }
}

/// Category of a backend failure, carried as its string tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorKind {
    NotSupported,
    Network,
    Decode,
    Drm,
    Aborted,
    Other(String),
}

impl ErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::NotSupported => "not-supported",
            ErrorKind::Network => "network",
            ErrorKind::Decode => "decode",
            ErrorKind::Drm => "drm",
            ErrorKind::Aborted => "aborted",
            ErrorKind::Other(tag) => tag,
        }
    }
}

impl From<&str> for ErrorKind {
    fn from(tag: &str) -> Self {
        match tag {
            "not-supported" => ErrorKind::NotSupported,
            "network" => ErrorKind::Network,
            "decode" => ErrorKind::Decode,
            "drm" => ErrorKind::Drm,
            "aborted" => ErrorKind::Aborted,
            other => ErrorKind::Other(other.to_string()),
        }
    }
}

impl From<String> for ErrorKind {
    fn from(tag: String) -> Self {
        ErrorKind::from(tag.as_str())
    }
}

impl From<ErrorKind> for String {
    fn from(kind: ErrorKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progressive playback progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeEvent {
    ProgressiveProgress { progress: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HlsEvent {
    ManifestLoading { progress: f64 },
    ManifestParsed { variants: Vec<Rendition>, duration: f64 },
    VariantSelected { variant: Rendition },
    SegmentLoading { segment_index: u64, progress: f64 },
    AdaptiveSwitchStarted { variant: Rendition },
    ManifestLoadFailed { message: String },
    SegmentLoadFailed { segment_index: u64, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashEvent {
    MpdLoading { progress: f64 },
    MpdParsed { representations: Vec<Rendition>, duration: f64 },
    RepresentationSelected { representation: Rendition },
    SegmentDownloading { segment_index: u64, progress: f64 },
    QualitySwitchStarted { representation: Rendition },
    MpdLoadFailed { message: String },
    SegmentDownloadFailed { segment_index: u64, message: String },
}

impl From<Intent> for Event {
    fn from(intent: Intent) -> Self {
        Event::Intent(intent)
    }
}

impl From<EngineEvent> for Event {
    fn from(event: EngineEvent) -> Self {
        Event::Engine(event)
    }
}

impl From<NativeEvent> for Event {
    fn from(event: NativeEvent) -> Self {
        Event::Native(event)
    }
}

impl From<HlsEvent> for Event {
    fn from(event: HlsEvent) -> Self {
        Event::Hls(event)
    }
}

impl From<DashEvent> for Event {
    fn from(event: DashEvent) -> Self {
        Event::Dash(event)
    }
}

impl Event {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::Intent(intent) => match intent {
                Intent::LoadRequested { .. } => "intent/load",
                Intent::PlayRequested => "intent/play",
                Intent::PauseRequested => "intent/pause",
                Intent::SeekRequested { .. } => "intent/seek",
                Intent::SetVolumeRequested { .. } => "intent/set-volume",
                Intent::SetMutedRequested { .. } => "intent/set-muted",
                Intent::RetryRequested => "intent/retry",
                Intent::ResetRequested => "intent/reset",
            },
            Event::Engine(engine) => match engine {
                EngineEvent::Mounted => "engine/mounted",
                EngineEvent::MetadataLoaded { .. } => "engine/metadata-loaded",
                EngineEvent::TimeUpdated(_) => "engine/time-updated",
                EngineEvent::Playing(_) => "engine/playing",
                EngineEvent::Paused(_) => "engine/paused",
                EngineEvent::Waiting(_) => "engine/waiting",
                EngineEvent::Seeked(_) => "engine/seeked",
                EngineEvent::Ended(_) => "engine/ended",
                EngineEvent::VolumeChanged { .. } => "engine/volume-changed",
                EngineEvent::MutedChanged { .. } => "engine/muted-changed",
                EngineEvent::Error { .. } => "engine/error",
            },
            Event::Native(NativeEvent::ProgressiveProgress { .. }) => "native/progressive-progress",
            Event::Hls(hls) => match hls {
                HlsEvent::ManifestLoading { .. } => "hls/manifest-loading",
                HlsEvent::ManifestParsed { .. } => "hls/manifest-parsed",
                HlsEvent::VariantSelected { .. } => "hls/variant-selected",
                HlsEvent::SegmentLoading { .. } => "hls/segment-loading",
                HlsEvent::AdaptiveSwitchStarted { .. } => "hls/adaptive-switch-started",
                HlsEvent::ManifestLoadFailed { .. } => "hls/manifest-load-failed",
                HlsEvent::SegmentLoadFailed { .. } => "hls/segment-load-failed",
            },
            Event::Dash(dash) => match dash {
                DashEvent::MpdLoading { .. } => "dash/mpd-loading",
                DashEvent::MpdParsed { .. } => "dash/mpd-parsed",
                DashEvent::RepresentationSelected { .. } => "dash/representation-selected",
                DashEvent::SegmentDownloading { .. } => "dash/segment-downloading",
                DashEvent::QualitySwitchStarted { .. } => "dash/quality-switch-started",
                DashEvent::MpdLoadFailed { .. } => "dash/mpd-load-failed",
                DashEvent::SegmentDownloadFailed { .. } => "dash/segment-download-failed",
            },
        }
    }
}
