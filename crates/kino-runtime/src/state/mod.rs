//! Player state model
//!
//! Every reachable playback condition is one variant of [`PlayerState`],
//! grouped in three families:
//!
//! - *Control* states shared by all backends (`Idle` .. `Ended`)
//! - *Source* states, backend sub-phases ([`NativeState`], [`HlsState`], [`DashState`])
//! - *Error* states ([`ErrorState`]), recoverable or fatal
//!
//! States are immutable snapshots: the reducer replaces the whole value on
//! every processed event. Questions such as "does this state have a current
//! time?" are answered by the free functions in [`capability`].

pub mod capability;
mod error;
mod source;

pub use capability::Capability;
pub use error::ErrorState;
pub use source::{DashState, HlsState, NativeState};

use crate::types::{SourceMetadata, TimeRange, TimeSnapshot};
use serde::{Deserialize, Serialize};

/// Position, duration and buffered ranges of a playable state.
///
/// Constructed through [`Timeline::new`] so that
/// `0 <= current_time <= duration` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub current_time: f64,
    pub duration: f64,
    pub buffered: Vec<TimeRange>,
}

impl Timeline {
    pub fn new(current_time: f64, duration: f64, buffered: Vec<TimeRange>) -> Self {
        let duration = normalize_duration(duration);
        let current_time = if current_time.is_finite() {
            current_time.clamp(0.0, duration)
        } else {
            0.0
        };
        Self {
            current_time,
            duration,
            buffered,
        }
    }

    pub fn from_snapshot(snapshot: &TimeSnapshot) -> Self {
        Self::new(snapshot.current_time, snapshot.duration, snapshot.buffered.clone())
    }

    /// Empty timeline positioned at zero
    pub fn start(duration: f64) -> Self {
        Self::new(0.0, duration, Vec::new())
    }
}

/// NaN and negative durations collapse to zero; infinity (live) is kept
pub(crate) fn normalize_duration(duration: f64) -> f64 {
    if duration.is_nan() || duration < 0.0 {
        0.0
    } else {
        duration
    }
}

/// Playing states always advance
pub(crate) fn normalize_rate(rate: f64) -> f64 {
    if rate.is_finite() && rate > 0.0 {
        rate
    } else {
        1.0
    }
}

/// Player state machine states
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    /// Initial state, no content loaded
    #[default]
    Idle,
    /// Source requested, backend not yet reporting
    Loading { url: String, progress: f64 },
    Playing {
        current_time: f64,
        duration: f64,
        buffered: Vec<TimeRange>,
        playback_rate: f64,
        source: Option<SourceMetadata>,
    },
    Paused {
        current_time: f64,
        duration: f64,
        buffered: Vec<TimeRange>,
        source: Option<SourceMetadata>,
    },
    Buffering {
        current_time: f64,
        duration: f64,
        buffered: Vec<TimeRange>,
        buffer_progress: f64,
        source: Option<SourceMetadata>,
    },
    Seeking {
        from_time: f64,
        to_time: f64,
        duration: f64,
    },
    Ended {
        duration: f64,
        was_looping: bool,
    },
    Native(NativeState),
    Hls(HlsState),
    Dash(DashState),
    Error(ErrorState),
}

impl PlayerState {
    pub fn loading(url: impl Into<String>) -> Self {
        PlayerState::Loading {
            url: url.into(),
            progress: 0.0,
        }
    }

    pub fn playing(timeline: Timeline, playback_rate: f64, source: Option<SourceMetadata>) -> Self {
        PlayerState::Playing {
            current_time: timeline.current_time,
            duration: timeline.duration,
            buffered: timeline.buffered,
            playback_rate: normalize_rate(playback_rate),
            source,
        }
    }

    pub fn paused(timeline: Timeline, source: Option<SourceMetadata>) -> Self {
        PlayerState::Paused {
            current_time: timeline.current_time,
            duration: timeline.duration,
            buffered: timeline.buffered,
            source,
        }
    }

    pub fn buffering(timeline: Timeline, buffer_progress: f64, source: Option<SourceMetadata>) -> Self {
        PlayerState::Buffering {
            current_time: timeline.current_time,
            duration: timeline.duration,
            buffered: timeline.buffered,
            buffer_progress: buffer_progress.clamp(0.0, 1.0),
            source,
        }
    }

    /// Short, stable name for logs and CLI output
    pub fn name(&self) -> &'static str {
        match self {
            PlayerState::Idle => "idle",
            PlayerState::Loading { .. } => "loading",
            PlayerState::Playing { .. } => "playing",
            PlayerState::Paused { .. } => "paused",
            PlayerState::Buffering { .. } => "buffering",
            PlayerState::Seeking { .. } => "seeking",
            PlayerState::Ended { .. } => "ended",
            PlayerState::Native(NativeState::ProgressiveLoading { .. }) => "native/progressive-loading",
            PlayerState::Hls(hls) => hls.name(),
            PlayerState::Dash(dash) => dash.name(),
            PlayerState::Error(ErrorState::Network { .. }) => "error/network",
            PlayerState::Error(ErrorState::HlsManifestLoad { .. }) => "error/hls-manifest-load",
            PlayerState::Error(ErrorState::HlsSegmentLoad { .. }) => "error/hls-segment-load",
            PlayerState::Error(ErrorState::DashManifestLoad { .. }) => "error/dash-manifest-load",
            PlayerState::Error(ErrorState::DashSegmentLoad { .. }) => "error/dash-segment-load",
            PlayerState::Error(ErrorState::Decode { .. }) => "error/decode",
            PlayerState::Error(ErrorState::Abort { .. }) => "error/abort",
            PlayerState::Error(ErrorState::NotSupported { .. }) => "error/not-supported",
            PlayerState::Error(ErrorState::Drm { .. }) => "error/drm",
        }
    }
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
