//! Side effects requested by the reducer.
//!
//! Effects are plain data; the runtime engine interprets them against the
//! active adapter and the video surface.

use crate::types::PlaybackType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    DestroyAdapter,
    CreateAdapter { playback_type: PlaybackType, url: String },
    AttachVideoElement,
    LoadSource { url: String },
    Play,
    Pause,
    Seek { time: f64 },
    SetVolume { volume: f64 },
    SetMuted { muted: bool },
}

impl Effect {
    /// Operation name used when wrapping adapter failures
    pub fn operation(&self) -> &'static str {
        match self {
            Effect::DestroyAdapter => "destroy",
            Effect::CreateAdapter { .. } => "create",
            Effect::AttachVideoElement => "mount",
            Effect::LoadSource { .. } => "load",
            Effect::Play => "play",
            Effect::Pause => "pause",
            Effect::Seek { .. } => "seek",
            Effect::SetVolume { .. } => "set_volume",
            Effect::SetMuted { .. } => "set_muted",
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::CreateAdapter { playback_type, url } => write!(f, "create({playback_type}, {url})"),
            Effect::LoadSource { url } => write!(f, "load({url})"),
            Effect::Seek { time } => write!(f, "seek({time})"),
            Effect::SetVolume { volume } => write!(f, "set_volume({volume})"),
            Effect::SetMuted { muted } => write!(f, "set_muted({muted})"),
            other => f.write_str(other.operation()),
        }
    }
}

/// Effects that (re)load `url` from scratch, in the order they must run:
/// the old adapter goes first and the new one must exist before it can be
/// attached or fed a source.
pub fn load_sequence(playback_type: PlaybackType, url: &str) -> Vec<Effect> {
    vec![
        Effect::DestroyAdapter,
        Effect::CreateAdapter {
            playback_type,
            url: url.to_string(),
        },
        Effect::AttachVideoElement,
        Effect::LoadSource { url: url.to_string() },
    ]
}
