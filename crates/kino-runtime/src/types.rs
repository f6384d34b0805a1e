//! Core types shared by states, events and adapters

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Unique identifier for a runtime instance, attached to its tracing span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuntimeId(pub Uuid);

impl RuntimeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RuntimeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Streaming backend driving playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackType {
    /// Progressive download played by the surface itself
    Native,
    /// HTTP Live Streaming
    Hls,
    /// MPEG-DASH
    Dash,
}

impl PlaybackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackType::Native => "native",
            PlaybackType::Hls => "hls",
            PlaybackType::Dash => "dash",
        }
    }
}

impl std::fmt::Display for PlaybackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlaybackType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(PlaybackType::Native),
            "hls" => Ok(PlaybackType::Hls),
            "dash" => Ok(PlaybackType::Dash),
            other => Err(format!("unknown playback type: {other}")),
        }
    }
}

/// Detect the playback backend from a source URL.
///
/// Only the path suffix is considered; query strings and fragments are
/// ignored and relative URLs are accepted.
pub fn detect_playback_type(url: &str) -> PlaybackType {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase(),
        Err(_) => strip_query(url).to_ascii_lowercase(),
    };

    if path.ends_with(".m3u8") {
        PlaybackType::Hls
    } else if path.ends_with(".mpd") {
        PlaybackType::Dash
    } else {
        PlaybackType::Native
    }
}

fn strip_query(url: &str) -> &str {
    let end = url.find(|c: char| c == '?' || c == '#').unwrap_or(url.len());
    &url[..end]
}

/// Video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns quality tier name
    pub fn quality_name(&self) -> &'static str {
        match self.height {
            0..=240 => "240p",
            241..=360 => "360p",
            361..=480 => "480p",
            481..=720 => "720p",
            721..=1080 => "1080p",
            1081..=1440 => "1440p",
            _ => "4K",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A buffered time range in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

/// What is known about the loaded source once metadata arrives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub playback_type: PlaybackType,
    pub url: String,
    pub resolution: Option<Resolution>,
    pub codec: Option<String>,
}

impl SourceMetadata {
    /// Build metadata for a freshly loaded source.
    ///
    /// Native sources report an `"unknown"` codec; HLS and DASH leave it
    /// empty until a variant or representation is selected.
    pub fn from_load(playback_type: PlaybackType, url: impl Into<String>, width: u32, height: u32) -> Self {
        let resolution = (width > 0 && height > 0).then(|| Resolution::new(width, height));
        let codec = match playback_type {
            PlaybackType::Native => Some("unknown".to_string()),
            PlaybackType::Hls | PlaybackType::Dash => None,
        };
        Self {
            playback_type,
            url: url.into(),
            resolution,
            codec,
        }
    }

    /// Metadata for a source once an HLS variant or DASH representation is chosen
    pub fn for_rendition(playback_type: PlaybackType, url: impl Into<String>, rendition: &Rendition) -> Self {
        Self {
            playback_type,
            url: url.into(),
            resolution: rendition.resolution,
            codec: rendition.codec.clone(),
        }
    }

    /// Take resolution and codec from a newly selected rendition, keeping
    /// what is already known when the rendition does not advertise them
    pub fn with_rendition(mut self, rendition: &Rendition) -> Self {
        if rendition.resolution.is_some() {
            self.resolution = rendition.resolution;
        }
        if rendition.codec.is_some() {
            self.codec = rendition.codec.clone();
        }
        self
    }
}

/// Timing snapshot reported by a backend alongside engine events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSnapshot {
    pub current_time: f64,
    pub duration: f64,
    #[serde(default)]
    pub buffered: Vec<TimeRange>,
    #[serde(default)]
    pub paused: bool,
    #[serde(default = "default_rate")]
    pub playback_rate: f64,
    #[serde(default)]
    pub looping: bool,
}

fn default_rate() -> f64 {
    1.0
}

impl TimeSnapshot {
    pub fn new(current_time: f64, duration: f64) -> Self {
        Self {
            current_time,
            duration,
            buffered: Vec::new(),
            paused: false,
            playback_rate: 1.0,
            looping: false,
        }
    }

    pub fn paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    pub fn with_buffered(mut self, buffered: Vec<TimeRange>) -> Self {
        self.buffered = buffered;
        self
    }
}

/// A selectable encoding: an HLS variant or a DASH representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rendition {
    /// Unique identifier for this rendition
    pub id: String,
    /// Bandwidth in bits per second
    pub bandwidth: u64,
    /// Video resolution (if video track)
    pub resolution: Option<Resolution>,
    /// Codec string as advertised by the manifest
    pub codec: Option<String>,
}

impl Rendition {
    pub fn new(id: impl Into<String>, bandwidth: u64) -> Self {
        Self {
            id: id.into(),
            bandwidth,
            resolution: None,
            codec: None,
        }
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = Some(Resolution::new(width, height));
        self
    }

    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = Some(codec.into());
        self
    }
}
