//! Backend-specific sub-phases entered while loading or adapting

use super::Timeline;
use crate::types::{Rendition, SourceMetadata};
use serde::{Deserialize, Serialize};

/// Progressive (native) playback phases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeState {
    ProgressiveLoading { url: String, progress: f64 },
}

/// HLS phases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HlsState {
    ManifestLoading {
        url: String,
        progress: f64,
    },
    ManifestParsed {
        url: String,
        variants: Vec<Rendition>,
        duration: f64,
    },
    VariantSelected {
        variant: Rendition,
        timeline: Timeline,
        source: SourceMetadata,
    },
    SegmentLoading {
        url: String,
        segment_index: u64,
        progress: f64,
        duration: f64,
    },
    AdaptiveSwitching {
        from: Option<Rendition>,
        to: Rendition,
        timeline: Timeline,
        source: SourceMetadata,
    },
}

/// DASH phases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashState {
    MpdLoading {
        url: String,
        progress: f64,
    },
    MpdParsed {
        url: String,
        representations: Vec<Rendition>,
        duration: f64,
    },
    RepresentationSelected {
        representation: Rendition,
        timeline: Timeline,
        source: SourceMetadata,
    },
    SegmentDownloading {
        url: String,
        segment_index: u64,
        progress: f64,
        duration: f64,
    },
    QualitySwitching {
        from: Option<Rendition>,
        to: Rendition,
        timeline: Timeline,
        source: SourceMetadata,
    },
}

impl NativeState {
    pub fn url(&self) -> &str {
        match self {
            NativeState::ProgressiveLoading { url, .. } => url,
        }
    }
}

impl HlsState {
    pub fn url(&self) -> &str {
        match self {
            HlsState::ManifestLoading { url, .. }
            | HlsState::ManifestParsed { url, .. }
            | HlsState::SegmentLoading { url, .. } => url,
            HlsState::VariantSelected { source, .. } | HlsState::AdaptiveSwitching { source, .. } => {
                &source.url
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HlsState::ManifestLoading { .. } => "hls/manifest-loading",
            HlsState::ManifestParsed { .. } => "hls/manifest-parsed",
            HlsState::VariantSelected { .. } => "hls/variant-selected",
            HlsState::SegmentLoading { .. } => "hls/segment-loading",
            HlsState::AdaptiveSwitching { .. } => "hls/adaptive-switching",
        }
    }
}

impl DashState {
    pub fn url(&self) -> &str {
        match self {
            DashState::MpdLoading { url, .. }
            | DashState::MpdParsed { url, .. }
            | DashState::SegmentDownloading { url, .. } => url,
            DashState::RepresentationSelected { source, .. } | DashState::QualitySwitching { source, .. } => {
                &source.url
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DashState::MpdLoading { .. } => "dash/mpd-loading",
            DashState::MpdParsed { .. } => "dash/mpd-parsed",
            DashState::RepresentationSelected { .. } => "dash/representation-selected",
            DashState::SegmentDownloading { .. } => "dash/segment-downloading",
            DashState::QualitySwitching { .. } => "dash/quality-switching",
        }
    }
}
