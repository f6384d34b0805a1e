//! Backend-specific transitions.
//!
//! Each backend's events only move the machine when it is already in one of
//! that backend's phases (or in a control state whose source belongs to the
//! backend). Anything else is a no-op, so a stray HLS event can never
//! corrupt a DASH session and vice versa.

use super::{carry_retry_count, Transition};
use crate::event::{DashEvent, HlsEvent, NativeEvent};
use crate::state::{
    capability, normalize_duration, DashState, ErrorState, HlsState, NativeState, PlayerState, Timeline,
};
use crate::types::{detect_playback_type, PlaybackType, SourceMetadata};

/// URL of a plain `Loading` state whose source belongs to `backend`
fn loading_url(state: &PlayerState, backend: PlaybackType) -> Option<&str> {
    match state {
        PlayerState::Loading { url, .. } if detect_playback_type(url) == backend => Some(url),
        _ => None,
    }
}

/// Source of a `Playing` state driven by `backend`
fn playing_source(state: &PlayerState, backend: PlaybackType) -> Option<&SourceMetadata> {
    match state {
        PlayerState::Playing {
            source: Some(source), ..
        } if source.playback_type == backend => Some(source),
        _ => None,
    }
}

fn failure(state: &PlayerState, backend: PlaybackType, next: ErrorState) -> Transition {
    if capability::playback_type(state) != Some(backend) {
        return Transition::unchanged(state);
    }
    Transition::to(PlayerState::Error(carry_retry_count(state, next)))
}

fn owned_url(state: &PlayerState) -> Option<String> {
    capability::source_url(state).map(str::to_string)
}

pub(super) fn reduce_native(state: &PlayerState, event: &NativeEvent) -> Transition {
    match event {
        NativeEvent::ProgressiveProgress { progress } => {
            let url = match state {
                PlayerState::Native(NativeState::ProgressiveLoading { url, .. }) => url.as_str(),
                _ => match loading_url(state, PlaybackType::Native) {
                    Some(url) => url,
                    None => return Transition::unchanged(state),
                },
            };
            Transition::to(PlayerState::Native(NativeState::ProgressiveLoading {
                url: url.to_string(),
                progress: progress.clamp(0.0, 1.0),
            }))
        }
    }
}

pub(super) fn reduce_hls(state: &PlayerState, event: &HlsEvent) -> Transition {
    let next = match (state, event) {
        (PlayerState::Hls(HlsState::ManifestLoading { url, .. }), HlsEvent::ManifestLoading { progress }) => {
            HlsState::ManifestLoading {
                url: url.clone(),
                progress: progress.clamp(0.0, 1.0),
            }
        }
        (_, HlsEvent::ManifestLoading { progress }) => match loading_url(state, PlaybackType::Hls) {
            Some(url) => HlsState::ManifestLoading {
                url: url.to_string(),
                progress: progress.clamp(0.0, 1.0),
            },
            None => return Transition::unchanged(state),
        },

        (PlayerState::Hls(HlsState::ManifestLoading { url, .. }), HlsEvent::ManifestParsed { variants, duration }) => {
            HlsState::ManifestParsed {
                url: url.clone(),
                variants: variants.clone(),
                duration: normalize_duration(*duration),
            }
        }
        (_, HlsEvent::ManifestParsed { variants, duration }) => match loading_url(state, PlaybackType::Hls) {
            Some(url) => HlsState::ManifestParsed {
                url: url.to_string(),
                variants: variants.clone(),
                duration: normalize_duration(*duration),
            },
            None => return Transition::unchanged(state),
        },

        (
            PlayerState::Hls(HlsState::ManifestParsed { url, duration, .. })
            | PlayerState::Hls(HlsState::SegmentLoading { url, duration, .. }),
            HlsEvent::VariantSelected { variant },
        ) => HlsState::VariantSelected {
            variant: variant.clone(),
            timeline: Timeline::start(*duration),
            source: SourceMetadata::for_rendition(PlaybackType::Hls, url.clone(), variant),
        },
        (
            PlayerState::Hls(HlsState::AdaptiveSwitching { timeline, source, .. }),
            HlsEvent::VariantSelected { variant },
        ) => HlsState::VariantSelected {
            variant: variant.clone(),
            timeline: timeline.clone(),
            source: source.clone().with_rendition(variant),
        },

        (
            PlayerState::Hls(HlsState::ManifestParsed { url, duration, .. })
            | PlayerState::Hls(HlsState::SegmentLoading { url, duration, .. }),
            HlsEvent::SegmentLoading {
                segment_index,
                progress,
            },
        ) => HlsState::SegmentLoading {
            url: url.clone(),
            segment_index: *segment_index,
            progress: progress.clamp(0.0, 1.0),
            duration: *duration,
        },

        (
            PlayerState::Hls(HlsState::VariantSelected {
                variant: current,
                timeline,
                source,
            }),
            HlsEvent::AdaptiveSwitchStarted { variant },
        )
        | (
            PlayerState::Hls(HlsState::AdaptiveSwitching {
                to: current,
                timeline,
                source,
                ..
            }),
            HlsEvent::AdaptiveSwitchStarted { variant },
        ) => HlsState::AdaptiveSwitching {
            from: Some(current.clone()),
            to: variant.clone(),
            timeline: timeline.clone(),
            source: source.clone(),
        },
        (_, HlsEvent::AdaptiveSwitchStarted { variant }) => {
            match (playing_source(state, PlaybackType::Hls), capability::timeline(state)) {
                (Some(source), Some(timeline)) => HlsState::AdaptiveSwitching {
                    from: None,
                    to: variant.clone(),
                    timeline,
                    source: source.clone(),
                },
                _ => return Transition::unchanged(state),
            }
        }

        (_, HlsEvent::ManifestLoadFailed { message }) => {
            return failure(
                state,
                PlaybackType::Hls,
                ErrorState::HlsManifestLoad {
                    error: message.clone(),
                    retry_count: 0,
                    url: owned_url(state),
                },
            )
        }
        (_, HlsEvent::SegmentLoadFailed { segment_index, message }) => {
            return failure(
                state,
                PlaybackType::Hls,
                ErrorState::HlsSegmentLoad {
                    error: message.clone(),
                    retry_count: 0,
                    url: owned_url(state),
                    segment_index: Some(*segment_index),
                },
            )
        }

        _ => return Transition::unchanged(state),
    };

    Transition::to(PlayerState::Hls(next))
}

pub(super) fn reduce_dash(state: &PlayerState, event: &DashEvent) -> Transition {
    let next = match (state, event) {
        (PlayerState::Dash(DashState::MpdLoading { url, .. }), DashEvent::MpdLoading { progress }) => {
            DashState::MpdLoading {
                url: url.clone(),
                progress: progress.clamp(0.0, 1.0),
            }
        }
        (_, DashEvent::MpdLoading { progress }) => match loading_url(state, PlaybackType::Dash) {
            Some(url) => DashState::MpdLoading {
                url: url.to_string(),
                progress: progress.clamp(0.0, 1.0),
            },
            None => return Transition::unchanged(state),
        },

        (
            PlayerState::Dash(DashState::MpdLoading { url, .. }),
            DashEvent::MpdParsed {
                representations,
                duration,
            },
        ) => DashState::MpdParsed {
            url: url.clone(),
            representations: representations.clone(),
            duration: normalize_duration(*duration),
        },
        (
            _,
            DashEvent::MpdParsed {
                representations,
                duration,
            },
        ) => match loading_url(state, PlaybackType::Dash) {
            Some(url) => DashState::MpdParsed {
                url: url.to_string(),
                representations: representations.clone(),
                duration: normalize_duration(*duration),
            },
            None => return Transition::unchanged(state),
        },

        (
            PlayerState::Dash(DashState::MpdParsed { url, duration, .. })
            | PlayerState::Dash(DashState::SegmentDownloading { url, duration, .. }),
            DashEvent::RepresentationSelected { representation },
        ) => DashState::RepresentationSelected {
            representation: representation.clone(),
            timeline: Timeline::start(*duration),
            source: SourceMetadata::for_rendition(PlaybackType::Dash, url.clone(), representation),
        },
        (
            PlayerState::Dash(DashState::QualitySwitching { timeline, source, .. }),
            DashEvent::RepresentationSelected { representation },
        ) => DashState::RepresentationSelected {
            representation: representation.clone(),
            timeline: timeline.clone(),
            source: source.clone().with_rendition(representation),
        },

        (
            PlayerState::Dash(DashState::MpdParsed { url, duration, .. })
            | PlayerState::Dash(DashState::SegmentDownloading { url, duration, .. }),
            DashEvent::SegmentDownloading {
                segment_index,
                progress,
            },
        ) => DashState::SegmentDownloading {
            url: url.clone(),
            segment_index: *segment_index,
            progress: progress.clamp(0.0, 1.0),
            duration: *duration,
        },

        (
            PlayerState::Dash(DashState::RepresentationSelected {
                representation: current,
                timeline,
                source,
            }),
            DashEvent::QualitySwitchStarted { representation },
        )
        | (
            PlayerState::Dash(DashState::QualitySwitching {
                to: current,
                timeline,
                source,
                ..
            }),
            DashEvent::QualitySwitchStarted { representation },
        ) => DashState::QualitySwitching {
            from: Some(current.clone()),
            to: representation.clone(),
            timeline: timeline.clone(),
            source: source.clone(),
        },
        (_, DashEvent::QualitySwitchStarted { representation }) => {
            match (playing_source(state, PlaybackType::Dash), capability::timeline(state)) {
                (Some(source), Some(timeline)) => DashState::QualitySwitching {
                    from: None,
                    to: representation.clone(),
                    timeline,
                    source: source.clone(),
                },
                _ => return Transition::unchanged(state),
            }
        }

        (_, DashEvent::MpdLoadFailed { message }) => {
            return failure(
                state,
                PlaybackType::Dash,
                ErrorState::DashManifestLoad {
                    error: message.clone(),
                    retry_count: 0,
                    url: owned_url(state),
                },
            )
        }
        (_, DashEvent::SegmentDownloadFailed { segment_index, message }) => {
            return failure(
                state,
                PlaybackType::Dash,
                ErrorState::DashSegmentLoad {
                    error: message.clone(),
                    retry_count: 0,
                    url: owned_url(state),
                    segment_index: Some(*segment_index),
                },
            )
        }

        _ => return Transition::unchanged(state),
    };

    Transition::to(PlayerState::Dash(next))
}
