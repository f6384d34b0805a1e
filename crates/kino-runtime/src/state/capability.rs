//! Capability queries over [`PlayerState`].
//!
//! These are free functions matching on the variant tag rather than methods
//! on a state hierarchy. Each state belongs to exactly one [`Capability`]
//! group: playable, recoverable error or fatal error.

use super::{DashState, ErrorState, HlsState, NativeState, PlayerState, Timeline};
use crate::types::{detect_playback_type, PlaybackType, SourceMetadata, TimeRange};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Playable,
    RecoverableError,
    FatalError,
}

pub fn capability(state: &PlayerState) -> Capability {
    match state {
        PlayerState::Error(err) if err.is_fatal() => Capability::FatalError,
        PlayerState::Error(_) => Capability::RecoverableError,
        _ => Capability::Playable,
    }
}

pub fn is_playable(state: &PlayerState) -> bool {
    capability(state) == Capability::Playable
}

pub fn is_error(state: &PlayerState) -> bool {
    matches!(state, PlayerState::Error(_))
}

pub fn is_recoverable_error(state: &PlayerState) -> bool {
    capability(state) == Capability::RecoverableError
}

pub fn is_fatal_error(state: &PlayerState) -> bool {
    capability(state) == Capability::FatalError
}

/// Recoverable errors may be retried; nothing else can
pub fn can_retry(state: &PlayerState) -> bool {
    is_recoverable_error(state)
}

pub fn error(state: &PlayerState) -> Option<&ErrorState> {
    match state {
        PlayerState::Error(err) => Some(err),
        _ => None,
    }
}

pub fn retry_count(state: &PlayerState) -> Option<u32> {
    error(state).and_then(ErrorState::retry_count)
}

/// Position, duration and buffered ranges of states that expose both a
/// current time and a duration.
pub fn timeline(state: &PlayerState) -> Option<Timeline> {
    match state {
        PlayerState::Playing {
            current_time,
            duration,
            buffered,
            ..
        }
        | PlayerState::Paused {
            current_time,
            duration,
            buffered,
            ..
        }
        | PlayerState::Buffering {
            current_time,
            duration,
            buffered,
            ..
        } => Some(Timeline {
            current_time: *current_time,
            duration: *duration,
            buffered: buffered.clone(),
        }),
        PlayerState::Hls(HlsState::VariantSelected { timeline, .. })
        | PlayerState::Hls(HlsState::AdaptiveSwitching { timeline, .. })
        | PlayerState::Dash(DashState::RepresentationSelected { timeline, .. })
        | PlayerState::Dash(DashState::QualitySwitching { timeline, .. }) => Some(timeline.clone()),
        _ => None,
    }
}

pub fn current_time(state: &PlayerState) -> Option<f64> {
    match state {
        PlayerState::Playing { current_time, .. }
        | PlayerState::Paused { current_time, .. }
        | PlayerState::Buffering { current_time, .. } => Some(*current_time),
        PlayerState::Hls(HlsState::VariantSelected { timeline, .. })
        | PlayerState::Hls(HlsState::AdaptiveSwitching { timeline, .. })
        | PlayerState::Dash(DashState::RepresentationSelected { timeline, .. })
        | PlayerState::Dash(DashState::QualitySwitching { timeline, .. }) => Some(timeline.current_time),
        _ => None,
    }
}

pub fn duration(state: &PlayerState) -> Option<f64> {
    match state {
        PlayerState::Playing { duration, .. }
        | PlayerState::Paused { duration, .. }
        | PlayerState::Buffering { duration, .. }
        | PlayerState::Seeking { duration, .. }
        | PlayerState::Ended { duration, .. }
        | PlayerState::Hls(HlsState::ManifestParsed { duration, .. })
        | PlayerState::Hls(HlsState::SegmentLoading { duration, .. })
        | PlayerState::Dash(DashState::MpdParsed { duration, .. })
        | PlayerState::Dash(DashState::SegmentDownloading { duration, .. }) => Some(*duration),
        PlayerState::Hls(HlsState::VariantSelected { timeline, .. })
        | PlayerState::Hls(HlsState::AdaptiveSwitching { timeline, .. })
        | PlayerState::Dash(DashState::RepresentationSelected { timeline, .. })
        | PlayerState::Dash(DashState::QualitySwitching { timeline, .. }) => Some(timeline.duration),
        _ => None,
    }
}

pub fn buffered(state: &PlayerState) -> Option<&[TimeRange]> {
    match state {
        PlayerState::Playing { buffered, .. }
        | PlayerState::Paused { buffered, .. }
        | PlayerState::Buffering { buffered, .. } => Some(buffered),
        _ => timeline_ref(state).map(|t| t.buffered.as_slice()),
    }
}

fn timeline_ref(state: &PlayerState) -> Option<&Timeline> {
    match state {
        PlayerState::Hls(HlsState::VariantSelected { timeline, .. })
        | PlayerState::Hls(HlsState::AdaptiveSwitching { timeline, .. })
        | PlayerState::Dash(DashState::RepresentationSelected { timeline, .. })
        | PlayerState::Dash(DashState::QualitySwitching { timeline, .. }) => Some(timeline),
        _ => None,
    }
}

/// Source metadata, for states that carry it
pub fn source(state: &PlayerState) -> Option<&SourceMetadata> {
    match state {
        PlayerState::Playing { source, .. }
        | PlayerState::Paused { source, .. }
        | PlayerState::Buffering { source, .. } => source.as_ref(),
        PlayerState::Hls(HlsState::VariantSelected { source, .. })
        | PlayerState::Hls(HlsState::AdaptiveSwitching { source, .. })
        | PlayerState::Dash(DashState::RepresentationSelected { source, .. })
        | PlayerState::Dash(DashState::QualitySwitching { source, .. }) => Some(source),
        _ => None,
    }
}

/// URL of the source this state refers to, when known
pub fn source_url(state: &PlayerState) -> Option<&str> {
    match state {
        PlayerState::Loading { url, .. } => Some(url),
        PlayerState::Native(native) => Some(native.url()),
        PlayerState::Hls(hls) => Some(hls.url()),
        PlayerState::Dash(dash) => Some(dash.url()),
        PlayerState::Error(err) => err.url(),
        _ => source(state).map(|s| s.url.as_str()),
    }
}

/// Backend a state belongs to, when it can be told
pub fn playback_type(state: &PlayerState) -> Option<PlaybackType> {
    match state {
        PlayerState::Native(_) => Some(PlaybackType::Native),
        PlayerState::Hls(_) => Some(PlaybackType::Hls),
        PlayerState::Dash(_) => Some(PlaybackType::Dash),
        PlayerState::Error(ErrorState::HlsManifestLoad { .. } | ErrorState::HlsSegmentLoad { .. }) => {
            Some(PlaybackType::Hls)
        }
        PlayerState::Error(ErrorState::DashManifestLoad { .. } | ErrorState::DashSegmentLoad { .. }) => {
            Some(PlaybackType::Dash)
        }
        PlayerState::Error(ErrorState::Decode { playback_type, .. }) => Some(*playback_type),
        _ => match source(state) {
            Some(source) => Some(source.playback_type),
            None => source_url(state).map(detect_playback_type),
        },
    }
}

/// States in which a source is still being fetched and a backend may report
/// metadata: `Loading`, each backend's loading sub-phases, and recoverable
/// errors awaiting the outcome of a retry.
pub fn is_loading(state: &PlayerState) -> bool {
    match state {
        PlayerState::Loading { .. } => true,
        PlayerState::Native(NativeState::ProgressiveLoading { .. }) => true,
        PlayerState::Hls(
            HlsState::ManifestLoading { .. } | HlsState::ManifestParsed { .. } | HlsState::SegmentLoading { .. },
        ) => true,
        PlayerState::Dash(
            DashState::MpdLoading { .. } | DashState::MpdParsed { .. } | DashState::SegmentDownloading { .. },
        ) => true,
        PlayerState::Error(err) => err.is_recoverable(),
        _ => false,
    }
}

/// Transient adaptive phases that are playing in practice and collapse back
/// into `Playing` on the next time update.
pub fn is_transient_playing(state: &PlayerState) -> bool {
    matches!(
        state,
        PlayerState::Hls(HlsState::VariantSelected { .. } | HlsState::AdaptiveSwitching { .. })
            | PlayerState::Dash(DashState::RepresentationSelected { .. } | DashState::QualitySwitching { .. })
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rendition;

    fn hls_source() -> SourceMetadata {
        SourceMetadata::from_load(PlaybackType::Hls, "master.m3u8", 1280, 720)
    }

    #[test]
    fn test_capability_groups_are_exclusive() {
        let states = [
            PlayerState::Idle,
            PlayerState::loading("v.mp4"),
            PlayerState::Error(ErrorState::network("timeout", None)),
            PlayerState::Error(ErrorState::NotSupported {
                error: "codec".into(),
                codec: None,
                url: None,
            }),
        ];

        for state in &states {
            let groups = [is_playable(state), is_recoverable_error(state), is_fatal_error(state)];
            assert_eq!(groups.iter().filter(|g| **g).count(), 1, "{state}");
            assert_eq!(is_error(state), !is_playable(state));
        }
    }

    #[test]
    fn test_fatal_errors_cannot_retry() {
        let drm = PlayerState::Error(ErrorState::Drm {
            error: "no license".into(),
            key_system: None,
        });
        assert!(is_error(&drm));
        assert!(!can_retry(&drm));
        assert_eq!(retry_count(&drm), None);
    }

    #[test]
    fn test_time_fields_of_source_states() {
        let state = PlayerState::Hls(HlsState::VariantSelected {
            variant: Rendition::new("720p", 2_500_000),
            timeline: Timeline::new(12.0, 60.0, Vec::new()),
            source: hls_source(),
        });

        assert_eq!(current_time(&state), Some(12.0));
        assert_eq!(duration(&state), Some(60.0));
        assert_eq!(source(&state).map(|s| s.playback_type), Some(PlaybackType::Hls));
        assert!(is_transient_playing(&state));
        assert!(!is_loading(&state));
    }

    #[test]
    fn test_seeking_has_duration_but_no_position() {
        let state = PlayerState::Seeking {
            from_time: 10.0,
            to_time: 30.0,
            duration: 120.0,
        };
        assert_eq!(current_time(&state), None);
        assert_eq!(duration(&state), Some(120.0));
        assert!(timeline(&state).is_none());
    }

    #[test]
    fn test_playback_type_lookup() {
        assert_eq!(playback_type(&PlayerState::Idle), None);
        assert_eq!(
            playback_type(&PlayerState::loading("https://cdn/x.mpd")),
            Some(PlaybackType::Dash)
        );
        assert_eq!(
            playback_type(&PlayerState::Error(ErrorState::HlsSegmentLoad {
                error: "404".into(),
                retry_count: 0,
                url: None,
                segment_index: Some(3),
            })),
            Some(PlaybackType::Hls)
        );
    }
}
