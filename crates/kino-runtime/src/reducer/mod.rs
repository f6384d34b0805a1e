//! Pure state transition function.
//!
//! [`reduce`] maps `(state, event)` to the next state plus the effects the
//! engine must run. It performs no I/O and is total: any combination it does
//! not recognise returns the current state unchanged with no effects.

mod source;

use crate::effect::{load_sequence, Effect};
use crate::event::{EngineEvent, ErrorKind, Event, Intent};
use crate::state::{
    capability::{self, is_loading, is_transient_playing},
    normalize_duration, DashState, ErrorState, HlsState, PlayerState, Timeline,
};
use crate::types::{detect_playback_type, PlaybackType, SourceMetadata, TimeSnapshot};

/// Result of one reducer step
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: PlayerState,
    pub effects: Vec<Effect>,
}

impl Transition {
    pub fn new(state: PlayerState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }

    /// Move to `state` without side effects
    pub fn to(state: PlayerState) -> Self {
        Self::new(state, Vec::new())
    }

    /// Keep `state`, emit nothing
    pub fn unchanged(state: &PlayerState) -> Self {
        Self::to(state.clone())
    }
}

/// Compute the next state and effects for `event`
pub fn reduce(state: &PlayerState, event: &Event) -> Transition {
    match event {
        Event::Intent(intent) => reduce_intent(state, intent),
        Event::Engine(engine) => reduce_engine(state, engine),
        Event::Native(native) => source::reduce_native(state, native),
        Event::Hls(hls) => source::reduce_hls(state, hls),
        Event::Dash(dash) => source::reduce_dash(state, dash),
    }
}

fn reduce_intent(state: &PlayerState, intent: &Intent) -> Transition {
    match intent {
        Intent::LoadRequested { url } => {
            Transition::new(PlayerState::loading(url), load_sequence(detect_playback_type(url), url))
        }
        Intent::PlayRequested => play(state),
        Intent::PauseRequested => match state {
            PlayerState::Playing {
                current_time,
                duration,
                buffered,
                source,
                ..
            } => Transition::new(
                PlayerState::Paused {
                    current_time: *current_time,
                    duration: *duration,
                    buffered: buffered.clone(),
                    source: source.clone(),
                },
                vec![Effect::Pause],
            ),
            _ => Transition::unchanged(state),
        },
        Intent::SeekRequested { time } => match capability::timeline(state) {
            Some(timeline) => Transition::new(
                PlayerState::Seeking {
                    from_time: timeline.current_time,
                    to_time: *time,
                    duration: timeline.duration,
                },
                vec![Effect::Seek { time: *time }],
            ),
            None => Transition::unchanged(state),
        },
        Intent::SetVolumeRequested { volume } => {
            Transition::new(state.clone(), vec![Effect::SetVolume { volume: *volume }])
        }
        Intent::SetMutedRequested { muted } => Transition::new(state.clone(), vec![Effect::SetMuted { muted: *muted }]),
        Intent::RetryRequested => retry(state),
        Intent::ResetRequested => Transition::new(PlayerState::Idle, vec![Effect::DestroyAdapter]),
    }
}

/// Play is only meaningful once a source exists and playback is halted
fn play(state: &PlayerState) -> Transition {
    let next = match state {
        PlayerState::Paused { .. } | PlayerState::Buffering { .. } => capability::timeline(state)
            .map(|timeline| PlayerState::playing(timeline, 1.0, capability::source(state).cloned())),
        PlayerState::Ended { duration, .. } => Some(PlayerState::playing(Timeline::start(*duration), 1.0, None)),
        PlayerState::Hls(HlsState::VariantSelected { timeline, source, .. })
        | PlayerState::Dash(DashState::RepresentationSelected { timeline, source, .. }) => {
            Some(PlayerState::playing(timeline.clone(), 1.0, Some(source.clone())))
        }
        _ => None,
    };

    match next {
        Some(next) => Transition::new(next, vec![Effect::Play]),
        None => Transition::unchanged(state),
    }
}

/// Reload the source of a recoverable error, counting the attempt.
///
/// The error state stays committed while the reload runs; it is left once
/// the backend reports metadata again.
fn retry(state: &PlayerState) -> Transition {
    let PlayerState::Error(err) = state else {
        return Transition::unchanged(state);
    };
    if err.is_fatal() {
        return Transition::unchanged(state);
    }
    let Some(url) = err.url().map(str::to_string) else {
        return Transition::unchanged(state);
    };

    let attempt = err.retry_count().unwrap_or(0).saturating_add(1);
    Transition::new(
        PlayerState::Error(err.clone().with_retry_count(attempt)),
        load_sequence(detect_playback_type(&url), &url),
    )
}

fn reduce_engine(state: &PlayerState, event: &EngineEvent) -> Transition {
    match event {
        EngineEvent::Mounted | EngineEvent::VolumeChanged { .. } | EngineEvent::MutedChanged { .. } => {
            Transition::unchanged(state)
        }
        EngineEvent::MetadataLoaded {
            playback_type,
            url,
            duration,
            width,
            height,
        } => {
            if !is_loading(state) {
                return Transition::unchanged(state);
            }
            let source = SourceMetadata::from_load(*playback_type, url.clone(), *width, *height);
            Transition::to(PlayerState::paused(Timeline::start(*duration), Some(source)))
        }
        EngineEvent::TimeUpdated(snapshot) => time_updated(state, snapshot),
        EngineEvent::Playing(snapshot) => Transition::to(PlayerState::playing(
            Timeline::from_snapshot(snapshot),
            snapshot.playback_rate,
            carried_source(state),
        )),
        EngineEvent::Paused(snapshot) => {
            Transition::to(PlayerState::paused(Timeline::from_snapshot(snapshot), carried_source(state)))
        }
        EngineEvent::Waiting(snapshot) => Transition::to(PlayerState::buffering(
            Timeline::from_snapshot(snapshot),
            0.0,
            carried_source(state),
        )),
        EngineEvent::Seeked(snapshot) => {
            let timeline = Timeline::from_snapshot(snapshot);
            let next = if snapshot.paused {
                PlayerState::paused(timeline, carried_source(state))
            } else {
                PlayerState::playing(timeline, snapshot.playback_rate, carried_source(state))
            };
            Transition::to(next)
        }
        EngineEvent::Ended(snapshot) => Transition::to(PlayerState::Ended {
            duration: normalize_duration(snapshot.duration),
            was_looping: snapshot.looping,
        }),
        EngineEvent::Error {
            kind,
            message,
            url,
            codec,
        } => Transition::to(PlayerState::Error(error_state(
            state,
            kind,
            message,
            url.as_deref(),
            codec.as_deref(),
        ))),
    }
}

/// Refresh time fields without leaving the current family; transient
/// adaptive phases fall back into `Playing`.
fn time_updated(state: &PlayerState, snapshot: &TimeSnapshot) -> Transition {
    let timeline = Timeline::from_snapshot(snapshot);
    let next = match state {
        PlayerState::Playing {
            playback_rate, source, ..
        } => PlayerState::playing(timeline, *playback_rate, source.clone()),
        PlayerState::Paused { source, .. } => PlayerState::paused(timeline, source.clone()),
        PlayerState::Buffering {
            buffer_progress,
            source,
            ..
        } => PlayerState::buffering(timeline, *buffer_progress, source.clone()),
        PlayerState::Seeking { from_time, to_time, .. } => PlayerState::Seeking {
            from_time: *from_time,
            to_time: *to_time,
            duration: timeline.duration,
        },
        _ if is_transient_playing(state) => {
            PlayerState::playing(timeline, snapshot.playback_rate, capability::source(state).cloned())
        }
        _ => return Transition::unchanged(state),
    };
    Transition::to(next)
}

fn carried_source(state: &PlayerState) -> Option<SourceMetadata> {
    capability::source(state).cloned()
}

fn error_state(
    state: &PlayerState,
    kind: &ErrorKind,
    message: &str,
    url: Option<&str>,
    codec: Option<&str>,
) -> ErrorState {
    let error = message.to_string();
    let url = url.or_else(|| capability::source_url(state)).map(str::to_string);

    let next = match kind {
        ErrorKind::NotSupported => ErrorState::NotSupported {
            error,
            codec: codec.map(str::to_string),
            url,
        },
        ErrorKind::Decode => {
            let playback_type = capability::playback_type(state)
                .or_else(|| url.as_deref().map(detect_playback_type))
                .unwrap_or(PlaybackType::Native);
            ErrorState::Decode {
                error,
                playback_type,
                retry_count: 0,
                url,
            }
        }
        ErrorKind::Drm => ErrorState::Drm {
            error,
            key_system: None,
        },
        ErrorKind::Aborted => ErrorState::Abort { error, url },
        ErrorKind::Network | ErrorKind::Other(_) => ErrorState::Network {
            error,
            retry_count: 0,
            url,
        },
    };

    carry_retry_count(state, next)
}

/// A repeated failure of the same kind keeps the attempts already made
pub(crate) fn carry_retry_count(state: &PlayerState, next: ErrorState) -> ErrorState {
    match state {
        PlayerState::Error(prev) if prev.same_kind(&next) => {
            let count = prev.retry_count().unwrap_or(0);
            next.with_retry_count(count)
        }
        _ => next,
    }
}
