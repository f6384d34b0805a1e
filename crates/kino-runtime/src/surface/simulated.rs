//! In-memory media element driven by an explicit clock

use super::{MediaErrorCode, MediaEvent, VideoSurface};
use crate::error::{AdapterError, AdapterResult};
use crate::observer::{lock, Listener, Listeners, Subscription};
use crate::types::{Resolution, TimeRange, TimeSnapshot};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// What the simulated element finds at a url
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MediaInfo {
    Playable {
        duration: f64,
        #[serde(default)]
        width: u32,
        #[serde(default)]
        height: u32,
    },
    Failing {
        code: MediaErrorCode,
        message: String,
    },
}

impl MediaInfo {
    pub fn playable(duration: f64, width: u32, height: u32) -> Self {
        MediaInfo::Playable {
            duration,
            width,
            height,
        }
    }

    pub fn failing(code: MediaErrorCode, message: impl Into<String>) -> Self {
        MediaInfo::Failing {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
struct Playback {
    source: Option<String>,
    duration: f64,
    size: Option<Resolution>,
    current_time: f64,
    paused: bool,
    ended: bool,
    looping: bool,
    rate: f64,
    volume: f64,
    muted: bool,
}

impl Playback {
    fn empty(volume: f64, muted: bool, looping: bool) -> Self {
        Self {
            paused: true,
            rate: 1.0,
            volume,
            muted,
            looping,
            ..Default::default()
        }
    }

    fn loaded(&self) -> bool {
        self.source.is_some()
    }
}

/// A [`VideoSurface`] that plays from a catalogue instead of the network.
///
/// Nothing moves until [`SimulatedSurface::advance`] is called, which makes
/// the element deterministic under test and in the CLI simulator.
pub struct SimulatedSurface {
    id: String,
    catalog: Mutex<HashMap<String, MediaInfo>>,
    playback: Mutex<Playback>,
    listeners: Listeners<MediaEvent>,
}

impl SimulatedSurface {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            catalog: Mutex::new(HashMap::new()),
            playback: Mutex::new(Playback::empty(1.0, false, false)),
            listeners: Listeners::new(),
        }
    }

    /// Register what loading `url` produces
    pub fn with_media(self, url: impl Into<String>, info: MediaInfo) -> Self {
        self.insert_media(url, info);
        self
    }

    pub fn insert_media(&self, url: impl Into<String>, info: MediaInfo) {
        lock(&self.catalog).insert(url.into(), info);
    }

    pub fn set_looping(&self, looping: bool) {
        lock(&self.playback).looping = looping;
    }

    pub fn current_source(&self) -> Option<String> {
        lock(&self.playback).source.clone()
    }

    pub fn volume(&self) -> (f64, bool) {
        let playback = lock(&self.playback);
        (playback.volume, playback.muted)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Move the clock forward by `seconds` of wall time.
    ///
    /// Emits `timeupdate`, and `ended` (or a loop back to zero) once the end
    /// of the media is reached. Does nothing while paused.
    pub fn advance(&self, seconds: f64) {
        let mut events = Vec::new();
        {
            let mut playback = lock(&self.playback);
            if !playback.loaded() || playback.paused || seconds <= 0.0 {
                return;
            }

            let next = playback.current_time + seconds * playback.rate;
            if playback.duration > 0.0 && next >= playback.duration {
                if playback.looping {
                    playback.current_time = 0.0;
                    events.push(MediaEvent::Seeked);
                    events.push(MediaEvent::TimeUpdate);
                } else {
                    playback.current_time = playback.duration;
                    playback.paused = true;
                    playback.ended = true;
                    events.push(MediaEvent::TimeUpdate);
                    events.push(MediaEvent::Ended);
                }
            } else {
                playback.current_time = next;
                events.push(MediaEvent::TimeUpdate);
            }
        }

        for event in events {
            self.listeners.emit(&event);
        }
    }

    /// Report a data starvation, as when the network falls behind
    pub fn stall(&self) {
        if lock(&self.playback).loaded() {
            self.listeners.emit(&MediaEvent::Waiting);
        }
    }

    /// Recover from [`SimulatedSurface::stall`]
    pub fn resume(&self) {
        let playing = {
            let playback = lock(&self.playback);
            playback.loaded() && !playback.paused
        };
        if playing {
            self.listeners.emit(&MediaEvent::Playing);
        }
    }

    /// Raise a media error in the middle of playback
    pub fn fail(&self, code: MediaErrorCode, message: impl Into<String>) {
        self.listeners.emit(&MediaEvent::Error {
            code,
            message: message.into(),
        });
    }
}

#[async_trait]
impl VideoSurface for SimulatedSurface {
    fn id(&self) -> &str {
        &self.id
    }

    async fn set_source(&self, url: &str) -> AdapterResult<()> {
        let media = lock(&self.catalog).get(url).cloned();
        debug!(surface = %self.id, url, known = media.is_some(), "Setting source");

        {
            let mut playback = lock(&self.playback);
            *playback = Playback::empty(playback.volume, playback.muted, playback.looping);
            if let Some(MediaInfo::Playable {
                duration,
                width,
                height,
            }) = &media
            {
                playback.source = Some(url.to_string());
                playback.duration = *duration;
                playback.size = (*width > 0 && *height > 0).then(|| Resolution::new(*width, *height));
            }
        }

        self.listeners.emit(&MediaEvent::LoadStart);
        match media {
            Some(MediaInfo::Playable { .. }) => {
                self.listeners.emit(&MediaEvent::Progress { progress: 1.0 });
                self.listeners.emit(&MediaEvent::LoadedMetadata);
            }
            Some(MediaInfo::Failing { code, message }) => {
                self.listeners.emit(&MediaEvent::Error { code, message });
            }
            None => {
                self.listeners.emit(&MediaEvent::Error {
                    code: MediaErrorCode::SrcNotSupported,
                    message: format!("no media at {url}"),
                });
            }
        }
        Ok(())
    }

    async fn play(&self) -> AdapterResult<()> {
        {
            let mut playback = lock(&self.playback);
            if !playback.loaded() {
                return Err(AdapterError::Surface("no source loaded".to_string()));
            }
            if playback.ended {
                playback.current_time = 0.0;
                playback.ended = false;
            }
            playback.paused = false;
        }
        self.listeners.emit(&MediaEvent::Playing);
        Ok(())
    }

    async fn pause(&self) -> AdapterResult<()> {
        {
            let mut playback = lock(&self.playback);
            if !playback.loaded() {
                return Err(AdapterError::Surface("no source loaded".to_string()));
            }
            playback.paused = true;
        }
        self.listeners.emit(&MediaEvent::Pause);
        Ok(())
    }

    async fn seek(&self, time: f64) -> AdapterResult<()> {
        {
            let mut playback = lock(&self.playback);
            if !playback.loaded() {
                return Err(AdapterError::Surface("no source loaded".to_string()));
            }
            playback.current_time = time.clamp(0.0, playback.duration.max(0.0));
            playback.ended = false;
        }
        self.listeners.emit(&MediaEvent::Seeked);
        Ok(())
    }

    fn set_volume(&self, volume: f64) {
        let (volume, muted) = {
            let mut playback = lock(&self.playback);
            playback.volume = volume.clamp(0.0, 1.0);
            (playback.volume, playback.muted)
        };
        self.listeners.emit(&MediaEvent::VolumeChange { volume, muted });
    }

    fn set_muted(&self, muted: bool) {
        let volume = {
            let mut playback = lock(&self.playback);
            playback.muted = muted;
            playback.volume
        };
        self.listeners.emit(&MediaEvent::VolumeChange { volume, muted });
    }

    fn reset(&self) {
        let mut playback = lock(&self.playback);
        *playback = Playback::empty(playback.volume, playback.muted, playback.looping);
    }

    fn snapshot(&self) -> TimeSnapshot {
        let playback = lock(&self.playback);
        let buffered = if playback.loaded() && playback.duration > 0.0 {
            vec![TimeRange::new(0.0, playback.duration)]
        } else {
            Vec::new()
        };

        TimeSnapshot {
            current_time: playback.current_time,
            duration: playback.duration,
            buffered,
            paused: playback.paused,
            playback_rate: playback.rate,
            looping: playback.looping,
        }
    }

    fn video_size(&self) -> Option<Resolution> {
        lock(&self.playback).size
    }

    fn subscribe(&self, listener: Listener<MediaEvent>) -> Subscription {
        self.listeners.subscribe(listener)
    }
}
