//! Progressive playback through the surface's own decoder

use super::Adapter;
use crate::error::{AdapterError, AdapterResult};
use crate::event::{EngineEvent, Event, NativeEvent};
use crate::observer::{lock, Listener, Listeners, Subscription};
use crate::surface::{MediaEvent, VideoSurface};
use crate::types::PlaybackType;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, instrument};

#[derive(Default)]
struct Attachment {
    surface: Option<Arc<dyn VideoSurface>>,
    media_events: Option<Subscription>,
    destroyed: bool,
}

/// Adapter for sources the surface can play directly (MP4, WebM, ...).
///
/// Surface notifications are translated one-to-one into engine events, with
/// timing read from the surface at the moment each notification fires.
pub struct NativeAdapter {
    listeners: Listeners<Event>,
    url: Arc<Mutex<Option<String>>>,
    attachment: Mutex<Attachment>,
}

impl NativeAdapter {
    pub fn new() -> Self {
        Self {
            listeners: Listeners::new(),
            url: Arc::new(Mutex::new(None)),
            attachment: Mutex::new(Attachment::default()),
        }
    }

    fn surface(&self) -> AdapterResult<Arc<dyn VideoSurface>> {
        let attachment = lock(&self.attachment);
        if attachment.destroyed {
            return Err(AdapterError::Destroyed);
        }
        attachment.surface.clone().ok_or(AdapterError::NotMounted)
    }
}

impl Default for NativeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine events for one surface notification
fn translate(event: &MediaEvent, surface: &dyn VideoSurface, url: Option<&str>) -> Vec<Event> {
    let engine = match event {
        MediaEvent::LoadStart => return vec![NativeEvent::ProgressiveProgress { progress: 0.0 }.into()],
        MediaEvent::Progress { progress } => {
            return vec![NativeEvent::ProgressiveProgress { progress: *progress }.into()]
        }
        MediaEvent::LoadedMetadata => {
            let snapshot = surface.snapshot();
            let (width, height) = surface
                .video_size()
                .map(|r| (r.width, r.height))
                .unwrap_or((0, 0));
            EngineEvent::MetadataLoaded {
                playback_type: PlaybackType::Native,
                url: url.unwrap_or_default().to_string(),
                duration: snapshot.duration,
                width,
                height,
            }
        }
        MediaEvent::TimeUpdate => EngineEvent::TimeUpdated(surface.snapshot()),
        MediaEvent::Playing => EngineEvent::Playing(surface.snapshot()),
        MediaEvent::Pause => EngineEvent::Paused(surface.snapshot()),
        MediaEvent::Waiting => EngineEvent::Waiting(surface.snapshot()),
        MediaEvent::Seeked => EngineEvent::Seeked(surface.snapshot()),
        MediaEvent::Ended => EngineEvent::Ended(surface.snapshot()),
        MediaEvent::VolumeChange { volume, muted } => {
            return vec![
                EngineEvent::VolumeChanged { volume: *volume }.into(),
                EngineEvent::MutedChanged { muted: *muted }.into(),
            ]
        }
        MediaEvent::Error { code, message } => EngineEvent::Error {
            kind: code.kind(),
            message: message.clone(),
            url: url.map(str::to_string),
            codec: None,
        },
    };
    vec![engine.into()]
}

#[async_trait]
impl Adapter for NativeAdapter {
    fn playback_type(&self) -> PlaybackType {
        PlaybackType::Native
    }

    #[instrument(skip_all, fields(surface = surface.id()))]
    async fn mount(&self, surface: Arc<dyn VideoSurface>) -> AdapterResult<()> {
        let weak: Weak<dyn VideoSurface> = Arc::downgrade(&surface);
        let listeners = self.listeners.clone();
        let url = Arc::clone(&self.url);

        let media_events = surface.subscribe(Arc::new(move |event: &MediaEvent| {
            let Some(surface) = weak.upgrade() else {
                return;
            };
            let url = lock(&url).clone();
            for translated in translate(event, surface.as_ref(), url.as_deref()) {
                listeners.emit(&translated);
            }
        }));

        let previous = {
            let mut attachment = lock(&self.attachment);
            if attachment.destroyed {
                drop(attachment);
                media_events.unsubscribe();
                return Err(AdapterError::Destroyed);
            }
            attachment.surface = Some(surface);
            attachment.media_events.replace(media_events)
        };
        if let Some(previous) = previous {
            previous.unsubscribe();
        }

        debug!("Native adapter mounted");
        Ok(())
    }

    async fn load(&self, url: &str) -> AdapterResult<()> {
        let surface = self.surface()?;
        *lock(&self.url) = Some(url.to_string());
        surface.set_source(url).await
    }

    async fn play(&self) -> AdapterResult<()> {
        self.surface()?.play().await
    }

    async fn pause(&self) -> AdapterResult<()> {
        self.surface()?.pause().await
    }

    /// Seeks are clamped to the duration the surface reports right now
    async fn seek(&self, time: f64) -> AdapterResult<()> {
        let surface = self.surface()?;
        let duration = surface.snapshot().duration;
        let target = if duration.is_finite() && duration > 0.0 {
            time.clamp(0.0, duration)
        } else {
            time.max(0.0)
        };
        surface.seek(target).await
    }

    async fn set_volume(&self, volume: f64) -> AdapterResult<()> {
        self.surface()?.set_volume(volume.clamp(0.0, 1.0));
        Ok(())
    }

    async fn set_muted(&self, muted: bool) -> AdapterResult<()> {
        self.surface()?.set_muted(muted);
        Ok(())
    }

    async fn destroy(&self) -> AdapterResult<()> {
        let (surface, media_events) = {
            let mut attachment = lock(&self.attachment);
            attachment.destroyed = true;
            (attachment.surface.take(), attachment.media_events.take())
        };

        if let Some(media_events) = media_events {
            media_events.unsubscribe();
        }
        if let Some(surface) = surface {
            surface.reset();
        }
        lock(&self.url).take();
        self.listeners.clear();
        debug!("Native adapter destroyed");
        Ok(())
    }

    fn subscribe(&self, listener: Listener<Event>) -> Subscription {
        self.listeners.subscribe(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{MediaErrorCode, MediaInfo, SimulatedSurface};
    use crate::event::ErrorKind;

    fn mounted() -> (Arc<SimulatedSurface>, NativeAdapter, Arc<Mutex<Vec<Event>>>, Subscription) {
        let surface = Arc::new(
            SimulatedSurface::new("native-test")
                .with_media("movie.mp4", MediaInfo::playable(30.0, 1920, 1080)),
        );
        let adapter = NativeAdapter::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let sub = adapter.subscribe(Arc::new(move |e: &Event| sink.lock().unwrap().push(e.clone())));
        (surface, adapter, events, sub)
    }

    #[tokio::test]
    async fn test_load_reports_metadata_with_url() {
        let (surface, adapter, events, _sub) = mounted();
        adapter.mount(surface.clone()).await.unwrap();
        adapter.load("movie.mp4").await.unwrap();

        let events = events.lock().unwrap();
        assert!(events.contains(&Event::Engine(EngineEvent::MetadataLoaded {
            playback_type: PlaybackType::Native,
            url: "movie.mp4".to_string(),
            duration: 30.0,
            width: 1920,
            height: 1080,
        })));
        assert!(events.contains(&NativeEvent::ProgressiveProgress { progress: 1.0 }.into()));
    }

    #[tokio::test]
    async fn test_operations_require_mount() {
        let adapter = NativeAdapter::new();
        assert_eq!(adapter.load("movie.mp4").await, Err(AdapterError::NotMounted));
        assert_eq!(adapter.play().await, Err(AdapterError::NotMounted));
    }

    #[tokio::test]
    async fn test_seek_clamped_to_duration() {
        let (surface, adapter, _events, _sub) = mounted();
        adapter.mount(surface.clone()).await.unwrap();
        adapter.load("movie.mp4").await.unwrap();

        adapter.seek(90.0).await.unwrap();
        assert_eq!(surface.snapshot().current_time, 30.0);

        adapter.seek(-4.0).await.unwrap();
        assert_eq!(surface.snapshot().current_time, 0.0);
    }

    #[tokio::test]
    async fn test_media_error_maps_to_kind() {
        let (surface, adapter, events, _sub) = mounted();
        adapter.mount(surface.clone()).await.unwrap();
        adapter.load("movie.mp4").await.unwrap();

        surface.fail(MediaErrorCode::Decode, "corrupt frame");

        let events = events.lock().unwrap();
        assert!(matches!(
            events.last(),
            Some(Event::Engine(EngineEvent::Error { kind: ErrorKind::Decode, url: Some(url), .. })) if url == "movie.mp4"
        ));
    }

    #[tokio::test]
    async fn test_destroy_detaches_everything() {
        let (surface, adapter, events, _sub) = mounted();
        adapter.mount(surface.clone()).await.unwrap();
        adapter.load("movie.mp4").await.unwrap();
        assert_eq!(surface.listener_count(), 1);

        adapter.destroy().await.unwrap();
        let seen = events.lock().unwrap().len();
        surface.fail(MediaErrorCode::Network, "late");

        assert_eq!(surface.listener_count(), 0);
        assert!(surface.current_source().is_none());
        assert_eq!(events.lock().unwrap().len(), seen);
        assert_eq!(adapter.play().await, Err(AdapterError::Destroyed));
        assert!(adapter.mount(surface.clone()).await.is_err());
    }
}
