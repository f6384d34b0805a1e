//! Runtime engine: the event queue, the drain loop and effect execution.
//!
//! Every input, whether a caller intent or an adapter notification, goes
//! through one FIFO queue. A single drain at a time pops an event, reduces
//! it, commits and publishes the new state, then runs that event's effects
//! in order, awaiting each one, before popping the next event.

use crate::adapter::{Adapter, AdapterRegistry};
use crate::config::RuntimeConfig;
use crate::effect::Effect;
use crate::error::{Result, RuntimeError};
use crate::event::{EngineEvent, ErrorKind, Event, Intent};
use crate::observer::{lock, Listener, Listeners, Subscription};
use crate::reducer::{reduce, Transition};
use crate::retry::{RetryDecision, RetryPolicy};
use crate::state::PlayerState;
use crate::surface::VideoSurface;
use crate::types::{PlaybackType, RuntimeId};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, instrument, warn};

/// An entry in the event queue. Entries without an event are barriers used
/// by [`PlayerRuntime::flush`].
struct Queued {
    event: Option<Event>,
    done: Option<oneshot::Sender<()>>,
    /// Adapter epoch the event belongs to; `None` for caller input
    epoch: Option<u64>,
}

impl Queued {
    fn event(event: Event, done: Option<oneshot::Sender<()>>) -> Self {
        Self {
            event: Some(event),
            done,
            epoch: None,
        }
    }

    /// Event that is only meaningful while adapter epoch `epoch` is current
    fn from_epoch(event: Event, epoch: u64) -> Self {
        Self {
            event: Some(event),
            done: None,
            epoch: Some(epoch),
        }
    }

    fn barrier(done: oneshot::Sender<()>) -> Self {
        Self {
            event: None,
            done: Some(done),
            epoch: None,
        }
    }
}

struct ActiveAdapter {
    adapter: Arc<dyn Adapter>,
    events: Subscription,
}

/// Releases the drain flag even when the draining future is dropped
/// mid-event, and hands leftover entries to a fresh drain in that case.
struct DrainGuard<'a> {
    inner: &'a Arc<Inner>,
    finished: bool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.inner.draining.store(false, Ordering::Release);
        if !self.finished {
            warn!(runtime = %self.inner.id, "Drain cancelled mid-event");
            if !lock(&self.inner.queue).is_empty() {
                self.inner.schedule_drain();
            }
        }
    }
}

/// Volume and mute requested by the caller, re-applied to each new adapter
#[derive(Debug, Clone, Copy)]
struct Preferences {
    volume: f64,
    muted: bool,
}

struct Inner {
    id: RuntimeId,
    config: RuntimeConfig,
    registry: AdapterRegistry,
    state: watch::Sender<PlayerState>,
    queue: Mutex<VecDeque<Queued>>,
    draining: AtomicBool,
    /// Bumped on every adapter create and destroy
    epoch: AtomicU64,
    adapter: Mutex<Option<ActiveAdapter>>,
    surface: Mutex<Option<Arc<dyn VideoSurface>>>,
    preferences: Mutex<Preferences>,
    observers: Listeners<PlayerState>,
}

/// Handle to one player runtime. Clones share the same runtime.
#[derive(Clone)]
pub struct PlayerRuntime {
    inner: Arc<Inner>,
}

impl PlayerRuntime {
    /// Runtime with the default configuration
    pub fn new(registry: AdapterRegistry) -> Self {
        Self::with_config(registry, RuntimeConfig::default())
    }

    pub fn with_config(registry: AdapterRegistry, config: RuntimeConfig) -> Self {
        let (state, _) = watch::channel(PlayerState::Idle);
        let preferences = Preferences {
            volume: config.initial_volume.clamp(0.0, 1.0),
            muted: config.initial_muted,
        };
        let id = RuntimeId::new();
        debug!(runtime = %id, backends = ?registry.playback_types(), "Runtime created");

        Self {
            inner: Arc::new(Inner {
                id,
                config,
                registry,
                state,
                queue: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                adapter: Mutex::new(None),
                surface: Mutex::new(None),
                preferences: Mutex::new(preferences),
                observers: Listeners::new(),
            }),
        }
    }

    pub fn id(&self) -> RuntimeId {
        self.inner.id
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Record the video surface and process `Mounted`
    #[instrument(skip_all, fields(runtime = %self.inner.id, surface = surface.id()))]
    pub async fn mount(&self, surface: Arc<dyn VideoSurface>) {
        *lock(&self.inner.surface) = Some(surface);
        info!("Video surface mounted");
        self.dispatch(EngineEvent::Mounted).await;
    }

    /// Enqueue `event` and wait until it and every effect it produced have
    /// been processed.
    #[instrument(skip_all, fields(runtime = %self.inner.id))]
    pub async fn dispatch(&self, event: impl Into<Event>) {
        let (done, processed) = oneshot::channel();
        self.inner.enqueue(Queued::event(event.into(), Some(done)));
        Arc::clone(&self.inner).drain().await;
        // The sender is dropped unsent only if the runtime goes away first
        let _ = processed.await;
    }

    /// Enqueue `event` without waiting. Safe to call from listeners and
    /// other synchronous contexts; the event is drained on the current tokio
    /// runtime if there is one, or by the next `dispatch` otherwise.
    pub fn post(&self, event: impl Into<Event>) {
        self.inner.enqueue(Queued::event(event.into(), None));
        self.inner.schedule_drain();
    }

    /// Wait until every event queued so far has been processed
    pub async fn flush(&self) {
        let (done, processed) = oneshot::channel();
        self.inner.enqueue(Queued::barrier(done));
        Arc::clone(&self.inner).drain().await;
        let _ = processed.await;
    }

    pub async fn load(&self, url: impl Into<String>) {
        self.dispatch(Intent::LoadRequested { url: url.into() }).await
    }

    pub async fn play(&self) {
        self.dispatch(Intent::PlayRequested).await
    }

    pub async fn pause(&self) {
        self.dispatch(Intent::PauseRequested).await
    }

    pub async fn seek(&self, time: f64) {
        self.dispatch(Intent::SeekRequested { time }).await
    }

    /// Register a state observer. It is called with the current state right
    /// away, then with every new committed state before that state's effects
    /// run. Events that leave the state unchanged are not re-delivered.
    pub fn subscribe(&self, listener: Listener<PlayerState>) -> Subscription {
        let subscription = self.inner.observers.subscribe(Arc::clone(&listener));
        listener(&self.state());
        subscription
    }

    /// Receiver that always holds the latest committed state
    pub fn watch(&self) -> watch::Receiver<PlayerState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> PlayerState {
        self.inner.state.borrow().clone()
    }

    /// Backend of the active adapter, if any
    pub fn playback_type(&self) -> Option<PlaybackType> {
        lock(&self.inner.adapter)
            .as_ref()
            .map(|active| active.adapter.playback_type())
    }

    /// Consult `policy` for the current state and, when it allows, wait the
    /// backoff delay and dispatch `RetryRequested`.
    #[instrument(skip_all, fields(runtime = %self.inner.id))]
    pub async fn retry(&self, policy: &RetryPolicy) -> RetryDecision {
        let decision = policy.decide(&self.state());
        match &decision {
            RetryDecision::Retry { attempt, delay } => {
                info!(attempt, ?delay, "Retrying after error");
                tokio::time::sleep(*delay).await;
                self.dispatch(Intent::RetryRequested).await;
            }
            RetryDecision::GiveUp(error) => {
                warn!(error = %error, "Retries exhausted");
            }
            RetryDecision::NotAnError => {}
        }
        decision
    }

    /// Tear down the active adapter and drop every observer. Never fails.
    #[instrument(skip_all, fields(runtime = %self.inner.id))]
    pub async fn destroy(&self) {
        if let Err(err) = self.inner.destroy_adapter().await {
            warn!(error = %err, "Adapter destroy failed");
        }
        self.inner.observers.clear();
        info!("Runtime destroyed");
    }
}

impl std::fmt::Debug for PlayerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerRuntime")
            .field("id", &self.inner.id)
            .field("state", &self.state().name())
            .field("playback_type", &self.playback_type())
            .finish()
    }
}

impl Inner {
    fn enqueue(&self, queued: Queued) {
        lock(&self.queue).push_back(queued);
    }

    fn dequeue(&self) -> Option<Queued> {
        lock(&self.queue).pop_front()
    }

    /// Start a drain on the ambient tokio runtime unless one is running
    fn schedule_drain(self: &Arc<Self>) {
        if self.draining.load(Ordering::Acquire) {
            return;
        }
        match Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::clone(self);
                handle.spawn(async move { inner.drain().await });
            }
            Err(_) => debug!(runtime = %self.id, "No tokio runtime, event left queued"),
        }
    }

    /// Process the queue until it is empty. Returns immediately when another
    /// drain is already active; that drain will pick up anything enqueued.
    async fn drain(self: Arc<Self>) {
        loop {
            if self
                .draining
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return;
            }

            let mut guard = DrainGuard {
                inner: &self,
                finished: false,
            };
            while let Some(Queued { event, done, epoch }) = self.dequeue() {
                match (event, epoch) {
                    (Some(event), Some(epoch)) if epoch != self.epoch.load(Ordering::Acquire) => {
                        debug!(runtime = %self.id, event = event.name(), epoch, "Dropping event from a retired adapter");
                    }
                    (Some(event), _) => self.process(event).await,
                    (None, _) => {}
                }
                if let Some(done) = done {
                    let _ = done.send(());
                }
            }
            guard.finished = true;
            drop(guard);

            // An enqueue that raced with the release above saw the flag set
            // and left its event for us.
            if lock(&self.queue).is_empty() {
                return;
            }
        }
    }

    async fn process(self: &Arc<Self>, event: Event) {
        let current = self.state.borrow().clone();
        let Transition { state, effects } = reduce(&current, &event);

        if state != current {
            debug!(
                runtime = %self.id,
                event = event.name(),
                from = current.name(),
                to = state.name(),
                "State transition"
            );
            self.state.send_replace(state.clone());
            self.observers.emit(&state);
        }

        for effect in effects {
            debug!(runtime = %self.id, effect = %effect, "Executing effect");
            if let Err(err) = self.execute(&effect).await {
                match effect {
                    Effect::DestroyAdapter => {
                        warn!(runtime = %self.id, error = %err, "Adapter teardown failed")
                    }
                    _ => {
                        warn!(
                            runtime = %self.id,
                            code = err.error_code(),
                            error = %err,
                            "Effect failed"
                        );
                        let epoch = self.epoch.load(Ordering::Acquire);
                        self.enqueue(Queued::from_epoch(Event::Engine(err.to_event()), epoch));
                    }
                }
            }
        }
    }

    async fn execute(self: &Arc<Self>, effect: &Effect) -> Result<()> {
        let operation = effect.operation();
        match effect {
            Effect::DestroyAdapter => self.destroy_adapter().await,
            Effect::CreateAdapter { playback_type, url } => self.create_adapter(*playback_type, url),
            Effect::AttachVideoElement => {
                let adapter = self.active_adapter()?;
                let surface = lock(&self.surface).clone().ok_or(RuntimeError::NoVideoElement)?;
                adapter
                    .mount(surface)
                    .await
                    .map_err(|e| RuntimeError::adapter(operation, e))?;
                self.apply_preferences(adapter.as_ref()).await
            }
            Effect::LoadSource { url } => self
                .active_adapter()?
                .load(url)
                .await
                .map_err(|e| RuntimeError::adapter(operation, e)),
            Effect::Play => self
                .active_adapter()?
                .play()
                .await
                .map_err(|e| RuntimeError::adapter(operation, e)),
            Effect::Pause => self
                .active_adapter()?
                .pause()
                .await
                .map_err(|e| RuntimeError::adapter(operation, e)),
            Effect::Seek { time } => self
                .active_adapter()?
                .seek(*time)
                .await
                .map_err(|e| RuntimeError::adapter(operation, e)),
            Effect::SetVolume { volume } => {
                lock(&self.preferences).volume = volume.clamp(0.0, 1.0);
                match self.active_adapter() {
                    Ok(adapter) => adapter
                        .set_volume(*volume)
                        .await
                        .map_err(|e| RuntimeError::adapter(operation, e)),
                    Err(_) => Ok(()),
                }
            }
            Effect::SetMuted { muted } => {
                lock(&self.preferences).muted = *muted;
                match self.active_adapter() {
                    Ok(adapter) => adapter
                        .set_muted(*muted)
                        .await
                        .map_err(|e| RuntimeError::adapter(operation, e)),
                    Err(_) => Ok(()),
                }
            }
        }
    }

    fn active_adapter(&self) -> Result<Arc<dyn Adapter>> {
        lock(&self.adapter)
            .as_ref()
            .map(|active| Arc::clone(&active.adapter))
            .ok_or(RuntimeError::NoAdapter)
    }

    fn create_adapter(self: &Arc<Self>, playback_type: PlaybackType, url: &str) -> Result<()> {
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        let Some(adapter) = self.registry.create(playback_type) else {
            warn!(runtime = %self.id, %playback_type, url, "No adapter registered");
            let error = EngineEvent::Error {
                kind: ErrorKind::NotSupported,
                message: format!("no {playback_type} adapter available"),
                url: Some(url.to_string()),
                codec: None,
            };
            self.enqueue(Queued::from_epoch(Event::Engine(error), epoch));
            return Ok(());
        };

        if adapter.playback_type() != playback_type {
            return Err(RuntimeError::NoAdapter);
        }

        let weak = Arc::downgrade(self);
        let events = adapter.subscribe(Arc::new(move |event: &Event| {
            if let Some(inner) = weak.upgrade() {
                inner.enqueue(Queued::from_epoch(event.clone(), epoch));
                inner.schedule_drain();
            }
        }));

        let previous = lock(&self.adapter).replace(ActiveAdapter { adapter, events });
        if let Some(previous) = previous {
            // Only reachable if a create ran without a destroy before it
            previous.events.unsubscribe();
        }

        info!(runtime = %self.id, %playback_type, url, epoch, "Adapter created");
        Ok(())
    }

    /// Retire the active adapter. Whatever it queued before this point is
    /// dropped by the drain.
    async fn destroy_adapter(&self) -> Result<()> {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        let active = lock(&self.adapter).take();
        let Some(ActiveAdapter { adapter, events }) = active else {
            return Ok(());
        };

        events.unsubscribe();
        debug!(runtime = %self.id, playback_type = %adapter.playback_type(), "Destroying adapter");
        adapter
            .destroy()
            .await
            .map_err(|e| RuntimeError::adapter("destroy", e))
    }

    async fn apply_preferences(&self, adapter: &dyn Adapter) -> Result<()> {
        let Preferences { volume, muted } = *lock(&self.preferences);
        adapter
            .set_volume(volume)
            .await
            .map_err(|e| RuntimeError::adapter("set_volume", e))?;
        adapter
            .set_muted(muted)
            .await
            .map_err(|e| RuntimeError::adapter("set_muted", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::NativeAdapter;
    use crate::surface::{MediaInfo, SimulatedSurface};

    fn runtime_with_surface() -> (PlayerRuntime, Arc<SimulatedSurface>) {
        let surface = Arc::new(
            SimulatedSurface::new("engine-test").with_media("v.mp4", MediaInfo::playable(120.0, 1920, 1080)),
        );
        (PlayerRuntime::new(AdapterRegistry::with_defaults()), surface)
    }

    #[tokio::test]
    async fn test_load_reaches_paused_with_native_adapter() {
        let (runtime, surface) = runtime_with_surface();
        runtime.mount(surface.clone()).await;
        runtime.load("v.mp4").await;
        runtime.flush().await;

        assert!(matches!(runtime.state(), PlayerState::Paused { duration, .. } if duration == 120.0));
        assert_eq!(runtime.playback_type(), Some(PlaybackType::Native));
        assert_eq!(surface.current_source().as_deref(), Some("v.mp4"));
    }

    #[tokio::test]
    async fn test_load_without_surface_reports_error() {
        let runtime = PlayerRuntime::new(AdapterRegistry::with_defaults());
        runtime.load("v.mp4").await;
        runtime.flush().await;

        assert!(matches!(runtime.state(), PlayerState::Error(_)));
    }

    #[tokio::test]
    async fn test_mismatched_adapter_type_is_rejected() {
        let registry = AdapterRegistry::new()
            .with(PlaybackType::Hls, || Arc::new(NativeAdapter::new()) as Arc<dyn Adapter>);
        let (_, surface) = runtime_with_surface();
        let runtime = PlayerRuntime::new(registry);
        runtime.mount(surface).await;

        runtime.load("live.m3u8").await;
        runtime.flush().await;

        assert_eq!(runtime.playback_type(), None);
        assert!(crate::state::capability::is_fatal_error(&runtime.state()));
    }

    #[tokio::test]
    async fn test_volume_preference_survives_reload() {
        let (runtime, surface) = runtime_with_surface();
        runtime.dispatch(Intent::SetVolumeRequested { volume: 0.25 }).await;
        runtime.dispatch(Intent::SetMutedRequested { muted: true }).await;

        runtime.mount(surface.clone()).await;
        runtime.load("v.mp4").await;

        assert_eq!(surface.volume(), (0.25, true));
    }

    #[tokio::test]
    async fn test_unchanged_state_is_not_redelivered() {
        let (runtime, _surface) = runtime_with_surface();
        let calls = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&calls);
        let _sub = runtime.subscribe(Arc::new(move |_: &PlayerState| *counter.lock().unwrap() += 1));

        runtime.dispatch(Intent::SetVolumeRequested { volume: 0.5 }).await;
        runtime.pause().await;

        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_destroy_clears_adapter_and_observers() {
        let (runtime, surface) = runtime_with_surface();
        let calls = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&calls);
        let _sub = runtime.subscribe(Arc::new(move |_: &PlayerState| *counter.lock().unwrap() += 1));

        runtime.mount(surface.clone()).await;
        runtime.load("v.mp4").await;
        runtime.destroy().await;
        let seen = *calls.lock().unwrap();

        runtime.dispatch(Intent::ResetRequested).await;

        assert_eq!(runtime.playback_type(), None);
        assert_eq!(surface.listener_count(), 0);
        assert_eq!(*calls.lock().unwrap(), seen);
    }
}
