//! Backend adapter contract.
//!
//! An adapter owns one playback technology (native progressive, HLS or DASH)
//! for the lifetime of one source. The engine creates it through the
//! [`AdapterRegistry`], attaches it to the mounted [`VideoSurface`], and
//! listens to the events it emits. Adapters never touch runtime state.

mod native;

pub use native::NativeAdapter;

use crate::error::AdapterResult;
use crate::event::Event;
use crate::observer::{Listener, Subscription};
use crate::surface::VideoSurface;
use crate::types::PlaybackType;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// A playback backend
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Technology this adapter drives
    fn playback_type(&self) -> PlaybackType;

    /// Attach to the video surface. Called once, before `load`.
    async fn mount(&self, surface: Arc<dyn VideoSurface>) -> AdapterResult<()>;

    async fn load(&self, url: &str) -> AdapterResult<()>;

    async fn play(&self) -> AdapterResult<()>;

    async fn pause(&self) -> AdapterResult<()>;

    async fn seek(&self, time: f64) -> AdapterResult<()>;

    async fn set_volume(&self, volume: f64) -> AdapterResult<()>;

    async fn set_muted(&self, muted: bool) -> AdapterResult<()>;

    /// Release the surface and every listener. The adapter is unusable
    /// afterwards.
    async fn destroy(&self) -> AdapterResult<()>;

    /// Receive the engine, native, HLS or DASH events this adapter emits.
    ///
    /// Listeners may be called from inside any of the methods above, so they
    /// must not block on the adapter.
    fn subscribe(&self, listener: Listener<Event>) -> Subscription;
}

/// Builds a fresh adapter for each load
pub trait AdapterFactory: Send + Sync {
    fn create(&self) -> Arc<dyn Adapter>;
}

impl<F> AdapterFactory for F
where
    F: Fn() -> Arc<dyn Adapter> + Send + Sync,
{
    fn create(&self) -> Arc<dyn Adapter> {
        self()
    }
}

/// Map from playback type to the factory that serves it
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    factories: HashMap<PlaybackType, Arc<dyn AdapterFactory>>,
}

impl AdapterRegistry {
    /// Registry with no backends at all
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry serving progressive sources through [`NativeAdapter`].
    ///
    /// HLS and DASH need a streaming backend registered by the embedder.
    pub fn with_defaults() -> Self {
        Self::new().with(PlaybackType::Native, || Arc::new(NativeAdapter::new()) as Arc<dyn Adapter>)
    }

    /// Builder form of [`AdapterRegistry::register`]
    pub fn with(mut self, playback_type: PlaybackType, factory: impl AdapterFactory + 'static) -> Self {
        self.register(playback_type, factory);
        self
    }

    /// Register `factory` for `playback_type`, replacing any previous one
    pub fn register(&mut self, playback_type: PlaybackType, factory: impl AdapterFactory + 'static) {
        self.factories.insert(playback_type, Arc::new(factory));
    }

    pub fn create(&self, playback_type: PlaybackType) -> Option<Arc<dyn Adapter>> {
        self.factories.get(&playback_type).map(|factory| factory.create())
    }

    pub fn supports(&self, playback_type: PlaybackType) -> bool {
        self.factories.contains_key(&playback_type)
    }

    /// Registered playback types, in a stable order
    pub fn playback_types(&self) -> Vec<PlaybackType> {
        let mut types: Vec<PlaybackType> = self.factories.keys().copied().collect();
        types.sort_by_key(|t| t.as_str());
        types
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("playback_types", &self.playback_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_serve_native_only() {
        let registry = AdapterRegistry::with_defaults();
        assert!(registry.supports(PlaybackType::Native));
        assert!(!registry.supports(PlaybackType::Hls));
        assert!(registry.create(PlaybackType::Dash).is_none());

        let adapter = registry.create(PlaybackType::Native).unwrap();
        assert_eq!(adapter.playback_type(), PlaybackType::Native);
    }

    #[test]
    fn test_register_replaces_factory() {
        let registry = AdapterRegistry::new()
            .with(PlaybackType::Hls, || Arc::new(NativeAdapter::new()) as Arc<dyn Adapter>)
            .with(PlaybackType::Native, || Arc::new(NativeAdapter::new()) as Arc<dyn Adapter>);

        assert_eq!(
            registry.playback_types(),
            vec![PlaybackType::Hls, PlaybackType::Native]
        );
    }
}
