//! Kino Runtime - playback state machine for Kino
//!
//! This crate drives video playback through one deterministic state machine,
//! whatever the backend:
//! - A closed [`PlayerState`] model with capability queries
//! - A pure [`reduce`] function returning the next state and its effects
//! - An engine that serializes every input through one event queue
//! - A backend [`Adapter`] contract for native, HLS and DASH playback
//! - Retry decisions with exponential backoff
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Kino Runtime                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   intents ──┐                                                   │
//! │             ▼                                                   │
//! │      ┌─────────────┐    ┌──────────────┐    ┌──────────────┐    │
//! │      │ Event Queue │───▶│   Reducer    │───▶│  Observers   │    │
//! │      └─────────────┘    └──────┬───────┘    └──────────────┘    │
//! │             ▲                  │ effects                        │
//! │             │                  ▼                                │
//! │             │           ┌──────────────┐    ┌──────────────┐    │
//! │      adapter events ────│   Adapter    │───▶│ VideoSurface │    │
//! │                         │ native/hls/  │    └──────────────┘    │
//! │                         │    dash      │                        │
//! │                         └──────────────┘                        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use kino_runtime::{AdapterRegistry, MediaInfo, PlayerRuntime, SimulatedSurface};
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let surface = Arc::new(
//!     SimulatedSurface::new("main").with_media("movie.mp4", MediaInfo::playable(120.0, 1920, 1080)),
//! );
//! let runtime = PlayerRuntime::new(AdapterRegistry::with_defaults());
//! runtime.mount(surface).await;
//! runtime.load("movie.mp4").await;
//! runtime.play().await;
//! println!("{}", runtime.state());
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod effect;
pub mod engine;
pub mod error;
pub mod event;
pub mod observer;
pub mod reducer;
pub mod retry;
pub mod state;
pub mod surface;
pub mod types;

pub use adapter::{Adapter, AdapterFactory, AdapterRegistry, NativeAdapter};
pub use config::RuntimeConfig;
pub use effect::Effect;
pub use engine::PlayerRuntime;
pub use error::{AdapterError, AdapterResult, Result, RuntimeError};
pub use event::{DashEvent, EngineEvent, ErrorKind, Event, HlsEvent, Intent, NativeEvent};
pub use observer::{Listener, Subscription};
pub use reducer::{reduce, Transition};
pub use retry::{RetryDecision, RetryPolicy};
pub use state::{capability, Capability, DashState, ErrorState, HlsState, NativeState, PlayerState, Timeline};
pub use surface::{MediaErrorCode, MediaEvent, MediaInfo, SimulatedSurface, VideoSurface};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version; call once at startup after installing a
/// tracing subscriber
pub fn init() {
    tracing::info!(version = VERSION, "Kino Runtime initialized");
}
