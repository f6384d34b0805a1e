//! Simulated playback example
//!
//! Drives a runtime against an in-memory video surface and prints every
//! committed state.
//!
//! Run with: cargo run -p kino-runtime --example simulated_playback

use kino_runtime::{
    capability, AdapterRegistry, MediaErrorCode, MediaInfo, PlayerRuntime, PlayerState, RetryPolicy,
    SimulatedSurface,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    println!("Kino Runtime - Simulated Playback Example");
    println!("=========================================\n");

    let surface = Arc::new(
        SimulatedSurface::new("example")
            .with_media("movie.mp4", MediaInfo::playable(8.0, 1280, 720))
            .with_media("offline.mp4", MediaInfo::failing(MediaErrorCode::Network, "host unreachable")),
    );
    let runtime = PlayerRuntime::new(AdapterRegistry::with_defaults());

    let _states = runtime.subscribe(Arc::new(|state: &PlayerState| {
        let position = capability::current_time(state)
            .zip(capability::duration(state))
            .map(|(t, d)| format!("{t:>5.1}s / {d:.1}s"))
            .unwrap_or_default();
        println!("  {:<28} {}", state.name(), position);
    }));

    runtime.mount(surface.clone()).await;

    println!("\nPlaying movie.mp4:");
    runtime.load("movie.mp4").await;
    runtime.play().await;
    for _ in 0..5 {
        surface.advance(2.0);
        runtime.flush().await;
    }

    println!("\nLoading an unreachable source:");
    runtime.load("offline.mp4").await;
    let policy = RetryPolicy::new(2).with_backoff(Duration::from_millis(50), Duration::from_millis(200));
    while runtime.retry(&policy).await.should_retry() {}

    println!("\nLoading an HLS stream without an HLS backend:");
    runtime.load("https://cdn.example.com/live/master.m3u8").await;

    runtime.destroy().await;
}
