//! Benchmark tests for kino-runtime operations
//!
//! Run with: cargo bench -p kino-runtime

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use kino_runtime::state::capability;
use kino_runtime::*;

// ============================================================================
// Helpers
// ============================================================================

fn native_source() -> SourceMetadata {
    SourceMetadata::from_load(PlaybackType::Native, "https://cdn.example.com/movie.mp4", 1920, 1080)
}

fn playing() -> PlayerState {
    PlayerState::Playing {
        current_time: 42.0,
        duration: 3600.0,
        buffered: vec![TimeRange::new(0.0, 60.0)],
        playback_rate: 1.0,
        source: Some(native_source()),
    }
}

fn create_test_variants(count: usize) -> Vec<Rendition> {
    (0..count)
        .map(|i| {
            let height = 240 + (i as u32) * 120;
            Rendition::new(format!("{height}p"), 400_000 * (i as u64 + 1))
                .with_resolution(height * 16 / 9, height)
                .with_codec("avc1.64001f")
        })
        .collect()
}

fn sample_states() -> Vec<PlayerState> {
    let variant = create_test_variants(1).remove(0);
    vec![
        PlayerState::Idle,
        PlayerState::loading("https://cdn.example.com/live.m3u8"),
        playing(),
        PlayerState::paused(Timeline::new(10.0, 120.0, Vec::new()), Some(native_source())),
        PlayerState::Hls(HlsState::VariantSelected {
            variant: variant.clone(),
            timeline: Timeline::start(600.0),
            source: SourceMetadata::for_rendition(PlaybackType::Hls, "live.m3u8", &variant),
        }),
        PlayerState::Error(ErrorState::network("timeout", Some("movie.mp4".into()))),
    ]
}

// ============================================================================
// Reducer Benchmarks
// ============================================================================

fn bench_reduce_intents(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reducer Intents");
    let state = playing();

    let intents: Vec<(&str, Event)> = vec![
        ("load", Intent::LoadRequested { url: "https://cdn.example.com/show.mpd".into() }.into()),
        ("pause", Intent::PauseRequested.into()),
        ("seek", Intent::SeekRequested { time: 1800.0 }.into()),
        ("volume", Intent::SetVolumeRequested { volume: 0.5 }.into()),
        ("reset", Intent::ResetRequested.into()),
    ];

    for (name, event) in &intents {
        group.bench_with_input(BenchmarkId::new("from_playing", name), event, |b, event| {
            b.iter(|| black_box(reduce(black_box(&state), black_box(event))));
        });
    }

    group.finish();
}

fn bench_reduce_engine_events(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reducer Engine Events");
    let state = playing();

    group.bench_function("time_updated", |b| {
        let event: Event = EngineEvent::TimeUpdated(
            TimeSnapshot::new(43.0, 3600.0).with_buffered(vec![TimeRange::new(0.0, 70.0)]),
        )
        .into();
        b.iter(|| black_box(reduce(black_box(&state), black_box(&event))));
    });

    group.bench_function("error", |b| {
        let event: Event = EngineEvent::error(ErrorKind::Network, "connection reset").into();
        b.iter(|| black_box(reduce(black_box(&state), black_box(&event))));
    });

    group.finish();
}

fn bench_hls_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("HLS Session");

    for count in [3usize, 8, 16] {
        let variants = create_test_variants(count);
        let events: Vec<Event> = vec![
            Intent::LoadRequested { url: "https://cdn.example.com/live.m3u8".into() }.into(),
            HlsEvent::ManifestLoading { progress: 0.5 }.into(),
            HlsEvent::ManifestParsed {
                variants: variants.clone(),
                duration: 600.0,
            }
            .into(),
            HlsEvent::VariantSelected {
                variant: variants[0].clone(),
            }
            .into(),
            Intent::PlayRequested.into(),
            HlsEvent::AdaptiveSwitchStarted {
                variant: variants[count - 1].clone(),
            }
            .into(),
            EngineEvent::TimeUpdated(TimeSnapshot::new(4.0, 600.0)).into(),
        ];

        group.bench_with_input(BenchmarkId::new("fold", count), &events, |b, events| {
            b.iter(|| {
                let state = events
                    .iter()
                    .fold(PlayerState::Idle, |state, event| reduce(&state, event).state);
                black_box(state)
            });
        });
    }

    group.finish();
}

// ============================================================================
// Capability Benchmarks
// ============================================================================

fn bench_capabilities(c: &mut Criterion) {
    let mut group = c.benchmark_group("Capabilities");
    let states = sample_states();

    group.bench_function("timeline", |b| {
        b.iter(|| {
            for state in &states {
                black_box(capability::timeline(black_box(state)));
            }
        });
    });

    group.bench_function("playback_type", |b| {
        b.iter(|| {
            for state in &states {
                black_box(capability::playback_type(black_box(state)));
            }
        });
    });

    group.bench_function("detect_playback_type", |b| {
        let urls = [
            "https://cdn.example.com/live/master.m3u8",
            "https://cdn.example.com/vod/manifest.mpd?token=abc",
            "/videos/movie.mp4",
        ];
        b.iter(|| {
            for url in &urls {
                black_box(detect_playback_type(black_box(url)));
            }
        });
    });

    group.finish();
}

criterion_group!(
    reducer_benches,
    bench_reduce_intents,
    bench_reduce_engine_events,
    bench_hls_session,
);

criterion_group!(
    capability_benches,
    bench_capabilities,
);

criterion_main!(reducer_benches, capability_benches);
