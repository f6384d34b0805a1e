//! CLI command implementations

use crate::output::{self, DetectionRow, OutputFormat, ReplayRow, TransitionRow};
use anyhow::Context;
use chrono::Utc;
use console::style;
use kino_runtime::state::capability;
use kino_runtime::{
    detect_playback_type, reduce, AdapterRegistry, Event, MediaErrorCode, MediaInfo, PlayerRuntime,
    PlayerState, RetryDecision, RuntimeConfig, SimulatedSurface, Transition,
};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

/// Load a runtime configuration file, or the defaults when none is given
pub fn load_config(path: Option<&Path>) -> anyhow::Result<RuntimeConfig> {
    let Some(path) = path else {
        return Ok(RuntimeConfig::default());
    };
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    RuntimeConfig::from_json_str(&json).with_context(|| format!("loading config from {}", path.display()))
}

/// Detect the backend for each URL
pub fn detect(urls: &[String], format: &str) -> anyhow::Result<()> {
    let rows: Vec<DetectionRow> = urls
        .iter()
        .map(|url| DetectionRow {
            url: url.clone(),
            backend: detect_playback_type(url).to_string(),
        })
        .collect();

    output::print_rows(&rows, format, |row| {
        format!("{:<8} {}", style(&row.backend).bold(), row.url)
    })
}

/// Parameters of a simulated session
#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub play_for: f64,
    pub step: f64,
    pub seek: Option<f64>,
    pub fail: Option<String>,
}

fn failure_code(kind: &str) -> anyhow::Result<MediaErrorCode> {
    match kind {
        "network" => Ok(MediaErrorCode::Network),
        "decode" => Ok(MediaErrorCode::Decode),
        "aborted" => Ok(MediaErrorCode::Aborted),
        "not-supported" => Ok(MediaErrorCode::SrcNotSupported),
        other => anyhow::bail!("unknown failure kind '{other}' (expected network, decode, aborted, not-supported)"),
    }
}

/// Short description of what a state knows about its source or error
fn detail(state: &PlayerState) -> String {
    if let Some(error) = capability::error(state) {
        return match error.retry_count() {
            Some(retries) => format!("{error} (retries: {retries})"),
            None => error.to_string(),
        };
    }

    match capability::source(state) {
        Some(source) => {
            let mut parts = vec![source.playback_type.to_string()];
            if let Some(resolution) = source.resolution {
                parts.push(format!("{} {}", resolution, resolution.quality_name()));
            }
            if let Some(codec) = &source.codec {
                parts.push(codec.clone());
            }
            parts.join(" ")
        }
        None => capability::source_url(state).unwrap_or_default().to_string(),
    }
}

/// Run one source through the runtime on a simulated surface
pub async fn simulate(
    url: &str,
    options: SimulateOptions,
    config: RuntimeConfig,
    format: &str,
) -> anyhow::Result<()> {
    if options.step <= 0.0 {
        anyhow::bail!("--step must be positive, got {}", options.step);
    }

    let media = match &options.fail {
        Some(kind) => MediaInfo::failing(failure_code(kind)?, format!("simulated {kind} failure")),
        None => MediaInfo::playable(options.duration, options.width, options.height),
    };
    let surface = Arc::new(SimulatedSurface::new("cli").with_media(url, media));
    let policy = config.retry_policy();
    let runtime = PlayerRuntime::with_config(AdapterRegistry::with_defaults(), config);
    info!(runtime = %runtime.id(), url, "Starting simulation");

    let rows: Arc<Mutex<Vec<TransitionRow>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&rows);
    let subscription = runtime.subscribe(Arc::new(move |state: &PlayerState| {
        let mut rows = sink.lock().unwrap_or_else(PoisonError::into_inner);
        let step = rows.len() + 1;
        rows.push(TransitionRow {
            step,
            at: Utc::now().format("%H:%M:%S%.3f").to_string(),
            state: state.name().to_string(),
            position: output::position(capability::current_time(state), capability::duration(state)),
            detail: detail(state),
        });
    }));

    runtime.mount(surface.clone()).await;
    runtime.load(url).await;

    // Abort errors never count up, so attempts are bounded here as well
    for _ in 0..=policy.max_retries {
        match runtime.retry(&policy).await {
            RetryDecision::Retry { .. } => continue,
            RetryDecision::GiveUp(error) => {
                warn!(error = %error, "Giving up on source");
                break;
            }
            RetryDecision::NotAnError => break,
        }
    }

    if matches!(runtime.state(), PlayerState::Paused { .. }) {
        runtime.play().await;

        let mut elapsed = 0.0;
        while elapsed < options.play_for {
            let dt = options.step.min(options.play_for - elapsed);
            surface.advance(dt);
            runtime.flush().await;
            elapsed += dt;
            if matches!(runtime.state(), PlayerState::Ended { .. }) {
                break;
            }
        }

        if let Some(time) = options.seek {
            runtime.seek(time).await;
        }
        runtime.pause().await;
    }

    subscription.unsubscribe();
    let final_state = runtime.state();
    runtime.destroy().await;

    let rows = std::mem::take(&mut *rows.lock().unwrap_or_else(PoisonError::into_inner));
    output::print_rows(&rows, format, |row| {
        format!(
            "{:>3}  {}  {:<36} {:<18} {}",
            row.step,
            row.at,
            output::styled_state(&row.state),
            row.position,
            row.detail
        )
    })?;

    if OutputFormat::from(format) == OutputFormat::Text {
        println!("\nFinal state: {}", output::styled_state(final_state.name()));
    }

    Ok(())
}

/// Fold a recorded event log through the reducer, starting from `Idle`
pub fn replay_events(events: &[Event]) -> (PlayerState, Vec<ReplayRow>) {
    let mut state = PlayerState::Idle;
    let mut rows = Vec::with_capacity(events.len());

    for (i, event) in events.iter().enumerate() {
        let Transition { state: next, effects } = reduce(&state, event);
        rows.push(ReplayRow {
            step: i + 1,
            event: event.name().to_string(),
            state: next.name().to_string(),
            effects: effects.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
        });
        state = next;
    }

    (state, rows)
}

/// Replay an event log file
pub fn replay(path: &Path, format: &str) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let events: Vec<Event> =
        serde_json::from_str(&json).with_context(|| format!("parsing events from {}", path.display()))?;

    let (state, rows) = replay_events(&events);
    output::print_rows(&rows, format, |row| {
        let effects = if row.effects.is_empty() {
            String::new()
        } else {
            format!(" -> [{}]", row.effects)
        };
        format!(
            "{:>3}  {:<24} {}{}",
            row.step,
            row.event,
            output::styled_state(&row.state),
            effects
        )
    })?;

    if OutputFormat::from(format) == OutputFormat::Text {
        println!("\nFinal state: {}", serde_json::to_string_pretty(&state)?);
    }

    Ok(())
}
