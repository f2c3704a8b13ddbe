//! Replay binary: drives the turncue pipeline from a recorded session.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use turncue_engine::{
    metrics, replay::next_paced_line, CueDispatcher, Pipeline, RecordingChannel, ReplayTick,
    TracingChannel, TurncueConfig,
};
use turncue_models::{CueKind, Modality};
use turncue_perception::FaceDetector;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing()?;

    let Some(replay_path) = std::env::args().nth(1).map(PathBuf::from) else {
        bail!("usage: turncue <replay.jsonl>");
    };

    let metrics_enabled = std::env::var("METRICS_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);
    let metrics_handle = if metrics_enabled {
        match metrics::init_metrics() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Failed to install metrics recorder: {}", e);
                None
            }
        }
    } else {
        None
    };

    let mut config = TurncueConfig::load().context("Failed to load configuration")?;
    if std::env::var("TURNCUE_REPLAY_FAST")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
    {
        config.replay.fast = true;
    }
    info!(
        replay = %replay_path.display(),
        tick_hz = config.replay.tick_hz,
        fast = config.replay.fast,
        "Starting turncue replay"
    );

    let recorder = RecordingChannel::new("summary", Modality::Visual);
    let dispatcher = CueDispatcher::new()
        .with_channel(Box::new(TracingChannel))
        .with_channel(Box::new(recorder.clone()));

    let detector = build_detector(&config);
    let tick_hz = config.replay.tick_hz;
    let fast = config.replay.fast;
    let mut pipeline = Pipeline::new(config, detector, dispatcher)?;

    let file = tokio::fs::File::open(&replay_path)
        .await
        .with_context(|| format!("Failed to open {}", replay_path.display()))?;
    let mut lines = BufReader::new(file).lines();

    let mut interval = tokio::time::interval(Duration::from_secs_f32(1.0 / tick_hz));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut line_no = 0usize;
    let mut ticks = 0usize;
    loop {
        let next = tokio::select! {
            line = next_paced_line(&mut lines, &mut interval, fast) => line?,
            _ = &mut shutdown => {
                info!("Received shutdown signal");
                break;
            }
        };
        let Some(line) = next else {
            break;
        };
        line_no += 1;

        let Some(tick) = ReplayTick::parse_line(&line, line_no)? else {
            continue;
        };
        pipeline.tick(tick.dt, tick.input());
        ticks += 1;
    }

    let cues = recorder.recorded();
    let speaks = cues.iter().filter(|c| c.kind == CueKind::Speak).count();
    let holds = cues.iter().filter(|c| c.kind == CueKind::Hold).count();
    info!(ticks, speaks, holds, final_state = %pipeline.turn_state(), "Replay finished");

    println!("ticks: {}  hold: {}  speak: {}", ticks, holds, speaks);
    for cue in &cues {
        println!(
            "{:>8.3}s  {:<5}  dir={:+.2}  {}",
            cue.at_sec, cue.kind, cue.direction_hint, cue.reason
        );
    }

    if let Some(handle) = metrics_handle {
        info!("Metrics snapshot:\n{}", handle.render());
    }

    Ok(())
}

/// Colored output for dev, JSON for production.
fn init_tracing() -> Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("turncue=info".parse()?)
        .add_directive("ort=warn".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

/// Load the face detector when a model is configured and ONNX support is
/// compiled in. Any failure leaves the pipeline without a detector.
#[cfg(feature = "onnx")]
fn build_detector(config: &TurncueConfig) -> Option<FaceDetector> {
    use turncue_perception::OrtBackend;

    let path = config.model_path.as_ref()?;
    let backend = match OrtBackend::new(path, config.decoder.output_name.as_str()) {
        Ok(backend) => backend,
        Err(e) => {
            warn!(error = %e, "Face detector unavailable");
            return None;
        }
    };
    match FaceDetector::new(Box::new(backend), config.decoder.clone()) {
        Ok(detector) => Some(detector),
        Err(e) => {
            warn!(error = %e, "Face detector unavailable");
            None
        }
    }
}

#[cfg(not(feature = "onnx"))]
fn build_detector(config: &TurncueConfig) -> Option<FaceDetector> {
    if config.model_path.is_some() {
        warn!("model_path is set but this build has no ONNX support; replaying recorded faces only");
    }
    None
}
