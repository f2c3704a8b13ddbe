//! One tick of the perception-to-cue loop.
//!
//! Stage order is fixed: detector, tracker, aggregator, VAD, orchestrator,
//! dispatcher. Each stage reads only the snapshot produced upstream in the
//! same tick.

use std::time::Instant;

use tracing::{debug, trace};
use turncue_models::{
    CueEvent, Detection, GroupAttentionState, TrackSnapshot, TurnState, VadState,
};
use turncue_perception::{
    AttentionAggregator, FaceDetector, Frame, Tracker, VoiceActivityDetector,
};

use crate::config::TurncueConfig;
use crate::dispatcher::CueDispatcher;
use crate::error::EngineResult;
use crate::event_log::EventLog;
use crate::metrics;
use crate::orchestrator::TurnTakingOrchestrator;

/// Camera input for one tick.
#[derive(Debug, Clone)]
pub enum FrameInput {
    /// Raw pixels, run through the face detector.
    Raw(Frame),
    /// Faces already decoded elsewhere (replay, external detector).
    Detections(Vec<Detection>),
}

/// Microphone input for one tick.
#[derive(Debug, Clone, Copy)]
pub enum AudioInput<'a> {
    /// One PCM frame of samples in [-1, 1].
    Samples(&'a [f32]),
    /// A frame already reduced to its level.
    Level { level_db: f32, frame_ms: f32 },
}

/// Inputs sampled for one tick. `None` means the sensor produced nothing.
#[derive(Debug, Clone, Default)]
pub struct TickInput<'a> {
    pub frame: Option<FrameInput>,
    pub audio: Option<AudioInput<'a>>,
}

/// Everything the tick produced.
#[derive(Debug, Clone)]
pub struct TickOutput {
    pub tracks: Vec<TrackSnapshot>,
    pub attention: GroupAttentionState,
    pub vad: VadState,
    pub turn_state: TurnState,
    pub cue: Option<CueEvent>,
}

/// The assembled control loop.
pub struct Pipeline {
    config: TurncueConfig,
    detector: Option<FaceDetector>,
    tracker: Tracker,
    aggregator: AttentionAggregator,
    vad: VoiceActivityDetector,
    orchestrator: TurnTakingOrchestrator,
    dispatcher: CueDispatcher,
    event_log: EventLog,
}

impl Pipeline {
    /// Build a pipeline from validated configuration.
    ///
    /// Without a detector, raw frames count as frames without faces. An
    /// unusable event log path disables the log instead of failing.
    pub fn new(
        config: TurncueConfig,
        detector: Option<FaceDetector>,
        dispatcher: CueDispatcher,
    ) -> EngineResult<Self> {
        config.validate()?;

        let event_log = match &config.event_log_path {
            Some(path) => EventLog::open_or_disabled(path),
            None => EventLog::disabled(),
        };

        debug!(
            detector = detector.is_some(),
            channels = dispatcher.len(),
            event_log = event_log.is_enabled(),
            "Pipeline assembled"
        );

        Ok(Self {
            tracker: Tracker::new(config.tracker, config.frontal, config.smoothing),
            aggregator: AttentionAggregator::new(config.attention),
            vad: VoiceActivityDetector::new(config.vad),
            orchestrator: TurnTakingOrchestrator::new(config.turn_taking),
            detector,
            dispatcher,
            event_log,
            config,
        })
    }

    /// Run one tick, `dt` seconds after the previous one.
    pub fn tick(&mut self, dt: f32, input: TickInput<'_>) -> TickOutput {
        let started = Instant::now();

        let detections = match input.frame {
            Some(FrameInput::Detections(detections)) => detections,
            Some(FrameInput::Raw(frame)) => match self.detector.as_mut() {
                Some(detector) => detector.detect(&frame),
                None => Vec::new(),
            },
            None => Vec::new(),
        };

        let tracks = self.tracker.update(dt, &detections);
        let attention = self.aggregator.update(dt, &tracks);

        let vad = match input.audio {
            Some(AudioInput::Samples(samples)) => self.vad.process_frame(samples),
            Some(AudioInput::Level { level_db, frame_ms }) => {
                self.vad.process_level(level_db, frame_ms)
            }
            None => self.vad.mark_unavailable(),
        };

        let before = self.orchestrator.state();
        let cue = self.orchestrator.tick(dt, &attention, &vad);
        let turn_state = self.orchestrator.state();

        if turn_state != before {
            self.event_log
                .record_transition(before, turn_state, self.orchestrator.clock());
        }
        if let Some(cue) = &cue {
            self.event_log.record_cue(cue);
            let report = self.dispatcher.dispatch(cue, &self.config.modalities);
            trace!(?report, "Cue dispatched");
        }

        metrics::record_tick_duration(started.elapsed().as_secs_f64());

        TickOutput {
            tracks,
            attention,
            vad,
            turn_state,
            cue,
        }
    }

    pub fn config(&self) -> &TurncueConfig {
        &self.config
    }

    pub fn turn_state(&self) -> TurnState {
        self.orchestrator.state()
    }
}
