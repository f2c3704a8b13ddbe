//! End-to-end turn-taking scenarios driven through the full pipeline.

use turncue_engine::{
    AudioInput, CueDispatcher, FrameInput, Pipeline, RecordingChannel, TickInput, TickOutput,
    TurnTakingConfig, TurncueConfig,
};
use turncue_models::{CueEvent, CueKind, Detection, Modality, Rect, TurnState};
use turncue_perception::{
    DecoderConfig, FaceDetector, Frame, InferenceBackend, PriorLevel, VisionResult,
};

const DT: f32 = 1.0 / 30.0;
const QUIET_DB: f32 = -60.0;
const SPEECH_DB: f32 = -20.0;

/// A face looking straight at the camera, 100px wide, centred on `cx`.
fn frontal_face(cx: f32) -> Detection {
    Detection::frontal(Rect::new(cx - 50.0, 190.0, 100.0, 100.0), 0.9)
}

/// Same face with the head turned: nose far off the eye midpoint.
fn turned_face(cx: f32) -> Detection {
    let mut det = frontal_face(cx);
    det.landmarks.0[2].x += 40.0;
    det
}

struct Harness {
    pipeline: Pipeline,
    recorder: RecordingChannel,
    outputs: Vec<TickOutput>,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(TurncueConfig::default(), None)
    }

    fn with_config(config: TurncueConfig, detector: Option<FaceDetector>) -> Self {
        let recorder = RecordingChannel::new("test", Modality::Visual);
        let dispatcher = CueDispatcher::new().with_channel(Box::new(recorder.clone()));
        let pipeline = Pipeline::new(config, detector, dispatcher).unwrap();
        Self {
            pipeline,
            recorder,
            outputs: Vec::new(),
        }
    }

    /// Run `seconds` of ticks with the same faces and microphone level.
    fn run(&mut self, seconds: f32, faces: Option<Vec<Detection>>, level_db: Option<f32>) {
        let steps = (seconds / DT).round() as usize;
        for _ in 0..steps {
            let input = TickInput {
                frame: faces.clone().map(FrameInput::Detections),
                audio: level_db.map(|level_db| AudioInput::Level {
                    level_db,
                    frame_ms: DT * 1000.0,
                }),
            };
            let output = self.pipeline.tick(DT, input);
            self.outputs.push(output);
        }
    }

    fn cues(&self) -> Vec<CueEvent> {
        self.recorder.recorded()
    }

    fn count(&self, kind: CueKind) -> usize {
        self.cues().iter().filter(|c| c.kind == kind).count()
    }

    fn ever_addressed(&self) -> bool {
        self.outputs.iter().any(|o| o.attention.addressed)
    }
}

#[test]
fn scenario_single_frontal_face_in_silence_invites_once() {
    let mut h = Harness::new();
    h.run(2.0, Some(vec![frontal_face(320.0)]), Some(QUIET_DB));

    assert_eq!(h.count(CueKind::Speak), 1);
    let speak = h
        .cues()
        .into_iter()
        .find(|c| c.kind == CueKind::Speak)
        .unwrap();
    assert!(speak.direction_hint.abs() < 0.05, "direction {}", speak.direction_hint);
    // Dwell (0.35 s) then enter-stable (0.8 s) before anything fires
    assert!(speak.at_sec > 1.1 && speak.at_sec < 1.3, "speak at {}", speak.at_sec);
    assert_eq!(h.pipeline.turn_state(), TurnState::Cooldown);
}

#[test]
fn scenario_quiet_room_before_address_invites_without_hold() {
    let mut h = Harness::new();
    h.run(2.0, Some(vec![]), Some(QUIET_DB));
    h.run(1.5, Some(vec![frontal_face(320.0)]), Some(QUIET_DB));

    let cues = h.cues();
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].kind, CueKind::Speak);
    assert_eq!(cues[0].reason, "addressed_gap_ready");
}

#[test]
fn scenario_half_group_looking_while_talking_holds() {
    let mut h = Harness::new();
    let faces = vec![frontal_face(150.0), turned_face(490.0)];
    h.run(5.0, Some(faces), Some(SPEECH_DB));

    let last = h.outputs.last().unwrap();
    assert_eq!(last.attention.faces_count, 2);
    assert_eq!(last.attention.looking_count, 1);
    assert_eq!(last.attention.attention_score, 0.5);
    assert!(last.attention.addressed);
    assert!(last.vad.is_speech);

    let cues = h.cues();
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].kind, CueKind::Hold);
    assert_eq!(cues[0].reason, "addressed_while_speech");
    // Looked face sits left of centre
    assert!(cues[0].direction_hint < 0.0);
    assert_eq!(h.count(CueKind::Speak), 0);
}

#[test]
fn scenario_brief_glance_never_addresses() {
    let mut h = Harness::new();
    h.run(0.6, Some(vec![frontal_face(320.0)]), Some(QUIET_DB));
    h.run(2.0, Some(vec![turned_face(320.0)]), Some(QUIET_DB));

    assert!(h.outputs.iter().any(|o| o.tracks.iter().any(|t| t.looked)));
    assert!(!h.ever_addressed());
    assert!(h.cues().is_empty());
}

#[test]
fn scenario_sustained_address_speaks_once_per_cycle() {
    let mut h = Harness::new();
    h.run(10.0, Some(vec![frontal_face(320.0)]), Some(QUIET_DB));
    assert_eq!(h.count(CueKind::Speak), 1);
    assert_eq!(h.pipeline.turn_state(), TurnState::Cooldown);
    let after_first_cycle = h.cues().len();

    // Everyone leaves: tracks time out, address drops, back to idle
    h.run(3.0, Some(vec![]), Some(QUIET_DB));
    assert_eq!(h.pipeline.turn_state(), TurnState::Idle);
    assert_eq!(h.cues().len(), after_first_cycle);

    // A new address starts a new cycle; the room stayed quiet, so no HOLD
    h.run(4.0, Some(vec![frontal_face(320.0)]), Some(QUIET_DB));
    assert_eq!(h.count(CueKind::Speak), 2);
    assert_eq!(h.count(CueKind::Hold), 1);
    let cues = h.cues();
    assert_eq!(cues.last().unwrap().reason, "addressed_gap_ready");
}

#[test]
fn short_detector_dropout_keeps_address() {
    let mut h = Harness::new();
    h.run(2.0, Some(vec![frontal_face(320.0)]), Some(SPEECH_DB));
    assert!(h.outputs.last().unwrap().attention.addressed);

    // Four missing camera frames
    h.run(4.0 * DT, None, Some(SPEECH_DB));
    h.run(1.0, Some(vec![frontal_face(320.0)]), Some(SPEECH_DB));

    let tail = &h.outputs[h.outputs.len() - 40..];
    assert!(tail.iter().all(|o| o.attention.addressed));
    assert_eq!(h.cues().len(), 1);
}

#[test]
fn missing_microphone_never_invites() {
    let mut h = Harness::new();
    h.run(6.0, Some(vec![frontal_face(320.0)]), None);

    assert!(h.ever_addressed());
    assert!(!h.outputs.last().unwrap().vad.available);
    assert_eq!(h.count(CueKind::Speak), 0);
    assert_eq!(h.count(CueKind::Hold), 1);
}

/// Detector whose model emits a buffer of the wrong size.
struct TruncatedBackend;

impl InferenceBackend for TruncatedBackend {
    fn infer(&mut self, _input: &[f32], _shape: [usize; 4]) -> VisionResult<Vec<f32>> {
        Ok(vec![0.9; 100])
    }

    fn name(&self) -> &'static str {
        "truncated"
    }
}

#[test]
fn malformed_detector_output_is_treated_as_no_faces() {
    let decoder = DecoderConfig {
        input_width: 64,
        input_height: 64,
        prior_levels: vec![PriorLevel::new(32, &[32.0])],
        ..Default::default()
    };
    let detector = FaceDetector::new(Box::new(TruncatedBackend), decoder).unwrap();
    let mut h = Harness::with_config(TurncueConfig::default(), Some(detector));

    for _ in 0..60 {
        let input = TickInput {
            frame: Some(FrameInput::Raw(Frame::solid(64, 48, [128, 128, 128]))),
            audio: Some(AudioInput::Samples(&[0.001; 533])),
        };
        let output = h.pipeline.tick(DT, input);
        assert!(output.tracks.is_empty());
        assert!(!output.attention.addressed);
    }
    assert!(h.cues().is_empty());
}

#[test]
fn event_log_records_transitions_and_cues() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.jsonl");
    // A longer quiet requirement guarantees HOLD before SPEAK
    let config = TurncueConfig {
        event_log_path: Some(path.clone()),
        turn_taking: TurnTakingConfig {
            min_quiet_to_invite_sec: 1.5,
            ..Default::default()
        },
        ..Default::default()
    };

    let mut h = Harness::with_config(config, None);
    h.run(3.5, Some(vec![frontal_face(320.0)]), Some(QUIET_DB));
    drop(h);

    let content = std::fs::read_to_string(&path).unwrap();
    let records: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    let kinds: Vec<&str> = records.iter().map(|r| r["kind"].as_str().unwrap()).collect();
    assert_eq!(kinds, ["transition", "cue", "transition", "cue"]);
    assert_eq!(records[0]["to"], "addressed_hold");
    assert_eq!(records[1]["cue"]["kind"], "hold");
    assert_eq!(records[2]["to"], "cooldown");
    assert_eq!(records[3]["cue"]["kind"], "speak");
}

#[test]
fn unusable_event_log_path_does_not_stop_the_loop() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();
    let config = TurncueConfig {
        event_log_path: Some(blocker.join("session.jsonl")),
        ..Default::default()
    };

    let mut h = Harness::with_config(config, None);
    h.run(2.0, Some(vec![frontal_face(320.0)]), Some(QUIET_DB));

    assert_eq!(h.count(CueKind::Speak), 1);
    assert!(!blocker.join("session.jsonl").exists());
}
