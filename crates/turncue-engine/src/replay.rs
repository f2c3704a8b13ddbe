//! Recorded session replay format.
//!
//! One JSON object per line:
//!
//! ```json
//! {"dt": 0.033, "faces": [...], "audio_level_db": -58.0}
//! ```
//!
//! `faces` absent means no camera frame that tick; `audio` (raw samples) or
//! `audio_level_db` absent means no microphone frame.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, Lines};
use tokio::time::Interval;
use turncue_models::Detection;

use crate::error::{EngineError, EngineResult};
use crate::pipeline::{AudioInput, FrameInput, TickInput};

/// One recorded tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayTick {
    /// Seconds since the previous tick
    pub dt: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faces: Option<Vec<Detection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_level_db: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<Vec<f32>>,
}

impl ReplayTick {
    /// Parse one line. Blank lines yield `None`.
    pub fn parse_line(line: &str, line_no: usize) -> EngineResult<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let tick: ReplayTick = serde_json::from_str(line)
            .map_err(|e| EngineError::replay(format!("line {}: {}", line_no, e)))?;
        if !tick.dt.is_finite() || tick.dt < 0.0 {
            return Err(EngineError::replay(format!(
                "line {}: dt must be a non-negative number, got {}",
                line_no, tick.dt
            )));
        }
        Ok(Some(tick))
    }

    /// Pipeline input for this tick. Raw samples win over a precomputed level.
    pub fn input(&self) -> TickInput<'_> {
        let audio = match (&self.audio, self.audio_level_db) {
            (Some(samples), _) => Some(AudioInput::Samples(samples)),
            (None, Some(level_db)) => Some(AudioInput::Level {
                level_db,
                frame_ms: self.dt * 1000.0,
            }),
            (None, None) => None,
        };
        TickInput {
            frame: self.faces.clone().map(FrameInput::Detections),
            audio,
        }
    }
}

/// Next replay line, waiting for the scheduler unless running fast.
pub async fn next_paced_line<R>(
    lines: &mut Lines<R>,
    interval: &mut Interval,
    fast: bool,
) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    if !fast {
        interval.tick().await;
    }
    lines.next_line().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncBufReadExt;

    #[test]
    fn test_parse_minimal_line() {
        let tick = ReplayTick::parse_line(r#"{"dt": 0.05}"#, 1).unwrap().unwrap();
        assert_eq!(tick.dt, 0.05);
        let input = tick.input();
        assert!(input.frame.is_none());
        assert!(input.audio.is_none());
    }

    #[test]
    fn test_level_becomes_audio_input() {
        let tick = ReplayTick::parse_line(r#"{"dt": 0.02, "faces": [], "audio_level_db": -58.5}"#, 3)
            .unwrap()
            .unwrap();
        let input = tick.input();
        assert!(matches!(input.frame, Some(FrameInput::Detections(ref d)) if d.is_empty()));
        match input.audio {
            Some(AudioInput::Level { level_db, frame_ms }) => {
                assert_eq!(level_db, -58.5);
                assert!((frame_ms - 20.0).abs() < 1e-4);
            }
            other => panic!("unexpected audio input: {:?}", other),
        }
    }

    #[test]
    fn test_blank_and_invalid_lines() {
        assert!(ReplayTick::parse_line("   ", 1).unwrap().is_none());
        assert!(ReplayTick::parse_line("{not json", 2).is_err());
        assert!(ReplayTick::parse_line(r#"{"dt": -1.0}"#, 3).is_err());
    }

    #[test]
    fn test_paced_lines_until_eof() {
        let text: &[u8] = b"{\"dt\": 0.1}\n\n{\"dt\": 0.1, \"audio_level_db\": -40.0}\n";
        let parsed = tokio_test::block_on(async {
            let mut lines = text.lines();
            let mut interval = tokio::time::interval(Duration::from_millis(1));
            let mut parsed = Vec::new();
            let mut line_no = 0;
            while let Some(line) = next_paced_line(&mut lines, &mut interval, false).await.unwrap() {
                line_no += 1;
                if let Some(tick) = ReplayTick::parse_line(&line, line_no).unwrap() {
                    parsed.push(tick);
                }
            }
            parsed
        });

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].audio_level_db, Some(-40.0));
    }
}
