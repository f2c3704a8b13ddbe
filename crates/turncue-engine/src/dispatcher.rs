//! Cue fan-out to modality channels.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};
use turncue_models::{CueEvent, Modality, ModalityToggles};

use crate::error::DispatchError;
use crate::metrics;

/// One output channel for cues (LED ring, haptic motor, earcon, ...).
pub trait CueChannel: Send {
    /// Name used in logs and metrics.
    fn name(&self) -> &str;

    /// Modality this channel renders.
    fn modality(&self) -> Modality;

    /// Render one cue.
    fn deliver(&mut self, cue: &CueEvent) -> Result<(), DispatchError>;
}

/// Outcome of one dispatch call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Fans a cue out to every enabled channel.
///
/// A failing channel is logged and counted; it never stops the remaining
/// channels and never reaches the caller.
#[derive(Default)]
pub struct CueDispatcher {
    channels: Vec<Box<dyn CueChannel>>,
}

impl CueDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel. Channels receive cues in registration order.
    pub fn register(&mut self, channel: Box<dyn CueChannel>) {
        debug!(channel = channel.name(), modality = ?channel.modality(), "Registered cue channel");
        self.channels.push(channel);
    }

    pub fn with_channel(mut self, channel: Box<dyn CueChannel>) -> Self {
        self.register(channel);
        self
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Deliver `cue` to every channel whose modality is enabled.
    pub fn dispatch(&mut self, cue: &CueEvent, toggles: &ModalityToggles) -> DispatchReport {
        let mut report = DispatchReport::default();

        for channel in &mut self.channels {
            if !toggles.allows(channel.modality()) {
                report.skipped += 1;
                continue;
            }

            match channel.deliver(cue) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    metrics::record_dispatch_failure(channel.name());
                    warn!(
                        channel = channel.name(),
                        kind = %cue.kind,
                        error = %e,
                        "Cue delivery failed"
                    );
                }
            }
        }

        report
    }
}

/// Renders cues as log lines. Stands in for the visual overlay.
#[derive(Debug, Default)]
pub struct TracingChannel;

impl CueChannel for TracingChannel {
    fn name(&self) -> &str {
        "tracing"
    }

    fn modality(&self) -> Modality {
        Modality::Visual
    }

    fn deliver(&mut self, cue: &CueEvent) -> Result<(), DispatchError> {
        info!(
            kind = %cue.kind,
            reason = %cue.reason,
            direction = cue.direction_hint,
            at = cue.at_sec,
            "Cue"
        );
        Ok(())
    }
}

/// Keeps every delivered cue in memory.
#[derive(Debug, Clone)]
pub struct RecordingChannel {
    name: String,
    modality: Modality,
    cues: Arc<Mutex<Vec<CueEvent>>>,
}

impl RecordingChannel {
    pub fn new(name: impl Into<String>, modality: Modality) -> Self {
        Self {
            name: name.into(),
            modality,
            cues: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Cues delivered so far (shared with clones of this channel).
    pub fn recorded(&self) -> Vec<CueEvent> {
        match self.cues.lock() {
            Ok(cues) => cues.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl CueChannel for RecordingChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn modality(&self) -> Modality {
        self.modality
    }

    fn deliver(&mut self, cue: &CueEvent) -> Result<(), DispatchError> {
        let mut cues = self
            .cues
            .lock()
            .map_err(|_| DispatchError::Unavailable(self.name.clone()))?;
        cues.push(cue.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turncue_models::CueKind;

    struct FailingChannel;

    impl CueChannel for FailingChannel {
        fn name(&self) -> &str {
            "broken-motor"
        }

        fn modality(&self) -> Modality {
            Modality::Haptic
        }

        fn deliver(&mut self, _cue: &CueEvent) -> Result<(), DispatchError> {
            Err(DispatchError::channel_failed("broken-motor", "driver not responding"))
        }
    }

    fn cue() -> CueEvent {
        CueEvent::new(CueKind::Speak, "addressed_gap_ready", -0.4, 2.5)
    }

    #[test]
    fn test_failure_isolated_from_other_channels() {
        let visual = RecordingChannel::new("ring", Modality::Visual);
        let haptic = RecordingChannel::new("motor", Modality::Haptic);
        let mut dispatcher = CueDispatcher::new()
            .with_channel(Box::new(FailingChannel))
            .with_channel(Box::new(visual.clone()))
            .with_channel(Box::new(haptic.clone()));

        let report = dispatcher.dispatch(&cue(), &ModalityToggles::default());
        assert_eq!(
            report,
            DispatchReport {
                delivered: 2,
                skipped: 0,
                failed: 1
            }
        );
        assert_eq!(visual.recorded(), vec![cue()]);
        assert_eq!(haptic.recorded(), vec![cue()]);
    }

    #[test]
    fn test_disabled_modalities_skipped() {
        let audio = RecordingChannel::new("earcon", Modality::Audio);
        let mut dispatcher = CueDispatcher::new().with_channel(Box::new(audio.clone()));

        let report = dispatcher.dispatch(&cue(), &ModalityToggles::default());
        assert_eq!(report.skipped, 1);
        assert!(audio.recorded().is_empty());
    }

    #[test]
    fn test_redispatch_is_safe() {
        let visual = RecordingChannel::new("ring", Modality::Visual);
        let mut dispatcher = CueDispatcher::new()
            .with_channel(Box::new(TracingChannel))
            .with_channel(Box::new(visual.clone()));

        for _ in 0..3 {
            let report = dispatcher.dispatch(&cue(), &ModalityToggles::default());
            assert_eq!(report.delivered, 2);
        }
        assert_eq!(visual.recorded().len(), 3);
        assert_eq!(dispatcher.len(), 2);
    }
}
