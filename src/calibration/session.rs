// Calibration session: the three-buffer acquisition workflow
//
// State machine over the fixed buffer order pH 4 -> pH 7 -> pH 10. The
// session accumulates raw readings per stage and judges them with the
// stability detector; the caller owns the probe polling cadence and the
// retry budget. Wrong-state calls are rejected with UnexpectedState
// instead of panicking.

use log::info;

use crate::calibration::fit;
use crate::calibration::model::{AnchorPoint, CalibrationModel, CalibrationPoints};
use crate::calibration::stability::{StabilityDetector, StabilityOutcome};
use crate::error::CalibrationError;

/// Buffer solution stage in the fixed calibration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferStage {
    Ph4,
    Ph7,
    Ph10,
}

impl BufferStage {
    /// Get the next stage in the calibration sequence
    ///
    /// # Returns
    /// * `Some(BufferStage)` - Next buffer to calibrate against
    /// * `None` - All three buffers complete
    pub fn next(&self) -> Option<BufferStage> {
        match self {
            BufferStage::Ph4 => Some(BufferStage::Ph7),
            BufferStage::Ph7 => Some(BufferStage::Ph10),
            BufferStage::Ph10 => None,
        }
    }

    /// Known true pH of this stage's buffer solution
    pub fn target_ph(&self) -> f64 {
        match self {
            BufferStage::Ph4 => 4.0,
            BufferStage::Ph7 => 7.0,
            BufferStage::Ph10 => 10.0,
        }
    }

    /// Get human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            BufferStage::Ph4 => "pH 4 Buffer",
            BufferStage::Ph7 => "pH 7 Buffer",
            BufferStage::Ph10 => "pH 10 Buffer",
        }
    }

    /// Stage position in the anchor array
    fn index(&self) -> usize {
        match self {
            BufferStage::Ph4 => 0,
            BufferStage::Ph7 => 1,
            BufferStage::Ph10 => 2,
        }
    }
}

/// Session state over the three buffer stages
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    /// Waiting for the operator to immerse the probe in the stage's buffer
    AwaitingBuffer(BufferStage),
    /// Accumulating raw readings for the stage
    Sampling(BufferStage),
    /// Stage settled on an anchor value; ready to advance
    Stabilized { stage: BufferStage, value: f64 },
    /// All three anchors recorded; ready to fit
    Fitting,
    /// Model fitted and persisted (terminal)
    Saved,
    /// Session cancelled by the operator or a probe failure (terminal)
    Aborted,
}

impl SessionState {
    /// Check whether the session has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Saved | SessionState::Aborted)
    }

    /// Short state name for error reporting
    fn name(&self) -> String {
        match self {
            SessionState::AwaitingBuffer(stage) => {
                format!("AwaitingBuffer({})", stage.display_name())
            }
            SessionState::Sampling(stage) => format!("Sampling({})", stage.display_name()),
            SessionState::Stabilized { stage, .. } => {
                format!("Stabilized({})", stage.display_name())
            }
            SessionState::Fitting => "Fitting".to_string(),
            SessionState::Saved => "Saved".to_string(),
            SessionState::Aborted => "Aborted".to_string(),
        }
    }
}

/// Progress information for operator display during a stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionProgress {
    /// Stage currently being calibrated
    pub stage: BufferStage,
    /// Raw readings accumulated for this stage
    pub readings_collected: usize,
    /// Readings the detector judges per assessment
    pub min_samples: usize,
}

/// Drives the three-anchor acquisition workflow
pub struct CalibrationSession {
    detector: StabilityDetector,
    state: SessionState,
    /// Readings accumulated for the current stage, oldest first
    window: Vec<f64>,
    /// Settled raw values indexed by stage
    anchors: [Option<f64>; 3],
}

impl CalibrationSession {
    /// Create a session awaiting the pH 4 buffer
    pub fn new(detector: StabilityDetector) -> Self {
        Self {
            detector,
            state: SessionState::AwaitingBuffer(BufferStage::Ph4),
            window: Vec::new(),
            anchors: [None; 3],
        }
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Stage currently being worked, if the session is inside one
    pub fn current_stage(&self) -> Option<BufferStage> {
        match self.state {
            SessionState::AwaitingBuffer(stage) | SessionState::Sampling(stage) => Some(stage),
            SessionState::Stabilized { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Readings accumulated for the current stage
    pub fn readings(&self) -> &[f64] {
        &self.window
    }

    /// Progress for operator display
    ///
    /// # Returns
    /// * `Some(SessionProgress)` - Session is inside a buffer stage
    /// * `None` - Session is fitting or terminal
    pub fn progress(&self) -> Option<SessionProgress> {
        self.current_stage().map(|stage| SessionProgress {
            stage,
            readings_collected: self.window.len(),
            min_samples: self.detector.min_samples(),
        })
    }

    /// Begin accumulating readings for the awaited buffer
    ///
    /// # Errors
    /// `UnexpectedState` unless the session is awaiting a buffer
    pub fn begin_sampling(&mut self) -> Result<(), CalibrationError> {
        match self.state {
            SessionState::AwaitingBuffer(stage) => {
                self.window.clear();
                self.state = SessionState::Sampling(stage);
                Ok(())
            }
            _ => Err(self.unexpected("begin sampling")),
        }
    }

    /// Record one raw reading for the current stage
    ///
    /// # Errors
    /// `UnexpectedState` unless the session is sampling
    pub fn add_reading(&mut self, raw: f64) -> Result<(), CalibrationError> {
        match self.state {
            SessionState::Sampling(_) => {
                self.window.push(raw);
                Ok(())
            }
            _ => Err(self.unexpected("add reading")),
        }
    }

    /// Judge the accumulated window with the stability detector
    ///
    /// A stable verdict records the stage's anchor and moves the session
    /// to `Stabilized`; otherwise the session stays in `Sampling` and
    /// keeps accumulating readings.
    ///
    /// # Errors
    /// `UnexpectedState` unless the session is sampling
    pub fn assess(&mut self) -> Result<StabilityOutcome, CalibrationError> {
        let stage = match self.state {
            SessionState::Sampling(stage) => stage,
            _ => return Err(self.unexpected("assess readings")),
        };

        let outcome = self.detector.assess(&self.window);
        if let StabilityOutcome::Stable { value } = outcome {
            info!(
                "[Session] {} settled at {:.3} after {} readings",
                stage.display_name(),
                value,
                self.window.len()
            );
            self.anchors[stage.index()] = Some(value);
            self.state = SessionState::Stabilized { stage, value };
        }
        Ok(outcome)
    }

    /// Move past a stabilized stage: to the next buffer, or to fitting
    ///
    /// # Errors
    /// `UnexpectedState` unless the current stage has stabilized
    pub fn advance(&mut self) -> Result<(), CalibrationError> {
        match self.state {
            SessionState::Stabilized { stage, .. } => {
                self.window.clear();
                self.state = match stage.next() {
                    Some(next) => SessionState::AwaitingBuffer(next),
                    None => SessionState::Fitting,
                };
                Ok(())
            }
            _ => Err(self.unexpected("advance")),
        }
    }

    /// Discard the current stage's readings for an operator retry
    ///
    /// # Errors
    /// `UnexpectedState` unless the session is sampling
    pub fn restart_stage(&mut self) -> Result<(), CalibrationError> {
        match self.state {
            SessionState::Sampling(stage) => {
                info!("[Session] Restarting {} sampling", stage.display_name());
                self.window.clear();
                Ok(())
            }
            _ => Err(self.unexpected("restart stage")),
        }
    }

    /// Fit the calibration curve over the three recorded anchors
    ///
    /// Pairs each settled raw value with its buffer's known target pH,
    /// runs the least-squares fit, and wraps the result into a model
    /// stamped with the current time. The session stays in `Fitting`
    /// until the caller persists the model and calls `mark_saved`.
    ///
    /// # Errors
    /// `UnexpectedState` unless all three anchors have been recorded
    pub fn fit(&self) -> Result<CalibrationModel, CalibrationError> {
        if self.state != SessionState::Fitting {
            return Err(self.unexpected("fit"));
        }
        let (raw_4, raw_7, raw_10) = match self.anchors {
            [Some(raw_4), Some(raw_7), Some(raw_10)] => (raw_4, raw_7, raw_10),
            _ => return Err(self.unexpected("fit")),
        };

        let points = CalibrationPoints {
            ph_4: AnchorPoint {
                raw: raw_4,
                target: BufferStage::Ph4.target_ph(),
            },
            ph_7: AnchorPoint {
                raw: raw_7,
                target: BufferStage::Ph7.target_ph(),
            },
            ph_10: AnchorPoint {
                raw: raw_10,
                target: BufferStage::Ph10.target_ph(),
            },
        };
        let curve = fit::least_squares(&[points.ph_4, points.ph_7, points.ph_10]);
        info!(
            "[Session] Fitted curve: slope={:.6} intercept={:.6} r_squared={:.6}",
            curve.slope, curve.intercept, curve.r_squared
        );
        Ok(CalibrationModel::new(points, curve))
    }

    /// Record that the fitted model has been persisted
    ///
    /// # Errors
    /// `UnexpectedState` unless the session is fitting
    pub fn mark_saved(&mut self) -> Result<(), CalibrationError> {
        if self.state != SessionState::Fitting {
            return Err(self.unexpected("mark saved"));
        }
        self.state = SessionState::Saved;
        Ok(())
    }

    /// Cancel the session from any non-terminal state
    ///
    /// # Errors
    /// `UnexpectedState` when the session has already finished
    pub fn abort(&mut self) -> Result<(), CalibrationError> {
        if self.state.is_terminal() {
            return Err(self.unexpected("abort"));
        }
        info!(
            "[Session] Calibration aborted in state {}",
            self.state.name()
        );
        self.state = SessionState::Aborted;
        Ok(())
    }

    fn unexpected(&self, action: &'static str) -> CalibrationError {
        CalibrationError::UnexpectedState {
            action,
            state: self.state.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_session() -> CalibrationSession {
        CalibrationSession::new(StabilityDetector::new(3, 0.1))
    }

    /// Feed constant readings until the current stage stabilizes
    fn settle_stage(session: &mut CalibrationSession, raw: f64) {
        session.begin_sampling().unwrap();
        loop {
            session.add_reading(raw).unwrap();
            if session.assess().unwrap().is_stable() {
                break;
            }
        }
        session.advance().unwrap();
    }

    #[test]
    fn test_buffer_stage_order() {
        assert_eq!(BufferStage::Ph4.next(), Some(BufferStage::Ph7));
        assert_eq!(BufferStage::Ph7.next(), Some(BufferStage::Ph10));
        assert_eq!(BufferStage::Ph10.next(), None);
    }

    #[test]
    fn test_buffer_stage_targets() {
        assert_eq!(BufferStage::Ph4.target_ph(), 4.0);
        assert_eq!(BufferStage::Ph7.target_ph(), 7.0);
        assert_eq!(BufferStage::Ph10.target_ph(), 10.0);
    }

    #[test]
    fn test_new_session_awaits_ph4() {
        let session = create_test_session();
        assert_eq!(
            session.state(),
            SessionState::AwaitingBuffer(BufferStage::Ph4)
        );
        assert_eq!(session.current_stage(), Some(BufferStage::Ph4));
        assert!(!session.state().is_terminal());
    }

    #[test]
    fn test_full_walk_produces_linear_model() {
        let mut session = create_test_session();

        settle_stage(&mut session, 1.0);
        assert_eq!(
            session.state(),
            SessionState::AwaitingBuffer(BufferStage::Ph7)
        );
        settle_stage(&mut session, 2.0);
        settle_stage(&mut session, 3.0);
        assert_eq!(session.state(), SessionState::Fitting);

        let model = session.fit().unwrap();
        assert!((model.calibration_curve.slope - 3.0).abs() < 1e-9);
        assert!((model.calibration_curve.intercept - 1.0).abs() < 1e-9);
        assert!((model.calibration_curve.r_squared - 1.0).abs() < 1e-9);
        assert_eq!(model.calibration_points.ph_7.raw, 2.0);
        assert_eq!(model.calibration_points.ph_7.target, 7.0);

        session.mark_saved().unwrap();
        assert_eq!(session.state(), SessionState::Saved);
    }

    #[test]
    fn test_unstable_window_keeps_sampling() {
        let mut session = create_test_session();
        session.begin_sampling().unwrap();
        for raw in [1.0, 2.0, 3.0] {
            session.add_reading(raw).unwrap();
        }
        assert!(matches!(
            session.assess().unwrap(),
            StabilityOutcome::TooNoisy { .. }
        ));
        assert_eq!(session.state(), SessionState::Sampling(BufferStage::Ph4));

        // The stream settles; only the most recent window is judged
        for raw in [2.0, 2.0, 2.0] {
            session.add_reading(raw).unwrap();
        }
        assert!(session.assess().unwrap().is_stable());
        assert_eq!(
            session.state(),
            SessionState::Stabilized {
                stage: BufferStage::Ph4,
                value: 2.0
            }
        );
    }

    #[test]
    fn test_add_reading_requires_sampling() {
        let mut session = create_test_session();
        match session.add_reading(7.0) {
            Err(CalibrationError::UnexpectedState { action, state }) => {
                assert_eq!(action, "add reading");
                assert!(state.contains("AwaitingBuffer"));
            }
            other => panic!("Expected UnexpectedState, got {:?}", other),
        }
    }

    #[test]
    fn test_begin_sampling_requires_awaiting_buffer() {
        let mut session = create_test_session();
        session.begin_sampling().unwrap();
        assert!(session.begin_sampling().is_err());
    }

    #[test]
    fn test_assess_requires_sampling() {
        let mut session = create_test_session();
        assert!(session.assess().is_err());
    }

    #[test]
    fn test_advance_requires_stabilized() {
        let mut session = create_test_session();
        assert!(session.advance().is_err());
        session.begin_sampling().unwrap();
        assert!(session.advance().is_err());
    }

    #[test]
    fn test_fit_requires_all_anchors() {
        let mut session = create_test_session();
        assert!(session.fit().is_err());
        settle_stage(&mut session, 1.0);
        assert!(session.fit().is_err());
    }

    #[test]
    fn test_mark_saved_requires_fitting() {
        let mut session = create_test_session();
        assert!(session.mark_saved().is_err());
    }

    #[test]
    fn test_restart_stage_clears_window() {
        let mut session = create_test_session();
        session.begin_sampling().unwrap();
        session.add_reading(6.5).unwrap();
        session.add_reading(6.6).unwrap();
        assert_eq!(session.readings().len(), 2);

        session.restart_stage().unwrap();
        assert_eq!(session.readings().len(), 0);
        assert_eq!(session.state(), SessionState::Sampling(BufferStage::Ph4));
    }

    #[test]
    fn test_restart_stage_requires_sampling() {
        let mut session = create_test_session();
        assert!(session.restart_stage().is_err());
    }

    #[test]
    fn test_abort_from_each_non_terminal_state() {
        // AwaitingBuffer
        let mut session = create_test_session();
        session.abort().unwrap();
        assert_eq!(session.state(), SessionState::Aborted);

        // Sampling
        let mut session = create_test_session();
        session.begin_sampling().unwrap();
        session.abort().unwrap();
        assert_eq!(session.state(), SessionState::Aborted);

        // Stabilized
        let mut session = create_test_session();
        session.begin_sampling().unwrap();
        for _ in 0..3 {
            session.add_reading(1.0).unwrap();
        }
        session.assess().unwrap();
        session.abort().unwrap();
        assert_eq!(session.state(), SessionState::Aborted);

        // Fitting
        let mut session = create_test_session();
        settle_stage(&mut session, 1.0);
        settle_stage(&mut session, 2.0);
        settle_stage(&mut session, 3.0);
        session.abort().unwrap();
        assert_eq!(session.state(), SessionState::Aborted);
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let mut session = create_test_session();
        session.abort().unwrap();

        assert!(session.abort().is_err());
        assert!(session.begin_sampling().is_err());
        assert!(session.add_reading(7.0).is_err());
        assert!(session.assess().is_err());
        assert!(session.fit().is_err());
        assert!(session.mark_saved().is_err());
        assert_eq!(session.progress(), None);
    }

    #[test]
    fn test_progress_reports_stage_and_counts() {
        let mut session = create_test_session();
        let progress = session.progress().unwrap();
        assert_eq!(progress.stage, BufferStage::Ph4);
        assert_eq!(progress.readings_collected, 0);
        assert_eq!(progress.min_samples, 3);

        session.begin_sampling().unwrap();
        session.add_reading(6.5).unwrap();
        let progress = session.progress().unwrap();
        assert_eq!(progress.readings_collected, 1);
    }
}
