use std::path::{Path, PathBuf};

use oddout_core::{Display, PointerInput, Result, Slot, StimulusResolver, Trial, TrialResult};
use oddout_timing::Timer;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ExperimentConfig;
use crate::presenter::TrialPresenter;
use crate::session_log::{SessionLog, format_record};

/// Where the session log goes.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub log_dir: PathBuf,
    pub log_base_name: String,
    pub log_extension: String,
}

impl From<&ExperimentConfig> for SessionSettings {
    fn from(config: &ExperimentConfig) -> Self {
        Self {
            log_dir: config.log_dir.clone(),
            log_base_name: config.log_base_name.clone(),
            log_extension: config.log_extension.clone(),
        }
    }
}

/// Aggregate view of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub log_path: PathBuf,
    pub trials: usize,
    /// Responses per slot (left, center, right).
    pub responses: [usize; 3],
    pub mean_response_ms: Option<f64>,
    pub min_response_ms: Option<f64>,
    pub max_response_ms: Option<f64>,
    #[serde(skip)]
    total_response_ms: f64,
}

impl SessionSummary {
    fn new(log_path: &Path) -> Self {
        Self {
            log_path: log_path.to_path_buf(),
            trials: 0,
            responses: [0; 3],
            mean_response_ms: None,
            min_response_ms: None,
            max_response_ms: None,
            total_response_ms: 0.0,
        }
    }

    fn record(&mut self, result: &TrialResult) {
        self.trials += 1;
        let Some(slot) = result.selected else {
            return;
        };
        self.responses[slot.index()] += 1;
        let rt = result.response_time_ms;
        self.total_response_ms += rt;
        let answered: usize = self.responses.iter().sum();
        self.mean_response_ms = Some(self.total_response_ms / answered as f64);
        self.min_response_ms = Some(self.min_response_ms.map_or(rt, |m| m.min(rt)));
        self.max_response_ms = Some(self.max_response_ms.map_or(rt, |m| m.max(rt)));
    }

    pub fn response_count(&self, slot: Slot) -> usize {
        self.responses[slot.index()]
    }
}

/// Drives a presenter through a trial list and records every result.
pub struct ExperimentRunner<B, R, T>
where
    B: Display + PointerInput,
    R: StimulusResolver,
    T: Timer,
{
    presenter: TrialPresenter<B, R, T>,
    session: SessionSettings,
}

impl<B, R, T> ExperimentRunner<B, R, T>
where
    B: Display + PointerInput,
    R: StimulusResolver,
    T: Timer,
{
    pub fn new(presenter: TrialPresenter<B, R, T>, session: SessionSettings) -> Self {
        Self { presenter, session }
    }

    /// Runs every trial in order. The display is released whether or not the
    /// session completes; results written before a failure stay in the log.
    pub fn run(mut self, trials: &[Trial]) -> Result<SessionSummary> {
        let outcome = self.run_trials(trials);
        if let Err(e) = &outcome {
            warn!(error = %e, "Session stopped early");
        }
        self.presenter.close();
        outcome
    }

    fn run_trials(&mut self, trials: &[Trial]) -> Result<SessionSummary> {
        let log = SessionLog::open(
            &self.session.log_dir,
            &self.session.log_base_name,
            &self.session.log_extension,
        )?;
        info!(path = %log.path().display(), trials = trials.len(), "Session started");

        let mut summary = SessionSummary::new(log.path());
        self.presenter.reset_display_clock();
        for (n, trial) in trials.iter().enumerate() {
            let result = self.presenter.present_trial(trial)?;
            log.append(&format_record(&result, self.presenter.resolver()))?;
            info!(
                trial = n + 1,
                of = trials.len(),
                selected = ?result.selected,
                display_ms = result.display_latency_ms,
                response_ms = result.response_time_ms,
                "Trial recorded"
            );
            summary.record(&result);
            self.presenter.reset()?;
        }

        info!(
            trials = summary.trials,
            left = summary.response_count(Slot::Left),
            center = summary.response_count(Slot::Center),
            right = summary.response_count(Slot::Right),
            mean_ms = summary.mean_response_ms.unwrap_or_default(),
            min_ms = summary.min_response_ms.unwrap_or_default(),
            max_ms = summary.max_response_ms.unwrap_or_default(),
            "Session complete"
        );
        Ok(summary)
    }
}
