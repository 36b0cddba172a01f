use std::time::Duration;

use oddout_core::{
    Display, ExperimentError, ItemId, Layout, PointerInput, PresenterState, Result, Scene, Slot,
    StimulusResolver, Trial, TrialResult,
};
use oddout_timing::{Clock, Timer};
use tracing::{debug, trace};

use crate::config::ExperimentConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct PresenterSettings {
    pub question: String,
    pub layout: Layout,
    pub inter_trial_interval: Duration,
    pub poll_interval: Duration,
}

impl From<&ExperimentConfig> for PresenterSettings {
    fn from(config: &ExperimentConfig) -> Self {
        Self {
            question: config.question.clone(),
            layout: config.layout.clone(),
            inter_trial_interval: config.inter_trial_interval(),
            poll_interval: config.poll_interval(),
        }
    }
}

/// Runs one trial at a time on an exclusively owned display.
///
/// Two clocks are kept: the display clock is reset once per session, so
/// `display_latency_ms` is session-elapsed time; the response clock restarts at
/// every render.
pub struct TrialPresenter<B, R, T>
where
    B: Display + PointerInput,
    R: StimulusResolver,
    T: Timer,
{
    backend: B,
    resolver: R,
    settings: PresenterSettings,
    display_clock: Clock<T>,
    response_clock: Clock<T>,
    state: PresenterState,
    stimuli: Option<[B::Stimulus; 3]>,
    selected: Option<Slot>,
    closed: bool,
}

impl<B, R, T> TrialPresenter<B, R, T>
where
    B: Display + PointerInput,
    R: StimulusResolver,
    T: Timer,
{
    pub fn new(backend: B, resolver: R, timer: T, settings: PresenterSettings) -> Self {
        Self {
            backend,
            resolver,
            settings,
            display_clock: Clock::new(timer.clone()),
            response_clock: Clock::new(timer),
            state: PresenterState::Idle,
            stimuli: None,
            selected: None,
            closed: false,
        }
    }

    pub fn state(&self) -> PresenterState {
        self.state
    }

    pub fn selected(&self) -> Option<Slot> {
        self.selected
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn settings(&self) -> &PresenterSettings {
        &self.settings
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Starts the session-wide display clock.
    pub fn reset_display_clock(&mut self) {
        self.display_clock.reset();
    }

    /// Renders `trial` and blocks until a press lands on one of its stimuli.
    pub fn present_trial(&mut self, trial: &Trial) -> Result<TrialResult> {
        self.load(trial)?;
        let display_latency_ms = self.display()?;
        let (slot, response_time_ms) = self.await_response()?;
        Ok(TrialResult {
            trial: trial.clone(),
            selected: Some(slot),
            display_latency_ms,
            response_time_ms,
        })
    }

    /// `Idle | Reset -> Loaded`
    pub fn load(&mut self, trial: &Trial) -> Result<()> {
        self.ensure_open()?;
        let [left, center, right] = *trial.items();
        let stimuli = [
            self.load_one(left)?,
            self.load_one(center)?,
            self.load_one(right)?,
        ];
        self.stimuli = Some(stimuli);
        self.state = PresenterState::Loaded;
        debug!(items = ?trial.items(), "Trial loaded");
        Ok(())
    }

    fn load_one(&mut self, item: ItemId) -> Result<B::Stimulus> {
        let path = self.resolver.resolve(item);
        self.backend.load_stimulus(item, &path, &self.settings.layout)
    }

    /// `Loaded -> Displayed`; returns the display latency in milliseconds.
    pub fn display(&mut self) -> Result<f64> {
        self.ensure_open()?;
        let stimuli = self
            .stimuli
            .as_ref()
            .ok_or_else(|| ExperimentError::Display("no trial loaded".into()))?;
        self.backend.present(Scene::Trial {
            question: &self.settings.question,
            layout: &self.settings.layout,
            stimuli,
        })?;
        let latency = self.display_clock.elapsed_ms();
        self.state = PresenterState::Displayed;
        debug!(display_ms = latency, "Trial displayed");
        Ok(latency)
    }

    /// `Displayed -> AwaitingInput -> Captured`.
    ///
    /// Polls until a press hits a drawn stimulus; there is no timeout. Presses
    /// queued before the render are discarded first.
    pub fn await_response(&mut self) -> Result<(Slot, f64)> {
        self.ensure_open()?;
        let stimuli = self
            .stimuli
            .as_ref()
            .ok_or_else(|| ExperimentError::Display("no trial displayed".into()))?;
        let sizes = stimuli.each_ref().map(|s| self.backend.footprint(s));
        self.backend.discard_pending()?;
        self.response_clock.reset();
        self.state = PresenterState::AwaitingInput;
        let mut polls = 0u64;
        let slot = loop {
            let sample = self.backend.poll()?;
            polls += 1;
            if let Some(slot) = self.settings.layout.hit(&sample.presses, &sizes) {
                break slot;
            }
            if !sample.is_empty() {
                trace!(presses = ?sample.presses, "Press outside stimuli ignored");
            }
            if !self.settings.poll_interval.is_zero() {
                self.response_clock.timer().sleep(self.settings.poll_interval);
            }
        };
        let response_ms = self.response_clock.elapsed_ms();
        self.selected = Some(slot);
        self.state = PresenterState::Captured;
        debug!(?slot, response_ms, polls, "Response captured");
        Ok((slot, response_ms))
    }

    /// `Captured -> Reset`: clears the selection, blanks the screen and waits the
    /// inter-trial interval.
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.selected = None;
        self.stimuli = None;
        self.backend.present(Scene::Blank)?;
        self.display_clock
            .timer()
            .sleep(self.settings.inter_trial_interval);
        self.state = PresenterState::Reset;
        Ok(())
    }

    /// Releases the display. Later calls are no-ops.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.stimuli = None;
            self.backend.close();
            debug!("Display released");
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(ExperimentError::Display("display already closed".into()))
        } else {
            Ok(())
        }
    }
}

impl<B, R, T> Drop for TrialPresenter<B, R, T>
where
    B: Display + PointerInput,
    R: StimulusResolver,
    T: Timer,
{
    fn drop(&mut self) {
        self.close();
    }
}
