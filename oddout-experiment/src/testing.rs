//! Scripted display backend for driving the presenter without a window.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use oddout_core::{
    Display, ExperimentError, ItemId, Layout, PointerInput, PointerSample, Result, Scene, Slot,
};
use oddout_timing::ManualTimer;

use crate::presenter::PresenterSettings;

pub fn settings() -> PresenterSettings {
    PresenterSettings {
        question: "Which is the odd one out?".into(),
        layout: Layout::default(),
        inter_trial_interval: Duration::from_millis(300),
        poll_interval: Duration::from_millis(1),
    }
}

/// One poll's worth of scripted input.
#[derive(Debug, Clone)]
pub enum Step {
    /// Nothing pressed; the shared clock moves forward.
    Idle(Duration),
    Press(Vec<(f32, f32)>),
}

impl Step {
    pub fn click(layout: &Layout, slot: Slot) -> Self {
        Step::Press(vec![layout.slot_center(slot)])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Presented {
    Blank,
    Trial([ItemId; 3]),
}

#[derive(Debug, Default)]
struct State {
    script: VecDeque<Step>,
    /// Presses made while no poll was running; reported by the next poll.
    pending: Vec<(f32, f32)>,
    discarded: Vec<(f32, f32)>,
    footprints: HashMap<ItemId, (f32, f32)>,
    presented: Vec<Presented>,
    loaded: Vec<(ItemId, PathBuf)>,
    missing: HashSet<ItemId>,
    closed: usize,
}

/// Clones share state, so tests keep a handle after moving one into the presenter.
/// An exhausted script reads as the operator aborting.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    timer: ManualTimer,
    state: Rc<RefCell<State>>,
}

impl ScriptedBackend {
    pub fn new(timer: ManualTimer, steps: Vec<Step>) -> Self {
        Self {
            timer,
            state: Rc::new(RefCell::new(State {
                script: steps.into(),
                ..State::default()
            })),
        }
    }

    pub fn mark_missing(&self, item: ItemId) {
        self.state.borrow_mut().missing.insert(item);
    }

    pub fn queue_press(&self, at: (f32, f32)) {
        self.state.borrow_mut().pending.push(at);
    }

    pub fn discarded(&self) -> Vec<(f32, f32)> {
        self.state.borrow().discarded.clone()
    }

    /// Drawn size for `item`; others fill the default stimulus box.
    pub fn set_footprint(&self, item: ItemId, size: (f32, f32)) {
        self.state.borrow_mut().footprints.insert(item, size);
    }

    pub fn presented(&self) -> Vec<Presented> {
        self.state.borrow().presented.clone()
    }

    pub fn loaded(&self) -> Vec<(ItemId, PathBuf)> {
        self.state.borrow().loaded.clone()
    }

    pub fn close_count(&self) -> usize {
        self.state.borrow().closed
    }

    pub fn remaining_steps(&self) -> usize {
        self.state.borrow().script.len()
    }
}

impl Display for ScriptedBackend {
    type Stimulus = ItemId;

    fn load_stimulus(&mut self, item: ItemId, path: &Path, _layout: &Layout) -> Result<ItemId> {
        let mut state = self.state.borrow_mut();
        if state.missing.contains(&item) {
            return Err(ExperimentError::MissingAsset {
                item,
                path: path.to_path_buf(),
                reason: "scripted as missing".into(),
            });
        }
        state.loaded.push((item, path.to_path_buf()));
        Ok(item)
    }

    fn footprint(&self, stimulus: &ItemId) -> (f32, f32) {
        self.state
            .borrow()
            .footprints
            .get(stimulus)
            .copied()
            .unwrap_or(Layout::default().stimulus_size)
    }

    fn present(&mut self, scene: Scene<'_, ItemId>) -> Result<()> {
        let shown = match scene {
            Scene::Blank => Presented::Blank,
            Scene::Trial { stimuli, .. } => Presented::Trial(*stimuli),
        };
        self.state.borrow_mut().presented.push(shown);
        Ok(())
    }

    fn close(&mut self) {
        self.state.borrow_mut().closed += 1;
    }
}

impl PointerInput for ScriptedBackend {
    fn poll(&mut self) -> Result<PointerSample> {
        let mut state = self.state.borrow_mut();
        if !state.pending.is_empty() {
            return Ok(PointerSample {
                presses: std::mem::take(&mut state.pending),
            });
        }
        match state.script.pop_front() {
            Some(Step::Idle(d)) => {
                self.timer.advance(d);
                Ok(PointerSample::default())
            }
            Some(Step::Press(presses)) => Ok(PointerSample { presses }),
            None => Err(ExperimentError::Aborted),
        }
    }

    fn discard_pending(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let stale = std::mem::take(&mut state.pending);
        state.discarded.extend(stale);
        Ok(())
    }
}
