use std::path::Path;

use crate::error::Result;
use crate::item::ItemId;
use crate::layout::Layout;
use crate::trial::CHOICES;

/// What a backend is asked to show in one buffer swap.
#[derive(Debug)]
pub enum Scene<'a, S> {
    Blank,
    Trial {
        question: &'a str,
        layout: &'a Layout,
        stimuli: &'a [S; CHOICES],
    },
}

/// Pointer presses observed by one non-blocking poll, in window pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerSample {
    pub presses: Vec<(f32, f32)>,
}

impl PointerSample {
    pub fn press(at: (f32, f32)) -> Self {
        Self { presses: vec![at] }
    }

    pub fn is_empty(&self) -> bool {
        self.presses.is_empty()
    }
}

/// Rendering side of the window toolkit.
pub trait Display {
    type Stimulus;

    /// Decodes the stimulus file for `item`; failures are `MissingAsset`.
    fn load_stimulus(&mut self, item: ItemId, path: &Path, layout: &Layout)
    -> Result<Self::Stimulus>;

    /// Drawn size of a loaded stimulus in window pixels; presses are hit-tested
    /// against this area around the slot center.
    fn footprint(&self, stimulus: &Self::Stimulus) -> (f32, f32);

    /// Draws the whole scene and swaps buffers once.
    fn present(&mut self, scene: Scene<'_, Self::Stimulus>) -> Result<()>;

    /// Releases the window; called exactly once.
    fn close(&mut self);
}

/// Input side of the window toolkit.
pub trait PointerInput {
    /// Returns immediately with the presses seen since the last poll.
    fn poll(&mut self) -> Result<PointerSample>;

    /// Drops presses made before now, e.g. during the inter-trial blank, so the
    /// next poll only reports presses made after the latest render.
    fn discard_pending(&mut self) -> Result<()>;
}
