pub mod display;
pub mod error;
pub mod item;
pub mod layout;
pub mod trial;

pub use display::{Display, PointerInput, PointerSample, Scene};
pub use error::{ExperimentError, Result};
pub use item::{ItemId, StimulusPool, StimulusResolver};
pub use layout::{Layout, Region, Slot};
pub use trial::{CHOICES, PresenterState, Trial, TrialResult};
