use serde::{Deserialize, Serialize};

use crate::error::{ExperimentError, Result};
use crate::trial::CHOICES;

/// Fixed display position of a stimulus, in hit-test priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Left,
    Center,
    Right,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Left, Slot::Center, Slot::Right];

    pub fn index(self) -> usize {
        match self {
            Slot::Left => 0,
            Slot::Center => 1,
            Slot::Right => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Axis-aligned rectangle in window pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Region {
    pub fn centered(center: (f32, f32), size: (f32, f32)) -> Self {
        Self {
            x: center.0 - size.0 * 0.5,
            y: center.1 - size.1 * 0.5,
            width: size.0,
            height: size.1,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Edges are inclusive.
    pub fn contains(&self, point: (f32, f32)) -> bool {
        point.0 >= self.x && point.0 <= self.right() && point.1 >= self.y && point.1 <= self.bottom()
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Screen geometry of a trial: question, frame and the three stimulus slots.
///
/// Offsets are relative to the window center with y growing downwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub slot_offsets: [(f32, f32); 3],
    pub stimulus_size: (f32, f32),
    pub question_offset: (f32, f32),
    pub question_size: f32,
    pub frame_size: (f32, f32),
    pub frame_line_width: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            slot_offsets: [(-200.0, 0.0), (0.0, 0.0), (200.0, 0.0)],
            stimulus_size: (180.0, 180.0),
            question_offset: (0.0, -200.0),
            question_size: 30.0,
            frame_size: (600.0, 300.0),
            frame_line_width: 3.0,
        }
    }
}

impl Layout {
    pub fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    fn offset(&self, offset: (f32, f32)) -> (f32, f32) {
        let (cx, cy) = self.center();
        (cx + offset.0, cy + offset.1)
    }

    pub fn slot_center(&self, slot: Slot) -> (f32, f32) {
        self.offset(self.slot_offsets[slot.index()])
    }

    /// The full stimulus box of `slot`; drawn images fit inside it.
    pub fn slot_region(&self, slot: Slot) -> Region {
        Region::centered(self.slot_center(slot), self.stimulus_size)
    }

    /// Area covered by a stimulus of `size` drawn in `slot`.
    pub fn stimulus_region(&self, slot: Slot, size: (f32, f32)) -> Region {
        Region::centered(self.slot_center(slot), size)
    }

    pub fn question_position(&self) -> (f32, f32) {
        self.offset(self.question_offset)
    }

    pub fn frame_region(&self) -> Region {
        Region::centered(self.center(), self.frame_size)
    }

    /// Slot whose drawn stimulus is hit by any of the given press locations.
    ///
    /// `sizes` are the drawn stimulus sizes in slot order. Slots are checked
    /// left, center, right; the first hit wins.
    pub fn hit(&self, presses: &[(f32, f32)], sizes: &[(f32, f32); CHOICES]) -> Option<Slot> {
        Slot::ALL.into_iter().find(|slot| {
            let region = self.stimulus_region(*slot, sizes[slot.index()]);
            presses.iter().any(|p| region.contains(*p))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ExperimentError::InvalidConfiguration(format!(
                "window size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.stimulus_size.0 <= 0.0 || self.stimulus_size.1 <= 0.0 {
            return Err(ExperimentError::InvalidConfiguration(
                "stimulus size must be positive".into(),
            ));
        }
        for (i, a) in Slot::ALL.iter().enumerate() {
            for b in &Slot::ALL[i + 1..] {
                if self.slot_region(*a).overlaps(&self.slot_region(*b)) {
                    return Err(ExperimentError::InvalidConfiguration(format!(
                        "stimulus regions {:?} and {:?} overlap",
                        a, b
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_slots_sit_left_center_right() {
        let layout = Layout::default();
        assert_eq!(layout.slot_center(Slot::Left), (200.0, 300.0));
        assert_eq!(layout.slot_center(Slot::Center), (400.0, 300.0));
        assert_eq!(layout.slot_center(Slot::Right), (600.0, 300.0));
        assert_eq!(layout.question_position(), (400.0, 100.0));
        assert!(layout.validate().is_ok());
    }

    const FULL: [(f32, f32); 3] = [(180.0, 180.0); 3];

    #[test]
    fn hit_prefers_leftmost_region() {
        let layout = Layout::default();
        let left = layout.slot_center(Slot::Left);
        let center = layout.slot_center(Slot::Center);
        assert_eq!(layout.hit(&[center], &FULL), Some(Slot::Center));
        assert_eq!(layout.hit(&[center, left], &FULL), Some(Slot::Left));
        assert_eq!(layout.hit(&[(5.0, 5.0)], &FULL), None);
        assert_eq!(layout.hit(&[], &FULL), None);
    }

    #[test]
    fn narrow_stimulus_margin_is_not_a_hit() {
        let layout = Layout::default();
        let sizes = [(180.0, 180.0), (90.0, 180.0), (180.0, 180.0)];
        let (cx, cy) = layout.slot_center(Slot::Center);
        // Inside the stimulus box but beside the drawn image.
        let margin = (cx + 60.0, cy);
        assert!(layout.slot_region(Slot::Center).contains(margin));
        assert_eq!(layout.hit(&[margin], &sizes), None);
        assert_eq!(layout.hit(&[(cx + 45.0, cy)], &sizes), Some(Slot::Center));

        let drawn = layout.stimulus_region(Slot::Center, sizes[1]);
        assert_eq!(drawn.center(), (cx, cy));
        assert_eq!((drawn.x, drawn.right()), (cx - 45.0, cx + 45.0));
    }

    #[test]
    fn region_edges_are_inclusive() {
        let region = Region::centered((10.0, 10.0), (4.0, 4.0));
        assert!(region.contains((8.0, 8.0)));
        assert!(region.contains((12.0, 12.0)));
        assert!(!region.contains((12.1, 10.0)));
    }

    #[test]
    fn overlapping_slots_are_rejected() {
        let layout = Layout {
            stimulus_size: (250.0, 100.0),
            ..Layout::default()
        };
        assert!(layout.validate().unwrap_err().is_configuration());
    }
}
