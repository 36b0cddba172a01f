use std::path::Path;

use image::imageops::FilterType;
use oddout_core::{ExperimentError, ItemId, Result};
use tiny_skia::{ColorU8, Pixmap};

/// Decoded stimulus image, premultiplied and scaled into its display box.
#[derive(Debug, Clone)]
pub struct Stimulus {
    pub item: ItemId,
    pixmap: Pixmap,
}

impl Stimulus {
    pub fn new(item: ItemId, pixmap: Pixmap) -> Self {
        Self { item, pixmap }
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }
}

/// Loads `path` and scales it to fit `max_size`, keeping the aspect ratio.
pub fn load_stimulus(item: ItemId, path: &Path, max_size: (f32, f32)) -> Result<Stimulus> {
    let missing = |reason: String| ExperimentError::MissingAsset {
        item,
        path: path.to_path_buf(),
        reason,
    };

    let decoded = image::open(path).map_err(|e| missing(e.to_string()))?;
    let (box_w, box_h) = (max_size.0.max(1.0) as u32, max_size.1.max(1.0) as u32);
    let rgba = decoded.resize(box_w, box_h, FilterType::Triangle).into_rgba8();
    let (w, h) = rgba.dimensions();

    let mut pixmap =
        Pixmap::new(w, h).ok_or_else(|| missing(format!("unusable image size {}x{}", w, h)))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(Stimulus::new(item, pixmap))
}
