pub mod render;
pub mod stimulus;

pub use render::{SkiaRenderer, load_font, render_text_pixmap};
pub use stimulus::{Stimulus, load_stimulus};

pub use ab_glyph::FontVec;
