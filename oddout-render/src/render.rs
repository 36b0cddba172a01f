use std::collections::HashMap;
use std::path::Path;

use ab_glyph::{Font, FontVec, Glyph, PxScale, ScaleFont, point};
use oddout_core::{ExperimentError, Layout, Region, Result, Scene, Slot};
use tiny_skia::{
    Color, Paint, PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8, Rect, Stroke, Transform,
};

use crate::stimulus::Stimulus;

const BACKGROUND: Color = Color::WHITE;
const INK: [u8; 4] = [0, 0, 0, 255];

pub fn load_font(path: &Path) -> Result<FontVec> {
    let bytes = std::fs::read(path).map_err(|e| {
        ExperimentError::InvalidConfiguration(format!(
            "cannot read font {}: {}",
            path.display(),
            e
        ))
    })?;
    FontVec::try_from_vec(bytes).map_err(|e| {
        ExperimentError::InvalidConfiguration(format!("cannot parse font {}: {}", path.display(), e))
    })
}

/// Rasterises `text` onto a tight transparent pixmap; `None` when nothing has an outline.
pub fn render_text_pixmap<F: Font>(
    text: &str,
    font_size: f32,
    font: &F,
    color: [u8; 4],
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // Layout with baseline at ascent
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let outlines: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    if outlines.is_empty() {
        return None;
    }

    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for out in &outlines {
        let b = out.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = w as usize;
    let dst = pm.pixels_mut();

    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            // Premultiply by coverage, then source-over onto what is already there
            let a = (cov * color[3] as f32 / 255.0).clamp(0.0, 1.0);
            let inv = 1.0 - a;
            let bg = dst[i];
            let blend = |s: u8, d: u8| (s as f32 * a + d as f32 * inv).round() as u8;
            let sa = (a * 255.0 + bg.alpha() as f32 * inv).round() as u8;
            let (r, g, b) = (
                blend(color[0], bg.red()).min(sa),
                blend(color[1], bg.green()).min(sa),
                blend(color[2], bg.blue()).min(sa),
            );
            if let Some(px) = PremultipliedColorU8::from_rgba(r, g, b, sa) {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}

/// Draws trial scenes onto an opaque RGBA canvas.
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    font: Option<FontVec>,
    text_cache: HashMap<(String, u32), Option<Pixmap>>,
    canvas: Pixmap,
}

impl SkiaRenderer {
    /// Without a font the question line is skipped.
    pub fn new(width: u32, height: u32, font: Option<FontVec>) -> Result<Self> {
        let mut canvas = Pixmap::new(width, height).ok_or_else(|| {
            ExperimentError::Display(format!("cannot allocate {}x{} canvas", width, height))
        })?;
        canvas.fill(BACKGROUND);
        Ok(Self {
            width,
            height,
            font,
            text_cache: HashMap::new(),
            canvas,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    /// Opaque RGBA bytes, ready for a straight-alpha frame buffer.
    pub fn frame(&self) -> &[u8] {
        self.canvas.data()
    }

    pub fn render_scene(&mut self, scene: &Scene<'_, Stimulus>) -> Result<()> {
        self.canvas.fill(BACKGROUND);
        if let Scene::Trial {
            question,
            layout,
            stimuli,
        } = scene
        {
            self.draw_question(question, layout);
            self.draw_frame(layout.frame_region(), layout.frame_line_width)?;
            for slot in Slot::ALL {
                self.draw_stimulus(&stimuli[slot.index()], layout.slot_center(slot));
            }
        }
        Ok(())
    }

    fn draw_question(&mut self, question: &str, layout: &Layout) {
        let Some(font) = &self.font else {
            return;
        };
        let key = (question.to_string(), layout.question_size.to_bits());
        let pm = self
            .text_cache
            .entry(key)
            .or_insert_with(|| render_text_pixmap(question, layout.question_size, font, INK));
        if let Some(pm) = pm {
            let (cx, cy) = layout.question_position();
            let x = (cx - pm.width() as f32 * 0.5).round() as i32;
            let y = (cy - pm.height() as f32 * 0.5).round() as i32;
            self.canvas.draw_pixmap(
                x,
                y,
                pm.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
    }

    fn draw_frame(&mut self, region: Region, line_width: f32) -> Result<()> {
        if line_width <= 0.0 {
            return Ok(());
        }
        let rect = Rect::from_xywh(region.x, region.y, region.width, region.height)
            .ok_or_else(|| ExperimentError::Display(format!("degenerate frame {:?}", region)))?;
        let path = PathBuilder::from_rect(rect);
        let mut paint = Paint::default();
        paint.anti_alias = false;
        paint.set_color_rgba8(INK[0], INK[1], INK[2], INK[3]);
        let stroke = Stroke {
            width: line_width,
            ..Stroke::default()
        };
        self.canvas
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        Ok(())
    }

    fn draw_stimulus(&mut self, stimulus: &Stimulus, center: (f32, f32)) {
        let (w, h) = stimulus.size();
        let x = (center.0 - w as f32 * 0.5).round() as i32;
        let y = (center.1 - h as f32 * 0.5).round() as i32;
        self.canvas.draw_pixmap(
            x,
            y,
            stimulus.pixmap().as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}
