//! Drawing surface trait.
//!
//! The painter only speaks this interface. The web crate implements it over a
//! `CanvasRenderingContext2d`; tests implement it with a recorder.

use glam::Vec2;

use super::color::Rgba;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// A `size` rectangle centred on `center`.
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self::new(center.x - size.x / 2.0, center.y - size.y / 2.0, size.x, size.y)
    }

    pub fn offset(self, by: Vec2) -> Self {
        Self::new(self.x + by.x, self.y + by.y, self.w, self.h)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

pub fn stop(offset: f32, color: Rgba) -> ColorStop {
    ColorStop { offset, color }
}

/// Fill or stroke style.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Linear { from: Vec2, to: Vec2, stops: Vec<ColorStop> },
    /// Radial gradient from a zero-radius point out to `radius`.
    Radial { center: Vec2, radius: f32, stops: Vec<ColorStop> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextBaseline {
    Top,
    Middle,
}

/// A bold monospace font at `size_px`, anchored as described.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size_px: f32,
    pub align: TextAlign,
    pub baseline: TextBaseline,
}

impl TextStyle {
    pub fn css_font(&self) -> String {
        format!("bold {}px monospace", self.size_px)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub color: Rgba,
    pub blur: f32,
}

/// A 2D immediate-mode drawing target in logical pixels.
pub trait Surface {
    /// Logical size of the drawable area.
    fn size(&self) -> Vec2;

    /// Make the whole surface transparent.
    fn clear(&mut self);

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, offset: Vec2);
    fn rotate(&mut self, angle: f32);

    /// Global alpha applied to every following draw until restored.
    fn set_alpha(&mut self, alpha: f32);
    fn set_shadow(&mut self, shadow: Option<Shadow>);

    fn fill_rect(&mut self, rect: Rect, paint: &Paint);
    fn fill_circle(&mut self, center: Vec2, radius: f32, paint: &Paint);
    /// A single segment with round caps.
    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, paint: &Paint);
    fn fill_text(&mut self, text: &str, pos: Vec2, style: &TextStyle, paint: &Paint);
    fn measure_text(&mut self, text: &str, style: &TextStyle) -> f32;
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;

    /// One recorded call, with the alpha in effect when it happened.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Op {
        Clear,
        Rect { rect: Rect, paint: Paint, alpha: f32 },
        Circle { center: Vec2, radius: f32, paint: Paint, alpha: f32 },
        Line { from: Vec2, to: Vec2, width: f32, alpha: f32 },
        Text { text: String, pos: Vec2, size_px: f32, alpha: f32 },
    }

    /// Records draw calls instead of rasterising them. Transforms are not applied.
    pub struct RecordingSurface {
        pub size: Vec2,
        pub ops: Vec<Op>,
        alpha: f32,
        stack: Vec<f32>,
        pub max_depth: usize,
    }

    impl RecordingSurface {
        pub fn new(size: Vec2) -> Self {
            Self { size, ops: Vec::new(), alpha: 1.0, stack: Vec::new(), max_depth: 0 }
        }

        pub fn depth(&self) -> usize {
            self.stack.len()
        }

        pub fn texts(&self) -> Vec<&str> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Text { text, .. } => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        }

        pub fn lines(&self) -> usize {
            self.ops.iter().filter(|op| matches!(op, Op::Line { .. })).count()
        }

        pub fn circles(&self) -> usize {
            self.ops.iter().filter(|op| matches!(op, Op::Circle { .. })).count()
        }
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> Vec2 {
            self.size
        }
        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }
        fn save(&mut self) {
            self.stack.push(self.alpha);
            self.max_depth = self.max_depth.max(self.stack.len());
        }
        fn restore(&mut self) {
            if let Some(alpha) = self.stack.pop() {
                self.alpha = alpha;
            }
        }
        fn translate(&mut self, _offset: Vec2) {}
        fn rotate(&mut self, _angle: f32) {}
        fn set_alpha(&mut self, alpha: f32) {
            self.alpha = alpha;
        }
        fn set_shadow(&mut self, _shadow: Option<Shadow>) {}
        fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
            self.ops.push(Op::Rect { rect, paint: paint.clone(), alpha: self.alpha });
        }
        fn fill_circle(&mut self, center: Vec2, radius: f32, paint: &Paint) {
            self.ops.push(Op::Circle { center, radius, paint: paint.clone(), alpha: self.alpha });
        }
        fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, _paint: &Paint) {
            self.ops.push(Op::Line { from, to, width, alpha: self.alpha });
        }
        fn fill_text(&mut self, text: &str, pos: Vec2, style: &TextStyle, _paint: &Paint) {
            self.ops.push(Op::Text { text: text.to_string(), pos, size_px: style.size_px, alpha: self.alpha });
        }
        fn measure_text(&mut self, text: &str, style: &TextStyle) -> f32 {
            text.chars().count() as f32 * style.size_px * 0.6
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect() {
        let r = Rect::centered(Vec2::new(200.0, 260.0), Vec2::new(100.0, 40.0));
        assert_eq!(r, Rect::new(150.0, 240.0, 100.0, 40.0));
        assert_eq!(r.offset(Vec2::splat(3.0)), Rect::new(153.0, 243.0, 100.0, 40.0));
    }

    #[test]
    fn font_string() {
        let style = TextStyle { size_px: 14.0, align: TextAlign::Center, baseline: TextBaseline::Top };
        assert_eq!(style.css_font(), "bold 14px monospace");
    }
}
