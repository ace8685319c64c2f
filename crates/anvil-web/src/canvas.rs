//! [`Surface`] over a `CanvasRenderingContext2d`.

use std::f64::consts::TAU;

use anvil_sim::renderer::ColorStop;
use anvil_sim::{Paint, Rect, Shadow, Surface, TextAlign, TextBaseline, TextStyle};
use glam::Vec2;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasGradient, CanvasRenderingContext2d, HtmlCanvasElement};

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    /// Logical size in CSS pixels.
    size: Vec2,
    dpr: f64,
}

/// Backing-store size for a logical size at a device pixel ratio.
pub fn backing_size(size: Vec2, dpr: f64) -> (u32, u32) {
    let px = |v: f32| (v as f64 * dpr).round().max(1.0) as u32;
    (px(size.x), px(size.y))
}

fn warn_on_err(op: &str, result: Result<(), JsValue>) {
    if let Err(e) = result {
        log::warn!("canvas {} failed: {:?}", op, e);
    }
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx, size: Vec2::ZERO, dpr: 1.0 })
    }

    /// Resize the backing store for `size` CSS pixels at `dpr` and scale the
    /// context so drawing stays in logical units. No-op when nothing changed.
    pub fn fit(&mut self, size: Vec2, dpr: f64) -> Result<(), JsValue> {
        if size == self.size && dpr == self.dpr {
            return Ok(());
        }
        let (w, h) = backing_size(size, dpr);
        self.canvas.set_width(w);
        self.canvas.set_height(h);
        let style = self.canvas.style();
        style.set_property("width", &format!("{}px", size.x))?;
        style.set_property("height", &format!("{}px", size.y))?;
        self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
        self.size = size;
        self.dpr = dpr;
        Ok(())
    }

    pub fn element(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn gradient(&self, paint: &Paint) -> Option<CanvasGradient> {
        let (gradient, stops): (CanvasGradient, &[ColorStop]) = match paint {
            Paint::Solid(_) => return None,
            Paint::Linear { from, to, stops } => (
                self.ctx.create_linear_gradient(from.x as f64, from.y as f64, to.x as f64, to.y as f64),
                stops.as_slice(),
            ),
            Paint::Radial { center, radius, stops } => {
                let (x, y) = (center.x as f64, center.y as f64);
                match self.ctx.create_radial_gradient(x, y, 0.0, x, y, (*radius).max(0.0) as f64) {
                    Ok(g) => (g, stops.as_slice()),
                    Err(e) => {
                        log::warn!("radial gradient failed: {:?}", e);
                        return None;
                    }
                }
            }
        };
        for s in stops {
            warn_on_err("color stop", gradient.add_color_stop(s.offset.clamp(0.0, 1.0), &s.color.to_string()));
        }
        Some(gradient)
    }

    fn set_fill(&self, paint: &Paint) {
        match (paint, self.gradient(paint)) {
            (Paint::Solid(color), _) => self.ctx.set_fill_style_str(&color.to_string()),
            (_, Some(gradient)) => self.ctx.set_fill_style_canvas_gradient(&gradient),
            (_, None) => {}
        }
    }

    fn set_stroke(&self, paint: &Paint) {
        match (paint, self.gradient(paint)) {
            (Paint::Solid(color), _) => self.ctx.set_stroke_style_str(&color.to_string()),
            (_, Some(gradient)) => self.ctx.set_stroke_style_canvas_gradient(&gradient),
            (_, None) => {}
        }
    }

    fn set_text_style(&self, style: &TextStyle) {
        self.ctx.set_font(&style.css_font());
        self.ctx.set_text_align(match style.align {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
        });
        self.ctx.set_text_baseline(match style.baseline {
            TextBaseline::Top => "top",
            TextBaseline::Middle => "middle",
        });
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.size.x as f64, self.size.y as f64);
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn translate(&mut self, offset: Vec2) {
        warn_on_err("translate", self.ctx.translate(offset.x as f64, offset.y as f64));
    }

    fn rotate(&mut self, angle: f32) {
        warn_on_err("rotate", self.ctx.rotate(angle as f64));
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.ctx.set_global_alpha(alpha.clamp(0.0, 1.0) as f64);
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        match shadow {
            Some(s) => {
                self.ctx.set_shadow_color(&s.color.to_string());
                self.ctx.set_shadow_blur(s.blur as f64);
            }
            None => {
                self.ctx.set_shadow_color("transparent");
                self.ctx.set_shadow_blur(0.0);
            }
        }
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        self.set_fill(paint);
        self.ctx.fill_rect(rect.x as f64, rect.y as f64, rect.w as f64, rect.h as f64);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, paint: &Paint) {
        if radius <= 0.0 {
            return;
        }
        self.set_fill(paint);
        self.ctx.begin_path();
        warn_on_err("arc", self.ctx.arc(center.x as f64, center.y as f64, radius as f64, 0.0, TAU));
        self.ctx.fill();
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, paint: &Paint) {
        self.set_stroke(paint);
        self.ctx.set_line_width(width as f64);
        self.ctx.set_line_cap("round");
        self.ctx.begin_path();
        self.ctx.move_to(from.x as f64, from.y as f64);
        self.ctx.line_to(to.x as f64, to.y as f64);
        self.ctx.stroke();
    }

    fn fill_text(&mut self, text: &str, pos: Vec2, style: &TextStyle, paint: &Paint) {
        self.set_fill(paint);
        self.set_text_style(style);
        warn_on_err("fill_text", self.ctx.fill_text(text, pos.x as f64, pos.y as f64));
    }

    fn measure_text(&mut self, text: &str, style: &TextStyle) -> f32 {
        self.set_text_style(style);
        match self.ctx.measure_text(text) {
            Ok(metrics) => metrics.width() as f32,
            Err(e) => {
                log::warn!("measure_text failed: {:?}", e);
                0.0
            }
        }
    }
}
