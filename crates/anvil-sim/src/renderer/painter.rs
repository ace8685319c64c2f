//! Stateless painting of one frame onto a [`Surface`].

use glam::Vec2;

use super::color::Rgba;
use super::status::Status;
use super::surface::{stop, Paint, Rect, Shadow, Surface, TextAlign, TextBaseline, TextStyle};
use crate::api::types::Viewport;
use crate::core::scene::{ANVIL_HALF, HANDLE_HALF, HEAD_RADIUS};
use crate::systems::effects::{GlobalSpark, Spark};

/// Connection lines are drawn between global sparks closer than this.
pub const CONNECTION_DISTANCE: f32 = 200.0;

const SHADOW: Rgba = Rgba::rgba(0, 0, 0, 0.3);
const AMBER: Rgba = Rgba::rgb(0xFF, 0xAA, 0x00);

/// Snapshot of everything drawn on the main canvas.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub viewport: Viewport,
    pub anvil: Vec2,
    /// Centre and angle.
    pub handle: (Vec2, f32),
    pub head: (Vec2, f32),
    pub sparks: &'a [Spark],
    pub status: Status,
}

/// Glyph look differs between the canvas and the page overlay.
#[derive(Debug, Clone, Copy)]
struct GlyphStyle {
    size_px: f32,
    alpha: f32,
    blur: f32,
}

const CANVAS_GLYPHS: GlyphStyle = GlyphStyle { size_px: 12.0, alpha: 0.6, blur: 4.0 };
const OVERLAY_GLYPHS: GlyphStyle = GlyphStyle { size_px: 16.0, alpha: 0.4, blur: 6.0 };

/// Paint the whole canvas, back to front.
pub fn draw_scene(surface: &mut dyn Surface, frame: &FrameView<'_>) {
    draw_background(surface, frame.viewport);
    draw_anvil(surface, frame.anvil);
    draw_hammer(surface, frame.handle, frame.head);
    for spark in frame.sparks {
        draw_spark(surface, spark, CANVAS_GLYPHS);
    }
    draw_status(surface, frame.viewport, frame.status);
}

/// Repaint the transparent page overlay with the global sparks.
pub fn draw_overlay(surface: &mut dyn Surface, globals: &[GlobalSpark]) {
    surface.clear();
    draw_connections(surface, globals);
    for g in globals {
        draw_spark(surface, &g.spark, OVERLAY_GLYPHS);
    }
}

fn draw_background(surface: &mut dyn Surface, viewport: Viewport) {
    let full = Rect::new(0.0, 0.0, viewport.width, viewport.height);
    surface.fill_rect(full, &Paint::Solid(Rgba::rgb(0x0D, 0x0D, 0x0D)));
    surface.fill_rect(
        full,
        &Paint::Linear {
            from: Vec2::ZERO,
            to: Vec2::new(0.0, viewport.height),
            stops: vec![stop(0.0, Rgba::rgb(0x1A, 0x1A, 0x1A)), stop(1.0, Rgba::rgb(0x0D, 0x0D, 0x0D))],
        },
    );
}

fn draw_anvil(surface: &mut dyn Surface, center: Vec2) {
    if !center.is_finite() {
        return;
    }
    let body = Rect::centered(center, ANVIL_HALF * 2.0);
    surface.fill_rect(body.offset(Vec2::splat(3.0)), &Paint::Solid(SHADOW));
    surface.fill_rect(
        body,
        &Paint::Linear {
            from: center - ANVIL_HALF,
            to: center + ANVIL_HALF,
            stops: vec![
                stop(0.0, Rgba::rgb(0x66, 0x66, 0x66)),
                stop(0.5, Rgba::rgb(0x44, 0x44, 0x44)),
                stop(1.0, Rgba::rgb(0x22, 0x22, 0x22)),
            ],
        },
    );
    let face = Rect::new(center.x - 20.0, body.y, 40.0, body.h);
    surface.fill_rect(face, &Paint::Solid(Rgba::rgb(0x33, 0x33, 0x33)));
}

fn draw_hammer(surface: &mut dyn Surface, handle: (Vec2, f32), head: (Vec2, f32)) {
    surface.save();
    surface.translate(handle.0);
    surface.rotate(handle.1);
    let bar = Rect::centered(Vec2::ZERO, HANDLE_HALF * 2.0);
    surface.fill_rect(bar.offset(Vec2::splat(2.0)), &Paint::Solid(SHADOW));
    surface.fill_rect(bar, &Paint::Solid(Rgba::rgb(0x8B, 0x45, 0x13)));
    surface.fill_rect(Rect { h: 2.0, ..bar }, &Paint::Solid(Rgba::WHITE.with_alpha(0.2)));
    surface.restore();

    surface.save();
    surface.translate(head.0);
    surface.fill_circle(Vec2::splat(2.0), HEAD_RADIUS, &Paint::Solid(SHADOW));
    surface.fill_circle(
        Vec2::ZERO,
        HEAD_RADIUS,
        &Paint::Radial {
            center: Vec2::ZERO,
            radius: HEAD_RADIUS,
            stops: vec![
                stop(0.0, Rgba::rgb(0xFF, 0x6B, 0x35)),
                stop(0.7, Rgba::rgb(0xE5, 0x5A, 0x2B)),
                stop(1.0, Rgba::rgb(0xCC, 0x4A, 0x1F)),
            ],
        },
    );
    surface.fill_circle(Vec2::splat(-5.0), 5.0, &Paint::Solid(Rgba::WHITE.with_alpha(0.3)));
    surface.restore();
}

/// Perceived brightness; stays high for most of a spark's life.
fn brightness(life: f32) -> f32 {
    life.max(0.0).powf(0.6)
}

fn draw_spark(surface: &mut dyn Surface, spark: &Spark, glyphs: GlyphStyle) {
    surface.save();
    let b = brightness(spark.life);

    let glow = spark.glow_size * b;
    if glow > 0.0 {
        surface.set_alpha((b * 1.2).min(1.0));
        surface.fill_circle(
            spark.pos,
            glow,
            &Paint::Radial {
                center: spark.pos,
                radius: glow,
                stops: vec![
                    stop(0.0, Rgba::rgba(255, 255, 255, 0.0)),
                    stop(0.3, Rgba::rgba(255, 200, 0, 0.6 * b)),
                    stop(0.7, Rgba::rgba(255, 100, 0, 0.4 * b)),
                    stop(1.0, Rgba::rgba(255, 50, 0, 0.0)),
                ],
            },
        );
    }

    let points: Vec<Vec2> = spark.trail.iter().map(|p| p.pos).collect();
    let len = points.len() as f32;
    for (i, pair) in points.windows(2).enumerate() {
        let progress = i as f32 / len;
        let alpha = progress * b * 1.2;
        let width = spark.base_size * 0.5 * (1.0 - progress) * b;
        if width > 0.1 && alpha > 0.01 {
            surface.set_alpha(alpha.min(1.0));
            let trail_paint = Paint::Linear {
                from: pair[0],
                to: pair[1],
                stops: vec![
                    stop(0.0, Rgba::rgb(0xFF, 0xD7, 0x00)),
                    stop(0.3, Rgba::rgb(0xFF, 0xA5, 0x00)),
                    stop(0.7, Rgba::rgb(0xFF, 0x45, 0x00)),
                    stop(1.0, Rgba::rgb(0xFF, 0x63, 0x47)),
                ],
            };
            surface.stroke_line(pair[0], pair[1], width, &trail_paint);
        }
    }

    let core = spark.size * b;
    let mut alpha = b * 1.3;
    if let Some(d) = &spark.disintegration {
        alpha *= 1.0 - glyph_progress(d.glyphs.len(), d.initial_count) * 0.7;
    }
    if core > 0.0 {
        let (r, g, bl) = spark.color.rgb();
        let color = Rgba::rgb(r, g, bl);
        surface.set_alpha(alpha.clamp(0.0, 1.0));
        surface.fill_circle(
            spark.pos,
            core,
            &Paint::Radial {
                center: spark.pos,
                radius: core,
                stops: vec![
                    stop(0.0, Rgba::WHITE),
                    stop(0.3, color),
                    stop(0.7, color.darken(0.3)),
                    stop(1.0, color.darken(0.6)),
                ],
            },
        );
        surface.set_alpha((alpha * 0.8).clamp(0.0, 1.0));
        surface.fill_circle(
            spark.pos - Vec2::splat(core * 0.3),
            core * 0.3,
            &Paint::Solid(Rgba::WHITE.with_alpha(0.9)),
        );
    }

    if spark.disintegration.is_some() {
        draw_glyphs(surface, spark, glyphs);
    }
    surface.restore();
}

fn glyph_progress(remaining: usize, initial: usize) -> f32 {
    if initial == 0 {
        0.0
    } else {
        remaining as f32 / initial as f32
    }
}

fn draw_glyphs(surface: &mut dyn Surface, spark: &Spark, look: GlyphStyle) {
    let Some(d) = &spark.disintegration else {
        return;
    };
    let style = TextStyle { size_px: look.size_px, align: TextAlign::Center, baseline: TextBaseline::Middle };
    let progress = glyph_progress(d.glyphs.len(), d.initial_count);
    let count = d.glyphs.len() as f32;

    surface.save();
    for (index, glyph) in d.glyphs.iter().enumerate() {
        // Glyphs fade in by creation order.
        let appearance = index as f32 / count;
        if appearance > progress {
            continue;
        }
        let fade_in = ((progress - appearance) * 3.0).min(1.0);
        let life = glyph.life.clamp(0.0, 1.0);
        let intensity = (255.0 * life).floor();
        let tint = Rgba::rgb(intensity as u8, (intensity * 0.8).floor() as u8, (intensity * 0.4).floor() as u8);

        surface.set_alpha(life * life * look.alpha * fade_in);
        surface.set_shadow(Some(Shadow { color: tint, blur: look.blur * life * fade_in }));
        let mut buf = [0u8; 4];
        surface.fill_text(glyph.glyph.encode_utf8(&mut buf), glyph.pos, &style, &Paint::Solid(tint));
    }
    surface.restore();
}

fn draw_connections(surface: &mut dyn Surface, globals: &[GlobalSpark]) {
    for (i, a) in globals.iter().enumerate() {
        for b in &globals[i + 1..] {
            let (p1, p2) = (a.spark.pos, b.spark.pos);
            let dist = p1.distance(p2);
            if dist >= CONNECTION_DISTANCE {
                continue;
            }
            let alpha = (1.0 - dist / CONNECTION_DISTANCE) * 0.6 * a.spark.life.min(b.spark.life);
            surface.save();
            surface.set_alpha(alpha.clamp(0.0, 1.0));
            surface.set_shadow(Some(Shadow { color: AMBER, blur: 5.0 }));
            let paint = Paint::Linear {
                from: p1,
                to: p2,
                stops: vec![
                    stop(0.0, AMBER),
                    stop(0.5, Rgba::rgb(0xFF, 0x66, 0x00)),
                    stop(1.0, AMBER),
                ],
            };
            surface.stroke_line(p1, p2, 2.0, &paint);
            surface.restore();
        }
    }
}

fn draw_status(surface: &mut dyn Surface, viewport: Viewport, status: Status) {
    let text = status.label();
    let style = TextStyle { size_px: 14.0, align: TextAlign::Center, baseline: TextBaseline::Top };
    let padding = 10.0;

    surface.save();
    surface.set_shadow(Some(Shadow { color: Rgba::BLACK, blur: 3.0 }));
    let width = surface.measure_text(text, &style);
    surface.fill_rect(
        Rect::new(viewport.width / 2.0 - width / 2.0 - padding, 10.0, width + padding * 2.0, 25.0),
        &Paint::Solid(Rgba::BLACK.with_alpha(0.7)),
    );
    surface.fill_text(text, Vec2::new(viewport.width / 2.0, 15.0), &style, &Paint::Solid(AMBER));
    surface.restore();
}
