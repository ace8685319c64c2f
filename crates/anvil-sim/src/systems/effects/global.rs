//! Sparks that escaped the canvas and roam the page.

use glam::Vec2;

use super::rng::Rng;
use super::spark::{Disintegration, Spark};
use crate::api::types::PageFrame;

pub const GLOBAL_TRAIL_LEN: usize = 10;
pub const GLOBAL_DECAY: f32 = 0.003;
pub const GLOBAL_DAMPING: f32 = 0.998;
/// Milliseconds credited per frame to the wander and transition timers.
pub const FRAME_MS: f32 = 16.0;
/// A global spark starts disintegrating after wandering this long.
pub const WANDER_MS: f32 = 5000.0;
/// No drift forces act on a freshly promoted spark until this has passed.
pub const TRANSITION_MS: f32 = 1000.0;

const EDGE_RESTITUTION: f32 = 0.8;
const ATTRACTION: f32 = 0.01;
const JITTER: f32 = 0.01;
const SWIRL: f32 = 0.001;
const TRAIL_JITTER: f32 = 1.5;

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSpark {
    /// Position and trail are in page coordinates.
    pub spark: Spark,
    pub wander_ms: f32,
    pub transition_ms: f32,
}

impl GlobalSpark {
    /// Lift a spark leaving the canvas onto the page.
    pub fn promote(spark: Spark, page: &PageFrame) -> Self {
        let trail = spark.trail.mapped(|p| page.to_page(p), GLOBAL_TRAIL_LEN);
        Self {
            spark: Spark {
                pos: page.to_page(spark.pos),
                life: 1.0,
                decay: GLOBAL_DECAY,
                size: spark.size * 1.5,
                trail,
                disintegration: None,
                ..spark
            },
            wander_ms: 0.0,
            transition_ms: 0.0,
        }
    }

    pub fn is_spent(&self) -> bool {
        self.spark.is_spent()
    }

    /// Everything after the shared pairwise pass for one frame.
    pub fn advance(&mut self, rng: &mut Rng) {
        let jitter = Vec2::new(rng.signed(TRAIL_JITTER), rng.signed(TRAIL_JITTER));
        let s = &mut self.spark;
        s.record_trail(jitter);
        s.pos += s.vel;
        s.vel *= GLOBAL_DAMPING;
        s.life -= s.decay;

        if self.wander_ms > WANDER_MS && !s.is_disintegrating() {
            s.disintegration = Some(Disintegration::start(s.pos, rng));
        }
        s.update_glyphs(rng);
    }
}

fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert!(i < j);
    let (head, tail) = items.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

/// Edge bounce, pairwise collision/attraction, then drift for every global spark.
/// `bounds` is the size of the page viewport.
pub fn interact(sparks: &mut [GlobalSpark], bounds: Vec2, rng: &mut Rng) {
    let center = bounds / 2.0;
    for i in 0..sparks.len() {
        bounce_off_edges(&mut sparks[i].spark, bounds);

        for j in i + 1..sparks.len() {
            let (a, b) = pair_mut(sparks, i, j);
            collide_or_attract(&mut a.spark, &mut b.spark);
        }

        let g = &mut sparks[i];
        if g.transition_ms > TRANSITION_MS {
            g.spark.vel += Vec2::new(rng.signed(JITTER), rng.signed(JITTER));
            let to_center = center - g.spark.pos;
            let dist = to_center.length();
            if dist > 0.0 {
                g.spark.vel += to_center.perp() / dist * SWIRL;
            }
        }
    }
}

fn bounce_off_edges(s: &mut Spark, bounds: Vec2) {
    if s.pos.x < 0.0 || s.pos.x > bounds.x {
        s.vel.x *= -EDGE_RESTITUTION;
        s.pos.x = s.pos.x.clamp(0.0, bounds.x);
    }
    if s.pos.y < 0.0 || s.pos.y > bounds.y {
        s.vel.y *= -EDGE_RESTITUTION;
        s.pos.y = s.pos.y.clamp(0.0, bounds.y);
    }
}

fn collide_or_attract(a: &mut Spark, b: &mut Spark) {
    let delta = b.pos - a.pos;
    let dist = delta.length();
    let min_dist = (a.size + b.size) * 2.0;

    if dist > 0.0 && dist < min_dist {
        let push = delta / dist * (min_dist - dist) * 0.5;
        a.pos -= push;
        b.pos += push;

        let approach = (b.vel - a.vel).dot(delta);
        if approach > 0.0 {
            let impulse = delta * (2.0 * approach / (dist * dist));
            a.vel += impulse * 0.5;
            b.vel -= impulse * 0.5;
        }
    } else if dist > min_dist && dist < min_dist * 3.0 {
        let pull = delta / dist * (ATTRACTION / (dist * dist));
        a.vel += pull;
        b.vel -= pull;
    }
}
