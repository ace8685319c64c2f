//! In-canvas impact sparks.

use std::collections::VecDeque;

use glam::Vec2;

use super::binary::BinaryParticle;
use super::rng::Rng;
use super::spark_color::SparkColor;

pub const SPARK_TRAIL_LEN: usize = 8;
/// Downward acceleration per frame.
pub const SPARK_GRAVITY: f32 = 0.3;
/// No single impact spawns more than this.
pub const MAX_SPARKS_PER_IMPACT: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub pos: Vec2,
    /// Life of the owner when the point was recorded.
    pub life: f32,
}

/// Recent positions, oldest first. Never longer than its capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct Trail {
    points: VecDeque<TrailPoint>,
    cap: usize,
}

impl Trail {
    pub fn new(cap: usize) -> Self {
        Self { points: VecDeque::with_capacity(cap + 1), cap }
    }

    pub fn push(&mut self, point: TrailPoint) {
        self.points.push_back(point);
        while self.points.len() > self.cap {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    /// A copy with every point passed through `map`, at a new capacity.
    pub fn mapped(&self, map: impl Fn(Vec2) -> Vec2, cap: usize) -> Trail {
        let mut out = Trail::new(cap);
        for p in &self.points {
            out.push(TrailPoint { pos: map(p.pos), life: p.life });
        }
        out
    }
}

/// Glyph children of a spark that is breaking apart.
#[derive(Debug, Clone, PartialEq)]
pub struct Disintegration {
    pub glyphs: Vec<BinaryParticle>,
    /// Glyph count at the start, used to stagger their fade-in.
    pub initial_count: usize,
}

impl Disintegration {
    pub fn start(center: Vec2, rng: &mut Rng) -> Self {
        let glyphs = BinaryParticle::burst(center, rng);
        let initial_count = glyphs.len();
        Self { glyphs, initial_count }
    }

    pub fn update(&mut self, rng: &mut Rng) {
        self.glyphs.retain_mut(|g| g.update(rng));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spark {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub max_life: f32,
    /// Life lost per frame.
    pub decay: f32,
    pub size: f32,
    /// Trail width is derived from this rather than `size`.
    pub base_size: f32,
    pub glow_size: f32,
    pub color: SparkColor,
    pub trail: Trail,
    pub disintegration: Option<Disintegration>,
}

impl Spark {
    /// A fresh spark thrown off an impact at `speed` (units per frame).
    pub fn from_impact(origin: Vec2, speed: f32, rng: &mut Rng) -> Self {
        let pos = origin + Vec2::new(rng.signed(7.5), rng.range(0.0, 8.0));
        let angle = rng.next_f32() * std::f32::consts::TAU;
        let spark_speed = speed * rng.range(0.3, 1.0);
        let vel = Vec2::new(
            angle.cos() * spark_speed * 0.4,
            -rng.next_f32() * spark_speed * 0.6,
        );
        Self {
            pos,
            vel,
            life: 1.0,
            max_life: rng.range(0.6, 1.4),
            decay: rng.range(0.025, 0.04),
            size: rng.range(1.0, 5.0),
            base_size: rng.range(1.0, 5.0),
            glow_size: rng.range(3.0, 9.0),
            color: SparkColor::random(rng),
            trail: Trail::new(SPARK_TRAIL_LEN),
            disintegration: None,
        }
    }

    pub fn is_disintegrating(&self) -> bool {
        self.disintegration.is_some()
    }

    /// Dead, or disintegrated with nothing left to show.
    pub fn is_spent(&self) -> bool {
        self.life <= 0.0
            || self
                .disintegration
                .as_ref()
                .map_or(false, |d| d.glyphs.is_empty())
    }

    pub fn record_trail(&mut self, jitter: Vec2) {
        self.trail.push(TrailPoint { pos: self.pos + jitter, life: self.life });
    }

    pub fn update_glyphs(&mut self, rng: &mut Rng) {
        if let Some(d) = self.disintegration.as_mut() {
            d.update(rng);
        }
    }

    /// One in-canvas frame: record trail, integrate, fall, decay.
    pub fn advance(&mut self) {
        self.record_trail(Vec2::ZERO);
        self.pos += self.vel;
        self.vel.y += SPARK_GRAVITY;
        self.life -= self.decay;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trail_drops_oldest() {
        let mut trail = Trail::new(3);
        for i in 0..5 {
            trail.push(TrailPoint { pos: Vec2::new(i as f32, 0.0), life: 1.0 });
        }
        assert_eq!(trail.len(), 3);
        let xs: Vec<f32> = trail.iter().map(|p| p.pos.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn mapped_trail_respects_new_cap() {
        let mut trail = Trail::new(8);
        for i in 0..8 {
            trail.push(TrailPoint { pos: Vec2::new(i as f32, 0.0), life: 0.5 });
        }
        let moved = trail.mapped(|p| p + Vec2::new(10.0, 20.0), 4);
        assert_eq!(moved.len(), 4);
        let first = moved.iter().next().unwrap();
        assert_eq!(first.pos, Vec2::new(14.0, 20.0));
        assert_eq!(first.life, 0.5);
    }

    #[test]
    fn impact_spark_attributes_in_range() {
        let mut rng = Rng::new(11);
        let origin = Vec2::new(200.0, 240.0);
        for _ in 0..200 {
            let s = Spark::from_impact(origin, 5.0, &mut rng);
            assert!((s.pos.x - 200.0).abs() <= 7.5);
            assert!(s.pos.y >= 240.0 && s.pos.y <= 248.0);
            assert!(s.vel.y <= 0.0, "sparks fly upward");
            assert!(s.vel.x.abs() <= 5.0 * 0.4 + 1e-4);
            assert_eq!(s.life, 1.0);
            assert!(s.max_life >= 0.6 && s.max_life < 1.4);
            assert!(s.decay >= 0.025 && s.decay < 0.04);
            assert!(s.size >= 1.0 && s.size < 5.0);
            assert!(s.glow_size >= 3.0 && s.glow_size < 9.0);
            assert!(SparkColor::ALL.contains(&s.color));
        }
    }

    #[test]
    fn advance_applies_gravity_and_decay() {
        let mut rng = Rng::new(1);
        let mut s = Spark::from_impact(Vec2::ZERO, 0.0, &mut rng);
        let start = s.pos;
        let decay = s.decay;
        s.advance();
        assert_eq!(s.trail.len(), 1);
        assert_eq!(s.trail.iter().next().unwrap().pos, start);
        assert!((s.vel.y - SPARK_GRAVITY).abs() < 1e-6);
        assert!((s.life - (1.0 - decay)).abs() < 1e-6);
    }

    #[test]
    fn spent_rule() {
        let mut rng = Rng::new(1);
        let mut s = Spark::from_impact(Vec2::ZERO, 1.0, &mut rng);
        assert!(!s.is_spent());
        s.disintegration = Some(Disintegration { glyphs: Vec::new(), initial_count: 20 });
        assert!(s.is_spent(), "disintegrated with no glyphs left");
        s.disintegration = None;
        s.life = 0.0;
        assert!(s.is_spent());
    }
}
