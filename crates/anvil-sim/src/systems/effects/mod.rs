//! Particle engine: impact sparks inside the canvas, sparks that escaped onto
//! the page, and the binary glyphs they break into.

mod rng;
mod spark_color;
mod binary;
mod spark;
mod global;

pub use rng::Rng;
pub use spark_color::SparkColor;
pub use binary::BinaryParticle;
pub use spark::{Disintegration, Spark, Trail, TrailPoint, MAX_SPARKS_PER_IMPACT, SPARK_TRAIL_LEN};
pub use global::{GlobalSpark, FRAME_MS, GLOBAL_TRAIL_LEN, TRANSITION_MS, WANDER_MS};

use glam::Vec2;

use crate::api::config::SimConfig;
use crate::api::types::{PageFrame, Viewport};

/// Owns both spark populations and the RNG that drives them.
pub struct ParticleEngine {
    sparks: Vec<Spark>,
    globals: Vec<GlobalSpark>,
    rng: Rng,
    max_sparks: usize,
    max_globals: usize,
    margin: f32,
}

impl ParticleEngine {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            sparks: Vec::with_capacity(config.max_sparks),
            globals: Vec::with_capacity(config.max_global_sparks),
            rng: Rng::new(config.seed),
            max_sparks: config.max_sparks,
            max_globals: config.max_global_sparks,
            margin: config.bounds_margin,
        }
    }

    /// Throw sparks off an impact of `speed` units per frame at `origin`
    /// (head x, anvil top). Returns how many were spawned.
    pub fn emit(&mut self, speed: f32, origin: Vec2) -> usize {
        if self.sparks.len() >= self.max_sparks {
            return 0;
        }
        let wanted = ((speed * 2.0).floor().max(0.0) as usize).min(MAX_SPARKS_PER_IMPACT);
        let count = wanted.min(self.max_sparks - self.sparks.len());
        for _ in 0..count {
            let spark = Spark::from_impact(origin, speed, &mut self.rng);
            self.sparks.push(spark);
        }
        count
    }

    /// Advance both populations by one frame.
    pub fn tick(&mut self, viewport: Viewport, page: PageFrame) {
        self.tick_sparks(viewport, &page);
        self.tick_globals(&page);
    }

    fn tick_sparks(&mut self, viewport: Viewport, page: &PageFrame) {
        let sparks = std::mem::take(&mut self.sparks);
        for mut spark in sparks {
            spark.advance();

            if !spark.is_disintegrating() && !viewport.contains_with_margin(spark.pos, self.margin) {
                if self.globals.len() < self.max_globals {
                    self.globals.push(GlobalSpark::promote(spark, page));
                } else {
                    log::debug!("global spark cap reached, dropping escaped spark");
                }
                continue;
            }

            spark.update_glyphs(&mut self.rng);
            if !spark.is_spent() {
                self.sparks.push(spark);
            }
        }
    }

    fn tick_globals(&mut self, page: &PageFrame) {
        for g in &mut self.globals {
            g.wander_ms += FRAME_MS;
            g.transition_ms += FRAME_MS;
        }
        global::interact(&mut self.globals, page.viewport, &mut self.rng);

        let rng = &mut self.rng;
        self.globals.retain_mut(|g| {
            g.advance(rng);
            !g.is_spent()
        });
    }

    /// Drop every in-canvas spark. Global sparks are untouched.
    pub fn clear_sparks(&mut self) {
        self.sparks.clear();
    }

    pub fn sparks(&self) -> &[Spark] {
        &self.sparks
    }

    pub fn globals(&self) -> &[GlobalSpark] {
        &self.globals
    }

    pub fn spark_count(&self) -> usize {
        self.sparks.len()
    }

    pub fn global_count(&self) -> usize {
        self.globals.len()
    }

    #[cfg(test)]
    pub(crate) fn push_spark(&mut self, spark: Spark) {
        self.sparks.push(spark);
    }

    #[cfg(test)]
    pub(crate) fn rng_mut(&mut self) -> &mut Rng {
        &mut self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VP: Viewport = Viewport { width: 400.0, height: 300.0 };

    fn engine() -> ParticleEngine {
        ParticleEngine::new(&SimConfig::default())
    }

    fn page() -> PageFrame {
        PageFrame::new(Vec2::new(100.0, 200.0), Vec2::new(1280.0, 800.0))
    }

    fn escaping_spark(engine: &mut ParticleEngine) -> Spark {
        let mut s = Spark::from_impact(Vec2::new(200.0, 240.0), 1.0, engine.rng_mut());
        s.pos = Vec2::new(449.0, 100.0);
        s.vel = Vec2::new(5.0, 0.0);
        s
    }

    #[test]
    fn speed_five_emits_ten() {
        let mut e = engine();
        assert_eq!(e.emit(5.0, Vec2::new(260.0, 240.0)), 10);
        assert_eq!(e.spark_count(), 10);
        for s in e.sparks() {
            assert!(s.life >= 0.0 && s.life <= 1.0);
        }
    }

    #[test]
    fn emission_is_capped_per_impact_and_in_total() {
        let mut e = engine();
        assert_eq!(e.emit(100.0, Vec2::ZERO), 12);
        assert_eq!(e.emit(100.0, Vec2::ZERO), 3, "stops at the population cap");
        assert_eq!(e.emit(100.0, Vec2::ZERO), 0, "full population ignores impacts");
        assert_eq!(e.spark_count(), 15);
    }

    #[test]
    fn slow_or_bogus_impacts_emit_nothing() {
        let mut e = engine();
        assert_eq!(e.emit(0.4, Vec2::ZERO), 0);
        assert_eq!(e.emit(-3.0, Vec2::ZERO), 0);
        assert_eq!(e.emit(f32::NAN, Vec2::ZERO), 0);
    }

    #[test]
    fn populations_never_exceed_caps() {
        let mut e = engine();
        for frame in 0..2000 {
            e.emit(3.0 + (frame % 7) as f32, Vec2::new(200.0, 240.0));
            e.tick(VP, page());
            assert!(e.spark_count() <= 15);
            assert!(e.global_count() <= 25);
        }
    }

    #[test]
    fn life_never_increases_inside_canvas() {
        let mut e = engine();
        e.emit(6.0, Vec2::new(200.0, 240.0));
        let mut last: Vec<f32> = e.sparks().iter().map(|s| s.life).collect();
        for _ in 0..10 {
            e.tick(VP, PageFrame::from_viewport(VP));
            // sparks are only ever removed, so survivors keep their order
            let lives: Vec<f32> = e.sparks().iter().map(|s| s.life).collect();
            assert!(lives.len() <= last.len());
            if lives.len() == last.len() {
                for (now, before) in lives.iter().zip(&last) {
                    assert!(now <= before);
                }
            }
            last = lives;
        }
    }

    #[test]
    fn escaping_spark_moves_to_page_in_same_tick() {
        let mut e = engine();
        let s = escaping_spark(&mut e);
        e.push_spark(s);

        e.tick(VP, page());
        assert_eq!(e.spark_count(), 0);
        assert_eq!(e.global_count(), 1);
        let g = &e.globals()[0];
        // canvas (454, 100) + origin (100, 200), then one global step of ~5 with damping
        let expected = Vec2::new(554.0, 300.0);
        assert!((g.spark.pos - expected).length() < 6.0, "{:?}", g.spark.pos);
        assert!((g.spark.life - (1.0 - 0.003)).abs() < 1e-5);
    }

    #[test]
    fn promotion_dropped_when_global_cap_full() {
        let config = SimConfig { max_global_sparks: 0, ..SimConfig::default() };
        let mut e = ParticleEngine::new(&config);
        let s = escaping_spark(&mut e);
        e.push_spark(s);
        e.tick(VP, page());
        assert_eq!(e.spark_count(), 0);
        assert_eq!(e.global_count(), 0);
    }

    #[test]
    fn clear_sparks_keeps_globals() {
        let mut e = engine();
        let s = escaping_spark(&mut e);
        e.push_spark(s);
        e.tick(VP, page());
        e.emit(5.0, Vec2::new(200.0, 240.0));
        assert!(e.spark_count() > 0);

        e.clear_sparks();
        assert_eq!(e.spark_count(), 0);
        assert_eq!(e.global_count(), 1);
    }

    #[test]
    fn global_spark_disintegrates_after_wandering() {
        let mut e = engine();
        let s = escaping_spark(&mut e);
        e.push_spark(s);
        let big_page = PageFrame::new(Vec2::ZERO, Vec2::new(4000.0, 4000.0));
        e.tick(VP, big_page);

        let frames = (WANDER_MS / FRAME_MS) as usize + 1;
        for _ in 0..frames {
            e.tick(VP, big_page);
        }
        assert_eq!(e.global_count(), 1);
        let g = &e.globals()[0];
        assert!(g.spark.is_disintegrating());
        assert!(g.spark.life > 0.0);
    }
}
