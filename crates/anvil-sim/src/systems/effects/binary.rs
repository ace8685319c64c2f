//! Binary glyph particles left behind by a disintegrating spark.

use glam::Vec2;

use super::rng::Rng;

/// Life above this is held at full; below it the glyph starts fading.
const FADE_THRESHOLD: f32 = 0.3;
/// Glyphs at or below this life are removed.
const DEAD_LIFE: f32 = 0.0001;
const DAMPING: f32 = 0.998;
const GRAVITY: f32 = 0.01;
const DRIFT: f32 = 0.0025;

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryParticle {
    pub glyph: char,
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub decay: f32,
    pub size: f32,
}

impl BinaryParticle {
    /// Scatter 20 to 30 glyphs around `center`.
    pub fn burst(center: Vec2, rng: &mut Rng) -> Vec<BinaryParticle> {
        let count = 20 + rng.next_int(11) as usize;
        (0..count)
            .map(|_| BinaryParticle {
                glyph: if rng.next_f32() > 0.5 { '1' } else { '0' },
                pos: center + Vec2::new(rng.signed(40.0), rng.signed(40.0)),
                vel: Vec2::new(rng.signed(4.0), rng.signed(4.0)),
                life: 1.0,
                decay: rng.range(0.0005, 0.0015),
                size: rng.range(8.0, 14.0),
            })
            .collect()
    }

    /// Advance one frame. Returns false once the glyph has faded out.
    pub fn update(&mut self, rng: &mut Rng) -> bool {
        self.pos += self.vel;
        self.vel *= DAMPING;
        self.vel.y += GRAVITY;

        if self.life > FADE_THRESHOLD {
            self.life = 1.0;
        } else {
            self.life -= self.decay * 0.1;
        }

        self.vel += Vec2::new(rng.signed(DRIFT), rng.signed(DRIFT));
        self.life > DEAD_LIFE
    }
}
