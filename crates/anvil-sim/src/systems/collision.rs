//! Turns head-on-anvil contacts into spark emission requests.

use glam::Vec2;

use crate::api::types::BodyId;
use crate::core::physics::CollisionPair;

/// Queues impact intensities during a step so they can be emitted before the
/// same frame's particle update.
#[derive(Debug, Default)]
pub struct CollisionReactor {
    pending: Vec<f32>,
}

impl CollisionReactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// React to one contact. `head_velocity` is in units per second and `dt`
    /// converts it to units per frame. Returns the queued intensity, if any.
    pub fn on_contact(&mut self, pair: &CollisionPair, head_velocity: Vec2, dt: f32) -> Option<f32> {
        if !pair.started || !pair.involves(BodyId::Head, BodyId::Anvil) {
            return None;
        }
        let speed = head_velocity.length() * dt;
        if !speed.is_finite() {
            log::warn!("ignoring impact with non-finite head velocity {:?}", head_velocity);
            return None;
        }
        self.pending.push(speed);
        Some(speed)
    }

    /// Take every intensity queued since the last drain.
    pub fn drain(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.pending)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: BodyId, b: BodyId, started: bool) -> CollisionPair {
        CollisionPair { body_a: a, body_b: b, started }
    }

    #[test]
    fn head_anvil_in_either_order() {
        let mut r = CollisionReactor::new();
        let vel = Vec2::new(180.0, 240.0); // 300 units/s
        let a = r.on_contact(&pair(BodyId::Head, BodyId::Anvil, true), vel, 1.0 / 60.0).unwrap();
        let b = r.on_contact(&pair(BodyId::Anvil, BodyId::Head, true), vel, 1.0 / 60.0).unwrap();
        assert!((a - 5.0).abs() < 1e-4);
        assert_eq!(a, b);
        assert_eq!(r.drain().len(), 2);
        assert!(r.drain().is_empty());
    }

    #[test]
    fn foreign_and_ended_pairs_ignored() {
        let mut r = CollisionReactor::new();
        let vel = Vec2::new(100.0, 0.0);
        assert_eq!(r.on_contact(&pair(BodyId::Handle, BodyId::Anvil, true), vel, 1.0), None);
        assert_eq!(r.on_contact(&pair(BodyId::Head, BodyId::WallBottom, true), vel, 1.0), None);
        assert_eq!(r.on_contact(&pair(BodyId::Head, BodyId::Anvil, false), vel, 1.0), None);
        assert!(r.drain().is_empty());
    }

    #[test]
    fn non_finite_velocity_ignored() {
        let mut r = CollisionReactor::new();
        let out = r.on_contact(&pair(BodyId::Head, BodyId::Anvil, true), Vec2::new(f32::NAN, 0.0), 1.0);
        assert_eq!(out, None);
    }
}
