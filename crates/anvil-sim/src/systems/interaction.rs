//! Pointer handling: grabbing and dragging the hammer, and freezing it when idle.

use glam::Vec2;

use crate::api::types::BodyId;
use crate::core::physics::{AnchorKind, ConstraintId, PhysicsBody, PhysicsWorld, SpringParams};
use crate::core::scene::Scene;
use crate::renderer::status::{Status, StatusBanner};

/// Extra reach around the hammer shapes that still counts as a grab.
pub const GRAB_SLACK: f32 = 10.0;

pub const DRAG_SPRING: SpringParams = SpringParams { rest_length: 0.0, stiffness: 2000.0, damping: 40.0 };

/// The single active drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drag {
    pub constraint: ConstraintId,
    pub body: BodyId,
}

pub struct InteractionController {
    frozen: bool,
    drag: Option<Drag>,
    pointer: Vec2,
    last_interaction_ms: f64,
    freeze_delay_ms: f64,
    status: StatusBanner,
}

impl InteractionController {
    pub fn new(freeze_delay_ms: f64, status_revert_ms: f64) -> Self {
        Self {
            frozen: false,
            drag: None,
            pointer: Vec2::ZERO,
            last_interaction_ms: 0.0,
            freeze_delay_ms,
            status: StatusBanner::new(status_revert_ms),
        }
    }

    /// Restart the idle clock.
    pub fn touch(&mut self, now_ms: f64) {
        self.last_interaction_ms = now_ms;
    }

    pub fn pointer_down(&mut self, world: &mut PhysicsWorld, scene: &Scene, pos: Vec2, now_ms: f64) {
        self.pointer = pos;
        if self.frozen {
            self.unfreeze(world, scene);
            self.touch(now_ms);
            self.status.set(Status::ReadyToSwing, now_ms);
        }

        let Some((body, local)) = Self::hit_test(world, scene, pos) else {
            log::debug!("pointer down at {:?} missed the hammer", pos);
            return;
        };

        self.end_drag(world);
        match world.tether(&body, local, pos, DRAG_SPRING, AnchorKind::Movable, BodyId::DragAnchor) {
            Ok(constraint) => {
                self.drag = Some(Drag { constraint, body: body.id });
                self.touch(now_ms);
                self.status.set(Status::Dragging, now_ms);
            }
            Err(e) => log::warn!("could not start drag: {}", e),
        }
    }

    pub fn pointer_move(&mut self, world: &mut PhysicsWorld, pos: Vec2) {
        self.pointer = pos;
        if let Some(drag) = self.drag {
            world.set_tether_target(drag.constraint, pos);
        }
    }

    pub fn pointer_up(&mut self, world: &mut PhysicsWorld, now_ms: f64) {
        if self.end_drag(world) {
            self.touch(now_ms);
            self.status.set(Status::Released, now_ms);
        }
    }

    pub fn pointer_leave(&mut self, world: &mut PhysicsWorld, scene: &Scene, now_ms: f64) {
        self.end_drag(world);
        self.force_freeze(world, scene);
        self.status.set(Status::FrozenPointerLeft, now_ms);
    }

    /// Freeze the hammer once it has been left alone long enough.
    /// Returns `true` only on the tick that froze it.
    pub fn check_idle_freeze(&mut self, world: &mut PhysicsWorld, scene: &Scene, now_ms: f64) -> bool {
        if self.drag.is_some() || self.frozen || now_ms - self.last_interaction_ms <= self.freeze_delay_ms {
            return false;
        }
        self.force_freeze(world, scene);
        log::info!("hammer frozen after {} ms idle", now_ms - self.last_interaction_ms);
        true
    }

    /// Remove the drag constraint, if any. Returns whether one existed.
    pub fn end_drag(&mut self, world: &mut PhysicsWorld) -> bool {
        match self.drag.take() {
            Some(drag) => {
                world.remove_constraint(drag.constraint);
                true
            }
            None => false,
        }
    }

    /// Forget the drag if its constraint was dropped elsewhere.
    pub fn forget_constraints(&mut self, removed: &[ConstraintId]) {
        if let Some(drag) = self.drag {
            if removed.contains(&drag.constraint) {
                log::warn!("drag constraint went stale, releasing");
                self.drag = None;
            }
        }
    }

    /// Forget the drag without touching the world, for when the world itself is being replaced.
    pub fn abandon_drag(&mut self) {
        self.drag = None;
    }

    /// Make both hammer bodies static and motionless.
    pub fn force_freeze(&mut self, world: &mut PhysicsWorld, scene: &Scene) {
        for body in scene.hammer() {
            world.set_velocity(&body, Vec2::ZERO);
            world.set_angular_velocity(&body, 0.0);
            world.set_static(&body, true);
        }
        self.frozen = true;
    }

    fn unfreeze(&mut self, world: &mut PhysicsWorld, scene: &Scene) {
        for body in scene.hammer() {
            world.set_static(&body, false);
            world.set_velocity(&body, Vec2::ZERO);
            world.set_angular_velocity(&body, 0.0);
        }
        self.frozen = false;
    }

    /// Drop any drag and move the hammer back to its starting pose at rest.
    /// A frozen hammer stays frozen.
    pub fn reset_hammer(&mut self, world: &mut PhysicsWorld, scene: &Scene) {
        self.end_drag(world);
        let vp = scene.viewport;
        scene.place_hammer(world, Scene::handle_home(vp), Scene::head_home(vp));
    }

    /// Put the hammer back at safe positions after its state went non-finite.
    pub fn recover_invalid_geometry(&mut self, world: &mut PhysicsWorld, scene: &Scene) {
        self.end_drag(world);
        self.unfreeze(world, scene);
        let (handle_pos, head_pos) = Scene::safe_positions(scene.viewport);
        scene.place_hammer(world, handle_pos, head_pos);
        self.force_freeze(world, scene);
    }

    /// Find the hammer part under `pos`, head first. Returns the body and the
    /// grab point in its local frame.
    pub fn hit_test(world: &PhysicsWorld, scene: &Scene, pos: Vec2) -> Option<(PhysicsBody, Vec2)> {
        [scene.head, scene.handle].into_iter().find_map(|body| {
            let shape = world.collider_shape(&body)?;
            let (center, angle) = world.body_position(&body);
            let local = Vec2::from_angle(-angle).rotate(pos - center);
            shape.contains_local(local, GRAB_SLACK).then_some((body, local))
        })
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag(&self) -> Option<Drag> {
        self.drag
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn status(&self, now_ms: f64) -> Status {
        self.status.current(now_ms)
    }
}
