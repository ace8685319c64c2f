use glam::Vec2;
use rapier2d::prelude::*;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::api::error::{Result, SimError};
use crate::api::types::BodyId;

// ---------------------------------------------------------------------------
// Conversion helpers (private): glam <-> nalgebra
// ---------------------------------------------------------------------------

fn vec2_to_na(v: Vec2) -> nalgebra::Vector2<f32> {
    nalgebra::Vector2::new(v.x, v.y)
}

fn na_to_vec2(v: &nalgebra::Vector2<f32>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn vec2_to_point(v: Vec2) -> nalgebra::Point2<f32> {
    nalgebra::Point2::new(v.x, v.y)
}

fn na_iso_to_pos_rot(iso: &nalgebra::Isometry2<f32>) -> (Vec2, f32) {
    let pos = Vec2::new(iso.translation.x, iso.translation.y);
    let rot = iso.rotation.angle();
    (pos, rot)
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The kind of rigid body the scene creates directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Fixed,
}

impl BodyType {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Fixed => RigidBodyType::Fixed,
        }
    }
}

/// Shape description for a collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderDesc {
    Ball { radius: f32 },
    Cuboid { half_width: f32, half_height: f32 },
}

impl ColliderDesc {
    fn build_collider(&self) -> ColliderBuilder {
        match *self {
            ColliderDesc::Ball { radius } => ColliderBuilder::ball(radius),
            ColliderDesc::Cuboid { half_width, half_height } => {
                ColliderBuilder::cuboid(half_width, half_height)
            }
        }
    }

    /// Whether `local` (a point in the body's frame) lies within the shape grown by `slack`.
    pub fn contains_local(&self, local: Vec2, slack: f32) -> bool {
        match *self {
            ColliderDesc::Ball { radius } => local.length() <= radius + slack,
            ColliderDesc::Cuboid { half_width, half_height } => {
                local.x.abs() <= half_width + slack && local.y.abs() <= half_height + slack
            }
        }
    }
}

/// Physical material properties for a collider.
#[derive(Debug, Clone, Copy)]
pub struct ColliderMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
}

impl Default for ColliderMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.3,
            friction: 0.5,
            density: 1.0,
        }
    }
}

/// Builder for describing a rigid body before creation.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub position: Vec2,
    pub ccd: bool,
    pub collider: ColliderDesc,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl BodyDesc {
    /// Create a dynamic body description with the given collider shape.
    pub fn dynamic(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec2::ZERO,
            ccd: false,
            collider,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    /// Create a fixed (static) body description with the given collider shape.
    pub fn fixed(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Fixed,
            ..Self::dynamic(collider)
        }
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.position = pos;
        self
    }

    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }

    /// Set the linear damping (velocity decay). Higher values slow the body faster.
    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }

    /// Set the angular damping (rotation decay). Higher values slow rotation faster.
    pub fn with_angular_damping(mut self, damping: f32) -> Self {
        self.angular_damping = damping;
        self
    }
}

/// A body the world created, with its stable id and Rapier handles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsBody {
    pub id: BodyId,
    pub body_handle: RigidBodyHandle,
    pub collider_handle: ColliderHandle,
}

/// Stable id for a constraint owned by the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintId(pub u32);

/// Spring parameters. Stiffness and damping are force-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringParams {
    pub rest_length: f32,
    pub stiffness: f32,
    pub damping: f32,
}

/// Description of a constraint between two bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstraintDesc {
    /// Pins the two local anchors together. The bodies may still rotate about the pin.
    Pin { anchor_a: Vec2, anchor_b: Vec2 },
}

/// How the invisible anchor of a body-to-point constraint behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    /// Never moves. Retargeting teleports it.
    Fixed,
    /// Kinematic. Retargeting moves it smoothly during the next step.
    Movable,
}

/// A collision event between two bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// `true` when the collision just started, `false` when it ended.
    pub started: bool,
}

impl CollisionPair {
    /// Unordered match against a pair of ids.
    pub fn involves(&self, a: BodyId, b: BodyId) -> bool {
        (self.body_a == a && self.body_b == b) || (self.body_a == b && self.body_b == a)
    }
}

#[derive(Debug, Clone, Copy)]
struct ConstraintRecord {
    joint: ImpulseJointHandle,
    body_a: RigidBodyHandle,
    body_b: RigidBodyHandle,
    /// Anchor body owned by this constraint, removed together with it.
    anchor: Option<RigidBodyHandle>,
}

// ---------------------------------------------------------------------------
// WASM-safe event collector (no crossbeam)
// ---------------------------------------------------------------------------

struct DirectEventCollector {
    collisions: Mutex<Vec<CollisionEvent>>,
}

impl DirectEventCollector {
    fn new() -> Self {
        Self {
            collisions: Mutex::new(Vec::new()),
        }
    }

    fn drain_collisions(&self) -> Vec<CollisionEvent> {
        let mut guard = self.collisions.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *guard)
    }
}

impl EventHandler for DirectEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        self.collisions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: f32,
    ) {
    }
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Wraps all Rapier2D boilerplate into a single struct, and owns every
/// constraint so stale ones can be found and dropped by id.
pub struct PhysicsWorld {
    gravity: nalgebra::Vector2<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    event_collector: DirectEventCollector,
    constraints: BTreeMap<ConstraintId, ConstraintRecord>,
    next_constraint: u32,
}

impl PhysicsWorld {
    /// Create a new physics world with the given gravity vector.
    /// Y points down, so positive Y gravity pulls bodies towards the bottom of the canvas.
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity: vec2_to_na(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            event_collector: DirectEventCollector::new(),
            constraints: BTreeMap::new(),
            next_constraint: 1,
        }
    }

    /// Set the integration timestep. Validated on the next step.
    pub fn set_dt(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
    }

    pub fn dt(&self) -> f32 {
        self.integration_parameters.dt
    }

    /// Create a rigid body + collider and return handles.
    /// The `BodyId` is stored in the body's `user_data` for collision lookups.
    pub fn create_body(
        &mut self,
        id: BodyId,
        desc: &BodyDesc,
        material: ColliderMaterial,
    ) -> PhysicsBody {
        let rb = RigidBodyBuilder::new(desc.body_type.to_rapier())
            .translation(vec2_to_na(desc.position))
            .ccd_enabled(desc.ccd)
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .user_data(id.raw())
            .build();

        let body_handle = self.bodies.insert(rb);

        let collider = desc
            .collider
            .build_collider()
            .restitution(material.restitution)
            .friction(material.friction)
            .density(material.density)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();

        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);

        PhysicsBody {
            id,
            body_handle,
            collider_handle,
        }
    }

    /// Remove a body and all its colliders from the simulation.
    /// Rapier drops the joints attached to it; their records go stale until
    /// [`PhysicsWorld::validate_constraints`] runs.
    pub fn remove_body(&mut self, body: &PhysicsBody) {
        self.remove_handle(body.body_handle);
    }

    pub fn contains(&self, body: &PhysicsBody) -> bool {
        self.bodies.contains(body.body_handle)
    }

    /// Step the simulation and collect collision events into the provided Vec.
    pub fn step_into(&mut self, collision_events: &mut Vec<CollisionPair>) -> Result<()> {
        let dt = self.integration_parameters.dt;
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimError::InvalidTimestep(dt));
        }

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.event_collector,
        );

        for event in self.event_collector.drain_collisions() {
            let (h1, h2, started) = match event {
                CollisionEvent::Started(h1, h2, _) => (h1, h2, true),
                CollisionEvent::Stopped(h1, h2, _) => (h1, h2, false),
            };

            // Colliders whose body vanished mid-step are skipped.
            if let (Some(a), Some(b)) = (self.collider_to_body(h1), self.collider_to_body(h2)) {
                collision_events.push(CollisionPair {
                    body_a: a,
                    body_b: b,
                    started,
                });
            }
        }
        Ok(())
    }

    /// Set the linear velocity of a body directly. Ignored by static bodies.
    pub fn set_velocity(&mut self, body: &PhysicsBody, vel: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_linvel(vec2_to_na(vel), true);
        }
    }

    /// Get the current linear velocity of a body, in units per second.
    pub fn velocity(&self, body: &PhysicsBody) -> Vec2 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_to_vec2(rb.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn set_angular_velocity(&mut self, body: &PhysicsBody, angvel: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_angvel(angvel, true);
        }
    }

    pub fn angular_velocity(&self, body: &PhysicsBody) -> f32 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| rb.angvel())
            .unwrap_or(0.0)
    }

    /// Teleport a body.
    pub fn set_position(&mut self, body: &PhysicsBody, pos: Vec2, rotation: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_position(nalgebra::Isometry2::new(vec2_to_na(pos), rotation), true);
        }
    }

    /// Get the current position and rotation of a body.
    pub fn body_position(&self, body: &PhysicsBody) -> (Vec2, f32) {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_iso_to_pos_rot(rb.position()))
            .unwrap_or((Vec2::ZERO, 0.0))
    }

    /// Toggle a body between dynamic and static.
    pub fn set_static(&mut self, body: &PhysicsBody, is_static: bool) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            let target = if is_static { RigidBodyType::Fixed } else { RigidBodyType::Dynamic };
            rb.set_body_type(target, true);
        }
    }

    pub fn is_static(&self, body: &PhysicsBody) -> bool {
        self.bodies
            .get(body.body_handle)
            .map(|rb| rb.is_fixed())
            .unwrap_or(false)
    }

    /// `false` when any of position, rotation or velocity is NaN or infinite,
    /// or when the body no longer exists.
    pub fn is_finite(&self, body: &PhysicsBody) -> bool {
        self.bodies.get(body.body_handle).map_or(false, |rb| {
            let (pos, rot) = na_iso_to_pos_rot(rb.position());
            pos.is_finite()
                && rot.is_finite()
                && na_to_vec2(rb.linvel()).is_finite()
                && rb.angvel().is_finite()
        })
    }

    /// Number of rigid bodies in the simulation, anchors included.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Query the collider shape of a physics body.
    /// Returns `None` if the collider no longer exists or has an unsupported shape.
    pub fn collider_shape(&self, body: &PhysicsBody) -> Option<ColliderDesc> {
        let collider = self.colliders.get(body.collider_handle)?;
        let shape = collider.shape();
        if let Some(ball) = shape.as_ball() {
            Some(ColliderDesc::Ball { radius: ball.radius })
        } else if let Some(cuboid) = shape.as_cuboid() {
            Some(ColliderDesc::Cuboid {
                half_width: cuboid.half_extents.x,
                half_height: cuboid.half_extents.y,
            })
        } else {
            None
        }
    }

    // -- Constraint methods --

    /// Constrain two bodies together.
    pub fn link(&mut self, body_a: &PhysicsBody, body_b: &PhysicsBody, desc: &ConstraintDesc) -> Result<ConstraintId> {
        for body in [body_a, body_b] {
            if !self.contains(body) {
                return Err(SimError::MissingBody(body.id));
            }
        }
        let joint = match desc {
            ConstraintDesc::Pin { anchor_a, anchor_b } => {
                let joint = RevoluteJointBuilder::new()
                    .local_anchor1(vec2_to_point(*anchor_a))
                    .local_anchor2(vec2_to_point(*anchor_b))
                    .contacts_enabled(false)
                    .build();
                self.impulse_joints.insert(body_a.body_handle, body_b.body_handle, joint, true)
            }
        };
        Ok(self.record(ConstraintRecord {
            joint,
            body_a: body_a.body_handle,
            body_b: body_b.body_handle,
            anchor: None,
        }))
    }

    /// Constrain a point on `body` towards a world-space `target` with a spring.
    /// The world creates an invisible anchor body tagged `anchor_id` and
    /// removes it together with the constraint.
    pub fn tether(
        &mut self,
        body: &PhysicsBody,
        local_anchor: Vec2,
        target: Vec2,
        spring: SpringParams,
        kind: AnchorKind,
        anchor_id: BodyId,
    ) -> Result<ConstraintId> {
        if !self.contains(body) {
            return Err(SimError::MissingBody(body.id));
        }
        let builder = match kind {
            AnchorKind::Fixed => RigidBodyBuilder::fixed(),
            AnchorKind::Movable => RigidBodyBuilder::kinematic_position_based(),
        };
        let anchor = self.bodies.insert(
            builder
                .translation(vec2_to_na(target))
                .user_data(anchor_id.raw())
                .build(),
        );
        let joint = SpringJointBuilder::new(spring.rest_length, spring.stiffness, spring.damping)
            .local_anchor1(vec2_to_point(local_anchor))
            .local_anchor2(nalgebra::Point2::origin())
            .build();
        let joint = self.impulse_joints.insert(body.body_handle, anchor, joint, true);
        Ok(self.record(ConstraintRecord {
            joint,
            body_a: body.body_handle,
            body_b: anchor,
            anchor: Some(anchor),
        }))
    }

    /// Move the world-space end of a tether. Returns `false` if the
    /// constraint is unknown or has no anchor.
    pub fn set_tether_target(&mut self, id: ConstraintId, target: Vec2) -> bool {
        let Some(anchor) = self.constraints.get(&id).and_then(|c| c.anchor) else {
            return false;
        };
        let Some(rb) = self.bodies.get_mut(anchor) else {
            return false;
        };
        if rb.is_kinematic() {
            rb.set_next_kinematic_translation(vec2_to_na(target));
        } else {
            rb.set_translation(vec2_to_na(target), true);
        }
        true
    }

    /// World-space position of a tether's anchor.
    pub fn tether_target(&self, id: ConstraintId) -> Option<Vec2> {
        let anchor = self.constraints.get(&id)?.anchor?;
        self.bodies.get(anchor).map(|rb| na_to_vec2(rb.translation()))
    }

    /// Remove a constraint and its anchor body. Returns `false` if the id was unknown.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> bool {
        let Some(record) = self.constraints.remove(&id) else {
            return false;
        };
        self.drop_record(record);
        true
    }

    pub fn has_constraint(&self, id: ConstraintId) -> bool {
        self.constraints.contains_key(&id)
    }

    /// Drop every constraint whose joint or either body no longer exists.
    /// Returns the ids removed.
    pub fn validate_constraints(&mut self) -> Vec<ConstraintId> {
        let stale: Vec<ConstraintId> = self
            .constraints
            .iter()
            .filter(|(_, c)| {
                !self.impulse_joints.contains(c.joint)
                    || !self.bodies.contains(c.body_a)
                    || !self.bodies.contains(c.body_b)
            })
            .map(|(id, _)| *id)
            .collect();

        for id in &stale {
            if let Some(record) = self.constraints.remove(id) {
                log::warn!("dropping stale constraint {:?}", id);
                self.drop_record(record);
            }
        }
        stale
    }

    /// Number of constraints the world tracks.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Number of joints in the Rapier joint set.
    pub fn joint_count(&self) -> usize {
        self.impulse_joints.len()
    }

    // -- private helpers --

    fn record(&mut self, record: ConstraintRecord) -> ConstraintId {
        let id = ConstraintId(self.next_constraint);
        self.next_constraint += 1;
        self.constraints.insert(id, record);
        id
    }

    fn drop_record(&mut self, record: ConstraintRecord) {
        if self.impulse_joints.contains(record.joint) {
            self.impulse_joints.remove(record.joint, true);
        }
        if let Some(anchor) = record.anchor {
            self.remove_handle(anchor);
        }
    }

    fn remove_handle(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    fn collider_to_body(&self, collider_handle: ColliderHandle) -> Option<BodyId> {
        let collider = self.colliders.get(collider_handle)?;
        let body_handle = collider.parent()?;
        let body = self.bodies.get(body_handle)?;
        BodyId::from_raw(body.user_data)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
