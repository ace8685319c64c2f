use glam::Vec2;

use crate::api::error::{Result, SimError};
use crate::api::types::{BodyId, Viewport};
use crate::core::physics::{
    AnchorKind, BodyDesc, ColliderDesc, ColliderMaterial, ConstraintDesc, ConstraintId,
    PhysicsBody, PhysicsWorld, SpringParams,
};

/// Half extents of the hammer handle (120×8).
pub const HANDLE_HALF: Vec2 = Vec2::new(60.0, 4.0);
pub const HEAD_RADIUS: f32 = 15.0;
/// Where the head is pinned, in handle-local coordinates.
pub const HEAD_OFFSET: Vec2 = Vec2::new(60.0, 0.0);
/// How far above the viewport centre the hammer starts.
pub const HAMMER_LIFT: f32 = 30.0;
/// Half extents of the anvil (100×40).
pub const ANVIL_HALF: Vec2 = Vec2::new(50.0, 20.0);
/// Distance from the bottom edge to the anvil centre.
pub const ANVIL_INSET: f32 = 40.0;
pub const WALL_THICKNESS: f32 = 20.0;

/// Bodies in a freshly built world: hammer (2), anvil, walls (4), tether anchor.
pub const FRESH_BODY_COUNT: usize = 8;
/// Constraints in a freshly built world: head link and centre tether.
pub const FRESH_CONSTRAINT_COUNT: usize = 2;

pub const TETHER_SPRING: SpringParams = SpringParams { rest_length: 0.0, stiffness: 160.0, damping: 2.0 };

const HANDLE_MATERIAL: ColliderMaterial = ColliderMaterial { restitution: 0.3, friction: 0.1, density: 0.001 };
const HEAD_MATERIAL: ColliderMaterial = ColliderMaterial { restitution: 0.4, friction: 0.1, density: 0.01 };

/// Every body and constraint making up the hammer-and-anvil scene.
#[derive(Debug, Clone)]
pub struct Scene {
    pub viewport: Viewport,
    pub handle: PhysicsBody,
    pub head: PhysicsBody,
    pub anvil: PhysicsBody,
    /// Top, bottom, left, right.
    pub walls: [PhysicsBody; 4],
    /// Pin between the handle tip and the head.
    pub link: ConstraintId,
    /// Soft spring from the handle centre to the viewport centre.
    pub tether: ConstraintId,
}

impl Scene {
    /// Lay out the hammer, anvil and walls for `viewport` inside `world`.
    pub fn build(world: &mut PhysicsWorld, viewport: Viewport) -> Result<Self> {
        let (w, h) = (viewport.width, viewport.height);
        let handle_pos = Self::handle_home(viewport);

        let handle = world.create_body(
            BodyId::Handle,
            &BodyDesc::dynamic(ColliderDesc::Cuboid { half_width: HANDLE_HALF.x, half_height: HANDLE_HALF.y })
                .with_position(handle_pos)
                .with_linear_damping(3.0)
                .with_angular_damping(3.0),
            HANDLE_MATERIAL,
        );
        let head = world.create_body(
            BodyId::Head,
            &BodyDesc::dynamic(ColliderDesc::Ball { radius: HEAD_RADIUS })
                .with_position(handle_pos + HEAD_OFFSET)
                .with_linear_damping(0.6)
                .with_angular_damping(0.6)
                .with_ccd(true),
            HEAD_MATERIAL,
        );

        let link = world.link(
            &handle,
            &head,
            &ConstraintDesc::Pin { anchor_a: HEAD_OFFSET, anchor_b: Vec2::ZERO },
        )?;
        let tether = world.tether(
            &handle,
            Vec2::ZERO,
            viewport.center(),
            TETHER_SPRING,
            AnchorKind::Fixed,
            BodyId::TetherAnchor,
        )?;

        let anvil = world.create_body(
            BodyId::Anvil,
            &BodyDesc::fixed(ColliderDesc::Cuboid { half_width: ANVIL_HALF.x, half_height: ANVIL_HALF.y })
                .with_position(Vec2::new(w / 2.0, h - ANVIL_INSET)),
            ColliderMaterial::default(),
        );

        let half_t = WALL_THICKNESS / 2.0;
        let horizontal = ColliderDesc::Cuboid { half_width: w / 2.0, half_height: half_t };
        let vertical = ColliderDesc::Cuboid { half_width: half_t, half_height: h / 2.0 };
        let mut wall = |id: BodyId, shape: ColliderDesc, pos: Vec2| {
            world.create_body(id, &BodyDesc::fixed(shape).with_position(pos), ColliderMaterial::default())
        };
        let walls = [
            wall(BodyId::WallTop, horizontal, Vec2::new(w / 2.0, -half_t)),
            wall(BodyId::WallBottom, horizontal, Vec2::new(w / 2.0, h + half_t)),
            wall(BodyId::WallLeft, vertical, Vec2::new(-half_t, h / 2.0)),
            wall(BodyId::WallRight, vertical, Vec2::new(w + half_t, h / 2.0)),
        ];

        log::info!("scene built for {}x{}", w, h);
        Ok(Self { viewport, handle, head, anvil, walls, link, tether })
    }

    /// Remove every body and constraint this scene created.
    pub fn teardown(self, world: &mut PhysicsWorld) {
        world.remove_constraint(self.link);
        world.remove_constraint(self.tether);
        for body in self.bodies() {
            world.remove_body(&body);
        }
    }

    /// Fail with `MissingBody` if any scene body is gone from the world.
    pub fn verify(&self, world: &PhysicsWorld) -> Result<()> {
        match self.bodies().into_iter().find(|b| !world.contains(b)) {
            Some(missing) => Err(SimError::MissingBody(missing.id)),
            None => Ok(()),
        }
    }

    /// First body whose state holds a NaN or infinity.
    pub fn first_non_finite(&self, world: &PhysicsWorld) -> Option<BodyId> {
        self.bodies().into_iter().find(|b| !world.is_finite(b)).map(|b| b.id)
    }

    /// Whether either hammer part left the viewport by more than `margin`.
    pub fn hammer_out_of_bounds(&self, world: &PhysicsWorld, margin: f32) -> bool {
        self.hammer()
            .iter()
            .any(|b| !self.viewport.contains_with_margin(world.body_position(b).0, margin))
    }

    /// Teleport the hammer, level and motionless. The head is placed where given,
    /// so the link snaps it back if the two positions disagree.
    pub fn place_hammer(&self, world: &mut PhysicsWorld, handle_pos: Vec2, head_pos: Vec2) {
        world.set_position(&self.handle, handle_pos, 0.0);
        world.set_position(&self.head, head_pos, 0.0);
        for body in self.hammer() {
            world.set_velocity(&body, Vec2::ZERO);
            world.set_angular_velocity(&body, 0.0);
        }
    }

    /// Starting handle position for a viewport.
    pub fn handle_home(viewport: Viewport) -> Vec2 {
        Vec2::new(viewport.width / 2.0, viewport.height / 2.0 - HAMMER_LIFT)
    }

    pub fn head_home(viewport: Viewport) -> Vec2 {
        Self::handle_home(viewport) + HEAD_OFFSET
    }

    /// Fallback positions used after the hammer's state went non-finite.
    pub fn safe_positions(viewport: Viewport) -> (Vec2, Vec2) {
        (
            Vec2::new(viewport.width * 0.5, viewport.height * 0.4),
            Vec2::new(viewport.width * 0.6, viewport.height * 0.4),
        )
    }

    /// Y coordinate of the anvil's striking face.
    pub fn anvil_top(&self, world: &PhysicsWorld) -> f32 {
        world.body_position(&self.anvil).0.y - ANVIL_HALF.y
    }

    pub fn hammer(&self) -> [PhysicsBody; 2] {
        [self.handle, self.head]
    }

    pub fn bodies(&self) -> [PhysicsBody; 7] {
        let [top, bottom, left, right] = self.walls;
        [self.handle, self.head, self.anvil, top, bottom, left, right]
    }
}
