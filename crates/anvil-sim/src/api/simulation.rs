//! The animation driver: owns every subsystem and runs one frame per admitted tick.

use glam::Vec2;

use crate::api::config::SimConfig;
use crate::api::error::{Result, SimError};
use crate::api::types::{PageFrame, Viewport};
use crate::core::physics::{CollisionPair, PhysicsWorld};
use crate::core::scene::Scene;
use crate::core::time::FrameLimiter;
use crate::input::queue::{InputEvent, InputQueue};
use crate::renderer::painter::{draw_overlay, draw_scene, FrameView};
use crate::renderer::surface::Surface;
use crate::systems::collision::CollisionReactor;
use crate::systems::effects::ParticleEngine;
use crate::systems::interaction::InteractionController;

/// Where the driver is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriverState {
    /// Waiting out the startup delay.
    Starting { resume_at_ms: f64 },
    Running,
    /// Letting a rebuilt scene settle.
    Recovering { resume_at_ms: f64 },
}

/// What a call to [`Simulation::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Too soon after the previous frame.
    Throttled,
    /// Still starting up or settling.
    Waiting,
    Advanced,
    /// The frame failed and the scene was rebuilt.
    Rebuilt,
}

pub struct Simulation {
    config: SimConfig,
    viewport: Viewport,
    page: PageFrame,
    world: PhysicsWorld,
    scene: Scene,
    interaction: InteractionController,
    reactor: CollisionReactor,
    particles: ParticleEngine,
    input: InputQueue,
    limiter: FrameLimiter,
    state: DriverState,
    /// Reused across frames.
    collisions: Vec<CollisionPair>,
}

impl Simulation {
    pub fn new(config: SimConfig, viewport: Viewport, now_ms: f64) -> Result<Self> {
        let mut world = Self::fresh_world(&config);
        let scene = Scene::build(&mut world, viewport)?;
        log::info!("simulation created, starting in {} ms", config.startup_delay_ms);
        Ok(Self {
            viewport,
            page: PageFrame::from_viewport(viewport),
            world,
            scene,
            interaction: InteractionController::new(config.freeze_delay_ms, config.status_revert_ms),
            reactor: CollisionReactor::new(),
            particles: ParticleEngine::new(&config),
            input: InputQueue::new(),
            limiter: FrameLimiter::new(config.frame_interval_ms),
            state: DriverState::Starting { resume_at_ms: now_ms + config.startup_delay_ms },
            collisions: Vec::new(),
            config,
        })
    }

    fn fresh_world(config: &SimConfig) -> PhysicsWorld {
        let mut world = PhysicsWorld::new(config.gravity);
        world.set_dt(config.fixed_dt);
        world
    }

    /// Queue a pointer or reset event for the next frame.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Update where the canvas sits on the page and how large the page viewport is.
    pub fn set_page_frame(&mut self, page: PageFrame) {
        self.page = page;
    }

    /// Advance the simulation if a frame is due at `now_ms`.
    pub fn tick(&mut self, now_ms: f64) -> TickOutcome {
        if !self.limiter.admit(now_ms) {
            return TickOutcome::Throttled;
        }

        match self.state {
            DriverState::Starting { resume_at_ms } | DriverState::Recovering { resume_at_ms }
                if now_ms < resume_at_ms =>
            {
                return TickOutcome::Waiting;
            }
            DriverState::Starting { .. } => {
                if let Err(e) = self.scene.verify(&self.world) {
                    log::warn!("scene invalid at startup: {}", e);
                    self.rebuild(now_ms);
                    return TickOutcome::Rebuilt;
                }
                self.interaction.touch(now_ms);
                self.state = DriverState::Running;
                log::info!("simulation running");
            }
            DriverState::Recovering { .. } => {
                self.interaction.touch(now_ms);
                self.state = DriverState::Running;
            }
            DriverState::Running => {}
        }

        match self.frame(now_ms) {
            Ok(()) => TickOutcome::Advanced,
            Err(e) => {
                log::warn!("frame failed, rebuilding scene: {}", e);
                self.rebuild(now_ms);
                TickOutcome::Rebuilt
            }
        }
    }

    fn frame(&mut self, now_ms: f64) -> Result<()> {
        for event in self.input.drain() {
            self.apply_input(event, now_ms);
        }

        self.interaction.check_idle_freeze(&mut self.world, &self.scene, now_ms);

        let removed = self.world.validate_constraints();
        self.interaction.forget_constraints(&removed);
        self.scene.verify(&self.world)?;
        self.guard_geometry()?;

        // Impact intensity uses the velocity the head had going into the contact.
        let head_velocity = self.world.velocity(&self.scene.head);
        self.collisions.clear();
        self.world.step_into(&mut self.collisions)?;
        let dt = self.world.dt();
        for pair in &self.collisions {
            self.reactor.on_contact(pair, head_velocity, dt);
        }

        self.guard_geometry()?;

        if self.scene.hammer_out_of_bounds(&self.world, self.config.bounds_margin) {
            log::warn!("hammer left the canvas, resetting");
            self.reset();
        }

        let impacts = self.reactor.drain();
        if !impacts.is_empty() {
            let origin = Vec2::new(
                self.world.body_position(&self.scene.head).0.x,
                self.scene.anvil_top(&self.world),
            );
            for speed in impacts {
                self.particles.emit(speed, origin);
            }
        }

        self.particles.tick(self.viewport, self.page);
        Ok(())
    }

    fn apply_input(&mut self, event: InputEvent, now_ms: f64) {
        match event {
            InputEvent::PointerDown { x, y } => {
                self.interaction.pointer_down(&mut self.world, &self.scene, Vec2::new(x, y), now_ms)
            }
            InputEvent::PointerMove { x, y } => self.interaction.pointer_move(&mut self.world, Vec2::new(x, y)),
            InputEvent::PointerUp { .. } => self.interaction.pointer_up(&mut self.world, now_ms),
            InputEvent::PointerLeave => self.interaction.pointer_leave(&mut self.world, &self.scene, now_ms),
            InputEvent::Reset => self.reset(),
        }
    }

    /// Recover the hammer in place when it went non-finite. Any other body
    /// going non-finite fails the frame.
    fn guard_geometry(&mut self) -> Result<()> {
        match self.scene.first_non_finite(&self.world) {
            None => Ok(()),
            Some(id) if id.is_hammer() => {
                log::warn!("{:?} went non-finite, moving hammer to safe positions", id);
                self.interaction.recover_invalid_geometry(&mut self.world, &self.scene);
                Ok(())
            }
            Some(id) => Err(SimError::NonFinite(id)),
        }
    }

    /// Re-centre the hammer and clear in-canvas sparks without rebuilding.
    /// The hammer keeps its frozen state.
    pub fn reset(&mut self) {
        self.interaction.reset_hammer(&mut self.world, &self.scene);
        self.particles.clear_sparks();
        self.reactor.clear();
    }

    /// Replace the world and scene wholesale, keeping global sparks.
    fn rebuild(&mut self, now_ms: f64) {
        let mut world = Self::fresh_world(&self.config);
        let scene = match Scene::build(&mut world, self.viewport) {
            Ok(scene) => scene,
            Err(e) => {
                log::error!("rebuild failed, retrying after settle: {}", e);
                self.state = DriverState::Recovering { resume_at_ms: now_ms + self.config.settle_delay_ms };
                return;
            }
        };
        self.world = world;
        self.scene = scene;
        self.interaction.abandon_drag();
        self.interaction.force_freeze(&mut self.world, &self.scene);
        self.particles.clear_sparks();
        self.reactor.clear();
        self.collisions.clear();
        self.state = DriverState::Recovering { resume_at_ms: now_ms + self.config.settle_delay_ms };
        log::info!("scene rebuilt");
    }

    /// Snapshot of the main canvas contents at `now_ms`.
    pub fn frame_view(&self, now_ms: f64) -> FrameView<'_> {
        FrameView {
            viewport: self.viewport,
            anvil: self.world.body_position(&self.scene.anvil).0,
            handle: self.world.body_position(&self.scene.handle),
            head: self.world.body_position(&self.scene.head),
            sparks: self.particles.sparks(),
            status: self.interaction.status(now_ms),
        }
    }

    /// Paint the canvas and the page overlay.
    pub fn draw(&self, canvas: &mut dyn Surface, overlay: &mut dyn Surface, now_ms: f64) {
        draw_scene(canvas, &self.frame_view(now_ms));
        draw_overlay(overlay, self.particles.globals());
    }

    /// Tear everything down.
    pub fn destroy(self) {
        let (sparks, globals) = (self.particles.spark_count(), self.particles.global_count());
        let world = self.dismantle();
        log::info!(
            "simulation destroyed ({} sparks, {} global sparks dropped, {} bodies left)",
            sparks,
            globals,
            world.body_count()
        );
    }

    /// Release the drag and remove every scene body and constraint.
    fn dismantle(self) -> PhysicsWorld {
        let Self { mut world, scene, mut interaction, .. } = self;
        interaction.end_drag(&mut world);
        scene.teardown(&mut world);
        world
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn particles(&self) -> &ParticleEngine {
        &self.particles
    }

    #[cfg(test)]
    pub(crate) fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    #[cfg(test)]
    pub(crate) fn particles_mut(&mut self) -> &mut ParticleEngine {
        &mut self.particles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::BodyId;
    use crate::core::scene::{FRESH_BODY_COUNT, FRESH_CONSTRAINT_COUNT};
    use crate::renderer::status::Status;
    use crate::renderer::surface::recording::RecordingSurface;
    use crate::systems::effects::{Rng, Spark};

    const VP: Viewport = Viewport { width: 400.0, height: 300.0 };
    const FRAME: f64 = 17.0;

    fn running() -> (Simulation, f64) {
        let mut sim = Simulation::new(SimConfig::default(), VP, 0.0).unwrap();
        assert_eq!(sim.tick(500.0), TickOutcome::Advanced);
        (sim, 500.0)
    }

    fn run_until(sim: &mut Simulation, mut now: f64, until: f64) -> f64 {
        while now < until {
            now += FRAME;
            sim.tick(now);
        }
        now
    }

    fn spark_at(pos: Vec2) -> Spark {
        let mut rng = Rng::new(3);
        let mut spark = Spark::from_impact(Vec2::new(200.0, 240.0), 4.0, &mut rng);
        spark.pos = pos;
        spark.vel = Vec2::ZERO;
        spark
    }

    fn add_global(sim: &mut Simulation) {
        let page = PageFrame::from_viewport(VP);
        sim.particles_mut().push_spark(spark_at(Vec2::new(-300.0, 100.0)));
        sim.particles_mut().tick(VP, page);
        assert_eq!(sim.particles().global_count(), 1);
    }

    #[test]
    fn waits_out_startup_delay() {
        let mut sim = Simulation::new(SimConfig::default(), VP, 0.0).unwrap();
        assert!(matches!(sim.state(), DriverState::Starting { .. }));
        assert_eq!(sim.tick(0.0), TickOutcome::Waiting);
        assert_eq!(sim.tick(250.0), TickOutcome::Waiting);
        assert_eq!(sim.tick(500.0), TickOutcome::Advanced);
        assert_eq!(sim.state(), DriverState::Running);
    }

    #[test]
    fn fresh_scene_counts() {
        let sim = Simulation::new(SimConfig::default(), VP, 0.0).unwrap();
        assert_eq!(sim.world().body_count(), FRESH_BODY_COUNT);
        assert_eq!(sim.world().constraint_count(), FRESH_CONSTRAINT_COUNT);
    }

    #[test]
    fn throttles_fast_ticks() {
        let (mut sim, now) = running();
        assert_eq!(sim.tick(now + 5.0), TickOutcome::Throttled);
        assert_eq!(sim.tick(now + 16.0), TickOutcome::Throttled);
        assert_eq!(sim.tick(now + 17.0), TickOutcome::Advanced);
    }

    #[test]
    fn freezes_after_idle_delay() {
        let (mut sim, now) = running();
        let now = run_until(&mut sim, now, 2400.0);
        assert!(!sim.interaction().is_frozen());
        run_until(&mut sim, now, 2700.0);
        assert!(sim.interaction().is_frozen());
        assert!(sim.world().is_static(&sim.scene().head));
    }

    #[test]
    fn drag_through_input_queue() {
        let mut sim = Simulation::new(SimConfig::default(), VP, 0.0).unwrap();
        // No steps run while starting, so the head is still at its home position.
        sim.push_input(InputEvent::PointerDown { x: 260.0, y: 120.0 });
        assert_eq!(sim.tick(500.0), TickOutcome::Advanced);
        assert!(sim.interaction().is_dragging());
        assert_eq!(sim.world().constraint_count(), FRESH_CONSTRAINT_COUNT + 1);
        assert_eq!(sim.interaction().status(500.0), Status::Dragging);

        sim.push_input(InputEvent::PointerMove { x: 300.0, y: 80.0 });
        sim.push_input(InputEvent::PointerUp { x: 300.0, y: 80.0 });
        assert_eq!(sim.tick(520.0), TickOutcome::Advanced);
        assert!(!sim.interaction().is_dragging());
        assert_eq!(sim.world().constraint_count(), FRESH_CONSTRAINT_COUNT);
        assert_eq!(sim.world().body_count(), FRESH_BODY_COUNT);
    }

    #[test]
    fn pointer_leave_freezes() {
        let (mut sim, now) = running();
        sim.push_input(InputEvent::PointerLeave);
        sim.tick(now + FRAME);
        assert!(sim.interaction().is_frozen());
        assert_eq!(sim.interaction().status(now + FRAME), Status::FrozenPointerLeft);
    }

    #[test]
    fn missing_body_triggers_rebuild() {
        let (mut sim, now) = running();
        add_global(&mut sim);
        sim.particles_mut().push_spark(spark_at(Vec2::new(200.0, 200.0)));
        let anvil = sim.scene().anvil;
        sim.world_mut().remove_body(&anvil);

        let now = now + FRAME;
        assert_eq!(sim.tick(now), TickOutcome::Rebuilt);
        assert_eq!(sim.world().body_count(), FRESH_BODY_COUNT);
        assert_eq!(sim.world().constraint_count(), FRESH_CONSTRAINT_COUNT);
        assert!(sim.interaction().is_frozen());
        assert_eq!(sim.particles().spark_count(), 0);
        assert_eq!(sim.particles().global_count(), 1);
        assert_eq!(sim.state(), DriverState::Recovering { resume_at_ms: now + 100.0 });

        assert_eq!(sim.tick(now + 50.0), TickOutcome::Waiting);
        assert_eq!(sim.tick(now + 100.0), TickOutcome::Advanced);
        assert_eq!(sim.state(), DriverState::Running);
    }

    #[test]
    fn removed_handle_drops_its_constraints_and_rebuilds() {
        let mut sim = Simulation::new(SimConfig::default(), VP, 0.0).unwrap();
        sim.push_input(InputEvent::PointerDown { x: 200.0, y: 120.0 });
        assert_eq!(sim.tick(500.0), TickOutcome::Advanced);
        assert!(sim.interaction().is_dragging());

        let handle = sim.scene().handle;
        sim.world_mut().remove_body(&handle);
        assert_eq!(sim.tick(520.0), TickOutcome::Rebuilt);
        assert!(!sim.interaction().is_dragging());
        assert_eq!(sim.world().body_count(), FRESH_BODY_COUNT);
        assert_eq!(sim.world().constraint_count(), FRESH_CONSTRAINT_COUNT);
    }

    #[test]
    fn invalid_timestep_rebuilds_every_frame() {
        let config = SimConfig { fixed_dt: 0.0, ..SimConfig::default() };
        let mut sim = Simulation::new(config, VP, 0.0).unwrap();
        assert_eq!(sim.tick(500.0), TickOutcome::Rebuilt);
        assert_eq!(sim.tick(600.0), TickOutcome::Rebuilt);
        assert_eq!(sim.world().body_count(), FRESH_BODY_COUNT);
    }

    #[test]
    fn non_finite_hammer_recovers_in_place() {
        let (mut sim, now) = running();
        let head = sim.scene().head;
        sim.world_mut().set_velocity(&head, Vec2::new(f32::NAN, 0.0));

        assert_eq!(sim.tick(now + FRAME), TickOutcome::Advanced);
        assert_eq!(sim.state(), DriverState::Running);
        assert!(sim.interaction().is_frozen());
        assert_eq!(sim.scene().first_non_finite(sim.world()), None);
        let (pos, _) = sim.world().body_position(&head);
        assert!((pos - Vec2::new(240.0, 120.0)).length() < 0.01);
    }

    #[test]
    fn non_finite_anvil_rebuilds() {
        let (mut sim, now) = running();
        let anvil = sim.scene().anvil;
        sim.world_mut().set_position(&anvil, Vec2::new(f32::NAN, 260.0), 0.0);
        assert_eq!(sim.tick(now + FRAME), TickOutcome::Rebuilt);
        assert_eq!(sim.scene().first_non_finite(sim.world()), None);
    }

    #[test]
    fn out_of_bounds_hammer_is_reset() {
        let (mut sim, now) = running();
        sim.particles_mut().push_spark(spark_at(Vec2::new(200.0, 200.0)));
        let (handle, head) = (sim.scene().handle, sim.scene().head);
        sim.world_mut().set_position(&handle, Vec2::new(-500.0, -500.0), 0.0);
        sim.world_mut().set_position(&head, Vec2::new(-440.0, -500.0), 0.0);

        assert_eq!(sim.tick(now + FRAME), TickOutcome::Advanced);
        let (pos, _) = sim.world().body_position(&handle);
        assert!((pos - Scene::handle_home(VP)).length() < 0.01);
        assert_eq!(sim.particles().spark_count(), 0);
    }

    #[test]
    fn reset_event_recenters_and_keeps_globals() {
        let (mut sim, now) = running();
        add_global(&mut sim);
        sim.particles_mut().push_spark(spark_at(Vec2::new(200.0, 200.0)));

        sim.push_input(InputEvent::Reset);
        sim.tick(now + FRAME);
        assert_eq!(sim.particles().spark_count(), 0);
        assert_eq!(sim.particles().global_count(), 1);
        assert!(!sim.interaction().is_frozen());
        assert_eq!(sim.world().body_count(), FRESH_BODY_COUNT);
    }

    #[test]
    fn reset_keeps_frozen_hammer_frozen() {
        let (mut sim, now) = running();
        sim.push_input(InputEvent::PointerLeave);
        sim.tick(now + FRAME);
        assert!(sim.interaction().is_frozen());

        sim.push_input(InputEvent::Reset);
        let mut t = now + FRAME;
        for _ in 0..30 {
            t += FRAME;
            assert_eq!(sim.tick(t), TickOutcome::Advanced);
        }
        assert!(sim.interaction().is_frozen());
        let head = sim.scene().head;
        assert!(sim.world().is_static(&head));
        let (pos, angle) = sim.world().body_position(&head);
        assert!((pos - Scene::head_home(VP)).length() < 0.01, "head stayed home, got {:?}", pos);
        assert_eq!(angle, 0.0);

        sim.reset();
        assert!(sim.interaction().is_frozen());
    }

    #[test]
    fn head_strike_emits_sparks_in_the_contact_frame() {
        let (mut sim, mut now) = running();
        let scene = sim.scene().clone();
        scene.place_hammer(sim.world_mut(), Vec2::new(140.0, 200.0), Vec2::new(200.0, 200.0));
        for body in scene.hammer() {
            sim.world_mut().set_velocity(&body, Vec2::new(0.0, 600.0));
        }

        let mut struck = false;
        for _ in 0..30 {
            now += FRAME;
            assert_eq!(sim.tick(now), TickOutcome::Advanced);
            let contact = sim
                .collisions
                .iter()
                .any(|p| p.started && p.involves(BodyId::Head, BodyId::Anvil));
            if sim.particles().spark_count() == 0 {
                assert!(!contact, "contact at {} produced no sparks", now);
                continue;
            }
            assert!(contact, "sparks appeared at {} without a head/anvil contact", now);
            for spark in sim.particles().sparks() {
                assert_eq!(spark.trail.len(), 1, "advanced exactly once");
                assert!(spark.life >= 1.0 - 0.04 - 1e-4 && spark.life < 1.0);
                let origin = spark.trail.iter().next().unwrap().pos;
                assert!((240.0..=248.0 + 1e-3).contains(&origin.y), "emitted at the anvil top, got {:?}", origin);
            }
            struck = true;
            break;
        }
        assert!(struck, "head never reached the anvil");
    }

    #[test]
    fn dismantle_mid_drag_empties_the_world() {
        let (mut sim, now) = running();
        sim.push_input(InputEvent::PointerDown { x: 260.0, y: 120.0 });
        sim.tick(now + FRAME);
        assert!(sim.interaction().is_dragging());

        let world = sim.dismantle();
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.constraint_count(), 0);
        assert_eq!(world.joint_count(), 0);
    }

    #[test]
    fn draw_paints_canvas_and_overlay() {
        let (mut sim, now) = running();
        add_global(&mut sim);
        let mut canvas = RecordingSurface::new(VP.size());
        let mut overlay = RecordingSurface::new(Vec2::new(1280.0, 800.0));
        sim.draw(&mut canvas, &mut overlay, now);
        assert_eq!(canvas.texts(), vec!["Hammer Ready"]);
        assert!(overlay.circles() >= 1);
        assert_eq!(canvas.depth(), 0);
        assert_eq!(overlay.depth(), 0);
    }

    #[test]
    fn hammer_bodies_are_the_only_movers() {
        let (mut sim, now) = running();
        let anvil = sim.scene().anvil;
        let before = sim.world().body_position(&anvil).0;
        run_until(&mut sim, now, 1000.0);
        assert_eq!(sim.world().body_position(&anvil).0, before);
        assert!(BodyId::Head.is_hammer() && !BodyId::Anvil.is_hammer());
    }
}
