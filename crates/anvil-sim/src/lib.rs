pub mod api;
pub mod core;
pub mod systems;
pub mod renderer;
pub mod input;

// Re-export key types at crate root for convenience
pub use api::config::SimConfig;
pub use api::error::{Result, SimError};
pub use api::simulation::{DriverState, Simulation, TickOutcome};
pub use api::types::{BodyId, PageFrame, Viewport};
pub use self::core::physics::{
    AnchorKind, BodyDesc, BodyType, ColliderDesc, ColliderMaterial, CollisionPair,
    ConstraintDesc, ConstraintId, PhysicsBody, PhysicsWorld, SpringParams,
};
pub use self::core::scene::Scene;
pub use self::core::startup::{Readiness, Retry, RetryPolicy};
pub use self::core::time::FrameLimiter;
pub use input::queue::{InputEvent, InputQueue};
pub use renderer::{Paint, Rect, Rgba, Shadow, Status, Surface, TextAlign, TextBaseline, TextStyle};
pub use systems::collision::CollisionReactor;
pub use systems::effects::{BinaryParticle, GlobalSpark, ParticleEngine, Rng, Spark, SparkColor};
pub use systems::interaction::InteractionController;
