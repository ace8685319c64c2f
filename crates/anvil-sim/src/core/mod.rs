pub mod physics;
pub mod scene;
pub mod startup;
pub mod time;
