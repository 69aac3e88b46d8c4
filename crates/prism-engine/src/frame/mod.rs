//! Frame loop: drawable-size tracking and the per-tick render state machine.

mod renderer;
mod tracker;

pub use renderer::{FrameRenderer, RendererState, SceneConfig, TickOutcome};
pub use tracker::SurfaceTracker;
