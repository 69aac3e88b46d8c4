//! Window + event loop.
//!
//! Owns the `winit` EventLoop and Window and drives one [`FrameRenderer`]
//! from redraw requests.
//!
//! [`FrameRenderer`]: crate::frame::FrameRenderer

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, SceneSetup};
