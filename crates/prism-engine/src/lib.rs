//! Prism engine crate.
//!
//! Draws a fixed set of triangles, each with its own uniform record, buffer
//! and bind group, through one shared pipeline. The frame loop is generic
//! over the GPU seam in [`device`]; [`window`] wires it to wgpu and winit.

pub mod device;
pub mod error;
pub mod frame;
pub mod layout;
pub mod resource;
pub mod window;

pub mod logging;
pub mod render;

pub use error::{LayoutError, RenderError, Result};
