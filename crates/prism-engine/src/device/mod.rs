//! GPU device seam and its wgpu implementation.
//!
//! The frame loop only talks to the traits in this module:
//! - [`GraphicsDevice`] / [`PassEncoder`] for buffers, bind groups, pipelines and command recording
//! - [`PresentationSurface`] for the drawable being rendered into
//! - [`SchedulingHost`] for the "next frame" callback
//!
//! [`init_gpu`] is the bootstrap collaborator that acquires a real adapter,
//! device and window surface.

mod gpu;
mod init;
mod traits;

#[cfg(test)]
pub(crate) mod mock;

pub use gpu::{init_gpu, Gpu, GpuPipeline, GpuSurface, SurfaceImage};
pub use init::GpuInit;
pub use traits::{
    ClearColor, GraphicsDevice, PassEncoder, PipelineDesc, PresentationSurface, SchedulingHost,
};
