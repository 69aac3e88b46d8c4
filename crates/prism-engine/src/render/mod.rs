//! Shader artifact and pipeline descriptions.
//!
//! Every scene draws the same triangle from `vs_main`; variants differ only in
//! which fragment entry point colors it.

mod pipeline;

pub use pipeline::{pipeline_desc, ShaderVariant, OBJECT_WGSL};
