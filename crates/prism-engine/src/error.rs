//! Error taxonomy for the per-object uniform core.
//!
//! Bootstrap and runtime plumbing use `anyhow`; everything below the
//! [`GraphicsDevice`](crate::device::GraphicsDevice) seam reports one of these
//! typed errors so callers can tell a programming error from a device failure.

use thiserror::Error;

/// A malformed uniform field layout.
///
/// Always a programming error: surfaced while the layout is built and never
/// recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("uniform layout has no fields")]
    Empty,

    #[error("uniform field `{0}` is declared more than once")]
    DuplicateField(String),

    #[error("uniform field `{name}` has {components} components; expected 1 to 4")]
    ComponentCount { name: String, components: u32 },

    #[error("uniform field `{name}` would start at byte {offset}, which is not {align}-byte aligned")]
    Misaligned { name: String, offset: u64, align: u64 },

    #[error("record alignment {0} is not a power-of-two multiple of 4 bytes")]
    Alignment(u64),

    #[error("uniform layout has no field named `{0}`")]
    UnknownField(String),
}

/// Errors raised by resource creation and the frame loop.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Device memory or handle allocation failed. Fatal for the object or
    /// pool being created; never retried.
    #[error("device resources exhausted: {0}")]
    ResourceExhausted(String),

    /// The device became unusable. The frame loop stops; re-acquiring a
    /// device is left to the bootstrap layer.
    #[error("graphics device lost: {0}")]
    DeviceLost(String),
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
