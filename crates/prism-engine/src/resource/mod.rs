//! Per-object uniform resources.
//!
//! - [`ObjectResource`]: one object's record, buffer and bind group
//! - [`ResourcePool`]: the batch of objects drawn with one pipeline
//! - [`RandomPolicy`]: where initial colors, offsets and scales come from

mod object;
mod policy;
mod pool;

pub use object::ObjectResource;
pub use policy::{
    hue_to_rgb, FixedPolicy, HuePolicy, ObjectAttributes, RandomPolicy, OFFSET_RANGE, SCALE_RANGE,
};
pub use pool::ResourcePool;
