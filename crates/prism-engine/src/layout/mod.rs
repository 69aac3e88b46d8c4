//! Uniform record layouts.
//!
//! A layout maps field names to scalar offsets inside one object's uniform
//! record and fixes the record's byte size.

mod uniform;

pub use uniform::{
    UniformField, UniformLayout, COLOR, OFFSET, SCALAR_SIZE, SCALE, UNIFORM_ALIGNMENT,
};
