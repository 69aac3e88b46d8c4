use std::ops::Range;
use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::Result;
use crate::layout::{UniformLayout, COLOR, OFFSET, SCALE};

use super::policy::ObjectAttributes;

/// One drawable instance: CPU-side uniform record, device buffer and the
/// bind group tying that buffer to group 0 / binding 0 of the pipeline.
///
/// The buffer and bind group are owned together and released together when
/// the object is dropped.
///
/// Only the scale field changes after creation. Color and offset are written
/// once by [`create`](Self::create).
pub struct ObjectResource<D: GraphicsDevice> {
    layout: Arc<UniformLayout>,
    values: Vec<f32>,
    scale_slot: Option<Range<usize>>,
    base_scale: f32,

    buffer: D::Buffer,
    bind_group: D::BindGroup,
}

impl<D: GraphicsDevice> ObjectResource<D> {
    /// Allocates the record, its device buffer and bind group, then fills
    /// color and offset from `attributes`.
    ///
    /// Fields the layout does not declare are skipped, so one attribute set
    /// serves every layout variant.
    pub fn create(
        device: &D,
        index: usize,
        layout: Arc<UniformLayout>,
        pipeline: &D::Pipeline,
        attributes: ObjectAttributes,
    ) -> Result<Self> {
        let buffer =
            device.create_uniform_buffer(&format!("uniforms for obj: {index}"), layout.total_size())?;
        let bind_group =
            device.create_bind_group(&format!("bind group for obj: {index}"), pipeline, &buffer)?;

        let mut values = vec![0.0; layout.scalar_count()];
        if let Some(field) = layout.field(COLOR) {
            copy_into(&mut values, field.range(), &attributes.color);
        }
        if let Some(field) = layout.field(OFFSET) {
            copy_into(&mut values, field.range(), &attributes.offset);
        }
        let scale_slot = layout.field(SCALE).map(|f| f.range());

        log::trace!(
            "object {index}: color {:?} offset {:?} base scale {}",
            attributes.color,
            attributes.offset,
            attributes.base_scale
        );

        Ok(Self {
            layout,
            values,
            scale_slot,
            base_scale: attributes.base_scale,
            buffer,
            bind_group,
        })
    }

    /// Updates the scale field of the CPU-side record only.
    ///
    /// The device copy is refreshed by the next [`flush`](Self::flush).
    pub fn write_scale(&mut self, scale: [f32; 2]) {
        if let Some(slot) = self.scale_slot.clone() {
            copy_into(&mut self.values, slot, &scale);
        }
    }

    /// Enqueues a copy of the whole record into the device buffer.
    ///
    /// Must be called before the draw that reads this object is recorded.
    pub fn flush(&self, device: &D) {
        device.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&self.values));
    }

    /// Aspect-corrected scale: the horizontal axis is divided by `aspect`.
    #[inline]
    pub fn scale_for_aspect(&self, aspect: f32) -> [f32; 2] {
        [self.base_scale / aspect, self.base_scale]
    }

    #[inline]
    pub fn base_scale(&self) -> f32 {
        self.base_scale
    }

    /// CPU-side record in layout order.
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    #[inline]
    pub fn bind_group(&self) -> &D::BindGroup {
        &self.bind_group
    }

    #[inline]
    pub fn buffer(&self) -> &D::Buffer {
        &self.buffer
    }
}

fn copy_into(values: &mut [f32], slot: Range<usize>, src: &[f32]) {
    let len = slot.len().min(src.len());
    values[slot.start..slot.start + len].copy_from_slice(&src[..len]);
}
