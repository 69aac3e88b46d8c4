use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::Result;
use crate::layout::UniformLayout;

use super::object::ObjectResource;
use super::policy::RandomPolicy;

/// Objects sharing one pipeline and one uniform layout.
///
/// Membership is fixed once [`populate`](Self::populate) returns. Iteration
/// order is creation order, which is also draw order.
pub struct ResourcePool<D: GraphicsDevice> {
    layout: Arc<UniformLayout>,
    objects: Vec<ObjectResource<D>>,
}

impl<D: GraphicsDevice> ResourcePool<D> {
    /// Eagerly creates `count` objects.
    ///
    /// All or nothing: if any allocation fails, every object created so far
    /// is released and the error is returned. There is no automatic retry.
    pub fn populate<P>(
        device: &D,
        count: usize,
        layout: Arc<UniformLayout>,
        pipeline: &D::Pipeline,
        policy: &mut P,
    ) -> Result<Self>
    where
        P: RandomPolicy + ?Sized,
    {
        let objects = (0..count)
            .map(|i| {
                ObjectResource::create(device, i, Arc::clone(&layout), pipeline, policy.attributes(i))
            })
            .collect::<Result<Vec<_>>>()
            .inspect_err(|e| log::error!("failed to populate {count} objects: {e}"))?;

        log::info!(
            "populated {count} objects ({} bytes of uniforms each)",
            layout.total_size()
        );

        Ok(Self { layout, objects })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[inline]
    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    /// Objects in creation order. Restartable: call again for a fresh pass.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, ObjectResource<D>> {
        self.objects.iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, ObjectResource<D>> {
        self.objects.iter_mut()
    }
}

impl<'a, D: GraphicsDevice> IntoIterator for &'a ResourcePool<D> {
    type Item = &'a ObjectResource<D>;
    type IntoIter = std::slice::Iter<'a, ObjectResource<D>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::mock::{MockDevice, MockPipeline};
    use crate::device::PipelineDesc;
    use crate::error::RenderError;
    use crate::resource::{HuePolicy, ObjectAttributes};

    fn setup(device: &MockDevice) -> (Arc<UniformLayout>, MockPipeline) {
        let layout = Arc::new(UniformLayout::color_scale_offset().unwrap());
        let pipeline = device
            .create_render_pipeline(
                &PipelineDesc {
                    label: "test",
                    shader_source: "",
                    vertex_entry: "vs",
                    fragment_entry: "fs",
                    uniform_size: layout.total_size(),
                },
                (),
            )
            .unwrap();
        (layout, pipeline)
    }

    #[test]
    fn populate_creates_count_objects_in_order() {
        let device = MockDevice::new();
        let (layout, pipeline) = setup(&device);
        let mut policy = |i: usize| ObjectAttributes {
            color: [i as f32, 0.0, 0.0, 1.0],
            offset: [0.0, 0.0],
            base_scale: 0.3,
        };

        let pool = ResourcePool::populate(&device, 5, layout, &pipeline, &mut policy).unwrap();
        assert_eq!(pool.len(), 5);

        let reds: Vec<f32> = pool.iter().map(|o| o.values()[0]).collect();
        assert_eq!(reds, vec![0.0, 1.0, 2.0, 3.0, 4.0]);

        // Restartable.
        assert_eq!(pool.iter().count(), 5);
        assert_eq!((&pool).into_iter().count(), 5);
    }

    #[test]
    fn populate_is_atomic() {
        let device = MockDevice::with_buffer_budget(7);
        let (layout, pipeline) = setup(&device);
        let mut policy = HuePolicy::seeded(3);

        let err = ResourcePool::populate(&device, 10, layout, &pipeline, &mut policy)
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::ResourceExhausted(_)));

        let j = device.journal.borrow();
        assert_eq!(j.live_buffers, 0);
        assert_eq!(j.live_bind_groups, 0);
        assert_eq!(j.released_buffers, 7);
        assert_eq!(j.released_bind_groups, 7);
    }

    #[test]
    fn populate_zero_is_empty() {
        let device = MockDevice::new();
        let (layout, pipeline) = setup(&device);
        let pool =
            ResourcePool::populate(&device, 0, layout, &pipeline, &mut HuePolicy::seeded(0)).unwrap();
        assert!(pool.is_empty());
    }

    #[test]
    fn dropping_pool_releases_every_handle() {
        let device = MockDevice::new();
        let (layout, pipeline) = setup(&device);
        let pool =
            ResourcePool::populate(&device, 100, layout, &pipeline, &mut HuePolicy::seeded(9))
                .unwrap();
        drop(pool);

        let j = device.journal.borrow();
        assert_eq!(j.released_buffers, 100);
        assert_eq!(j.released_bind_groups, 100);
        assert_eq!(j.live_buffers, 0);
        assert_eq!(j.live_bind_groups, 0);
    }
}
