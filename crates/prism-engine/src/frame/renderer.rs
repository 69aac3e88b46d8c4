use std::sync::Arc;

use crate::device::{
    ClearColor, GraphicsDevice, PassEncoder, PipelineDesc, PresentationSurface, SchedulingHost,
};
use crate::error::{RenderError, Result};
use crate::layout::{UniformLayout, SCALE};
use crate::resource::{RandomPolicy, ResourcePool};

use super::tracker::SurfaceTracker;

/// Per-scene settings.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub object_count: usize,
    pub clear_color: ClearColor,
    /// Vertices per object draw; the bundled shader emits one triangle.
    pub vertex_count: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            object_count: 100,
            clear_color: ClearColor::default(),
            vertex_count: 3,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RendererState {
    Idle,
    FrameInFlight,
    Stopped,
}

/// Result of one [`FrameRenderer::tick`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TickOutcome {
    /// One command buffer with `draws` draw calls was submitted.
    Rendered { draws: usize },
    /// No image was available; nothing was drawn and the next tick was
    /// still requested.
    Skipped,
    /// The drawable has zero area. No tick was requested: the host must
    /// request one once it observes a resize.
    ZeroArea,
    /// The renderer is stopped; no further tick was requested.
    Stopped,
}

/// Drives the frame loop for one pool of objects sharing one pipeline.
///
/// Each [`tick`](Self::tick) runs to completion:
/// 1. reconfigure the surface if the drawable size changed
/// 2. recompute every object's aspect-corrected scale and flush its record
/// 3. record one pass: clear, bind the pipeline once, then one bind + draw per object
/// 4. submit the single command buffer, present, and request the next tick
///
/// All buffer writes of a tick are enqueued before its submission, so the
/// device sees every record update before any draw that reads it.
pub struct FrameRenderer<D: GraphicsDevice, S: PresentationSurface<D>> {
    pool: Option<ResourcePool<D>>,
    pipeline: Option<D::Pipeline>,
    tracker: SurfaceTracker,
    config: SceneConfig,
    state: RendererState,
    frames_submitted: u64,

    surface: S,
    device: D,
}

impl<D: GraphicsDevice, S: PresentationSurface<D>> FrameRenderer<D, S> {
    /// Builds the shared pipeline and populates the pool.
    ///
    /// The pipeline's uniform binding is sized from `layout`, whatever
    /// `pipeline.uniform_size` says. `layout` must declare a `scale` field,
    /// otherwise [`LayoutError::UnknownField`] is returned before any device
    /// resource is created. The drawable size is unknown until the first
    /// resize notification.
    ///
    /// [`LayoutError::UnknownField`]: crate::error::LayoutError::UnknownField
    pub fn start<P>(
        device: D,
        surface: S,
        pipeline: &PipelineDesc<'_>,
        layout: Arc<UniformLayout>,
        config: SceneConfig,
        policy: &mut P,
    ) -> Result<Self>
    where
        P: RandomPolicy + ?Sized,
    {
        layout.offset_of(SCALE)?;

        let desc = PipelineDesc {
            uniform_size: layout.total_size(),
            ..*pipeline
        };
        let pipeline = device.create_render_pipeline(&desc, surface.format())?;
        let pool = ResourcePool::populate(
            &device,
            config.object_count,
            layout,
            &pipeline,
            policy,
        )?;

        log::info!(
            "renderer started: {} objects, pipeline `{}`",
            pool.len(),
            desc.label
        );

        Ok(Self {
            pool: Some(pool),
            pipeline: Some(pipeline),
            tracker: SurfaceTracker::default(),
            config,
            state: RendererState::Idle,
            frames_submitted: 0,
            surface,
            device,
        })
    }

    /// Runs one frame and requests the next one.
    ///
    /// A lost device or a fatal surface error stops the renderer and is
    /// returned; no further tick is requested in that case. Neither is one
    /// while the drawable has zero area.
    pub fn tick<H>(&mut self, host: &H) -> Result<TickOutcome>
    where
        H: SchedulingHost + ?Sized,
    {
        if self.state == RendererState::Stopped {
            return Ok(TickOutcome::Stopped);
        }
        debug_assert_eq!(self.state, RendererState::Idle);

        if let Some(reason) = self.device.lost_reason() {
            log::error!("device lost; stopping frame loop: {reason}");
            self.stop();
            return Err(RenderError::DeviceLost(reason));
        }

        self.state = RendererState::FrameInFlight;
        match self.render_frame(host) {
            Ok(outcome) => {
                self.state = RendererState::Idle;
                if outcome != TickOutcome::ZeroArea {
                    host.request_next_tick();
                }
                Ok(outcome)
            }
            Err(err) => {
                log::error!("frame failed; stopping frame loop: {err}");
                self.stop();
                Err(err)
            }
        }
    }

    fn render_frame<H>(&mut self, host: &H) -> Result<TickOutcome>
    where
        H: SchedulingHost + ?Sized,
    {
        if let Some((width, height)) = self.tracker.take_pending_resize() {
            log::debug!("configuring surface for {width}x{height}");
            self.surface.configure(&self.device, width, height);
        }

        if self.tracker.is_zero_area() {
            log::debug!("drawable has zero area; waiting for a resize");
            return Ok(TickOutcome::ZeroArea);
        }

        let (Some(pipeline), Some(pool)) = (self.pipeline.as_ref(), self.pool.as_mut()) else {
            return Ok(TickOutcome::Stopped);
        };

        let aspect = self.tracker.current_aspect();
        for object in pool.iter_mut() {
            let scale = object.scale_for_aspect(aspect);
            object.write_scale(scale);
            object.flush(&self.device);
        }

        let Some(image) = self.surface.acquire(&self.device)? else {
            log::debug!("no drawable available; skipping tick");
            return Ok(TickOutcome::Skipped);
        };

        let mut encoder = self.device.create_command_encoder("prism frame encoder");
        {
            let mut pass =
                self.device
                    .begin_render_pass(&mut encoder, S::view(&image), self.config.clear_color);
            pass.set_pipeline(pipeline);
            for object in pool.iter() {
                pass.set_bind_group(0, object.bind_group());
                pass.draw(0..self.config.vertex_count);
            }
        }

        self.device.submit(encoder);
        host.before_present();
        self.surface.present(image);
        self.frames_submitted += 1;

        Ok(TickOutcome::Rendered { draws: pool.len() })
    }

    /// Stops the loop and releases the pool and pipeline.
    ///
    /// Work already submitted is left to drain. Idempotent.
    pub fn stop(&mut self) {
        if self.state == RendererState::Stopped {
            return;
        }
        self.state = RendererState::Stopped;

        let released = self.pool.take().map_or(0, |pool| pool.len());
        self.pipeline = None;

        log::info!(
            "renderer stopped after {} frames; released {released} objects",
            self.frames_submitted
        );
    }

    /// Forwards a logical-size resize notification to the tracker.
    pub fn on_resize(&mut self, logical_width: f64, logical_height: f64, scale_factor: f64) {
        self.tracker
            .on_resize(logical_width, logical_height, scale_factor);
    }

    /// Forwards a device-pixel resize notification to the tracker.
    ///
    /// The host requests the next tick itself after a resize; a renderer
    /// parked on [`TickOutcome::ZeroArea`] does not reschedule.
    pub fn on_physical_resize(&mut self, width: u32, height: u32) {
        self.tracker.on_physical_resize(width, height);
    }

    #[inline]
    pub fn state(&self) -> RendererState {
        self.state
    }

    #[inline]
    pub fn tracker(&self) -> &SurfaceTracker {
        &self.tracker
    }

    /// `None` once stopped.
    #[inline]
    pub fn pool(&self) -> Option<&ResourcePool<D>> {
        self.pool.as_ref()
    }

    #[inline]
    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    #[inline]
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}
