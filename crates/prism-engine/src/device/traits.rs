use std::ops::Range;

use crate::error::Result;

/// Background color a render pass clears to, straight RGBA.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClearColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl ClearColor {
    #[inline]
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::new(0.3, 0.3, 0.3, 1.0)
    }
}

/// Everything needed to build the shared render pipeline.
///
/// The shader itself is an opaque WGSL artifact; the pipeline exposes one
/// uniform buffer at group 0 / binding 0 whose minimum size is `uniform_size`.
#[derive(Debug, Clone, Copy)]
pub struct PipelineDesc<'a> {
    pub label: &'a str,
    pub shader_source: &'a str,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
    pub uniform_size: u64,
}

/// Device-side operations the core consumes.
///
/// Handles are owned values: dropping a `Buffer` or `BindGroup` releases it.
pub trait GraphicsDevice {
    type Buffer;
    type BindGroup;
    type Pipeline;
    type Format: Copy;
    type View;
    type Encoder;
    type Pass<'e>: PassEncoder<Self>
    where
        Self: 'e;

    /// Allocates a uniform-readable, copy-destination buffer of `size` bytes.
    fn create_uniform_buffer(&self, label: &str, size: u64) -> Result<Self::Buffer>;

    /// Binds `buffer` to group 0 / binding 0 of `pipeline`'s layout.
    fn create_bind_group(
        &self,
        label: &str,
        pipeline: &Self::Pipeline,
        buffer: &Self::Buffer,
    ) -> Result<Self::BindGroup>;

    fn create_render_pipeline(
        &self,
        desc: &PipelineDesc<'_>,
        format: Self::Format,
    ) -> Result<Self::Pipeline>;

    /// Enqueues a copy of `data` into `buffer` on the device queue.
    fn write_buffer(&self, buffer: &Self::Buffer, offset: u64, data: &[u8]);

    fn create_command_encoder(&self, label: &str) -> Self::Encoder;

    /// Begins a pass that clears `view` to `clear`. The pass ends when the
    /// returned value is dropped.
    fn begin_render_pass<'e>(
        &self,
        encoder: &'e mut Self::Encoder,
        view: &Self::View,
        clear: ClearColor,
    ) -> Self::Pass<'e>;

    /// Finishes `encoder` and submits it. Does not wait for completion.
    fn submit(&self, encoder: Self::Encoder);

    /// Reason the device was lost, once the loss has been reported.
    fn lost_reason(&self) -> Option<String>;
}

/// Commands recorded inside one render pass.
pub trait PassEncoder<D: GraphicsDevice + ?Sized> {
    fn set_pipeline(&mut self, pipeline: &D::Pipeline);
    fn set_bind_group(&mut self, index: u32, group: &D::BindGroup);
    fn draw(&mut self, vertices: Range<u32>);
}

/// The resizable output image frames are rendered into.
pub trait PresentationSurface<D: GraphicsDevice> {
    type Image;

    fn format(&self) -> D::Format;

    /// (Re)configures the surface for a `width` x `height` drawable.
    fn configure(&mut self, device: &D, width: u32, height: u32);

    /// Acquires the current draw target. `Ok(None)` means this tick should be
    /// skipped (surface outdated, timed out, ...).
    fn acquire(&mut self, device: &D) -> Result<Option<Self::Image>>;

    fn view(image: &Self::Image) -> &D::View;

    /// Hands the image back for display after its commands were submitted.
    fn present(&mut self, image: Self::Image);
}

/// The environment's "next frame" primitive.
pub trait SchedulingHost {
    /// Arranges for the frame loop to be ticked again.
    fn request_next_tick(&self);

    /// Called right before a submitted frame is presented.
    fn before_present(&self) {}
}

impl SchedulingHost for winit::window::Window {
    fn request_next_tick(&self) {
        self.request_redraw();
    }

    fn before_present(&self) {
        self.pre_present_notify();
    }
}
