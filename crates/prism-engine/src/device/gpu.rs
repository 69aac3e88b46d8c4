use std::ops::Range;
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use winit::window::Window;

use super::traits::{ClearColor, GraphicsDevice, PassEncoder, PipelineDesc, PresentationSurface};
use super::GpuInit;
use crate::error::RenderError;

/// Logical device + queue behind the [`GraphicsDevice`] seam.
///
/// Device loss is reported by wgpu on an arbitrary thread; the callback only
/// fills `lost`, which the frame loop polls at the start of every tick.
pub struct Gpu {
    device: wgpu::Device,
    queue: wgpu::Queue,
    limits: wgpu::Limits,
    lost: Arc<OnceLock<String>>,
}

/// Pipeline plus the bind group layout objects bind their uniforms against.
pub struct GpuPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

/// Window surface (swapchain) and its active configuration.
///
/// Surface lifetime is tied to the window; architecture must ensure the window
/// outlives the `GpuSurface` instance.
pub struct GpuSurface<'w> {
    surface: wgpu::Surface<'w>,
    config: wgpu::SurfaceConfiguration,
}

/// An acquired swapchain image.
///
/// Short-lived: holding it prevents acquisition of subsequent frames.
pub struct SurfaceImage {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// Creates the device, queue and window surface.
///
/// Adapter/device acquisition is asynchronous under wgpu; it is driven to
/// completion with `pollster` since this runs once, before the first frame.
pub fn init_gpu<'w>(window: &'w Window, init: GpuInit) -> Result<(Gpu, GpuSurface<'w>)> {
    pollster::block_on(init_gpu_async(window, init))
}

async fn init_gpu_async<'w>(window: &'w Window, init: GpuInit) -> Result<(Gpu, GpuSurface<'w>)> {
    let size = window.inner_size();

    let GpuInit {
        prefer_srgb,
        present_mode,
        alpha_mode,
        power_preference,
        required_features,
        required_limits,
        desired_maximum_frame_latency,
    } = init;

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let surface = instance
        .create_surface(window)
        .context("failed to create wgpu surface")?;

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        })
        .await
        .context("failed to find a suitable GPU adapter")?;

    let info = adapter.get_info();
    log::info!("using adapter {} ({:?})", info.name, info.backend);

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("prism device"),
            required_features,
            required_limits,
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")?;

    let lost = Arc::new(OnceLock::new());
    {
        let lost = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            log::error!("device lost ({reason:?}): {message}");
            let _ = lost.set(format!("{reason:?}: {message}"));
        });
    }

    let caps = surface.get_capabilities(&adapter);
    let format = choose_surface_format(&caps, prefer_srgb).context("no supported surface formats")?;

    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode,
        alpha_mode: choose_alpha_mode(&caps, alpha_mode),
        view_formats: vec![],
        desired_maximum_frame_latency,
    };

    // Configured lazily by the frame loop once the first size is observed.
    let limits = device.limits();

    Ok((
        Gpu {
            device,
            queue,
            limits,
            lost,
        },
        GpuSurface { surface, config },
    ))
}

impl Gpu {
    fn max_uniform_size(&self) -> u64 {
        u64::from(self.limits.max_uniform_buffer_binding_size).min(self.limits.max_buffer_size)
    }

    /// Runs `create` inside an out-of-memory error scope.
    ///
    /// Popping blocks until the device has processed the call; creation only
    /// happens while the pool is populated, never per frame.
    fn catch_out_of_memory<T>(
        &self,
        label: &str,
        create: impl FnOnce() -> T,
    ) -> crate::error::Result<T> {
        let scope = self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let value = create();
        match exhausted(label, pollster::block_on(scope.pop())) {
            Some(err) => Err(err),
            None => Ok(value),
        }
    }
}

impl GraphicsDevice for Gpu {
    type Buffer = wgpu::Buffer;
    type BindGroup = wgpu::BindGroup;
    type Pipeline = GpuPipeline;
    type Format = wgpu::TextureFormat;
    type View = wgpu::TextureView;
    type Encoder = wgpu::CommandEncoder;
    type Pass<'e> = wgpu::RenderPass<'e>;

    fn create_uniform_buffer(&self, label: &str, size: u64) -> crate::error::Result<wgpu::Buffer> {
        if let Some(reason) = self.lost_reason() {
            return Err(RenderError::DeviceLost(reason));
        }
        let max = self.max_uniform_size();
        if size > max {
            return Err(RenderError::ResourceExhausted(format!(
                "{label}: {size} bytes exceeds the {max}-byte uniform binding limit"
            )));
        }

        self.catch_out_of_memory(label, || {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        })
    }

    fn create_bind_group(
        &self,
        label: &str,
        pipeline: &GpuPipeline,
        buffer: &wgpu::Buffer,
    ) -> crate::error::Result<wgpu::BindGroup> {
        if let Some(reason) = self.lost_reason() {
            return Err(RenderError::DeviceLost(reason));
        }

        self.catch_out_of_memory(label, || {
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &pipeline.bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            })
        })
    }

    fn create_render_pipeline(
        &self,
        desc: &PipelineDesc<'_>,
        format: wgpu::TextureFormat,
    ) -> crate::error::Result<GpuPipeline> {
        let min_binding_size = wgpu::BufferSize::new(desc.uniform_size).ok_or_else(|| {
            RenderError::ResourceExhausted(format!("{}: zero-sized uniform record", desc.label))
        })?;

        let shader = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.shader_source.into()),
        });

        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("prism object bgl"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: Some(min_binding_size),
                        },
                        count: None,
                    }],
                });

        let pipeline_layout =
            self.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("prism pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(desc.vertex_entry),
                compilation_options: Default::default(),
                buffers: &[],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(desc.fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Ok(GpuPipeline {
            pipeline,
            bind_group_layout,
        })
    }

    fn write_buffer(&self, buffer: &wgpu::Buffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer, offset, data);
    }

    fn create_command_encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }

    fn begin_render_pass<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        clear: ClearColor,
    ) -> wgpu::RenderPass<'e> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("prism frame pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: clear.r,
                        g: clear.g,
                        b: clear.b,
                        a: clear.a,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }

    fn submit(&self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn lost_reason(&self) -> Option<String> {
        self.lost.get().cloned()
    }
}

impl PassEncoder<Gpu> for wgpu::RenderPass<'_> {
    fn set_pipeline(&mut self, pipeline: &GpuPipeline) {
        wgpu::RenderPass::set_pipeline(self, &pipeline.pipeline);
    }

    fn set_bind_group(&mut self, index: u32, group: &wgpu::BindGroup) {
        wgpu::RenderPass::set_bind_group(self, index, group, &[]);
    }

    fn draw(&mut self, vertices: Range<u32>) {
        wgpu::RenderPass::draw(self, vertices, 0..1);
    }
}

impl PresentationSurface<Gpu> for GpuSurface<'_> {
    type Image = SurfaceImage;

    fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// wgpu does not support configuring a surface with a 0x0 size; callers
    /// skip zero-area sizes.
    fn configure(&mut self, gpu: &Gpu, width: u32, height: u32) {
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&gpu.device, &self.config);
    }

    fn acquire(&mut self, gpu: &Gpu) -> crate::error::Result<Option<SurfaceImage>> {
        let texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated; reconfiguring");
                self.surface.configure(&gpu.device, &self.config);
                return Ok(None);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(RenderError::ResourceExhausted(
                    "out of memory acquiring surface texture".into(),
                ));
            }
            Err(err @ (wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other)) => {
                log::debug!("skipping frame: {err}");
                return Ok(None);
            }
        };

        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Some(SurfaceImage { texture, view }))
    }

    fn view(image: &SurfaceImage) -> &wgpu::TextureView {
        &image.view
    }

    fn present(&mut self, image: SurfaceImage) {
        let SurfaceImage { texture, view } = image;
        drop(view);
        texture.present();
    }
}

/// Maps an error caught by an out-of-memory scope to `ResourceExhausted`.
fn exhausted(label: &str, caught: Option<wgpu::Error>) -> Option<RenderError> {
    caught.map(|err| {
        log::error!("{label}: allocation failed: {err}");
        RenderError::ResourceExhausted(format!("{label}: {err}"))
    })
}

fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = caps.formats.first().copied()?;

    if prefer_srgb {
        return caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .or(Some(first));
    }

    // Non-sRGB: uniform colors reach the swapchain unconverted.
    caps.formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or(Some(first))
}

fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_memory_becomes_resource_exhausted() {
        let caught = wgpu::Error::OutOfMemory {
            source: Box::new(std::io::Error::other("vram full")),
        };
        let err = exhausted("uniforms for obj: 7", Some(caught));
        match err {
            Some(RenderError::ResourceExhausted(msg)) => {
                assert!(msg.starts_with("uniforms for obj: 7"));
            }
            other => panic!("expected ResourceExhausted, got {other:?}"),
        }
    }

    #[test]
    fn clean_scope_is_not_an_error() {
        assert!(exhausted("bind group for obj: 0", None).is_none());
    }
}
