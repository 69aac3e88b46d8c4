use std::sync::Arc;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::device::{init_gpu, Gpu, GpuInit, GpuSurface};
use crate::error::LayoutError;
use crate::frame::{FrameRenderer, SceneConfig, TickOutcome};
use crate::layout::UniformLayout;
use crate::render::{pipeline_desc, ShaderVariant};
use crate::resource::RandomPolicy;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "prism".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
        }
    }
}

/// What the window draws: object count and clear color, fragment variant,
/// record layout, and where each object's initial attributes come from.
pub struct SceneSetup {
    pub scene: SceneConfig,
    pub variant: ShaderVariant,
    pub layout: UniformLayout,
    pub policy: Box<dyn RandomPolicy>,
}

impl SceneSetup {
    /// Scene using the color/scale/offset record.
    pub fn new(
        scene: SceneConfig,
        variant: ShaderVariant,
        policy: Box<dyn RandomPolicy>,
    ) -> Result<Self, LayoutError> {
        Ok(Self {
            scene,
            variant,
            layout: UniformLayout::color_scale_offset()?,
            policy,
        })
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window and renders `setup` into it until the window closes,
    /// the renderer stops, or a frame fails.
    pub fn run(config: RuntimeConfig, gpu_init: GpuInit, setup: SceneSetup) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, setup);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    renderer: FrameRenderer<Gpu, GpuSurface<'this>>,
}

fn start_renderer<'w>(
    window: &'w Window,
    gpu_init: GpuInit,
    setup: &mut SceneSetup,
) -> Result<FrameRenderer<Gpu, GpuSurface<'w>>> {
    let (gpu, surface) = init_gpu(window, gpu_init)?;
    let layout = Arc::new(setup.layout.clone());
    let desc = pipeline_desc(setup.variant, &layout);

    let mut renderer = FrameRenderer::start(
        gpu,
        surface,
        &desc,
        layout,
        setup.scene.clone(),
        setup.policy.as_mut(),
    )
    .context("failed to start renderer")?;

    let size = window.inner_size();
    renderer.on_physical_resize(size.width, size.height);
    Ok(renderer)
}

struct AppState {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    setup: SceneSetup,

    entry: Option<WindowEntry>,
    failure: Option<anyhow::Error>,
    exit_requested: bool,
}

impl AppState {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, setup: SceneSetup) -> Self {
        Self {
            config,
            gpu_init,
            setup,
            entry: None,
            failure: None,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure.get_or_insert(err);
        self.request_exit(event_loop);
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let setup = &mut self.setup;

        let entry = WindowEntryTryBuilder {
            window,
            renderer_builder: |w| start_renderer(w, gpu_init, setup),
        }
        .try_build()?;

        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);
        Ok(())
    }

    fn destroy_window_entry(&mut self) {
        if let Some(mut entry) = self.entry.take() {
            entry.with_renderer_mut(|r| r.stop());
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e.context("failed to create initial window"));
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Redraws are requested by the renderer itself after each tick.
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                self.destroy_window_entry();
                self.request_exit(event_loop);
            }

            // A scale-factor change is followed by `Resized` with the new
            // physical size, so it needs no handling of its own.
            WindowEvent::Resized(size) => {
                entry.with_mut(|fields| {
                    fields.renderer.on_physical_resize(size.width, size.height);
                    fields.window.request_redraw();
                });
            }

            WindowEvent::RedrawRequested => {
                let outcome = entry.with_mut(|fields| fields.renderer.tick(fields.window));
                match outcome {
                    Ok(TickOutcome::Stopped) => {
                        self.destroy_window_entry();
                        self.request_exit(event_loop);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        self.destroy_window_entry();
                        self.fail(event_loop, anyhow::Error::new(e).context("frame loop stopped"));
                    }
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.destroy_window_entry();
    }
}
