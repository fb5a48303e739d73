use std::sync::Arc;

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::{
    config::{RendererConfig, SceneDescription},
    gfx::{
        camera::{camera_controller::window_center, CameraController, KeyboardState},
        rendering::RenderEngine,
        resources::ImageFileDecoder,
        scene::{LoadContext, LoadError, Model, Scene, Skybox},
    },
};

/// Window, event loop and the renderer driving one scene
pub struct DeferredApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: RendererConfig,
    description: SceneDescription,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    scene: Option<Scene>,
    keys: KeyboardState,
    controller: CameraController,
    /// Setup failure reported by [`DeferredApp::run`] after the loop exits
    fatal: Option<anyhow::Error>,
}

impl DeferredApp {
    pub fn new(config: RendererConfig, description: SceneDescription) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("failed to create event loop")?;
        let controller = CameraController::new(config.move_speed, config.look_sensitivity);

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                description,
                window: None,
                render_engine: None,
                scene: None,
                keys: KeyboardState::new(),
                controller,
                fatal: None,
            },
        })
    }

    /// Run the application (consumes self and starts the event loop)
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .context("event loop terminated abnormally")?;

        match self.app_state.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn initialize(&mut self, window: Arc<Window>) -> anyhow::Result<()> {
        let render_engine = pollster::block_on(RenderEngine::new(window.clone(), &self.config))
            .context("failed to initialize the renderer")?;
        let scene = build_scene(&render_engine, &self.config, &self.description)
            .context("failed to load the scene")?;

        window.set_cursor_visible(false);
        self.recenter_cursor(&window);

        self.render_engine = Some(render_engine);
        self.scene = Some(scene);
        self.window = Some(window);
        Ok(())
    }

    /// Warps the cursor back to the window centre, which cursor-offset look
    /// depends on
    fn recenter_cursor(&mut self, window: &Window) {
        if let Err(err) = window.set_cursor_position(window_center(window.inner_size())) {
            log::debug!("cursor cannot be re-centred: {err}");
            self.controller.cursor_warp_failed();
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        self.keys.process_key_event(event);
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }

        match event.physical_key {
            PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
            PhysicalKey::Code(KeyCode::F1) => {
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.toggle_debug_view();
                }
            }
            _ => {}
        }
    }
}

/// Loads every model of `description` against the engine's device and layouts
pub fn build_scene(
    render_engine: &RenderEngine,
    config: &RendererConfig,
    description: &SceneDescription,
) -> Result<Scene, LoadError> {
    let gpu = render_engine.gpu();
    let decoder = ImageFileDecoder;
    let ctx = LoadContext {
        device: &gpu.device,
        queue: &gpu.queue,
        layouts: render_engine.layouts(),
        decoder: &decoder,
    };

    let mut scene = Scene::new(config.eye, config.light);
    for model in &description.models {
        scene.add_object(Model::load(&model.path, model.transform, &ctx)?);
    }
    if let Some(marker) = &description.light_marker {
        scene.set_light_marker(Model::load(&marker.path, marker.transform, &ctx)?);
    }
    if let Some(faces) = &description.skybox {
        scene.set_skybox(Skybox::load(
            &gpu.device,
            &gpu.queue,
            render_engine.layouts(),
            &decoder,
            faces,
        )?);
    }

    log::info!(
        "scene ready: {} drawables, skybox {}",
        scene.drawable_count(),
        if scene.skybox.is_some() { "on" } else { "off" }
    );
    Ok(scene)
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.fatal.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(self.config.window_title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ))
            .with_resizable(false);

        let result = event_loop
            .create_window(attributes)
            .context("failed to create window")
            .and_then(|window| self.initialize(Arc::new(window)));
        if let Err(err) = result {
            self.fail(event_loop, err);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            WindowEvent::CursorMoved { position, .. } => {
                let (Some(window), Some(scene)) = (self.window.clone(), self.scene.as_mut())
                else {
                    return;
                };
                self.controller
                    .process_cursor(position, window.inner_size(), &mut scene.eye);
                self.recenter_cursor(&window);
            }
            // the window is fixed-size; targets are never rebuilt
            WindowEvent::Resized(_) => {}
            WindowEvent::RedrawRequested => {
                let (Some(render_engine), Some(scene)) =
                    (self.render_engine.as_mut(), self.scene.as_mut())
                else {
                    return;
                };
                scene.update(&self.keys, &self.controller);
                render_engine.render_frame(scene);
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let DeviceEvent::MouseMotion { delta } = event else {
            return;
        };
        let (Some(window), Some(scene)) = (self.window.as_ref(), self.scene.as_mut()) else {
            return;
        };
        self.controller
            .process_mouse_motion(delta, window.inner_size(), &mut scene.eye);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
