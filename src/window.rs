// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `glow-triangle`.
//
// `glow-triangle` is free software: you can redistribute it and/or modify it under the
// terms of either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
//   version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `glow-triangle` is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE. See the GNU Lesser General Public License or the Mozilla Public License for more
// details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `glow-triangle`. If not, see <https://www.gnu.org/licenses/>.

//! Window, OpenGL context and event loop, through `glutin` and `winit`.

use crate::config::RenderConfig;
use crate::glow_backend::{GlError, GlowBackend};
use crate::renderer::{Renderer, RendererError};

use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{
    ContextApi, ContextAttributes, ContextAttributesBuilder, GlProfile, NotCurrentContext,
    PossiblyCurrentContext, Version,
};
use glutin::display::{Display, GetGlDisplay};
use glutin::prelude::*;
use glutin::surface::{Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};

use raw_window_handle::HasRawWindowHandle;

use std::error::Error;
use std::fmt;
use std::num::NonZeroU32;

use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent};
use winit::event_loop::{EventLoop, EventLoopWindowTarget};
use winit::window::{Window, WindowBuilder};

/// The renderer type driven by the window.
pub type GlRenderer = Renderer<GlowBackend<glow::Context>>;

/// A failure while creating the window or the context. None of these are recoverable.
#[derive(Debug)]
pub enum SetupError {
    /// No display or GL config could be created.
    Display(Box<dyn Error>),

    /// The display was created without a window.
    NoWindow,

    /// Neither an OpenGL 3.3 core nor an OpenGL ES 3.0 context could be created.
    Context(glutin::error::Error),

    /// The window surface could not be created.
    Surface(glutin::error::Error),

    /// The context could not be made current.
    MakeCurrent(glutin::error::Error),

    /// The renderer could not be set up on the loaded functions.
    Renderer(RendererError<GlError>),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::Display(err) => write!(f, "failed to create a display: {err}"),
            SetupError::NoWindow => f.write_str("failed to create a window"),
            SetupError::Context(err) => write!(f, "failed to create a GL context: {err}"),
            SetupError::Surface(err) => write!(f, "failed to create a window surface: {err}"),
            SetupError::MakeCurrent(err) => {
                write!(f, "failed to make the GL context current: {err}")
            }
            SetupError::Renderer(err) => write!(f, "failed to initialize OpenGL: {err}"),
        }
    }
}

impl Error for SetupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SetupError::Display(err) => Some(&**err),
            SetupError::NoWindow => None,
            SetupError::Context(err) | SetupError::Surface(err) | SetupError::MakeCurrent(err) => {
                Some(err)
            }
            SetupError::Renderer(err) => Some(err),
        }
    }
}

/// A window with a current OpenGL context and a renderer on top of it.
pub struct GlutinSetup {
    window: Window,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    renderer: GlRenderer,
}

fn make_window_builder(config: &RenderConfig) -> WindowBuilder {
    WindowBuilder::new()
        .with_title(config.title.clone())
        .with_inner_size(LogicalSize::new(config.width, config.height))
}

/// OpenGL 3.3 core first, OpenGL ES 3.0 as a fallback.
fn context_attributes(window: &Window) -> [ContextAttributes; 2] {
    let handle = Some(window.raw_window_handle());

    [
        ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
            .build(handle),
        ContextAttributesBuilder::new()
            .with_context_api(ContextApi::Gles(Some(Version::new(3, 0))))
            .build(handle),
    ]
}

fn create_context(
    display: &Display,
    gl_config: &Config,
    window: &Window,
) -> Result<NotCurrentContext, SetupError> {
    let [core, gles] = context_attributes(window);

    match unsafe { display.create_context(gl_config, &core) } {
        Ok(context) => Ok(context),
        Err(err) => {
            tracing::debug!("OpenGL 3.3 core context unavailable ({err}), trying OpenGL ES 3.0");
            unsafe { display.create_context(gl_config, &gles) }.map_err(SetupError::Context)
        }
    }
}

/// What a window event asks the event loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Exit,
    Resize(u32, u32),
    Ignore,
}

fn window_action(event: &WindowEvent<'_>) -> Action {
    match event {
        WindowEvent::Resized(size) => Action::Resize(size.width, size.height),
        WindowEvent::CloseRequested => Action::Exit,
        WindowEvent::KeyboardInput {
            input:
                KeyboardInput {
                    state: ElementState::Pressed,
                    virtual_keycode: Some(VirtualKeyCode::Escape),
                    ..
                },
            ..
        } => Action::Exit,
        _ => Action::Ignore,
    }
}

/// The surface can't be resized to an empty area, e.g. while minimized.
fn surface_size(width: u32, height: u32) -> Option<(NonZeroU32, NonZeroU32)> {
    Some((NonZeroU32::new(width)?, NonZeroU32::new(height)?))
}

impl GlutinSetup {
    /// Open the window, create the context and set up the renderer.
    ///
    /// Shader diagnostics are logged here and do not stop the setup.
    pub fn new<T>(
        event_loop: &EventLoopWindowTarget<T>,
        config: &RenderConfig,
    ) -> Result<Self, SetupError> {
        let display_builder =
            DisplayBuilder::new().with_window_builder(Some(make_window_builder(config)));

        // Prefer the config with the most samples.
        let (window, gl_config) = display_builder
            .build(event_loop, ConfigTemplateBuilder::new(), |configs| {
                configs
                    .reduce(|accum, config| {
                        if config.num_samples() > accum.num_samples() {
                            config
                        } else {
                            accum
                        }
                    })
                    // An empty list panics here; the picker has no way to report it.
                    .expect("no GL config matches the window")
            })
            .map_err(SetupError::Display)?;
        let window = window.ok_or(SetupError::NoWindow)?;

        tracing::debug!(
            samples = gl_config.num_samples(),
            hardware_accelerated = gl_config.hardware_accelerated(),
            api = ?gl_config.api(),
            "picked GL config"
        );

        let display = gl_config.display();
        let not_current = create_context(&display, &gl_config, &window)?;

        let attrs = window.build_surface_attributes(<_>::default());
        let surface = unsafe { display.create_window_surface(&gl_config, &attrs) }
            .map_err(SetupError::Surface)?;

        let context = not_current
            .make_current(&surface)
            .map_err(SetupError::MakeCurrent)?;

        if config.vsync {
            if let Err(err) =
                surface.set_swap_interval(&context, SwapInterval::Wait(NonZeroU32::MIN))
            {
                tracing::warn!("failed to enable vsync: {err}");
            }
        }

        let gl = load_glow(&display);

        // SAFETY: The context was made current above and stays current for the lifetime of
        // the renderer.
        let backend = unsafe { GlowBackend::new(gl) };
        let mut renderer = Renderer::new(backend, config).map_err(SetupError::Renderer)?;

        for diagnostic in renderer.shader_diagnostics() {
            tracing::error!("{diagnostic}");
        }

        // The framebuffer can be larger than the logical size on HiDPI screens.
        let size = window.inner_size();
        renderer.resize(size.width, size.height);

        Ok(Self {
            window,
            surface,
            context,
            renderer,
        })
    }

    /// Render until the window is closed or escape is pressed.
    pub fn run(self, event_loop: EventLoop<()>) -> ! {
        let Self {
            window,
            surface,
            context,
            renderer,
        } = self;

        // Taken out on exit, so GPU objects are deleted while the context is still current.
        let mut renderer = Some(renderer);

        event_loop.run(move |event, _, control_flow| {
            control_flow.set_poll();

            match event {
                Event::WindowEvent { event, window_id } if window_id == window.id() => {
                    match window_action(&event) {
                        Action::Resize(width, height) => {
                            if let Some((width, height)) = surface_size(width, height) {
                                surface.resize(&context, width, height);
                            }

                            if let Some(renderer) = renderer.as_mut() {
                                renderer.resize(width, height);
                            }
                        }
                        Action::Exit => control_flow.set_exit(),
                        Action::Ignore => (),
                    }
                }
                Event::MainEventsCleared => {
                    window.request_redraw();
                }
                Event::RedrawRequested(window_id) if window_id == window.id() => {
                    if let Some(renderer) = renderer.as_mut() {
                        renderer.draw_frame();
                    }

                    if let Err(err) = surface.swap_buffers(&context) {
                        tracing::error!("failed to swap buffers: {err}");
                        control_flow.set_exit_with_code(-1);
                    }
                }
                Event::LoopDestroyed => {
                    drop(renderer.take());
                    tracing::info!("window closed");
                }
                _ => (),
            }
        })
    }
}

fn load_glow(display: &Display) -> glow::Context {
    #[allow(unused_mut)]
    let mut gl = unsafe {
        glow::Context::from_loader_function_cstr(|s| display.get_proc_address(s) as *const _)
    };

    #[cfg(not(target_vendor = "apple"))]
    unsafe {
        use glow::HasContext;

        if gl.supports_debug() {
            gl.enable(glow::DEBUG_OUTPUT);
            gl.debug_message_callback(debug_message_callback);
        }
    }

    gl
}

#[cfg(not(target_vendor = "apple"))]
fn debug_message_callback(source: u32, ty: u32, id: u32, severity: u32, message: &str) {
    let source = match source {
        glow::DEBUG_SOURCE_API => "API",
        glow::DEBUG_SOURCE_WINDOW_SYSTEM => "Window System",
        glow::DEBUG_SOURCE_SHADER_COMPILER => "Shader Compiler",
        glow::DEBUG_SOURCE_THIRD_PARTY => "Third Party",
        glow::DEBUG_SOURCE_APPLICATION => "Application",
        glow::DEBUG_SOURCE_OTHER => "Other",
        _ => "Unknown",
    };

    let ty = match ty {
        glow::DEBUG_TYPE_ERROR => "Error",
        glow::DEBUG_TYPE_DEPRECATED_BEHAVIOR => "Deprecated Behavior",
        glow::DEBUG_TYPE_UNDEFINED_BEHAVIOR => "Undefined Behavior",
        glow::DEBUG_TYPE_PORTABILITY => "Portability",
        glow::DEBUG_TYPE_PERFORMANCE => "Performance",
        glow::DEBUG_TYPE_MARKER => "Marker",
        glow::DEBUG_TYPE_OTHER => "Other",
        _ => "Unknown",
    };

    match severity {
        glow::DEBUG_SEVERITY_HIGH => {
            tracing::error!("{ty}-{id} ({source}): {message}");
        }
        glow::DEBUG_SEVERITY_MEDIUM => {
            tracing::warn!("{ty}-{id} ({source}): {message}");
        }
        glow::DEBUG_SEVERITY_LOW => {
            tracing::info!("{ty}-{id} ({source}): {message}");
        }
        glow::DEBUG_SEVERITY_NOTIFICATION => {
            tracing::debug!("{ty}-{id} ({source}): {message}");
        }
        _ => (),
    };
}
