//! GL context and surface management (glutin + glow)

use std::ffi::CString;
use std::num::NonZeroU32;
use std::sync::Arc;

use glow::HasContext;
use glutin::config::ConfigTemplateBuilder;
use glutin::context::{
    ContextApi, ContextAttributesBuilder, NotCurrentGlContext, PossiblyCurrentContext, Version,
};
use glutin::display::{Display, DisplayApiPreference, GlDisplay};
use glutin::surface::{GlSurface, Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::window::Window;

use helios_render::{render_info, RenderError, RenderResult};

/// Owns the native GL objects: display, surface, current context and the
/// glow function table loaded from it.
pub struct GlContext {
    /// Loaded GL function table, shared with every resource
    pub gl: Arc<glow::Context>,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    /// Kept alive for the lifetime of the context
    _display: Display,
}

impl GlContext {
    /// Create a GL 3.3 core context on the window's surface
    pub fn new(window: &Window, width: u32, height: u32) -> RenderResult<Self> {
        let raw_display = window
            .display_handle()
            .map_err(|e| RenderError::InitializationFailed(format!("No display handle: {:?}", e)))?
            .as_raw();
        let raw_window = window
            .window_handle()
            .map_err(|e| RenderError::InitializationFailed(format!("No window handle: {:?}", e)))?
            .as_raw();

        let display = unsafe { Display::new(raw_display, DisplayApiPreference::Egl) }
            .map_err(|e| RenderError::InitializationFailed(format!("GL display: {}", e)))?;

        let template = ConfigTemplateBuilder::new()
            .with_depth_size(24)
            .build();
        let config = unsafe { display.find_configs(template) }
            .map_err(|e| RenderError::InitializationFailed(format!("GL configs: {}", e)))?
            .next()
            .ok_or_else(|| {
                RenderError::InitializationFailed("No matching GL config".to_string())
            })?;

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(raw_window));
        let not_current = unsafe { display.create_context(&config, &context_attributes) }
            .map_err(|e| RenderError::InitializationFailed(format!("GL context: {}", e)))?;

        let (surface_width, surface_height) = non_zero_extent(width, height)?;
        let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window,
            surface_width,
            surface_height,
        );
        let surface = unsafe { display.create_window_surface(&config, &surface_attributes) }
            .map_err(|e| RenderError::InitializationFailed(format!("GL surface: {}", e)))?;

        let context = not_current
            .make_current(&surface)
            .map_err(|e| RenderError::InitializationFailed(format!("make_current: {}", e)))?;

        // Vsync; failure here is harmless
        surface
            .set_swap_interval(&context, SwapInterval::Wait(NonZeroU32::MIN))
            .ok();

        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|name| display.get_proc_address(name))
        };

        let version = unsafe { gl.get_parameter_string(glow::VERSION) };
        render_info!("helios::gl", "Created OpenGL context: {}", version);

        Ok(Self {
            gl: Arc::new(gl),
            surface,
            context,
            _display: display,
        })
    }

    /// Resize the surface to match the framebuffer
    pub fn resize(&self, width: u32, height: u32) -> RenderResult<()> {
        let (width, height) = non_zero_extent(width, height)?;
        self.surface.resize(&self.context, width, height);
        Ok(())
    }

    /// Present the back buffer
    pub fn swap_buffers(&self) -> RenderResult<()> {
        self.surface
            .swap_buffers(&self.context)
            .map_err(|e| RenderError::BackendError(format!("swap_buffers: {}", e)))
    }

    /// Look up a GL extension function, for capability probing
    pub fn has_extension(&self, name: &str) -> bool {
        let Ok(cname) = CString::new(name) else {
            return false;
        };
        !self._display.get_proc_address(&cname).is_null()
    }
}

fn non_zero_extent(width: u32, height: u32) -> RenderResult<(NonZeroU32, NonZeroU32)> {
    match (NonZeroU32::new(width), NonZeroU32::new(height)) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(RenderError::InitializationFailed(format!(
            "Zero-sized surface extent {}x{}",
            width, height
        ))),
    }
}
