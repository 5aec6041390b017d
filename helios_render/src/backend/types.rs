//! Shared value types: capabilities, configuration, stats, viewport state

/// Static capability description of an initialized backend
///
/// Produced once during `RenderBackend::initialize()` and read-only
/// afterwards. Callers that pre-allocate per-frame resources key them off
/// `max_frames_in_flight`.
#[derive(Debug, Clone, Copy)]
pub struct BackendCapabilities {
    /// Compute shader support
    pub compute_shaders: bool,
    /// Multi-draw-indirect support
    pub multi_draw_indirect: bool,
    /// Bindless texture support
    pub bindless_textures: bool,
    /// Maximum size of a single uniform buffer in bytes
    pub max_uniform_buffer_size: u64,
    /// Maximum texture dimension in texels
    pub max_texture_size: u32,
    /// Number of frames the CPU may run ahead of the GPU
    pub max_frames_in_flight: u32,
}

impl Default for BackendCapabilities {
    fn default() -> Self {
        Self {
            compute_shaders: false,
            multi_draw_indirect: false,
            bindless_textures: false,
            max_uniform_buffer_size: 16 * 1024,
            max_texture_size: 2048,
            max_frames_in_flight: 1,
        }
    }
}

/// Backend configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Application name
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Helios Application".to_string(),
            app_version: (1, 0, 0),
        }
    }
}

/// Per-frame rendering statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderStats {
    /// Number of draw calls this frame
    pub draw_calls: u32,
    /// Number of triangles drawn this frame
    pub triangles: u32,
}

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// 2D rectangle
#[derive(Debug, Clone, Copy)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy)]
pub enum ClearValue {
    /// Color clear value (RGBA)
    Color([f32; 4]),
    /// Depth/stencil clear value
    DepthStencil { depth: f32, stencil: u32 },
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 16-bit indices (max 65535 vertices)
    U16,
    /// 32-bit indices (max ~4 billion vertices)
    U32,
}

impl IndexType {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}
