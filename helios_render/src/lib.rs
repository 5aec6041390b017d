/*!
# Helios Render

Core traits and types for the Helios render backend abstraction.

This crate provides the platform-agnostic rendering contract using trait-based
dynamic polymorphism. Backend implementations (OpenGL, Vulkan) live in their
own crates and are registered with a [`BackendRegistry`] at startup.

## Architecture

- **RenderBackend**: frame lifecycle, draw submission, sub-manager ownership
- **BufferManager / ShaderManager / UniformManager**: resource factories
- **RenderCommandQueue / RenderCommandBuffer**: command recording
- **BackendRegistry**: backend registration and priority-based auto-detection

Backend crates provide concrete types that implement these traits.
*/

// Internal modules
mod error;
pub mod log;
pub mod backend;

pub use error::{RenderError, RenderResult};
pub use backend::*;

// Re-export math library at crate root
pub use glam;
