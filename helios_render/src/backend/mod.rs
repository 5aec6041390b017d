//! Backend module - the full render backend contract
//!
//! Everything a caller needs to drive a backend without knowing which
//! native API is active: value types, resource manager traits, the
//! command abstraction, the `RenderBackend` trait and the registry.

// Module declarations
pub mod types;
pub mod vertex_layout;
pub mod uniform_layout;
pub mod buffer;
pub mod mesh;
pub mod shader;
pub mod uniform;
pub mod command;
pub mod draw_command;
pub mod render_backend;
pub mod registry;

#[cfg(test)]
pub mod mock_backend;

// Re-exports
pub use types::*;
pub use vertex_layout::*;
pub use uniform_layout::*;
pub use buffer::*;
pub use mesh::*;
pub use shader::*;
pub use uniform::*;
pub use command::*;
pub use draw_command::*;
pub use render_backend::*;
pub use registry::*;
