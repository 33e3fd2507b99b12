//! Shader packing
//!
//! This module discovers the shader tree, resolves the include graph between
//! shader files and generates one JS module declaring every shader as a string,
//! optionally running each file through the external GLSL minifier first.

mod minify;
mod pack;
mod registry;

pub use minify::minify_glsl;
pub use pack::{PackedShaders, pack_shaders};
pub use registry::{ShaderEntry, ShaderRegistry, variable_name};
