//! tinypack build utilities
//!
//! This crate packs a small browser game into a size-constrained archive. It
//! preprocesses the script and shader sources, emits a generated shader module,
//! renames symbols and graphics calls, re-encodes embedded song data, runs the
//! external minifiers and finally zips the output directory and reports its size.
//!
//! Debug builds skip every size optimization and keep the sources readable.

mod error;
mod minify;

pub mod directive;
pub mod gl_mangle;
pub mod manifest;
pub mod names;
pub mod package;
pub mod pipeline;
pub mod rename;
pub mod shaders;
pub mod song;
pub mod tool;

pub use error::{PackError, Result};
pub use manifest::{Constants, Manifest};
pub use minify::{CompressOptions, MinifyOptions, minify_js};
pub use pipeline::run;

/// Whether a run keeps the sources readable or optimizes for size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Debug,
    Minified,
}

/// The three script bundles of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bundle {
    /// Runs in the browser; inlined into the HTML page
    Client,
    /// Loaded by both sides; exports `$`-prefixed globals
    Shared,
    Server,
}

impl Bundle {
    /// File name in the source root and in the output directory
    pub fn file_name(self) -> &'static str {
        match self {
            Bundle::Client => "client.js",
            Bundle::Shared => "shared.js",
            Bundle::Server => "server.js",
        }
    }
}
