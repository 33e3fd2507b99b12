//! GLSL minification through the external shader minifier.

use super::ShaderEntry;
use crate::error::{PackError, Result};
use crate::tool::ToolCommand;
use std::ffi::OsString;
use std::path::Path;

/// Minifies one shader file and returns the tool's JS output.
///
/// External names are preserved so the uniforms, attributes and varyings the game
/// code binds to survive; the shader's exported functions are excluded from
/// renaming so other shaders can still call them.
///
/// # Arguments
///
/// * `tool` - Command line of the shader minifier.
/// * `cwd` - Directory the tool runs in (the project root).
/// * `entry` - The shader to minify.
pub fn minify_glsl(tool: &ToolCommand, cwd: &Path, entry: &ShaderEntry) -> Result<String> {
    let output = tempfile::Builder::new()
        .prefix("tinypack-shader")
        .suffix(".js")
        .tempfile()
        .map_err(|e| PackError::io(std::env::temp_dir(), e))?;

    let mut args: Vec<OsString> = vec!["--preserve-externals".into()];
    if !entry.exported_functions.is_empty() {
        args.push("--no-renaming-list".into());
        args.push(entry.exported_functions.join(",").into());
    }
    let io_args: [OsString; 5] = ["--format".into(), "js".into(), entry.path.clone().into_os_string(), "-o".into(), output.path().into()];
    args.extend(io_args);

    tool.run(cwd, &args)?;

    std::fs::read_to_string(output.path()).map_err(|e| PackError::io(output.path(), e))
}
