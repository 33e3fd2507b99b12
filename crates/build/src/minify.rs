//! JS minification utilities.
//!
//! This module drives the external JS compressor with the aggressive option set
//! used for release bundles.

use crate::Bundle;
use crate::error::{PackError, Result};
use crate::manifest::Constants;
use crate::tool::ToolCommand;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::Path;

/// Options passed to the compressor through its config file
#[derive(Debug, Clone, Serialize)]
pub struct MinifyOptions {
    /// Mangle and drop unused top-level names
    pub toplevel: bool,
    pub compress: CompressOptions,
}

/// Compression settings; every `unsafe` transform is enabled
#[derive(Debug, Clone, Serialize)]
pub struct CompressOptions {
    pub ecma: u32,
    pub keep_fargs: bool,
    pub passes: u32,
    pub pure_funcs: Vec<String>,
    pub pure_getters: bool,
    /// Constants substituted at compile time
    pub global_defs: Map<String, Value>,
    pub r#unsafe: bool,
    pub unsafe_arrows: bool,
    pub unsafe_comps: bool,
    #[serde(rename = "unsafe_Function")]
    pub unsafe_function: bool,
    pub unsafe_math: bool,
    pub unsafe_methods: bool,
    pub unsafe_proto: bool,
    pub unsafe_regexp: bool,
    pub unsafe_undefined: bool,
}

impl MinifyOptions {
    /// Options for one bundle
    ///
    /// The shared bundle keeps its top-level names because the other two bundles
    /// refer to them.
    pub fn for_bundle(bundle: Bundle, constants: &Constants) -> Self {
        Self {
            toplevel: bundle != Bundle::Shared,
            compress: CompressOptions {
                ecma: 2015,
                keep_fargs: false,
                passes: 2,
                pure_funcs: Vec::new(),
                pure_getters: true,
                global_defs: constants.as_map().clone(),
                r#unsafe: true,
                unsafe_arrows: true,
                unsafe_comps: true,
                unsafe_function: true,
                unsafe_math: true,
                unsafe_methods: true,
                unsafe_proto: true,
                unsafe_regexp: true,
                unsafe_undefined: true,
            },
        }
    }
}

/// Writes `contents` to a fresh temporary file with the given suffix
fn temp_file_with(suffix: &str, contents: &[u8]) -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("tinypack")
        .suffix(suffix)
        .tempfile()
        .map_err(|e| PackError::io(std::env::temp_dir(), e))?;
    file.write_all(contents).map_err(|e| PackError::io(file.path(), e))?;
    Ok(file)
}

/// Minifies one bundle with the external compressor.
///
/// # Arguments
///
/// * `tool` - Command line of the compressor; it must accept `<input> --config-file <json>`
///   and print the result on stdout.
/// * `cwd` - Directory the tool runs in.
/// * `bundle` - Which bundle is being minified, for diagnostics.
/// * `code` - The prepared source.
/// * `options` - Compressor options.
///
/// # Errors
///
/// `ToolFailed` if the compressor exits abnormally, `MinifierOutput` if it exits
/// normally but its output is not usable source text. In the latter case the input
/// and the tool's diagnostics are logged first.
pub fn minify_js(tool: &ToolCommand, cwd: &Path, bundle: Bundle, code: &str, options: &MinifyOptions) -> Result<String> {
    let input = temp_file_with(".js", code.as_bytes())?;
    let config_json = serde_json::to_vec_pretty(options).map_err(|source| PackError::Json { path: "<minifier options>".into(), source })?;
    let config = temp_file_with(".json", &config_json)?;

    let output = tool.run(cwd, [input.path().as_os_str(), "--config-file".as_ref(), config.path().as_os_str()])?;

    match String::from_utf8(output.stdout) {
        Ok(minified) if !minified.trim().is_empty() || code.trim().is_empty() => Ok(minified),
        result => {
            tracing::error!("Input to the minifier for {}:\n{code}", bundle.file_name());
            tracing::error!("Minifier stdout was {}", if result.is_ok() { "empty" } else { "not valid UTF-8" });
            tracing::error!("Minifier stderr: {}", String::from_utf8_lossy(&output.stderr));
            Err(PackError::MinifierOutput { bundle: bundle.file_name().to_string() })
        }
    }
}
