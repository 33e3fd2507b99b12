//! Shader discovery and dependency ordering

use crate::directive::{exported_functions, shader_includes};
use crate::error::{PackError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extensions recognised as shader sources
const SHADER_EXTENSIONS: [&str; 3] = ["glsl", "vert", "frag"];

/// Library shaders are declared before the vertex and fragment shaders that include them
fn extension_rank(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some("glsl") => 0,
        _ => 1,
    }
}

/// Turns a shader path relative to the shader root into a JS identifier
///
/// Every character that cannot appear in an identifier becomes `_`, so `a.vert`
/// is `a_vert` and `post/blur.frag` is `post_blur_frag`.
pub fn variable_name(relative_path: &str) -> String {
    relative_path.chars().map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '$' { c } else { '_' }).collect()
}

/// One discovered shader file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderEntry {
    /// Name of the JS variable holding this shader in the generated module
    pub variable_name: String,
    /// Location of the source file
    pub path: PathBuf,
    /// Unprocessed file contents
    pub raw_text: String,
    /// Variable names of the shaders this one includes, in directive order
    pub includes: Vec<String>,
    /// Functions marked as referenced from outside the shader
    pub exported_functions: Vec<String>,
}

impl ShaderEntry {
    /// Builds an entry from a path relative to the shader root and its contents
    pub fn new(relative_path: &str, path: PathBuf, raw_text: String) -> Self {
        Self {
            variable_name: variable_name(relative_path),
            includes: shader_includes(&raw_text).iter().map(|include| variable_name(include)).collect(),
            exported_functions: exported_functions(&raw_text),
            path,
            raw_text,
        }
    }
}

/// All shaders of a project, in declaration order
#[derive(Debug, Clone, Default)]
pub struct ShaderRegistry {
    entries: Vec<ShaderEntry>,
}

impl ShaderRegistry {
    /// Walks `root` recursively and loads every shader file
    ///
    /// Files are visited in file-name order, so the result is the same on every run
    /// for the same tree.
    pub fn discover(root: &Path) -> Result<Self> {
        let mut entries = Vec::new();

        for dir_entry in WalkDir::new(root).sort_by_file_name() {
            let dir_entry = dir_entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                PackError::io(path, e.into())
            })?;
            let path = dir_entry.path();
            let is_shader = path.extension().and_then(|e| e.to_str()).is_some_and(|e| SHADER_EXTENSIONS.contains(&e));
            if !dir_entry.file_type().is_file() || !is_shader {
                continue;
            }

            let raw_text = std::fs::read_to_string(path).map_err(|e| PackError::io(path, e))?;
            let relative = path.strip_prefix(root).unwrap_or(path).to_string_lossy().into_owned();
            tracing::debug!("Found shader {relative}");
            entries.push(ShaderEntry::new(&relative, path.to_path_buf(), raw_text));
        }

        Ok(Self::from_entries(entries))
    }

    /// Orders entries so that every shader comes after the shaders it includes
    ///
    /// `.glsl` files go first, otherwise the given order is kept. Entries are then
    /// moved only as far as needed to satisfy include dependencies.
    pub fn from_entries(mut entries: Vec<ShaderEntry>) -> Self {
        entries.sort_by_key(|entry| extension_rank(&entry.path));

        let known: Vec<String> = entries.iter().map(|e| e.variable_name.clone()).collect();
        for entry in &entries {
            for include in entry.includes.iter().filter(|include| !known.contains(include)) {
                tracing::warn!("Shader {} includes unknown shader {include}", entry.variable_name);
            }
        }

        let mut pending = entries;
        let mut ordered: Vec<ShaderEntry> = Vec::with_capacity(pending.len());
        while !pending.is_empty() {
            let ready = pending.iter().position(|entry| {
                entry.includes.iter().all(|include| !known.contains(include) || ordered.iter().any(|done| &done.variable_name == include))
            });
            let index = ready.unwrap_or_else(|| {
                tracing::warn!("Include cycle between shaders starting at {}", pending[0].variable_name);
                0
            });
            ordered.push(pending.remove(index));
        }

        Self { entries: ordered }
    }

    pub fn entries(&self) -> &[ShaderEntry] {
        &self.entries
    }

    /// Exported function names across all shaders, deduplicated, in order of first discovery
    pub fn exported_functions(&self) -> Vec<String> {
        let mut result: Vec<String> = Vec::new();
        for name in self.entries.iter().flat_map(|entry| &entry.exported_functions) {
            if !result.contains(name) {
                result.push(name.clone());
            }
        }
        result
    }
}
