//! Build manifest and constants loading
//!
//! The manifest is an optional YAML file describing where the project's inputs
//! live and which external tools to run. Every field has a default matching the
//! conventional project layout, so a project without a manifest still builds.

use crate::error::{PackError, Result};
use crate::tool::ToolCommand;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Default file name looked up in the project root
pub const MANIFEST_FILE_NAME: &str = "tinypack.yaml";

/// Name of the constant injected by the pipeline to tell builds apart
pub const DEBUG_CONSTANT: &str = "__DEBUG";

/// Project layout and tool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Directory every other path is resolved against (the manifest's directory)
    #[serde(skip)]
    pub root: PathBuf,
    /// Script sources; include directives are resolved relative to it
    pub source_dir: PathBuf,
    /// Static assets copied verbatim into the output directory
    pub static_dir: PathBuf,
    /// Root of the shader tree
    pub shader_dir: PathBuf,
    /// Output directory, destroyed and recreated on every run
    pub out_dir: PathBuf,
    /// Archive produced in minified mode
    pub archive: PathBuf,
    /// Archive size cap in bytes
    pub budget: u64,
    /// Graphics API declarations (member name to constant value or null)
    pub declarations: PathBuf,
    /// Named build-time constants
    pub constants: PathBuf,
    /// HTML template for minified builds
    pub html: PathBuf,
    /// HTML template for debug builds
    pub debug_html: PathBuf,
    /// Identifier of the graphics context object in client code
    pub graphics_namespace: String,
    /// File name of the generated shader module, written into `source_dir`
    pub shader_module: String,
    pub tools: Tools,
}

/// External tools invoked in minified mode
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Tools {
    pub shader_minifier: ToolCommand,
    pub js_minifier: ToolCommand,
    pub archiver: ToolCommand,
}

impl Default for Tools {
    fn default() -> Self {
        let shader_minifier = if cfg!(windows) {
            ToolCommand::new("tools\\shader_minifier.exe", &[])
        } else {
            ToolCommand::new("mono", &["tools/shader_minifier.exe"])
        };

        Self {
            shader_minifier,
            js_minifier: ToolCommand::new("terser", &[]),
            archiver: ToolCommand::new("advzip", &[]),
        }
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            source_dir: PathBuf::from("src"),
            static_dir: PathBuf::from("public"),
            shader_dir: PathBuf::from("shaders"),
            out_dir: PathBuf::from("build"),
            archive: PathBuf::from("bundle.zip"),
            budget: 13312,
            declarations: PathBuf::from("webgl-funcs.json"),
            constants: PathBuf::from("src/constants.json"),
            html: PathBuf::from("src/index.html"),
            debug_html: PathBuf::from("src/index.debug.html"),
            graphics_namespace: "gl".to_string(),
            shader_module: "shaders.gen.js".to_string(),
            tools: Tools::default(),
        }
    }
}

impl Manifest {
    /// Parses a manifest from YAML content
    pub fn from_yaml(yaml_content: &str) -> Result<Self, serde_norway::Error> {
        serde_norway::from_str(yaml_content)
    }

    /// Parses a manifest file; its directory becomes the project root
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PackError::io(path, e))?;
        let mut manifest = Self::from_yaml(&content).map_err(|source| PackError::Manifest { path: path.to_path_buf(), source })?;
        manifest.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(manifest)
    }

    /// Loads `tinypack.yaml` from `root` if present, otherwise uses the default layout rooted there
    pub fn discover<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let path = root.join(MANIFEST_FILE_NAME);
        if path.is_file() {
            Self::from_file(path)
        } else {
            Ok(Self { root: root.to_path_buf(), ..Self::default() })
        }
    }

    /// Resolves a manifest-relative path against the project root
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }
}

/// Named build-time constants, kept in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constants(Map<String, Value>);

impl Constants {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self)
    }

    /// Loads constants from a JSON object file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PackError::io(path, e))?;
        Self::from_json(&content).map_err(|source| PackError::Json { path: path.to_path_buf(), source })
    }

    /// Sets a constant, replacing any previous value under the same name
    pub fn insert(&mut self, name: &str, value: Value) {
        self.0.insert(name.to_string(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Renders `let NAME = value;` lines, one per constant, in declaration order
    pub fn let_declarations(&self) -> String {
        self.0.iter().map(|(name, value)| format!("let {name} = {value};\n")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_defaults_fill_missing_fields() {
        let yaml = r#"
out_dir: dist
budget: 1024
tools:
  archiver: ["zip", "-9"]
"#;

        let manifest = Manifest::from_yaml(yaml).unwrap();
        assert_eq!(manifest.out_dir, PathBuf::from("dist"));
        assert_eq!(manifest.budget, 1024);
        assert_eq!(manifest.source_dir, PathBuf::from("src"));
        assert_eq!(manifest.graphics_namespace, "gl");
        assert_eq!(manifest.tools.archiver.program(), "zip");
        assert_eq!(manifest.tools.archiver.args(), ["-9".to_string()]);
        assert_eq!(manifest.tools.js_minifier.program(), "terser");
    }

    #[test]
    fn test_manifest_discover_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::discover(dir.path()).unwrap();
        assert_eq!(manifest.root, dir.path());
        assert_eq!(manifest.path("src"), dir.path().join("src"));
    }

    #[test]
    fn test_constants_keep_file_order() {
        let constants = Constants::from_json(r#"{"SPEED": 5, "NAME": "ship", "ACCEL": 0.5}"#).unwrap();
        assert_eq!(constants.let_declarations(), "let SPEED = 5;\nlet NAME = \"ship\";\nlet ACCEL = 0.5;\n");
    }

    #[test]
    fn test_constants_insert_overrides() {
        let mut constants = Constants::from_json(r#"{"__DEBUG": true}"#).unwrap();
        constants.insert(DEBUG_CONSTANT, Value::Bool(false));
        assert_eq!(constants.let_declarations(), "let __DEBUG = false;\n");
    }
}
