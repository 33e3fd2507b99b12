//! End-to-end packing run
//!
//! Stages run strictly in sequence. Every renaming table and the file rename plan
//! are computed before the output directory is touched, so a failure in any of
//! them leaves the previous output in place.

use crate::directive::{inline_includes, insert_gl_optimize};
use crate::error::{PackError, Result};
use crate::gl_mangle::{GraphicsDeclarations, GraphicsMangler};
use crate::manifest::{Constants, DEBUG_CONSTANT, Manifest};
use crate::minify::{MinifyOptions, minify_js};
use crate::names::NamePool;
use crate::package::{ArchiveReport, OutputDir, assemble_html};
use crate::rename::{FileRename, SymbolTable, file_table, plan_file_renames, shader_internal_table, shared_global_table, top_level_entries};
use crate::shaders::{ShaderRegistry, minify_glsl, pack_shaders};
use crate::song::recode_song_calls;
use crate::{BuildMode, Bundle};
use serde_json::Value;
use std::path::Path;

/// State needed only by minified builds
struct Minification<'a> {
    table: SymbolTable,
    mangler: GraphicsMangler<'a>,
}

/// Applies the per-bundle transformations of one build mode
struct BundleProcessor<'a> {
    manifest: &'a Manifest,
    constants: &'a Constants,
    minification: Option<Minification<'a>>,
}

impl BundleProcessor<'_> {
    fn process(&self, bundle: Bundle, code: &str) -> Result<String> {
        let Some(minification) = &self.minification else {
            let code = if bundle == Bundle::Shared {
                format!("{}{code}", self.constants.let_declarations())
            } else {
                code.to_string()
            };
            return recode_song_calls(&code);
        };

        let mut code = minification.table.apply(code);
        if bundle == Bundle::Client {
            code = insert_gl_optimize(&code, &self.manifest.graphics_namespace);
            code = minification.mangler.mangle(&code)?;
        }
        let code = recode_song_calls(&code)?;

        tracing::info!("Minifying {}", bundle.file_name());
        let options = MinifyOptions::for_bundle(bundle, self.constants);
        minify_js(&self.manifest.tools.js_minifier, &self.manifest.root, bundle, &code, &options)
    }
}

/// Reads a bundle from the source root and resolves its inline-file directives
fn load_bundle(source_dir: &Path, bundle: Bundle) -> Result<String> {
    let path = source_dir.join(bundle.file_name());
    let code = std::fs::read_to_string(&path).map_err(|e| PackError::io(&path, e))?;
    inline_includes(&code, source_dir)
}

/// Top-level entries of the static directory renamed to single letters
fn plan_static_renames(static_dir: &Path) -> Result<Vec<FileRename>> {
    let entries = if static_dir.is_dir() { top_level_entries(static_dir)? } else { Vec::new() };
    plan_file_renames(&entries, &mut NamePool::files())
}

/// Runs the whole pipeline for the project described by `manifest`
///
/// # Arguments
///
/// * `manifest` - Project layout and tool configuration. A relative root is resolved
///   against the current directory.
/// * `mode` - `Debug` keeps the sources readable and stops after writing the output
///   directory; `Minified` shrinks everything and builds the archive.
///
/// # Returns
///
/// The archive size report in minified mode, `None` in debug mode.
///
/// # Errors
///
/// Any [`PackError`]; the run stops at the first failure.
pub fn run(manifest: &Manifest, mode: BuildMode) -> Result<Option<ArchiveReport>> {
    let root = std::path::absolute(&manifest.root).map_err(|e| PackError::io(&manifest.root, e))?;
    let manifest = Manifest { root, ..manifest.clone() };
    let source_dir = manifest.path(&manifest.source_dir);
    let static_dir = manifest.path(&manifest.static_dir);

    let mut constants = Constants::from_file(manifest.path(&manifest.constants))?;
    constants.insert(DEBUG_CONSTANT, Value::Bool(mode == BuildMode::Debug));

    tracing::info!("Packing shaders...");
    let registry = ShaderRegistry::discover(&manifest.path(&manifest.shader_dir))?;
    let mut shader_pool = NamePool::shader();
    let packed = pack_shaders(&registry, mode, &mut shader_pool, |entry| minify_glsl(&manifest.tools.shader_minifier, &manifest.root, entry))?;
    let module_path = source_dir.join(&manifest.shader_module);
    std::fs::write(&module_path, &packed.code).map_err(|e| PackError::io(&module_path, e))?;
    tracing::debug!("Wrote {} shaders to {}", registry.entries().len(), module_path.display());

    let client = load_bundle(&source_dir, Bundle::Client)?;
    let shared = load_bundle(&source_dir, Bundle::Shared)?;
    let server = load_bundle(&source_dir, Bundle::Server)?;

    let declarations;
    let (minification, renames) = match mode {
        BuildMode::Debug => (None, Vec::new()),
        BuildMode::Minified => {
            let renames = plan_static_renames(&static_dir)?;
            let table = SymbolTable::concat([
                shader_internal_table(&packed.code, &mut shader_pool)?,
                shared_global_table(&shared)?,
                file_table(&renames)?,
            ]);
            tracing::debug!("Symbol table has {} entries", table.len());

            declarations = GraphicsDeclarations::from_file(manifest.path(&manifest.declarations))?;
            let mangler = GraphicsMangler::new(&manifest.graphics_namespace, &declarations)?;
            (Some(Minification { table, mangler }), renames)
        }
    };

    tracing::info!("Packing javascript...");
    let processor = BundleProcessor {
        manifest: &manifest,
        constants: &constants,
        minification,
    };
    let client_js = processor.process(Bundle::Client, &client)?;
    let shared_js = processor.process(Bundle::Shared, &shared)?;
    let server_js = processor.process(Bundle::Server, &server)?;

    let template_path = manifest.path(if mode == BuildMode::Minified { &manifest.html } else { &manifest.debug_html });
    let template = std::fs::read_to_string(&template_path).map_err(|e| PackError::io(&template_path, e))?;
    let html = assemble_html(&template, &client_js);

    let output = OutputDir::recreate(&manifest.path(&manifest.out_dir))?;
    output.copy_static(&static_dir, &renames)?;
    output.write("index.html", &html)?;
    output.write(Bundle::Shared.file_name(), &shared_js)?;
    output.write(Bundle::Server.file_name(), &server_js)?;

    if mode == BuildMode::Debug {
        return Ok(None);
    }

    tracing::info!("Packing zip archive...");
    let report = output.archive(&manifest.tools.archiver, &manifest.path(&manifest.archive), manifest.budget)?;
    report.log();
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debug_processor<'a>(manifest: &'a Manifest, constants: &'a Constants) -> BundleProcessor<'a> {
        BundleProcessor {
            manifest,
            constants,
            minification: None,
        }
    }

    #[test]
    fn test_debug_shared_bundle_gets_constants() {
        let manifest = Manifest::default();
        let constants = Constants::from_json(r#"{"SPEED": 5}"#).unwrap();
        let processor = debug_processor(&manifest, &constants);

        assert_eq!(processor.process(Bundle::Shared, "let $x = SPEED;").unwrap(), "let SPEED = 5;\nlet $x = SPEED;");
        assert_eq!(processor.process(Bundle::Server, "let y = SPEED;").unwrap(), "let y = SPEED;");
    }

    #[test]
    fn test_debug_bundles_recode_song_data() {
        let manifest = Manifest::default();
        let constants = Constants::default();
        let processor = debug_processor(&manifest, &constants);

        let client = "let song = __includeSongData({songData: [], rowLen: 1, patternLen: 2, endPattern: 3, numChannels: 4});";
        assert_eq!(processor.process(Bundle::Client, client).unwrap(), "let song = [[],1,2,3,4];");
    }

    #[test]
    fn test_plan_static_renames_without_static_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(plan_static_renames(&dir.path().join("missing")).unwrap().is_empty());
    }
}
