//! Directive preprocessing
//!
//! Sources carry a tiny comment-based directive language. Script sources use
//! `//__include <path>` (or `//__inlineFile <path>`) to inline another file
//! verbatim. Shader sources use `//__include <file>` to declare a dependency on
//! another shader and `//__export` to mark the function declared on the next line
//! as referenced from outside the shader.

use crate::error::{PackError, Result};
use std::path::Path;

const INCLUDE_MARKER: &str = "//__include";
const INLINE_FILE_MARKER: &str = "//__inlineFile";
const EXPORT_MARKER: &str = "//__export";

/// Marker replaced by [`insert_gl_optimize`]
pub const GL_OPTIMIZE_MARKER: &str = "//__insertGLOptimize";

/// Which directive dialect a source is scanned with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Script,
    Shader,
}

/// A directive found on a single source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Replace the line with the contents of the file (script sources)
    InlineFile(String),
    /// The shader depends on another shader file
    ShaderInclude(String),
    /// The next line declares an externally referenced function
    ExportMarker,
}

/// Returns the argument following `marker` on `line`, if the marker is present and followed by whitespace
fn marker_argument<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let index = line.find(marker)?;
    let rest = &line[index + marker.len()..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let argument = rest.trim();
    (!argument.is_empty()).then_some(argument)
}

impl Directive {
    /// Parses the directive on `line`, if any
    ///
    /// Script directives may appear anywhere on the line (typically indented).
    /// Shader includes must start the trimmed line.
    pub fn parse(line: &str, kind: SourceKind) -> Option<Self> {
        match kind {
            SourceKind::Script => [INCLUDE_MARKER, INLINE_FILE_MARKER]
                .iter()
                .find_map(|marker| marker_argument(line, marker))
                .map(|path| Self::InlineFile(path.to_string())),
            SourceKind::Shader => {
                let trimmed = line.trim();
                if trimmed.starts_with(INCLUDE_MARKER) {
                    marker_argument(trimmed, INCLUDE_MARKER).map(|path| Self::ShaderInclude(path.to_string()))
                } else if trimmed.contains(EXPORT_MARKER) {
                    Some(Self::ExportMarker)
                } else {
                    None
                }
            }
        }
    }
}

/// Replaces every inline-file directive line with the referenced file's contents
///
/// Paths are relative to `source_root`. Inlined text is not scanned again.
///
/// # Errors
/// Returns `PackError::Io` if a referenced file cannot be read.
pub fn inline_includes(code: &str, source_root: &Path) -> Result<String> {
    let mut lines = Vec::new();

    for line in code.split('\n') {
        match Directive::parse(line, SourceKind::Script) {
            Some(Directive::InlineFile(path)) => {
                let path = source_root.join(path);
                let contents = std::fs::read_to_string(&path).map_err(|e| PackError::io(&path, e))?;
                tracing::debug!("Inlined {}", path.display());
                lines.push(contents);
            }
            _ => lines.push(line.to_string()),
        }
    }

    Ok(lines.join("\n"))
}

/// Lists the files a shader includes, in order of appearance
pub fn shader_includes(code: &str) -> Vec<String> {
    code.split('\n')
        .filter_map(|line| match Directive::parse(line, SourceKind::Shader) {
            Some(Directive::ShaderInclude(path)) => Some(path),
            _ => None,
        })
        .collect()
}

/// Extracts `name` from a GLSL prototype such as `vec3 name(vec3 p)`
fn glsl_function_name(prototype: &str) -> Option<&str> {
    let start = prototype.find(' ')? + 1;
    let end = prototype.find('(')?;
    (start < end).then(|| prototype[start..end].trim())
}

/// Lists the functions marked with an export directive, in order of appearance
pub fn exported_functions(code: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut lines = code.split('\n').map(str::trim);

    while let Some(line) = lines.next() {
        if Directive::parse(line, SourceKind::Shader) != Some(Directive::ExportMarker) {
            continue;
        }
        match lines.next().and_then(glsl_function_name) {
            Some(name) => result.push(name.to_string()),
            None => tracing::warn!("Export directive is not followed by a function prototype"),
        }
    }

    result
}

/// Replaces the graphics optimisation marker with code that aliases every member of the
/// graphics context under its sorted ordinal, so `ns[ordinal]` can stand in for `ns.member`
pub fn insert_gl_optimize(code: &str, namespace: &str) -> String {
    let snippet = format!(
        "
        let webglFuncs=[],webglFunc;
        for(webglFunc in {namespace})webglFuncs.push(webglFunc);
        for(webglFunc in {namespace}){namespace}[webglFuncs.sort().indexOf(webglFunc)]={namespace}[webglFunc];"
    );
    code.replacen(GL_OPTIMIZE_MARKER, &snippet, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script_directives() {
        assert_eq!(Directive::parse("    //__include math.lib.js", SourceKind::Script), Some(Directive::InlineFile("math.lib.js".to_string())));
        assert_eq!(Directive::parse("//__inlineFile soundbox.lib.js  ", SourceKind::Script), Some(Directive::InlineFile("soundbox.lib.js".to_string())));
        assert_eq!(Directive::parse("let x = 1; // __include nothing", SourceKind::Script), None);
        assert_eq!(Directive::parse("//__include", SourceKind::Script), None);
        assert_eq!(Directive::parse("__includeSongData({})", SourceKind::Script), None);
    }

    #[test]
    fn test_parse_shader_directives() {
        assert_eq!(Directive::parse("  //__include noise.glsl", SourceKind::Shader), Some(Directive::ShaderInclude("noise.glsl".to_string())));
        assert_eq!(Directive::parse("//__export", SourceKind::Shader), Some(Directive::ExportMarker));
        assert_eq!(Directive::parse("float x; //__include a.vert", SourceKind::Shader), None);
    }

    #[test]
    fn test_inline_includes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("math.lib.js"), "let add = (a, b) => a + b;").unwrap();

        let code = "(() => {\n    //__include math.lib.js\n    add(1, 2);\n})();";
        let inlined = inline_includes(code, dir.path()).unwrap();
        assert_eq!(inlined, "(() => {\nlet add = (a, b) => a + b;\n    add(1, 2);\n})();");
    }

    #[test]
    fn test_inline_includes_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = inline_includes("//__include missing.js", dir.path()).unwrap_err();
        assert!(matches!(err, PackError::Io { ref path, .. } if path.ends_with("missing.js")));
    }

    #[test]
    fn test_shader_includes_and_exports() {
        let code = "//__include noise.glsl\n//__include light.glsl\n\n//__export\nfloat fbm(vec3 p) {\n    return 0.;\n}\n//__export\n  vec3 shade(vec3 n) {}\n";
        assert_eq!(shader_includes(code), ["noise.glsl", "light.glsl"]);
        assert_eq!(exported_functions(code), ["fbm", "shade"]);
    }

    #[test]
    fn test_insert_gl_optimize() {
        let code = "let gl = C.getContext('webgl');\n//__insertGLOptimize\ngl.clear(0);";
        let result = insert_gl_optimize(code, "gl");
        assert!(!result.contains(GL_OPTIMIZE_MARKER));
        assert!(result.contains("for(webglFunc in gl)gl[webglFuncs.sort().indexOf(webglFunc)]=gl[webglFunc];"));
        assert!(result.ends_with("\ngl.clear(0);"));
    }
}
