//! Generated shader module emission

use super::{ShaderEntry, ShaderRegistry};
use crate::BuildMode;
use crate::error::Result;
use crate::names::NamePool;
use regex::{NoExpand, Regex};

/// The generated shader module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedShaders {
    /// JS source declaring one variable per shader
    pub code: String,
    /// Exported shader functions and the short names they were given (minified mode only)
    pub exported_names: Vec<(String, String)>,
}

/// Emits the module declaring every shader of `registry` as a JS string
///
/// In debug mode each shader is declared verbatim in a template literal. In minified
/// mode every file goes through `minify_shader`, exported function names are replaced
/// by names taken from `pool`, and `var` declarations become `let`. In both modes a
/// shader with includes is prefixed with the concatenation of its included shaders.
///
/// # Errors
/// Propagates minifier failures and `NamePoolExhausted` from `pool`.
pub fn pack_shaders(registry: &ShaderRegistry, mode: BuildMode, pool: &mut NamePool, minify_shader: impl Fn(&ShaderEntry) -> Result<String>) -> Result<PackedShaders> {
    let mut code = String::new();
    let mut exported_names = Vec::new();

    match mode {
        BuildMode::Debug => {
            for entry in registry.entries() {
                code.push_str(&format!("let {} = `{}`;\n\n", entry.variable_name, entry.raw_text));
            }
        }
        BuildMode::Minified => {
            for entry in registry.entries() {
                tracing::debug!("Minifying shader {}", entry.path.display());
                code.push_str(&minify_shader(entry)?);
            }

            let exported = registry.exported_functions();
            let short_names = pool.take(exported.len())?;
            exported_names = exported.into_iter().zip(short_names).collect();
            code = rewrite_minified_lines(&code, &exported_names)?;
        }
    }

    for entry in registry.entries().iter().filter(|entry| !entry.includes.is_empty()) {
        let declaration = format!("let {} =", entry.variable_name);
        let prefixed = format!("let {} = {} +", entry.variable_name, entry.includes.join("+"));
        code = code.replacen(&declaration, &prefixed, 1);
    }

    Ok(PackedShaders { code, exported_names })
}

/// Renames exported functions inside string-literal lines and shortens `var` declarations
fn rewrite_minified_lines(code: &str, exported_names: &[(String, String)]) -> Result<String> {
    let patterns = exported_names
        .iter()
        .map(|(from, to)| Ok((Regex::new(&format!(r"\b{}\b", regex::escape(from)))?, to.as_str())))
        .collect::<Result<Vec<_>>>()?;

    let lines: Vec<String> = code
        .split('\n')
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.starts_with('"') {
                patterns.iter().fold(line.to_string(), |line, (pattern, to)| pattern.replace_all(&line, NoExpand(to)).into_owned())
            } else if let Some(rest) = trimmed.strip_prefix("var ") {
                format!("let {rest}")
            } else {
                line.to_string()
            }
        })
        .collect();

    Ok(lines.join("\n"))
}
