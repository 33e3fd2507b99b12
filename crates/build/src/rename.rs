//! Symbol renaming for minified builds
//!
//! Three independent tables are built from already generated code: one for the
//! prefixed shader interface identifiers, one for the `$`-prefixed globals the
//! shared bundle exports, and one for the static files in the output directory.
//! The tables are concatenated and applied to every bundle as global textual
//! substitutions.

use crate::error::{PackError, Result};
use crate::names::NamePool;
use regex::{NoExpand, Regex};
use std::path::Path;

/// One substitution: every match of `pattern` becomes `replacement`
#[derive(Debug, Clone)]
pub struct Replacement {
    pub pattern: Regex,
    pub replacement: String,
}

/// An ordered list of substitutions
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    replacements: Vec<Replacement>,
}

impl SymbolTable {
    pub fn push(&mut self, pattern: Regex, replacement: String) {
        self.replacements.push(Replacement { pattern, replacement });
    }

    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Replacement> {
        self.replacements.iter()
    }

    /// Joins tables, keeping construction order
    pub fn concat(tables: impl IntoIterator<Item = SymbolTable>) -> Self {
        Self {
            replacements: tables.into_iter().flat_map(|table| table.replacements).collect(),
        }
    }

    /// Applies every substitution in order; replacement text is inserted literally
    pub fn apply(&self, code: &str) -> String {
        self.replacements
            .iter()
            .fold(code.to_string(), |code, r| r.pattern.replace_all(&code, NoExpand(&r.replacement)).into_owned())
    }
}

/// Distinct matches of `pattern` in `text`, in order of first appearance
fn unique_matches(pattern: &Regex, text: &str) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for found in pattern.find_iter(text) {
        if !result.iter().any(|existing| existing == found.as_str()) {
            result.push(found.as_str().to_string());
        }
    }
    result
}

/// Renames varyings (`v_`), uniforms (`u_`) and attributes (`a_`) found in the packed shaders
///
/// Names come from the shader pool, continuing after the names already handed to
/// exported shader functions.
///
/// # Errors
/// `NamePoolExhausted` if the shader pool cannot cover every identifier.
pub fn shader_internal_table(all_shader_code: &str, pool: &mut NamePool) -> Result<SymbolTable> {
    let mut identifiers = Vec::new();
    for prefix in ["v_", "u_", "a_"] {
        let family = Regex::new(&format!(r"\b{prefix}[a-zA-Z0-9_]+"))?;
        identifiers.extend(unique_matches(&family, all_shader_code));
    }

    let names = pool.take(identifiers.len())?;

    let mut table = SymbolTable::default();
    for (identifier, name) in identifiers.iter().zip(names) {
        table.push(Regex::new(&format!(r"\b{}\b", regex::escape(identifier)))?, name);
    }
    Ok(table)
}

/// Renames the shared bundle's `$`-prefixed globals to `$0`, `$1`, ...
pub fn shared_global_table(shared_code: &str) -> Result<SymbolTable> {
    let globals = unique_matches(&Regex::new(r"\$[a-zA-Z0-9_]+")?, shared_code);

    let mut table = SymbolTable::default();
    for (index, global) in globals.iter().enumerate() {
        table.push(Regex::new(&format!(r"{}\b", regex::escape(global)))?, format!("${index}"));
    }
    Ok(table)
}

/// A planned rename of one top-level output entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRename {
    pub from: String,
    pub to: String,
}

/// Names of the top-level entries of `dir`, sorted
pub fn top_level_entries(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| PackError::io(dir, e))? {
        let entry = entry.map_err(|e| PackError::io(dir, e))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

/// Maps every entry to the next name of `pool`; no file system access
///
/// # Errors
/// `NamePoolExhausted` if there are more entries than names.
pub fn plan_file_renames(entries: &[String], pool: &mut NamePool) -> Result<Vec<FileRename>> {
    let names = pool.take(entries.len())?;
    Ok(entries.iter().zip(names).map(|(from, to)| FileRename { from: from.clone(), to }).collect())
}

/// Retargets references to renamed files in generated code
///
/// Only `.` is escaped when turning a file name into a pattern.
pub fn file_table(renames: &[FileRename]) -> Result<SymbolTable> {
    let mut table = SymbolTable::default();
    for rename in renames {
        table.push(Regex::new(&rename.from.replace('.', r"\."))?, rename.to.clone());
    }
    Ok(table)
}
