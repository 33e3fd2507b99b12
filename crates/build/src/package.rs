//! Output directory assembly, archiving and size reporting

use crate::error::{PackError, Result};
use crate::rename::FileRename;
use crate::tool::ToolCommand;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Placeholder in the HTML template replaced by the client script
pub const CLIENT_JS_PLACEHOLDER: &str = "__clientJS";

/// Builds the page: every line trimmed and joined without separator, then the client
/// script (with `"` turned into `'`) substituted for the first placeholder
pub fn assemble_html(template: &str, client_js: &str) -> String {
    let html: String = template.lines().map(str::trim).collect();
    html.replacen(CLIENT_JS_PLACEHOLDER, &client_js.replace('"', "'"), 1)
}

/// The build output directory
#[derive(Debug, Clone)]
pub struct OutputDir {
    path: PathBuf,
}

impl OutputDir {
    /// Removes the directory if it exists and creates it empty
    pub fn recreate(path: &Path) -> Result<Self> {
        if path.exists() {
            fs::remove_dir_all(path).map_err(|e| PackError::io(path, e))?;
        }
        fs::create_dir_all(path).map_err(|e| PackError::io(path, e))?;
        Ok(Self { path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copies `static_dir` recursively into the directory
    ///
    /// Top-level entries listed in `renames` are copied under their new names; nested
    /// entries keep theirs.
    pub fn copy_static(&self, static_dir: &Path, renames: &[FileRename]) -> Result<()> {
        if !static_dir.is_dir() {
            tracing::warn!("Static directory {} does not exist, nothing to copy", static_dir.display());
            return Ok(());
        }

        for dir_entry in WalkDir::new(static_dir).min_depth(1).sort_by_file_name() {
            let dir_entry = dir_entry.map_err(|e| {
                let path = e.path().unwrap_or(static_dir).to_path_buf();
                PackError::io(path, e.into())
            })?;
            let relative = dir_entry.path().strip_prefix(static_dir).unwrap_or(dir_entry.path());
            let target = self.path.join(renamed_path(relative, renames));

            if dir_entry.file_type().is_dir() {
                fs::create_dir_all(&target).map_err(|e| PackError::io(&target, e))?;
            } else {
                fs::copy(dir_entry.path(), &target).map_err(|e| PackError::io(&target, e))?;
                tracing::debug!("Copied {} to {}", relative.display(), target.display());
            }
        }

        Ok(())
    }

    /// Writes `contents` to `name` inside the directory
    pub fn write(&self, name: &str, contents: &str) -> Result<()> {
        let path = self.path.join(name);
        fs::write(&path, contents).map_err(|e| PackError::io(&path, e))
    }

    /// Names of the top-level entries, sorted
    pub fn entries(&self) -> Result<Vec<String>> {
        crate::rename::top_level_entries(&self.path)
    }

    /// Zips the directory's top-level entries into `archive` and measures the result
    ///
    /// The archiver runs inside the directory, so entries are stored without a prefix.
    pub fn archive(&self, archiver: &ToolCommand, archive: &Path, budget: u64) -> Result<ArchiveReport> {
        let archive = std::path::absolute(archive).map_err(|e| PackError::io(archive, e))?;
        if archive.exists() {
            fs::remove_file(&archive).map_err(|e| PackError::io(&archive, e))?;
        }

        let mut args = vec!["-q".into(), "-a".into(), "-4".into(), archive.clone().into_os_string()];
        args.extend(self.entries()?.into_iter().map(Into::into));
        archiver.run(&self.path, &args)?;

        let bytes = fs::metadata(&archive).map_err(|e| PackError::io(&archive, e))?.len();
        Ok(ArchiveReport { bytes, budget })
    }
}

/// Applies a top-level rename to a path relative to the static directory
fn renamed_path(relative: &Path, renames: &[FileRename]) -> PathBuf {
    let mut components = relative.components();
    let Some(first) = components.next() else {
        return relative.to_path_buf();
    };

    let first = first.as_os_str().to_string_lossy();
    let renamed = renames.iter().find(|r| r.from == first).map_or(first.as_ref(), |r| r.to.as_str());

    // Joining an empty remainder would leave a trailing separator
    let rest = components.as_path();
    if rest.as_os_str().is_empty() { PathBuf::from(renamed) } else { Path::new(renamed).join(rest) }
}

/// Size of the final archive compared to the budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveReport {
    pub bytes: u64,
    pub budget: u64,
}

impl ArchiveReport {
    pub fn percentage(&self) -> f64 {
        if self.budget == 0 {
            return f64::INFINITY;
        }
        self.bytes as f64 / self.budget as f64 * 100.0
    }

    pub fn over_budget(&self) -> bool {
        self.bytes > self.budget
    }

    /// Logs the report, warning when the archive does not fit
    pub fn log(&self) {
        tracing::info!("{self}");
        if self.over_budget() {
            tracing::warn!("Archive is {} bytes over budget", self.bytes - self.budget);
        }
    }
}

impl fmt::Display for ArchiveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Final archive size: {} of {} / {:.2}%", self.bytes, self.budget, self.percentage())
    }
}
