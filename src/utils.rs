use eyre::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration required to run the conversion.
/// This decouples the logic from how the arguments were parsed (CLI/Config file).
#[derive(Clone)]
pub struct ExportConfig {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    /// Halt the run on a note without title or content instead of skipping it.
    pub strict: bool,
    pub quiet: bool,
}

/// Normalized destination and the notes found in the source.
pub struct ExportPlan {
    pub dest_dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Resolve both directories and list the notes to convert.
///
/// Returns `None` when there is nothing to do. In that case nothing has been
/// created on disk.
pub fn plan_export(config: &ExportConfig) -> Result<Option<ExportPlan>> {
    let source_dir = normalize_dir(&config.source_dir)?;
    info!("Reading Gnote/Tomboy notes from: {}", source_dir.display());

    let files = find_note_files(&source_dir)?;
    if files.is_empty() {
        info!("No note files.");
        return Ok(None);
    }

    let dest_dir = resolve_dest_dir(&source_dir, &config.dest_dir)?;
    info!("Writing Zim notes to: {}", dest_dir.display());

    Ok(Some(ExportPlan { dest_dir, files }))
}

/// Expand `~`, make the path absolute and resolve symlinks when it exists.
pub fn normalize_dir(path: &Path) -> Result<PathBuf> {
    let expanded = expand_tilde(path);
    let absolute = std::path::absolute(&expanded)
        .wrap_err_with(|| format!("Invalid path: {}", path.display()))?;
    if absolute.exists() {
        fs::canonicalize(&absolute)
            .wrap_err_with(|| format!("Failed to resolve: {}", absolute.display()))
    } else {
        Ok(absolute)
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// An empty destination means the current directory. A destination equal to
/// the source is moved into a `zim` subdirectory so the two never overlap.
pub fn resolve_dest_dir(source_dir: &Path, dest: &Path) -> Result<PathBuf> {
    let raw = dest.to_string_lossy();
    let trimmed = raw.trim_end();
    let dest = normalize_dir(Path::new(if trimmed.is_empty() { "." } else { trimmed }))?;
    if dest == source_dir {
        Ok(dest.join("zim"))
    } else {
        Ok(dest)
    }
}

/// All `*.note` files directly inside `source_dir`, sorted by path.
/// A source directory that does not exist simply holds no notes.
pub fn find_note_files(source_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(source_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).wrap_err_with(|| {
                format!("Failed to read source directory: {}", source_dir.display())
            });
        }
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "note"))
        .collect();
    files.sort();
    Ok(files)
}

pub fn prepare_destination(dest_dir: &Path) -> Result<()> {
    if !dest_dir.exists() {
        fs::create_dir_all(dest_dir).wrap_err_with(|| {
            format!("Failed to create destination directory: {}", dest_dir.display())
        })?;
    } else if has_entries(dest_dir) {
        warn!("Some files exist in {}", dest_dir.display());
    }
    Ok(())
}

fn has_entries(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut d| d.next().is_some())
        .unwrap_or(false)
}
