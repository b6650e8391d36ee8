use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::run::results_dir_for;

/// Resolve the source tree to an absolute directory path.
///
/// Docker bind mounts need absolute host paths, so relative input is joined
/// onto the current directory. Symlinks are left as given.
pub fn resolve_source_dir(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        anyhow::bail!("--sourcecode must not be empty");
    }

    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(path)
    };

    if !path.is_dir() {
        anyhow::bail!(
            "Folder {} is not a directory. Please provide a valid directory path and try again.",
            path.display()
        );
    }

    Ok(path)
}

/// Create `<source>/codeql-agent-results` ahead of the run so it is owned by
/// the invoking user rather than by the Docker daemon
pub fn ensure_results_dir(source: &Path) -> Result<PathBuf> {
    let dir = results_dir_for(source);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create results directory: {}", dir.display()))?;
    Ok(dir)
}
