//! Script file helpers
//!
//! A `.link` file stands in for another script: its first non-empty line is
//! the path of the target, relative to the link's own directory unless
//! absolute. Links may point at other links.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::LinkError;

/// Extension of link files, without the dot
pub const LINK_EXTENSION: &str = "link";

/// True when `path` is a link file
pub fn is_link_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(LINK_EXTENSION))
}

/// Follow link files until a regular script is reached
///
/// # Arguments
/// * `path` - Script or link file
/// * `max_depth` - Maximum number of links followed; a cycle always exceeds it
///
/// # Returns
/// The path of the script that should actually be evaluated
pub fn resolve_link_file(path: &Path, max_depth: u32) -> Result<PathBuf, LinkError> {
    let mut current = path.to_path_buf();
    let mut hops = 0;

    while is_link_file(&current) {
        if hops >= max_depth {
            return Err(LinkError::TooDeep {
                path: path.display().to_string(),
                max_depth,
            });
        }

        let next = read_link_target(&current)?;
        debug!("Link '{}' -> '{}'", current.display(), next.display());
        current = next;
        hops += 1;
    }

    Ok(current)
}

fn read_link_target(link: &Path) -> Result<PathBuf, LinkError> {
    let content = fs::read_to_string(link).map_err(|e| LinkError::Io {
        path: link.display().to_string(),
        source: e,
    })?;

    let target = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| LinkError::Empty(link.display().to_string()))?;

    let target = PathBuf::from(target);
    if target.is_absolute() {
        return Ok(target);
    }
    Ok(link.parent().map(|dir| dir.join(&target)).unwrap_or(target))
}

/// Undo label for a script file: its name without extension
pub fn script_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
