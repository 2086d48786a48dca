//! Filesystem scan that turns a vault directory into parser input.

use crate::error::VaultError;
use crate::models::VaultFile;
use std::collections::HashSet;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

fn relative_path_string(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let value = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<String>>()
        .join("/");
    Some(value)
}

fn should_skip_entry(
    path: &Path,
    is_dir: bool,
    root: &Path,
    excluded_dirs: &HashSet<String>,
) -> bool {
    let Some(relative) = relative_path_string(path, root) else {
        return false;
    };
    let mut components = relative
        .split('/')
        .filter(|value| !value.is_empty())
        .peekable();
    while let Some(component) = components.next() {
        let is_last = components.peek().is_none();
        if !is_dir && is_last {
            break;
        }
        if component.starts_with('.') || excluded_dirs.contains(&component.to_lowercase()) {
            return true;
        }
    }
    false
}

fn is_markdown_note(path: &Path) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

fn system_time_to_unix_millis(ts: SystemTime) -> Option<i64> {
    let millis = ts.duration_since(UNIX_EPOCH).ok()?.as_millis();
    i64::try_from(millis).ok()
}

/// Collect every `.md` file under `root`, sorted by relative path.
///
/// Hidden directories and `excluded_dirs` (case-insensitive) are pruned.
/// Files that are not valid UTF-8 or cannot be read are logged and skipped.
///
/// # Errors
///
/// Returns an error when `root` itself is not a readable directory.
pub fn scan_vault(root: &Path, excluded_dirs: &[String]) -> Result<Vec<VaultFile>, VaultError> {
    let metadata = std::fs::metadata(root).map_err(|err| VaultError::io(root, err))?;
    if !metadata.is_dir() {
        return Err(VaultError::io(
            root,
            std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                "vault root is not a directory",
            ),
        ));
    }
    let excluded: HashSet<String> = excluded_dirs
        .iter()
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .collect();

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            !should_skip_entry(entry.path(), entry.file_type().is_dir(), root, &excluded)
        })
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_markdown_note(path) {
            continue;
        }
        let Some(relative_path) = relative_path_string(path, root) else {
            continue;
        };
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("skipping unreadable vault file '{relative_path}': {err}");
                continue;
            }
        };
        let Ok(content) = String::from_utf8(bytes) else {
            log::warn!("skipping non UTF-8 vault file '{relative_path}'");
            continue;
        };
        let mtime = entry
            .metadata()
            .ok()
            .and_then(|meta| meta.modified().ok())
            .and_then(system_time_to_unix_millis);
        files.push(VaultFile {
            relative_path,
            absolute_path: path.to_path_buf(),
            content,
            mtime,
        });
    }
    files.sort_by(|left, right| left.relative_path.cmp(&right.relative_path));
    log::debug!("scanned {} markdown files under '{}'", files.len(), root.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_and_excluded_directories_are_pruned() {
        let root = Path::new("/vault");
        let excluded: HashSet<String> = ["node_modules".to_string()].into_iter().collect();
        assert!(should_skip_entry(Path::new("/vault/.obsidian"), true, root, &excluded));
        assert!(should_skip_entry(Path::new("/vault/Node_Modules"), true, root, &excluded));
        assert!(!should_skip_entry(Path::new("/vault/design"), true, root, &excluded));
        assert!(!should_skip_entry(Path::new("/vault/design/.hidden.md"), false, root, &excluded));
    }
}
