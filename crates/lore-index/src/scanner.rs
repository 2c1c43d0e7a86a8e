//! Workspace file enumeration with default skip rules and root `.gitignore`.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

/// Directory names pruned unconditionally, entire subtree included.
const SKIP_DIRS: &[&str] = &[
    ".git",
    ".idea",
    ".vscode",
    "node_modules",
    "target",
    "build",
    "dist",
    "bin",
    "__pycache__",
];

/// Junk files skipped regardless of location.
const SKIP_FILES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// Enumerate indexable files under `root`.
///
/// Applies, in order: the hard-coded skip set on directory names, the hidden
/// (dotfile) filter (`.gitignore` itself is consumed as configuration but
/// never returned), and the patterns of `<root>/.gitignore` with standard
/// gitignore semantics. Unreadable entries are logged and skipped; an
/// unreadable or missing root yields an empty list. The result is sorted so
/// repeated scans of the same tree observe the same order.
#[must_use]
pub fn scan(root: &Path) -> Vec<PathBuf> {
    let walk = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .require_git(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                !SKIP_DIRS.contains(&name.as_ref())
            } else {
                !SKIP_FILES.contains(&name.as_ref())
            }
        })
        .build();

    let mut files = Vec::new();
    for result in walk {
        match result {
            Ok(entry) => {
                if entry.file_type().is_some_and(|ft| ft.is_file()) {
                    files.push(entry.into_path());
                }
            }
            Err(e) => {
                tracing::warn!("scan skipped entry: {e}");
            }
        }
    }

    files.sort();
    files
}
