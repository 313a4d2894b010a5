use ignore::WalkBuilder;
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Collects every file under `root` whose extension matches `suffix`.
///
/// The walk is recursive and does not follow symlinks; hidden entries are
/// visited, and `.ignore`/git ignore rules are inert, whether they sit in
/// the tree or in a directory above it. Unreadable entries are skipped with
/// a warning rather than aborting the walk.
pub fn source_files(root: &Path, suffix: &str) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .ignore(false)
        .parents(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    continue;
                }
                let path = entry.path();
                if path.extension().is_some_and(|e| e == suffix) {
                    files.push(path.to_path_buf());
                }
            }
            Err(err) => {
                warn!("skipping unreadable entry under {}: {err}", root.display());
            }
        }
    }

    debug!(
        "found {} .{suffix} file(s) under {}",
        files.len(),
        root.display()
    );
    files
}
