use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use glob_match::glob_match;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::NamingError;

/// Directory names that are never scanned, wherever they appear in a path.
pub const BUILTIN_IGNORED_SEGMENTS: [&str; 7] = [
    "node_modules",
    "dist",
    ".git",
    ".vscode",
    "out",
    "build",
    "coverage",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Folder,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => f.write_str("File"),
            EntryKind::Folder => f.write_str("Folder"),
        }
    }
}

/// One file or folder found under the scan root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    pub relative_path: PathBuf,
    pub kind: EntryKind,
}

impl Entry {
    pub fn new(relative_path: impl Into<PathBuf>, kind: EntryKind) -> Self {
        Self {
            relative_path: relative_path.into(),
            kind,
        }
    }

    pub fn file(relative_path: impl Into<PathBuf>) -> Self {
        Self::new(relative_path, EntryKind::File)
    }

    pub fn folder(relative_path: impl Into<PathBuf>) -> Self {
        Self::new(relative_path, EntryKind::Folder)
    }

    /// The basename the naming rule is checked against.
    pub fn name(&self) -> &str {
        self.relative_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Parent directory relative to the scan root; empty for top-level entries.
    pub fn parent(&self) -> &Path {
        self.relative_path.parent().unwrap_or(Path::new(""))
    }

    pub fn display_path(&self) -> String {
        to_slash(&self.relative_path)
    }
}

/// A subtree or entry the scan had to skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanIssue {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub entries: Vec<Entry>,
    pub issues: Vec<ScanIssue>,
}

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Descend into symlinked directories. Links resolving inside the root, or to
    /// a directory already visited, are still reported as leaves.
    pub follow_symlinks: bool,
    /// Limit traversal depth; `Some(1)` lists only the root's children.
    pub max_depth: Option<usize>,
}

/// Two-layer ignore check: configured globs against the relative path, and
/// the built-in directory names against every path segment.
#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    patterns: Vec<String>,
}

impl IgnoreFilter {
    pub fn new(patterns: &[String]) -> Self {
        Self {
            patterns: patterns.to_vec(),
        }
    }

    pub fn is_ignored(&self, relative_path: &Path) -> bool {
        let has_ignored_segment = relative_path.components().any(|c| match c {
            Component::Normal(segment) => segment
                .to_str()
                .is_some_and(|s| BUILTIN_IGNORED_SEGMENTS.contains(&s)),
            _ => false,
        });
        if has_ignored_segment {
            return true;
        }

        let path = to_slash(relative_path);
        self.patterns.iter().any(|pattern| glob_match(pattern, &path))
    }
}

/// Walks `root` depth-first in lexical order and returns every file and folder
/// that is not ignored. Each call reads the disk afresh.
pub fn scan(
    root: &Path,
    ignore_patterns: &[String],
    options: &ScanOptions,
) -> Result<ScanOutcome, NamingError> {
    fs::read_dir(root).map_err(|source| NamingError::ScanRoot {
        path: root.to_path_buf(),
        source,
    })?;

    info!("Scanning {:?}", root);

    let filter = IgnoreFilter::new(ignore_patterns);
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(options.follow_symlinks)
        .sort_by_file_name();
    if let Some(depth) = options.max_depth {
        walker = walker.max_depth(depth);
    }

    let canonical_root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut outcome = ScanOutcome::default();

    let mut it = walker.into_iter();
    while let Some(next) = it.next() {
        let dent = match next {
            Ok(dent) => dent,
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                if err.loop_ancestor().is_some() {
                    // Symlink back to an ancestor: keep the link itself, don't descend.
                    debug!("Symlink loop at {:?}, treating as leaf", path);
                    if let Some(rel) = relative_to(root, &path) {
                        if !filter.is_ignored(&rel) {
                            outcome.entries.push(Entry::folder(rel));
                        }
                    }
                } else {
                    warn!("Skipping {:?}: {}", path, err);
                    outcome.issues.push(ScanIssue {
                        path,
                        message: err.to_string(),
                    });
                }
                continue;
            }
        };

        let Some(rel) = relative_to(root, dent.path()) else {
            continue;
        };
        let is_dir = dent.file_type().is_dir();

        if filter.is_ignored(&rel) {
            debug!("Ignoring {:?}", rel);
            if is_dir {
                it.skip_current_dir();
            }
            continue;
        }

        if dent.file_name().to_str().is_none() {
            outcome.issues.push(ScanIssue {
                path: dent.path().to_path_buf(),
                message: "name is not valid UTF-8".to_string(),
            });
            if is_dir {
                it.skip_current_dir();
            }
            continue;
        }

        if is_dir && options.follow_symlinks {
            if let Ok(target) = fs::canonicalize(dent.path()) {
                let link_into_root = dent.path_is_symlink() && target.starts_with(&canonical_root);
                if link_into_root || !visited.insert(target) {
                    debug!("Not descending into {:?}: target already covered", rel);
                    it.skip_current_dir();
                }
            }
        }

        let kind = if is_dir || (dent.path_is_symlink() && dent.path().is_dir()) {
            EntryKind::Folder
        } else {
            EntryKind::File
        };
        debug!("Found {} {:?}", kind, rel);
        outcome.entries.push(Entry::new(rel, kind));
    }

    info!(
        "Scan complete: {} entries, {} skipped",
        outcome.entries.len(),
        outcome.issues.len()
    );
    Ok(outcome)
}

fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    path.strip_prefix(root).ok().map(Path::to_path_buf)
}

pub(crate) fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn paths(outcome: &ScanOutcome) -> Vec<String> {
        outcome.entries.iter().map(Entry::display_path).collect()
    }

    #[test]
    fn test_scan_lists_files_and_folders_in_lexical_order() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "b.js");
        touch(dir.path(), "MyComponents/loginButton.js");
        touch(dir.path(), "MyComponents/LogOut.js");
        touch(dir.path(), "a.js");

        let outcome = scan(dir.path(), &[], &ScanOptions::default()).unwrap();
        assert_eq!(
            paths(&outcome),
            vec![
                "MyComponents",
                "MyComponents/LogOut.js",
                "MyComponents/loginButton.js",
                "a.js",
                "b.js",
            ]
        );
        assert_eq!(outcome.entries[0].kind, EntryKind::Folder);
        assert_eq!(outcome.entries[1].kind, EntryKind::File);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_builtin_segments_are_ignored_at_any_depth() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/index.js");
        touch(dir.path(), "node_modules/leftPad/index.js");
        touch(dir.path(), "packages/web/node_modules/react/index.js");
        touch(dir.path(), "packages/web/build/Bundle.js");

        let outcome = scan(dir.path(), &[], &ScanOptions::default()).unwrap();
        assert_eq!(
            paths(&outcome),
            vec!["packages", "packages/web", "src", "src/index.js"]
        );
    }

    #[test]
    fn test_glob_patterns_prune_matches() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "package.json");
        touch(dir.path(), "vendor/LibA/main.js");
        touch(dir.path(), "src/app.js");

        let ignore = vec!["package.json".to_string(), "vendor".to_string()];
        let outcome = scan(dir.path(), &ignore, &ScanOptions::default()).unwrap();
        assert_eq!(paths(&outcome), vec!["src", "src/app.js"]);
    }

    #[test]
    fn test_ignore_filter_matches_double_star() {
        let filter = IgnoreFilter::new(&["generated/**".to_string()]);
        assert!(filter.is_ignored(Path::new("generated/api/Client.ts")));
        assert!(!filter.is_ignored(Path::new("src/generated.ts")));
        assert!(filter.is_ignored(Path::new("src/coverage/report.html")));
    }

    #[test]
    fn test_max_depth_limits_traversal() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "top.js");
        touch(dir.path(), "nested/deep.js");

        let options = ScanOptions {
            max_depth: Some(1),
            ..ScanOptions::default()
        };
        let outcome = scan(dir.path(), &[], &options).unwrap();
        assert_eq!(paths(&outcome), vec!["nested", "top.js"]);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let err = scan(&dir.path().join("nope"), &[], &ScanOptions::default()).unwrap_err();
        assert!(matches!(err, NamingError::ScanRoot { .. }));
    }

    #[test]
    fn test_rescan_reflects_disk_changes() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "one.js");
        let first = scan(dir.path(), &[], &ScanOptions::default()).unwrap();
        touch(dir.path(), "two.js");
        let second = scan(dir.path(), &[], &ScanOptions::default()).unwrap();
        assert_eq!(first.entries.len(), 1);
        assert_eq!(second.entries.len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_is_leaf_by_default() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "real/inner.js");
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("linked")).unwrap();

        let outcome = scan(dir.path(), &[], &ScanOptions::default()).unwrap();
        assert_eq!(paths(&outcome), vec!["linked", "real", "real/inner.js"]);
        assert_eq!(outcome.entries[0].kind, EntryKind::Folder);
    }

    #[cfg(unix)]
    #[test]
    fn test_followed_symlink_cycle_terminates() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "loop/inner.js");
        std::os::unix::fs::symlink(dir.path().join("loop"), dir.path().join("loop/back")).unwrap();

        let options = ScanOptions {
            follow_symlinks: true,
            ..ScanOptions::default()
        };
        let outcome = scan(dir.path(), &[], &options).unwrap();
        assert_eq!(paths(&outcome), vec!["loop", "loop/back", "loop/inner.js"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_followed_symlink_outside_root_is_traversed() {
        let outside = tempdir().unwrap();
        touch(outside.path(), "shared/util.js");
        let dir = tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path().join("shared"), dir.path().join("shared")).unwrap();

        let options = ScanOptions {
            follow_symlinks: true,
            ..ScanOptions::default()
        };
        let outcome = scan(dir.path(), &[], &options).unwrap();
        assert_eq!(paths(&outcome), vec!["shared", "shared/util.js"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subtree_is_reported_and_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        touch(dir.path(), "locked/secret.js");
        touch(dir.path(), "open/visible.js");
        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        if fs::read_dir(&locked).is_ok() {
            // Privileged user: permissions are not enforced.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let outcome = scan(dir.path(), &[], &ScanOptions::default());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let outcome = outcome.unwrap();

        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].path, locked);
        assert_eq!(paths(&outcome), vec!["locked", "open", "open/visible.js"]);
    }
}
