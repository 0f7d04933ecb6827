use std::fs;
use std::io;
use std::path::Path;

use crate::scanner::EntryKind;

/// Host filesystem primitives the planner and executor rely on.
///
/// `rename` must be atomic per call: either applied or not. Nothing here is
/// atomic across calls.
pub trait FileSystem {
    /// Names of the direct children of `dir`.
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>>;
    /// Kind of the entry at `path`, or `None` if nothing is there. Does not follow symlinks.
    fn stat(&self, path: &Path) -> io::Result<Option<EntryKind>>;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// The local disk, through `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFs {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn stat(&self, path: &Path) -> io::Result<Option<EntryKind>> {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => Ok(Some(EntryKind::Folder)),
            Ok(meta) if meta.file_type().is_symlink() && path.is_dir() => {
                Ok(Some(EntryKind::Folder))
            }
            Ok(_) => Ok(Some(EntryKind::File)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_local_fs_stat() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let fs = LocalFs::new();

        assert_eq!(fs.stat(&dir.path().join("a.txt")).unwrap(), Some(EntryKind::File));
        assert_eq!(fs.stat(&dir.path().join("sub")).unwrap(), Some(EntryKind::Folder));
        assert_eq!(fs.stat(&dir.path().join("missing")).unwrap(), None);
    }

    #[test]
    fn test_local_fs_list_and_rename() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("old.txt"), "a").unwrap();
        let fs = LocalFs::new();

        fs.rename(&dir.path().join("old.txt"), &dir.path().join("new.txt"))
            .unwrap();
        assert_eq!(fs.list_dir(dir.path()).unwrap(), vec!["new.txt".to_string()]);
    }
}
