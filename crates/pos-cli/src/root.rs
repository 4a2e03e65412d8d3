use pos_core::paths::POS_DIR;
use std::path::{Path, PathBuf};

/// Resolve the store root.
///
/// `--root` / `POS_ROOT` wins; otherwise walk upward from the working
/// directory looking for `.pos/`, falling back to the working directory
/// itself (which is where `pos init` will create it).
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_store(&cwd).unwrap_or(cwd)
}

fn find_store(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(POS_DIR).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_root(Some(dir.path())), dir.path());
    }

    #[test]
    fn finds_store_from_subdirectory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(POS_DIR)).unwrap();
        let deep = dir.path().join("a/b/c");
        std::fs::create_dir_all(&deep).unwrap();
        assert_eq!(find_store(&deep).as_deref(), Some(dir.path()));
    }

    #[test]
    fn no_store_found() {
        let dir = TempDir::new().unwrap();
        assert_eq!(find_store(dir.path()), None);
    }
}
