use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::fs::read_dir;

/// Lists the direct children of `source_dir` and keeps regular files whose
/// base name matches `pattern` (already anchored at the name start by
/// [`crate::config::compile_pattern`]). Directories and symlinks are skipped.
/// Order is whatever the directory listing yields. An unreadable directory
/// yields an empty list; validity is the caller's concern.
pub async fn select_files(source_dir: &Path, pattern: &Regex) -> Vec<PathBuf> {
    let mut matching = Vec::new();
    let mut reader = match read_dir(source_dir).await {
        Ok(reader) => reader,
        Err(_) => return matching,
    };

    loop {
        match reader.next_entry().await {
            Ok(Some(entry)) => {
                let is_file = match entry.file_type().await {
                    // file_type does not follow symlinks
                    Ok(file_type) => file_type.is_file(),
                    Err(_) => false,
                };
                if !is_file {
                    continue;
                }
                let name = entry.file_name();
                let Some(name) = name.to_str() else {
                    continue;
                };
                if pattern.is_match(name) {
                    matching.push(entry.path());
                }
            }
            Ok(None) => break,
            Err(_) => break,
        }
    }

    matching
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::compile_pattern;

    #[tokio::test]
    async fn matches_files_and_ignores_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"img").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"txt").unwrap();
        std::fs::create_dir(dir.path().join("c.png")).unwrap();

        let pattern = compile_pattern(r".*\.png").unwrap();
        let found = select_files(dir.path(), &pattern).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0], dir.path().join("a.png"));
    }

    #[tokio::test]
    async fn never_returns_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::create_dir(dir.path().join("another.png")).unwrap();

        let pattern = compile_pattern(".*").unwrap();
        let found = select_files(dir.path(), &pattern).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn listing_is_not_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("nested.png"), b"img").unwrap();

        let pattern = compile_pattern(r".*\.png").unwrap();
        let found = select_files(dir.path(), &pattern).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn anchoring_selects_by_name_start() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("run_0001.graw"), b"x").unwrap();
        std::fs::write(dir.path().join("old_run_0001.graw"), b"x").unwrap();

        let pattern = compile_pattern("run_").unwrap();
        let found = select_files(dir.path(), &pattern).await;
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("run_0001.graw"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinks_are_excluded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("real.png"), b"img").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.png"), dir.path().join("link.png"))
            .unwrap();

        let pattern = compile_pattern(r".*\.png").unwrap();
        let found = select_files(dir.path(), &pattern).await;
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("real.png"));
    }

    #[tokio::test]
    async fn unreadable_directory_yields_nothing() {
        let pattern = compile_pattern(".*").unwrap();
        let found = select_files(Path::new("/no/such/dir"), &pattern).await;
        assert!(found.is_empty());
    }
}
