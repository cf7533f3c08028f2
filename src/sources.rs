//! Discovery of candidate image files for the wallpaper.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::Error;

/// Lowercase suffixes accepted as wallpaper images.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// Return `true` if `path` ends in an accepted image suffix (case-insensitive).
#[must_use]
pub fn is_accepted_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            ACCEPTED_EXTENSIONS.iter().any(|e| *e == ext)
        })
}

/// Build the ordered candidate list for `path`.
///
/// With `multi == false` the result is `[path]`, untouched. Otherwise every
/// regular file in the parent directory with an accepted suffix is returned,
/// in directory-listing order. That order is platform dependent but stable
/// for the lifetime of the returned list.
///
/// # Errors
/// - [`Error::SourceUnavailable`] if the parent directory is missing or
///   cannot be listed.
/// - [`Error::EmptyCandidateSet`] if the directory holds no accepted files.
pub fn enumerate(path: &Path, multi: bool) -> Result<Vec<PathBuf>, Error> {
    if !multi {
        return Ok(vec![path.to_path_buf()]);
    }

    let dir = match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => {
            return Err(Error::SourceUnavailable {
                path: path.to_path_buf(),
                source: None,
            });
        }
    };
    if !dir.is_dir() {
        return Err(Error::SourceUnavailable {
            path: dir.to_path_buf(),
            source: None,
        });
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            // Only a failure to read the directory itself hides every file.
            Err(err) if err.depth() == 0 => {
                return Err(Error::SourceUnavailable {
                    path: dir.to_path_buf(),
                    source: err.into_io_error(),
                });
            }
            Err(err) => {
                debug!(dir = %dir.display(), "skipping unreadable entry: {err}");
                continue;
            }
        };
        let candidate = entry.path();
        if entry.file_type().is_file() && is_accepted_image(candidate) {
            out.push(candidate.to_path_buf());
        }
    }

    if out.is_empty() {
        return Err(Error::EmptyCandidateSet(dir.to_path_buf()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn accepts_jpeg_suffixes_case_insensitively() {
        assert!(is_accepted_image(Path::new("a.jpg")));
        assert!(is_accepted_image(Path::new("a.JPEG")));
        assert!(is_accepted_image(Path::new("dir/b.JpG")));
        assert!(!is_accepted_image(Path::new("a.png")));
        assert!(!is_accepted_image(Path::new("jpg")));
    }

    #[test]
    fn single_mode_returns_path_unchanged() {
        let p = Path::new("/does/not/exist.png");
        assert_eq!(enumerate(p, false).unwrap(), vec![p.to_path_buf()]);
    }

    #[test]
    fn multi_mode_lists_sibling_jpegs_only() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("a.jpg"), b"x").unwrap();
        fs::write(root.join("b.JPEG"), b"x").unwrap();
        fs::write(root.join("c.png"), b"x").unwrap();
        fs::create_dir(root.join("d.jpg")).unwrap();
        fs::create_dir(root.join("nested")).unwrap();
        fs::write(root.join("nested").join("e.jpg"), b"x").unwrap();

        let mut found = enumerate(&root.join("a.jpg"), true).unwrap();
        found.sort();
        assert_eq!(found, vec![root.join("a.jpg"), root.join("b.JPEG")]);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_does_not_hide_siblings() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("a.jpg"), b"x").unwrap();
        fs::write(root.join("b.jpg"), b"x").unwrap();
        std::os::unix::fs::symlink(root.join("gone.txt"), root.join("stale.txt")).unwrap();
        std::os::unix::fs::symlink(root.join("gone.jpg"), root.join("stale.jpg")).unwrap();

        let mut found = enumerate(&root.join("a.jpg"), true).unwrap();
        found.sort();
        assert_eq!(found, vec![root.join("a.jpg"), root.join("b.jpg")]);
    }

    #[test]
    fn multi_mode_missing_parent_is_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let gone = tmp.path().join("gone").join("a.jpg");
        let err = enumerate(&gone, true).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { .. }), "{err:?}");
    }

    #[test]
    fn multi_mode_without_matches_is_empty_set() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("notes.txt"), b"x").unwrap();
        let err = enumerate(&tmp.path().join("notes.txt"), true).unwrap_err();
        assert!(matches!(err, Error::EmptyCandidateSet(_)), "{err:?}");
    }
}
