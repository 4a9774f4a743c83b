// Output path registry - keeps two items of one run from writing the same file

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::warn;

/// Paths handed out during a run.
///
/// Only collisions inside the run are resolved. A file left by an earlier
/// run is overwritten.
#[derive(Debug, Default)]
pub struct PathRegistry {
    claimed: Mutex<HashSet<PathBuf>>,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `path` for `item_id`. If another item already holds it, the item
    /// ID is appended to the file stem: `name [id].ext`.
    pub fn claim(&self, path: PathBuf, item_id: &str) -> PathBuf {
        let mut claimed = self.claimed.lock();

        if claimed.insert(path.clone()) {
            return path;
        }

        let mut candidate = with_id_suffix(&path, item_id);
        let mut attempt = 2;
        while !claimed.insert(candidate.clone()) {
            candidate = with_id_suffix(&path, &format!("{} {}", item_id, attempt));
            attempt += 1;
        }

        warn!(
            original = %path.display(),
            renamed = %candidate.display(),
            "output name already used in this run"
        );
        candidate
    }
}

fn with_id_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file_name = match path.extension() {
        Some(ext) => format!("{} [{}].{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{} [{}]", stem, suffix),
    };

    path.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_claim_keeps_path() {
        let registry = PathRegistry::new();
        let path = PathBuf::from("out/Song.mp3");

        assert_eq!(registry.claim(path.clone(), "abc"), path);
        assert_eq!(
            registry.claim(PathBuf::from("out/Other.mp3"), "def"),
            PathBuf::from("out/Other.mp3")
        );
    }

    #[test]
    fn test_collision_gets_item_id() {
        let registry = PathRegistry::new();

        registry.claim(PathBuf::from("out/Song.mp3"), "abc");
        let second = registry.claim(PathBuf::from("out/Song.mp3"), "def");

        assert_eq!(second, PathBuf::from("out/Song [def].mp3"));
    }

    #[test]
    fn test_repeated_id_still_unique() {
        let registry = PathRegistry::new();

        let a = registry.claim(PathBuf::from("out/Song.mp4"), "x");
        let b = registry.claim(PathBuf::from("out/Song.mp4"), "x");
        let c = registry.claim(PathBuf::from("out/Song.mp4"), "x");

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(c, PathBuf::from("out/Song [x 2].mp4"));
    }
}
