/// High score persistence.
///
/// The core only sees the `ScoreStore` trait: `get()` once when the session
/// is created, `set()` once per game end. Storage failures never reach
/// gameplay: an unreadable score reads as 0, a failed write is an `Err`
/// the session logs and drops.
///
/// ## File format:
///   Key-value lines, same style as the rest of the data directory:
///   `high_score=<n>`

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub trait ScoreStore {
    /// Best score so far, 0 if there is none.
    fn get(&self) -> u32;
    fn set(&mut self, score: u32) -> Result<(), StoreError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not write high score to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("score store unavailable")]
    Unavailable,
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

/// Where the score file and log live.
pub fn data_dir() -> PathBuf {
    // 1. Exe directory, if writable (portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let test_path = parent.join(".write_test_flapterm");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home (~/.local/share/flapterm)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/flapterm");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// File store
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct FileScoreStore {
    path: PathBuf,
}

impl FileScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileScoreStore { path: path.into() }
    }

    /// Relative names resolve against `data_dir()`; absolute paths are kept.
    pub fn in_data_dir(file: &Path) -> Self {
        if file.is_absolute() {
            FileScoreStore::new(file)
        } else {
            FileScoreStore::new(data_dir().join(file))
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreStore for FileScoreStore {
    fn get(&self) -> u32 {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => parse_score(&content).unwrap_or_else(|| {
                tracing::warn!(path = %self.path.display(), "unreadable high score, starting from 0");
                0
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "could not read high score");
                0
            }
        }
    }

    fn set(&mut self, score: u32) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
        std::fs::write(&self.path, serialize(score)).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

// ══════════════════════════════════════════════════════════════
// In-memory store
// ══════════════════════════════════════════════════════════════

/// Keeps the score in memory and records every write.
/// Used when no durable storage is wanted, and by tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryScoreStore {
    pub value: u32,
    pub writes: Vec<u32>,
    pub fail_writes: bool,
}

impl MemoryScoreStore {
    pub fn new(value: u32) -> Self {
        MemoryScoreStore { value, ..Default::default() }
    }

    /// A store whose every write fails.
    #[cfg(test)]
    pub fn failing() -> Self {
        MemoryScoreStore { fail_writes: true, ..Default::default() }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn get(&self) -> u32 {
        self.value
    }

    fn set(&mut self, score: u32) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable);
        }
        self.value = score;
        self.writes.push(score);
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Serialization
// ══════════════════════════════════════════════════════════════

fn serialize(score: u32) -> String {
    format!("high_score={}\n", score)
}

fn parse_score(content: &str) -> Option<u32> {
    content
        .lines()
        .find_map(|line| line.trim().strip_prefix("high_score="))
        .and_then(|val| val.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileScoreStore::new(dir.path().join("highscore.dat"));
        assert_eq!(store.get(), 0);
    }

    #[test]
    fn set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileScoreStore::new(dir.path().join("highscore.dat"));
        store.set(42).unwrap();
        assert_eq!(store.get(), 42);

        let reopened = FileScoreStore::new(dir.path().join("highscore.dat"));
        assert_eq!(reopened.get(), 42);
    }

    #[test]
    fn set_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileScoreStore::new(dir.path().join("nested/deeper/highscore.dat"));
        store.set(3).unwrap();
        assert_eq!(store.get(), 3);
    }

    #[test]
    fn garbage_file_reads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("highscore.dat");
        std::fs::write(&path, "high_score=lots\n").unwrap();
        assert_eq!(FileScoreStore::new(&path).get(), 0);

        std::fs::write(&path, "\u{0}\u{1}binary").unwrap();
        assert_eq!(FileScoreStore::new(&path).get(), 0);
    }

    #[test]
    fn write_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // The target path is a directory, so the write must fail.
        let mut store = FileScoreStore::new(dir.path());
        let err = store.set(5).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert_eq!(store.get(), 0);
    }

    #[test]
    fn absolute_paths_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let abs = dir.path().join("best.dat");
        assert_eq!(FileScoreStore::in_data_dir(&abs).path(), abs.as_path());
    }

    #[test]
    fn parse_tolerates_whitespace() {
        assert_eq!(parse_score("  high_score= 17 \n"), Some(17));
        assert_eq!(parse_score("other=1\nhigh_score=8\n"), Some(8));
        assert_eq!(parse_score(""), None);
        assert_eq!(serialize(9), "high_score=9\n");
    }

    #[test]
    fn memory_store_records_writes() {
        let mut store = MemoryScoreStore::new(4);
        assert_eq!(store.get(), 4);
        store.set(10).unwrap();
        assert_eq!(store.get(), 10);
        assert_eq!(store.writes, vec![10]);

        let mut broken = MemoryScoreStore::failing();
        assert!(broken.set(1).is_err());
        assert_eq!(broken.get(), 0);
    }
}
