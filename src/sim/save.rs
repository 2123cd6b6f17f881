/// Persistent player progress: best scores, completed levels, achievements.
///
/// ## File format
///   `progress.toml`, serde-mapped from `Progress`:
///
///   ```toml
///   completed = ["Tutorial", "Basics"]
///
///   [achievements]
///   unlocked = ["FirstSteps", "PureSkill"]
///
///   [achievements.stats]
///   total_pushes = 12
///
///   [best.Tutorial]
///   moves = 9
///   pushes = 3
///   ```
///
/// Best scores are keyed by level name, which the catalog keeps unique.
/// A missing file is a fresh start; an unreadable or corrupt one is
/// logged and treated the same way.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::achievements::Achievements;

pub const PROGRESS_FILE: &str = "progress.toml";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("could not write progress: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt progress file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("could not encode progress: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

// ══════════════════════════════════════════════════════════════
// Public types
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BestScore {
    pub moves: u32,
    pub pushes: u32,
}

impl BestScore {
    /// Fewer moves wins; on equal moves, fewer pushes wins.
    pub fn beats(self, other: BestScore) -> bool {
        (self.moves, self.pushes) < (other.moves, other.pushes)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    pub completed: BTreeSet<String>,
    pub achievements: Achievements,
    pub best: BTreeMap<String, BestScore>,
}

impl Progress {
    /// Record a finished level. Returns true when the score is a new best.
    pub fn record_completion(&mut self, level: &str, moves: u32, pushes: u32) -> bool {
        self.completed.insert(level.to_string());
        let score = BestScore { moves, pushes };
        match self.best.get(level) {
            Some(best) if !score.beats(*best) => false,
            _ => {
                self.best.insert(level.to_string(), score);
                true
            }
        }
    }

    pub fn best(&self, level: &str) -> Option<BestScore> {
        self.best.get(level).copied()
    }

    pub fn is_completed(&self, level: &str) -> bool {
        self.completed.contains(level)
    }

    /// Every name in `levels` has been completed at least once.
    pub fn completed_all<'a>(&self, mut levels: impl Iterator<Item = &'a str>) -> bool {
        levels.all(|name| self.completed.contains(name))
    }
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

/// Directory for progress: exe dir if writable, then XDG data home, then CWD.
pub fn save_dir() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // system installs like /usr/games/ won't be writable
            let test_path = parent.join(".write_test_boxpusher");
            if fs::write(&test_path, "").is_ok() {
                let _ = fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/boxpusher");
        if fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// Store
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ProgressStore { path: path.into() }
    }

    /// `progress.toml` inside `save_dir()`.
    pub fn default_location() -> Self {
        ProgressStore::new(save_dir().join(PROGRESS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Strict read: a missing file is `Ok(None)`.
    pub fn try_load(&self) -> Result<Option<Progress>, SaveError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(toml::from_str(&text)?))
    }

    /// Lenient read used at startup.
    pub fn load(&self) -> Progress {
        match self.try_load() {
            Ok(Some(progress)) => {
                log::info!("loaded progress from {}", self.path.display());
                progress
            }
            Ok(None) => {
                log::debug!("no progress file at {}", self.path.display());
                Progress::default()
            }
            Err(e) => {
                log::warn!("{}: {}; starting with empty progress", self.path.display(), e);
                Progress::default()
            }
        }
    }

    pub fn save(&self, progress: &Progress) -> Result<(), SaveError> {
        let text = toml::to_string(progress)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, text)?;
        log::debug!("saved progress to {}", self.path.display());
        Ok(())
    }
}
