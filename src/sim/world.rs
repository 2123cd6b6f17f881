/// WorldState: everything a running game session owns.
///
/// ## Ownership
///
///   - `catalog`  — immutable after load; hands out `Rc<LevelModel>`s.
///   - `puzzle`   — the live `PuzzleState` for `current_level`.
///   - `history`  — undo snapshots for the current attempt only. Cleared
///                  on reset and on every level load.
///   - `progress` — best scores, completions and achievement counters;
///                  the main loop persists it.
///
/// Menu state (`phase`, `select_cursor`) lives here so the renderer reads
/// one struct, but only `sim::step` mutates the puzzle.

use std::time::{Duration, Instant};

use crate::domain::state::PuzzleState;
use crate::sim::catalog::{CatalogError, LevelCatalog, LevelCatalogEntry};
use crate::sim::history::HistoryManager;
use crate::sim::save::Progress;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    LevelSelect,
    Playing,
    LevelComplete,
    GameComplete,
}

pub struct WorldState {
    pub catalog: LevelCatalog,
    pub current_level: usize,
    pub puzzle: PuzzleState,
    pub history: HistoryManager,
    /// Undo was used at least once since the level was loaded or reset.
    pub used_undo: bool,
    pub progress: Progress,
    pub phase: Phase,
    pub started_at: Instant,
    /// Frozen play time once the level is complete.
    pub finished_in: Option<Duration>,
    pub message: String,
    pub select_cursor: usize,
    pub select_scroll: usize,
}

// ── Construction ──

impl WorldState {
    /// Session positioned on the first catalog level, at the title screen.
    pub fn new(catalog: LevelCatalog, progress: Progress, history_depth: usize) -> Result<Self, CatalogError> {
        let (model, _) = catalog.get(0)?;
        Ok(WorldState {
            catalog,
            current_level: 0,
            puzzle: PuzzleState::new(model),
            history: HistoryManager::new(history_depth),
            used_undo: false,
            progress,
            phase: Phase::Title,
            started_at: Instant::now(),
            finished_in: None,
            message: String::new(),
            select_cursor: 0,
            select_scroll: 0,
        })
    }

    pub fn entry(&self) -> &LevelCatalogEntry {
        // current_level is only ever set from a successful catalog lookup
        &self.catalog.entries()[self.current_level]
    }

    pub fn elapsed(&self) -> Duration {
        self.finished_in.unwrap_or_else(|| self.started_at.elapsed())
    }

    pub fn set_message(&mut self, msg: &str) {
        self.message = msg.to_string();
    }

    /// Start the current level over: initial placement, empty history.
    pub fn restart_attempt(&mut self) {
        self.puzzle.reset();
        self.history.clear();
        self.used_undo = false;
        self.started_at = Instant::now();
        self.finished_in = None;
    }
}
