/// Inputs consumed and events emitted by a session step.
/// The presentation layer turns events into status messages; the main
/// loop uses them to decide when progress must be persisted.

use crate::domain::position::Direction;
use crate::domain::progress::Grade;
use crate::domain::rules::BlockReason;
use crate::sim::achievements::Achievement;
use crate::sim::catalog::CatalogError;

/// Player intent, already decoded from whatever device produced it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Input {
    Move(Direction),
    Undo,
    Reset,
    SelectLevel(usize),
    NextLevel,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Moved { pushed: bool },
    Blocked(BlockReason),
    Undone,
    NothingToUndo,
    LevelReset,
    LevelLoaded { index: usize },
    LevelUnavailable(CatalogError),
    LevelCompleted { index: usize, moves: u32, pushes: u32, grade: Grade },
    NewBest { moves: u32, pushes: u32 },
    AchievementUnlocked(Achievement),
    AllLevelsCompleted,
}

impl GameEvent {
    /// Whether this event changed anything in the persisted progress.
    pub fn touches_progress(&self) -> bool {
        matches!(
            self,
            GameEvent::LevelCompleted { .. }
                | GameEvent::NewBest { .. }
                | GameEvent::AchievementUnlocked(_)
        )
    }
}
