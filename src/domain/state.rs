/// PuzzleState: the mutable runtime state of one play session.
///
/// ## Layers
///
///   - `level`   — walls/targets/bounds, shared with the catalog. **Never
///                 copied** per state; every view borrows through the `Rc`.
///   - `player`, `boxes`, `moves`, `pushes` — the four mutable fields.
///   - `complete` — derived flag, recomputed on every mutation.
///
/// Mutation is restricted to `rules::apply_move` and `restore()`, so the
/// box count and no-overlap invariants only have to be upheld there.

use std::collections::HashSet;
use std::rc::Rc;

use super::layout::{self, LevelModel};
use super::position::Position;

#[derive(Clone, Debug)]
pub struct PuzzleState {
    level: Rc<LevelModel>,
    pub(in crate::domain) player: Position,
    pub(in crate::domain) boxes: HashSet<Position>,
    pub(in crate::domain) moves: u32,
    pub(in crate::domain) pushes: u32,
    pub(in crate::domain) complete: bool,
}

/// Independent copy of the four mutable fields, taken before a move.
///
/// Owns its own box set: mutating the live state afterwards can never
/// alias into stored history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub player: Position,
    pub boxes: HashSet<Position>,
    pub moves: u32,
    pub pushes: u32,
}

impl PuzzleState {
    /// Fresh state at the level's initial placement, counters at zero.
    pub fn new(level: Rc<LevelModel>) -> Self {
        let player = level.initial_player;
        let boxes = level.initial_boxes.clone();
        let complete = boxes.is_subset(&level.targets);
        PuzzleState { level, player, boxes, moves: 0, pushes: 0, complete }
    }

    pub fn level(&self) -> &LevelModel {
        &self.level
    }

    pub fn player(&self) -> Position {
        self.player
    }

    pub fn boxes(&self) -> &HashSet<Position> {
        &self.boxes
    }

    pub fn targets(&self) -> &HashSet<Position> {
        &self.level.targets
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn pushes(&self) -> u32 {
        self.pushes
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Number of boxes currently resting on a target.
    pub fn boxes_on_targets(&self) -> usize {
        self.boxes.intersection(&self.level.targets).count()
    }

    /// Deep copy of the mutable fields for the undo history.
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            player: self.player,
            boxes: self.boxes.clone(),
            moves: self.moves,
            pushes: self.pushes,
        }
    }

    /// Replace all four mutable fields at once. Consumes the snapshot so
    /// the restored box set is owned by the live state alone.
    pub fn restore(&mut self, snap: HistorySnapshot) {
        self.player = snap.player;
        self.boxes = snap.boxes;
        self.moves = snap.moves;
        self.pushes = snap.pushes;
        self.refresh_complete();
    }

    /// Back to the level's initial placement with zeroed counters.
    pub fn reset(&mut self) {
        *self = PuzzleState::new(Rc::clone(&self.level));
    }

    /// Current state encoded as layout symbol rows.
    pub fn rows(&self) -> Vec<String> {
        layout::render_rows(&self.level, self.player, &self.boxes)
    }

    pub(in crate::domain) fn refresh_complete(&mut self) {
        self.complete = self.boxes.is_subset(&self.level.targets);
    }
}

/// Field-for-field equality of the mutable state (the level is shared).
impl PartialEq for PuzzleState {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.level, &other.level)
            && self.player == other.player
            && self.boxes == other.boxes
            && self.moves == other.moves
            && self.pushes == other.pushes
            && self.complete == other.complete
    }
}

impl Eq for PuzzleState {}
