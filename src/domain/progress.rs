/// Win detection and par grading.
///
/// `is_complete` is derived from scratch on every call so it can be used
/// to cross-check the flag maintained by `rules::apply_move`.

use serde::{Deserialize, Serialize};

use super::state::PuzzleState;

/// Designer-set move/push targets for a level. Not a hard limit.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Par {
    pub moves: u32,
    pub pushes: u32,
}

impl Par {
    pub const DEFAULT: Par = Par { moves: 50, pushes: 25 };

    pub fn is_valid(self) -> bool {
        self.moves > 0 && self.pushes > 0
    }
}

impl Default for Par {
    fn default() -> Self {
        Par::DEFAULT
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Grade {
    pub under_par_moves: bool,
    pub under_par_pushes: bool,
}

impl Grade {
    pub fn all_par(self) -> bool {
        self.under_par_moves && self.under_par_pushes
    }
}

/// Every box sits on a target.
pub fn is_complete(state: &PuzzleState) -> bool {
    let targets = state.targets();
    state.boxes().iter().all(|b| targets.contains(b))
}

/// Compare counters against par. Equal to par counts as at/under par.
pub fn grade(state: &PuzzleState, par: Par) -> Grade {
    grade_counts(state.moves(), state.pushes(), par)
}

pub fn grade_counts(moves: u32, pushes: u32, par: Par) -> Grade {
    Grade {
        under_par_moves: moves <= par.moves,
        under_par_pushes: pushes <= par.pushes,
    }
}
