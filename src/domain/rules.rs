/// Move/push resolution — truth-table driven.
///
/// `apply_move` is the only transition that displaces the player or a box.
/// It never touches undo history: the caller snapshots the old state
/// first if the move should be undoable.
///
/// ## Move Truth Table
///
/// Checks run top to bottom; the first DENY wins and leaves the state
/// untouched (player, boxes, moves, pushes, complete).
///
/// ┌───────────────────────────────────┬─────────────────────────┐
/// │ Condition (target = player+delta) │ Outcome                 │
/// ├───────────────────────────────────┼─────────────────────────┤
/// │ target out of bounds              │ DENY  OutOfBounds       │
/// │ target is wall                    │ DENY  Wall              │
/// │ target holds box, beyond OOB      │ DENY  BoxOutOfBounds    │
/// │ target holds box, beyond wall/box │ DENY  BoxObstructed     │
/// │ target holds box, beyond free     │ PUSH  pushes+1, moves+1 │
/// │ otherwise                         │ WALK  moves+1           │
/// └───────────────────────────────────┴─────────────────────────┘
///
/// After WALK or PUSH, `complete` is recomputed as `boxes ⊆ targets`.

use super::position::Direction;
use super::state::PuzzleState;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlockReason {
    OutOfBounds,
    Wall,
    BoxOutOfBounds,
    BoxObstructed,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveOutcome {
    Blocked(BlockReason),
    Moved { pushed: bool, complete: bool },
}

/// Apply one directional move. See truth table above.
pub fn apply_move(state: &mut PuzzleState, dir: Direction) -> MoveOutcome {
    let level = state.level();
    let target = state.player.step(dir);

    if !level.in_bounds(target) {
        return MoveOutcome::Blocked(BlockReason::OutOfBounds);
    }
    if level.walls.contains(&target) {
        return MoveOutcome::Blocked(BlockReason::Wall);
    }

    let pushed = state.boxes.contains(&target);
    if pushed {
        let beyond = target.step(dir);
        if !level.in_bounds(beyond) {
            return MoveOutcome::Blocked(BlockReason::BoxOutOfBounds);
        }
        if level.walls.contains(&beyond) || state.boxes.contains(&beyond) {
            return MoveOutcome::Blocked(BlockReason::BoxObstructed);
        }
        state.boxes.remove(&target);
        state.boxes.insert(beyond);
        state.pushes += 1;
    }

    state.player = target;
    state.moves += 1;
    state.refresh_complete();

    MoveOutcome::Moved { pushed, complete: state.complete }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::rc::Rc;

    use crate::domain::layout::parse;
    use crate::domain::position::Position;
    use crate::domain::progress::is_complete;

    /// Helper: build a fresh state from a layout diagram.
    /// Legend: '#'=Wall '@'=Player '$'=Box '.'=Target '*'=Box on target
    ///         '+'=Player on target ' '=Floor
    fn state_from(rows: &[&str]) -> PuzzleState {
        PuzzleState::new(Rc::new(parse(rows).unwrap()))
    }

    fn p(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    fn blocked(out: MoveOutcome) -> bool {
        matches!(out, MoveOutcome::Blocked(_))
    }

    const DIRECTIONS: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Tiny deterministic generator for direction sequences.
    fn directions(seed: u64, len: usize) -> Vec<Direction> {
        let mut s = seed;
        (0..len)
            .map(|_| {
                s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                DIRECTIONS[((s >> 33) % 4) as usize]
            })
            .collect()
    }

    const ROOM: &[&str] = &[
        "########",
        "#  .   #",
        "# $$ . #",
        "#  @ $ #",
        "# .  $.#",
        "########",
    ];

    // ── Concrete scenarios ──

    #[test]
    fn push_box_onto_target_completes() {
        let mut s = state_from(&["#####", "#@$.#", "#####"]);
        let out = apply_move(&mut s, Direction::Right);
        assert_eq!(out, MoveOutcome::Moved { pushed: true, complete: true });
        assert_eq!(s.player(), p(2, 1));
        assert_eq!(s.boxes(), &HashSet::from([p(3, 1)]));
        assert_eq!((s.moves(), s.pushes()), (1, 1));
        assert!(s.is_complete());
    }

    #[test]
    fn walking_into_wall_is_blocked() {
        let mut s = state_from(&["#####", "#@$.#", "#####"]);
        let before = s.clone();
        assert_eq!(apply_move(&mut s, Direction::Left), MoveOutcome::Blocked(BlockReason::Wall));
        assert_eq!(s, before);
        assert_eq!(s.moves(), 0);
    }

    #[test]
    fn box_against_wall_is_obstructed() {
        let mut s = state_from(&["#####", "#@$#.", "#####"]);
        let before = s.clone();
        assert_eq!(
            apply_move(&mut s, Direction::Right),
            MoveOutcome::Blocked(BlockReason::BoxObstructed)
        );
        assert_eq!(s, before);
    }

    #[test]
    fn box_against_box_is_obstructed() {
        let mut s = state_from(&["######", "#@$$.#", "#   .#", "######"]);
        let before = s.clone();
        assert_eq!(
            apply_move(&mut s, Direction::Right),
            MoveOutcome::Blocked(BlockReason::BoxObstructed)
        );
        assert_eq!(s, before);
    }

    #[test]
    fn stepping_off_open_edge_is_out_of_bounds() {
        // No surrounding walls: the grid edge itself is the boundary.
        let mut s = state_from(&["@$.", "   "]);
        assert_eq!(apply_move(&mut s, Direction::Left), MoveOutcome::Blocked(BlockReason::OutOfBounds));
        assert_eq!(apply_move(&mut s, Direction::Up), MoveOutcome::Blocked(BlockReason::OutOfBounds));
        assert_eq!(s.moves(), 0);
    }

    #[test]
    fn pushing_box_off_open_edge_is_box_out_of_bounds() {
        let mut s = state_from(&[".@$"]);
        let before = s.clone();
        assert_eq!(
            apply_move(&mut s, Direction::Right),
            MoveOutcome::Blocked(BlockReason::BoxOutOfBounds)
        );
        assert_eq!(s, before);
    }

    #[test]
    fn plain_walk_counts_move_only() {
        let mut s = state_from(&["######", "#@ $.#", "######"]);
        let out = apply_move(&mut s, Direction::Right);
        assert_eq!(out, MoveOutcome::Moved { pushed: false, complete: false });
        assert_eq!((s.moves(), s.pushes()), (1, 0));
    }

    #[test]
    fn pushing_box_off_target_clears_complete() {
        let mut s = state_from(&["######", "#@* .#", "#   $#", "######"]);
        // one of two boxes on target; push it off
        let out = apply_move(&mut s, Direction::Right);
        assert_eq!(out, MoveOutcome::Moved { pushed: true, complete: false });
        assert_eq!(s.boxes_on_targets(), 0);
    }

    #[test]
    fn player_may_stand_on_target() {
        let mut s = state_from(&["#####", "#@.$*#", "#####"]);
        assert!(!blocked(apply_move(&mut s, Direction::Right)));
        assert_eq!(s.player(), p(2, 1));
        assert!(!s.is_complete());
    }

    // ── Properties over scripted random walks ──

    #[test]
    fn blocked_moves_are_no_ops() {
        for seed in 0..20 {
            let mut s = state_from(ROOM);
            for dir in directions(seed, 200) {
                let before = s.clone();
                if blocked(apply_move(&mut s, dir)) {
                    assert_eq!(s, before, "seed {seed}: blocked {dir} mutated state");
                }
            }
        }
    }

    #[test]
    fn counters_track_outcomes_exactly() {
        for seed in 0..20 {
            let mut s = state_from(ROOM);
            for dir in directions(seed, 200) {
                let (moves, pushes) = (s.moves(), s.pushes());
                match apply_move(&mut s, dir) {
                    MoveOutcome::Blocked(_) => {
                        assert_eq!((s.moves(), s.pushes()), (moves, pushes));
                    }
                    MoveOutcome::Moved { pushed, .. } => {
                        assert_eq!(s.moves(), moves + 1);
                        assert_eq!(s.pushes(), pushes + u32::from(pushed));
                    }
                }
            }
        }
    }

    #[test]
    fn box_count_and_no_overlap_hold() {
        for seed in 0..20 {
            let mut s = state_from(ROOM);
            let count = s.boxes().len();
            for dir in directions(seed, 300) {
                apply_move(&mut s, dir);
                assert_eq!(s.boxes().len(), count);
                assert!(s.boxes().is_disjoint(&s.level().walls));
                assert!(!s.boxes().contains(&s.player()));
                assert!(!s.level().walls.contains(&s.player()));
            }
        }
    }

    #[test]
    fn complete_flag_matches_independent_check() {
        for seed in 0..20 {
            let mut s = state_from(ROOM);
            for dir in directions(seed, 200) {
                if let MoveOutcome::Moved { complete, .. } = apply_move(&mut s, dir) {
                    assert_eq!(complete, is_complete(&s));
                }
                assert_eq!(s.is_complete(), is_complete(&s));
            }
        }
    }
}
