/// The step function: applies one player input to the session.
///
/// Processing order for a move:
///   1. Snapshot the puzzle
///   2. `rules::apply_move`
///   3. Blocked → drop the snapshot, report why, nothing else changes
///   4. Moved   → record the snapshot, count pushes
///   5. Complete → grade, best score, achievements, phase change
///
/// Moves and undo are only accepted while `Phase::Playing`. After a level
/// is complete the puzzle is frozen until Reset, SelectLevel or NextLevel.

use crate::domain::position::Direction;
use crate::domain::progress;
use crate::domain::rules::{self, MoveOutcome};
use crate::domain::state::PuzzleState;
use crate::sim::achievements::{Completion, Counter};
use crate::sim::catalog::CatalogError;
use super::event::{GameEvent, Input};
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: Input) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();

    match input {
        Input::Move(dir) => resolve_move(world, dir, &mut events),
        Input::Undo => resolve_undo(world, &mut events),
        Input::Reset => {
            if matches!(world.phase, Phase::Playing | Phase::LevelComplete) {
                world.restart_attempt();
                world.phase = Phase::Playing;
                world.set_message("Level reset");
                events.push(GameEvent::LevelReset);
            }
        }
        Input::SelectLevel(index) => match load_level(world, index) {
            Ok(()) => events.push(GameEvent::LevelLoaded { index }),
            Err(e) => {
                log::warn!("level select: {}", e);
                world.set_message(&e.to_string());
                events.push(GameEvent::LevelUnavailable(e));
            }
        },
        Input::NextLevel => resolve_next(world, &mut events),
    }

    events
}

/// Switch the session to catalog entry `index` and start playing it.
/// On error the session is left exactly as it was.
pub fn load_level(world: &mut WorldState, index: usize) -> Result<(), CatalogError> {
    let (model, entry) = world.catalog.get(index)?;
    log::info!("loading level {} \"{}\" ({})", index + 1, entry.name, entry.source);
    let message = format!("Level {}: {}", index + 1, entry.name);

    world.current_level = index;
    world.puzzle = PuzzleState::new(model);
    world.restart_attempt();
    world.phase = Phase::Playing;
    world.set_message(&message);
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Moves and undo
// ══════════════════════════════════════════════════════════════

fn resolve_move(world: &mut WorldState, dir: Direction, events: &mut Vec<GameEvent>) {
    if world.phase != Phase::Playing {
        return;
    }

    let snapshot = world.puzzle.snapshot();
    match rules::apply_move(&mut world.puzzle, dir) {
        MoveOutcome::Blocked(reason) => {
            log::trace!("move {} blocked: {:?}", dir, reason);
            events.push(GameEvent::Blocked(reason));
        }
        MoveOutcome::Moved { pushed, complete } => {
            world.history.record(snapshot);
            world.message.clear();
            events.push(GameEvent::Moved { pushed });
            if pushed {
                if let Some(a) = world.progress.achievements.record(Counter::TotalPushes) {
                    events.push(GameEvent::AchievementUnlocked(a));
                }
            }
            if complete {
                resolve_completion(world, events);
            }
        }
    }
}

fn resolve_undo(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.phase != Phase::Playing {
        return;
    }

    match world.history.undo() {
        Some(snap) => {
            world.puzzle.restore(snap);
            world.used_undo = true;
            world.set_message("Undo");
            events.push(GameEvent::Undone);
            if let Some(a) = world.progress.achievements.record(Counter::TotalUndos) {
                events.push(GameEvent::AchievementUnlocked(a));
            }
        }
        None => {
            world.set_message("Nothing to undo");
            events.push(GameEvent::NothingToUndo);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Completion
// ══════════════════════════════════════════════════════════════

fn resolve_completion(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let index = world.current_level;
    let (moves, pushes) = (world.puzzle.moves(), world.puzzle.pushes());
    let entry = &world.catalog.entries()[index];
    let name = entry.name.clone();
    let grade = progress::grade(&world.puzzle, entry.par);

    world.phase = Phase::LevelComplete;
    world.finished_in = Some(world.started_at.elapsed());
    log::info!("completed \"{}\" in {} moves, {} pushes ({:?})", name, moves, pushes, grade);
    events.push(GameEvent::LevelCompleted { index, moves, pushes, grade });

    if world.progress.record_completion(&name, moves, pushes) {
        events.push(GameEvent::NewBest { moves, pushes });
    }

    let catalog = &world.catalog;
    let all_levels_done = world
        .progress
        .completed_all(catalog.entries().iter().map(|e| e.name.as_str()));
    let unlocked = world.progress.achievements.level_completed(Completion {
        grade,
        used_undo: world.used_undo,
        final_level: catalog.is_final(index),
        all_levels_done,
    });
    for a in unlocked {
        log::info!("achievement unlocked: {}", a.name());
        events.push(GameEvent::AchievementUnlocked(a));
    }

    let message = if grade.all_par() {
        format!("Level complete! {} moves, {} pushes. Under par!", moves, pushes)
    } else {
        format!("Level complete! {} moves, {} pushes", moves, pushes)
    };
    world.set_message(&message);
}

fn resolve_next(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.phase != Phase::LevelComplete {
        return;
    }
    if world.catalog.is_final(world.current_level) {
        world.phase = Phase::GameComplete;
        world.set_message("All levels complete!");
        events.push(GameEvent::AllLevelsCompleted);
        return;
    }
    let index = world.current_level + 1;
    match load_level(world, index) {
        Ok(()) => events.push(GameEvent::LevelLoaded { index }),
        Err(e) => events.push(GameEvent::LevelUnavailable(e)),
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::Position;
    use crate::domain::rules::BlockReason;
    use crate::sim::achievements::Achievement;
    use crate::sim::catalog::{LevelCatalog, LevelRecord, LevelSource, SourcedRecord};
    use crate::sim::save::{BestScore, Progress};

    /// In-memory source: one record per layout, par 2/1.
    struct Layouts(Vec<(&'static str, Vec<&'static str>)>);

    impl LevelSource for Layouts {
        fn records(&self) -> Vec<SourcedRecord> {
            self.0
                .iter()
                .map(|(name, rows)| SourcedRecord {
                    source: format!("test:{name}"),
                    record: Ok(LevelRecord {
                        name: Some(name.to_string()),
                        layout: Some(rows.iter().map(|r| r.to_string()).collect()),
                        par_moves: Some(2),
                        par_pushes: Some(1),
                        ..LevelRecord::default()
                    }),
                })
                .collect()
        }
    }

    fn world_with(levels: Vec<(&'static str, Vec<&'static str>)>) -> WorldState {
        let catalog = LevelCatalog::load(&[&Layouts(levels)]);
        let mut w = WorldState::new(catalog, Progress::default(), 50).unwrap();
        load_level(&mut w, 0).unwrap();
        w
    }

    /// Same level model as the current puzzle, not a copy of it?
    fn shares_level(world: &WorldState, index: usize) -> bool {
        world
            .catalog
            .get(index)
            .map(|(model, _)| std::ptr::eq(&*model, world.puzzle.level()))
            .unwrap_or(false)
    }

    fn two_levels() -> WorldState {
        world_with(vec![
            ("One", vec!["#####", "#@$.#", "#   #", "#####"]),
            ("Two", vec!["######", "#@ $.#", "######"]),
        ])
    }

    #[test]
    fn blocked_move_leaves_history_untouched() {
        let mut w = two_levels();
        let events = step(&mut w, Input::Move(Direction::Left));
        assert_eq!(events, vec![GameEvent::Blocked(BlockReason::Wall)]);
        assert!(w.history.is_empty());
        assert_eq!(w.puzzle.moves(), 0);
        assert_eq!(w.progress.achievements.stats().total_pushes, 0);
    }

    #[test]
    fn move_records_one_snapshot_and_undo_restores() {
        let mut w = world_with(vec![("Walk", vec!["######", "#@  $.", "######"])]);
        step(&mut w, Input::Move(Direction::Right));
        assert_eq!(w.history.len(), 1);
        assert_eq!(step(&mut w, Input::Undo), vec![GameEvent::Undone]);
        assert_eq!(w.puzzle.player(), Position::new(1, 1));
        assert_eq!(w.puzzle.moves(), 0);
        assert!(w.used_undo);
        assert_eq!(step(&mut w, Input::Undo), vec![GameEvent::NothingToUndo]);
    }

    #[test]
    fn completing_a_level_grades_and_unlocks() {
        let mut w = two_levels();
        let events = step(&mut w, Input::Move(Direction::Right));
        assert_eq!(w.phase, Phase::LevelComplete);
        assert_eq!(events[0], GameEvent::Moved { pushed: true });
        assert!(events.contains(&GameEvent::LevelCompleted {
            index: 0,
            moves: 1,
            pushes: 1,
            grade: progress::Grade { under_par_moves: true, under_par_pushes: true },
        }));
        assert!(events.contains(&GameEvent::NewBest { moves: 1, pushes: 1 }));
        for a in [
            Achievement::FirstSteps,
            Achievement::SpeedDemon,
            Achievement::PerfectPush,
            Achievement::PureSkill,
            Achievement::ParExcellence,
        ] {
            assert!(events.contains(&GameEvent::AchievementUnlocked(a)), "missing {a:?}");
        }
        assert!(!events.contains(&GameEvent::AchievementUnlocked(Achievement::Legend)));
        assert_eq!(w.progress.best("One"), Some(BestScore { moves: 1, pushes: 1 }));
        assert!(w.finished_in.is_some());
    }

    #[test]
    fn input_after_completion_is_ignored() {
        let mut w = two_levels();
        step(&mut w, Input::Move(Direction::Right));
        let frozen = w.puzzle.clone();
        assert!(step(&mut w, Input::Move(Direction::Left)).is_empty());
        assert!(step(&mut w, Input::Undo).is_empty());
        assert_eq!(w.puzzle, frozen);
    }

    #[test]
    fn undo_used_denies_pure_skill() {
        let mut w = two_levels();
        step(&mut w, Input::Move(Direction::Down));
        step(&mut w, Input::Undo);
        let events = step(&mut w, Input::Move(Direction::Right));
        assert!(!events.contains(&GameEvent::AchievementUnlocked(Achievement::PureSkill)));
        assert!(events.contains(&GameEvent::AchievementUnlocked(Achievement::FirstSteps)));
    }

    #[test]
    fn reset_clears_history_and_undo_flag() {
        let mut w = world_with(vec![("Walk", vec!["######", "#@  $.", "######"])]);
        step(&mut w, Input::Move(Direction::Right));
        step(&mut w, Input::Move(Direction::Right));
        step(&mut w, Input::Undo);
        assert_eq!(step(&mut w, Input::Reset), vec![GameEvent::LevelReset]);
        assert!(w.history.is_empty());
        assert!(!w.used_undo);
        assert_eq!(w.puzzle.player(), Position::new(1, 1));
        assert_eq!((w.puzzle.moves(), w.puzzle.pushes()), (0, 0));
    }

    #[test]
    fn next_level_walks_catalog_then_finishes() {
        let mut w = two_levels();
        step(&mut w, Input::Move(Direction::Right));
        assert_eq!(step(&mut w, Input::NextLevel), vec![GameEvent::LevelLoaded { index: 1 }]);
        assert_eq!(w.phase, Phase::Playing);
        assert!(w.history.is_empty());

        step(&mut w, Input::Move(Direction::Right));
        let events = step(&mut w, Input::Move(Direction::Right));
        assert!(events.contains(&GameEvent::AchievementUnlocked(Achievement::Legend)));
        assert!(events.contains(&GameEvent::AchievementUnlocked(Achievement::Master)));
        assert_eq!(step(&mut w, Input::NextLevel), vec![GameEvent::AllLevelsCompleted]);
        assert_eq!(w.phase, Phase::GameComplete);
    }

    #[test]
    fn next_level_requires_completion() {
        let mut w = two_levels();
        assert!(step(&mut w, Input::NextLevel).is_empty());
        assert_eq!(w.current_level, 0);
    }

    #[test]
    fn out_of_range_select_is_surfaced() {
        let mut w = two_levels();
        step(&mut w, Input::Move(Direction::Down));
        let before = w.puzzle.clone();
        let events = step(&mut w, Input::SelectLevel(7));
        assert_eq!(
            events,
            vec![GameEvent::LevelUnavailable(CatalogError::IndexOutOfRange { index: 7, len: 2 })]
        );
        assert_eq!(w.current_level, 0);
        assert_eq!(w.puzzle, before);
    }

    #[test]
    fn select_level_shares_the_catalog_model() {
        let mut w = two_levels();
        assert_eq!(step(&mut w, Input::SelectLevel(1)), vec![GameEvent::LevelLoaded { index: 1 }]);
        assert!(shares_level(&w, 1));
        assert!(!shares_level(&w, 0));
    }

    #[test]
    fn slower_replay_keeps_first_best() {
        let mut w = two_levels();
        step(&mut w, Input::Move(Direction::Right));
        step(&mut w, Input::SelectLevel(0));
        step(&mut w, Input::Move(Direction::Down));
        step(&mut w, Input::Move(Direction::Up));
        let events = step(&mut w, Input::Move(Direction::Right));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::NewBest { .. })));
        assert_eq!(w.progress.best("One"), Some(BestScore { moves: 1, pushes: 1 }));
    }

    #[test]
    fn same_named_levels_do_not_share_progress() {
        let mut w = world_with(vec![
            ("Same", vec!["#####", "#@$.#", "#   #", "#####"]),
            ("Same", vec!["######", "#@ $.#", "######"]),
            ("Other", vec!["######", "#@ $.#", "######"]),
        ]);
        assert_eq!(w.catalog.len(), 2);
        assert_eq!(w.catalog.skipped().len(), 1);

        let events = step(&mut w, Input::Move(Direction::Right));
        assert!(events.contains(&GameEvent::AchievementUnlocked(Achievement::FirstSteps)));
        assert!(!events.contains(&GameEvent::AchievementUnlocked(Achievement::Master)));
        assert!(!w.progress.achievements.is_unlocked(Achievement::Master));
        assert_eq!(w.progress.best("Other"), None);
        assert!(!w.progress.is_completed("Other"));
    }

    #[test]
    fn solved_layout_never_reaches_play() {
        let mut w = world_with(vec![
            ("Stuck", vec!["@*"]),
            ("Real", vec!["#####", "#@$.#", "#   #", "#####"]),
        ]);
        assert_eq!(w.catalog.len(), 1);
        assert_eq!(w.entry().name, "Real");
        assert!(!w.puzzle.is_complete());
        let events = step(&mut w, Input::Move(Direction::Right));
        assert!(events.iter().any(|e| matches!(e, GameEvent::LevelCompleted { index: 0, .. })));
    }
}
