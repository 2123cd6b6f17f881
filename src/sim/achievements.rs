/// Achievements and the fixed set of counters that feed them.
///
/// ## Unlock rules
/// ┌────────────────┬───────────────────────────────────────────────┐
/// │ Achievement    │ Trigger                                       │
/// ├────────────────┼───────────────────────────────────────────────┤
/// │ FirstSteps     │ any level completed                           │
/// │ SpeedDemon     │ completed with moves <= par                   │
/// │ PerfectPush    │ completed with pushes <= par                  │
/// │ ParExcellence  │ both of the above in one completion           │
/// │ SpeedRunner    │ 3 consecutive completions with moves <= par   │
/// │ PureSkill      │ completed without undo                        │
/// │ Legend         │ final catalog level completed                 │
/// │ Master         │ every catalog level completed at least once   │
/// │ BoxMaster      │ 100 pushes in total                           │
/// │ TimeLord       │ 50 undos in total                             │
/// └────────────────┴───────────────────────────────────────────────┘
///
/// Blocked moves never reach this module. Each achievement unlocks once.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::progress::Grade;

const BOX_MASTER_PUSHES: u32 = 100;
const TIME_LORD_UNDOS: u32 = 50;
const SPEED_RUN_STREAK: u32 = 3;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum Achievement {
    FirstSteps,
    SpeedDemon,
    PerfectPush,
    Master,
    TimeLord,
    BoxMaster,
    SpeedRunner,
    PureSkill,
    ParExcellence,
    Legend,
}

impl Achievement {
    pub const ALL: [Achievement; 10] = [
        Achievement::FirstSteps,
        Achievement::SpeedDemon,
        Achievement::PerfectPush,
        Achievement::Master,
        Achievement::TimeLord,
        Achievement::BoxMaster,
        Achievement::SpeedRunner,
        Achievement::PureSkill,
        Achievement::ParExcellence,
        Achievement::Legend,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Achievement::FirstSteps => "First Steps",
            Achievement::SpeedDemon => "Speed Demon",
            Achievement::PerfectPush => "Perfect Push",
            Achievement::Master => "Master",
            Achievement::TimeLord => "Time Lord",
            Achievement::BoxMaster => "Box Master",
            Achievement::SpeedRunner => "Speed Runner",
            Achievement::PureSkill => "Pure Skill",
            Achievement::ParExcellence => "Par Excellence",
            Achievement::Legend => "Legend",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Achievement::FirstSteps => "Complete your first level",
            Achievement::SpeedDemon => "Complete a level at or under par moves",
            Achievement::PerfectPush => "Complete a level at or under par pushes",
            Achievement::Master => "Complete every level",
            Achievement::TimeLord => "Use undo 50 times",
            Achievement::BoxMaster => "Push 100 boxes",
            Achievement::SpeedRunner => "Complete 3 levels in a row at or under par moves",
            Achievement::PureSkill => "Complete a level without using undo",
            Achievement::ParExcellence => "Beat both par scores in one level",
            Achievement::Legend => "Complete the final level",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Counter {
    TotalPushes,
    TotalUndos,
    LevelsUnderPar,
    ConsecutiveUnderPar,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub total_pushes: u32,
    pub total_undos: u32,
    pub levels_under_par: u32,
    pub consecutive_under_par: u32,
}

impl Stats {
    pub fn get(&self, counter: Counter) -> u32 {
        match counter {
            Counter::TotalPushes => self.total_pushes,
            Counter::TotalUndos => self.total_undos,
            Counter::LevelsUnderPar => self.levels_under_par,
            Counter::ConsecutiveUnderPar => self.consecutive_under_par,
        }
    }

    fn slot(&mut self, counter: Counter) -> &mut u32 {
        match counter {
            Counter::TotalPushes => &mut self.total_pushes,
            Counter::TotalUndos => &mut self.total_undos,
            Counter::LevelsUnderPar => &mut self.levels_under_par,
            Counter::ConsecutiveUnderPar => &mut self.consecutive_under_par,
        }
    }

    pub fn bump(&mut self, counter: Counter) -> u32 {
        let slot = self.slot(counter);
        *slot = slot.saturating_add(1);
        *slot
    }

    pub fn reset(&mut self, counter: Counter) {
        *self.slot(counter) = 0;
    }
}

/// Facts about one level completion, gathered by the session.
#[derive(Clone, Copy, Debug)]
pub struct Completion {
    pub grade: Grade,
    pub used_undo: bool,
    pub final_level: bool,
    pub all_levels_done: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Achievements {
    unlocked: BTreeSet<Achievement>,
    stats: Stats,
}

impl Achievements {
    pub fn is_unlocked(&self, a: Achievement) -> bool {
        self.unlocked.contains(&a)
    }

    pub fn unlocked(&self) -> impl Iterator<Item = Achievement> + '_ {
        self.unlocked.iter().copied()
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Unlock `a`; returns it only the first time.
    fn unlock(&mut self, a: Achievement) -> Option<Achievement> {
        self.unlocked.insert(a).then_some(a)
    }

    /// Count one occurrence of a running counter (push, undo).
    pub fn record(&mut self, counter: Counter) -> Option<Achievement> {
        let value = self.stats.bump(counter);
        match counter {
            Counter::TotalPushes if value >= BOX_MASTER_PUSHES => self.unlock(Achievement::BoxMaster),
            Counter::TotalUndos if value >= TIME_LORD_UNDOS => self.unlock(Achievement::TimeLord),
            Counter::TotalPushes
            | Counter::TotalUndos
            | Counter::LevelsUnderPar
            | Counter::ConsecutiveUnderPar => None,
        }
    }

    /// Evaluate a level completion. Returns newly unlocked achievements
    /// in rule order.
    pub fn level_completed(&mut self, done: Completion) -> Vec<Achievement> {
        let mut candidates = vec![Achievement::FirstSteps];

        if done.grade.under_par_moves {
            self.stats.bump(Counter::LevelsUnderPar);
            self.stats.bump(Counter::ConsecutiveUnderPar);
            candidates.push(Achievement::SpeedDemon);
        } else {
            self.stats.reset(Counter::ConsecutiveUnderPar);
        }
        if done.grade.under_par_pushes {
            candidates.push(Achievement::PerfectPush);
        }
        if self.stats.get(Counter::ConsecutiveUnderPar) >= SPEED_RUN_STREAK {
            candidates.push(Achievement::SpeedRunner);
        }
        if !done.used_undo {
            candidates.push(Achievement::PureSkill);
        }
        if done.grade.all_par() {
            candidates.push(Achievement::ParExcellence);
        }
        if done.final_level {
            candidates.push(Achievement::Legend);
        }
        if done.all_levels_done {
            candidates.push(Achievement::Master);
        }

        candidates.into_iter().filter_map(|a| self.unlock(a)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn done(moves_ok: bool, pushes_ok: bool, used_undo: bool) -> Completion {
        Completion {
            grade: Grade { under_par_moves: moves_ok, under_par_pushes: pushes_ok },
            used_undo,
            final_level: false,
            all_levels_done: false,
        }
    }

    #[test]
    fn first_clean_completion_unlocks_the_basics() {
        let mut a = Achievements::default();
        let got = a.level_completed(done(true, true, false));
        assert_eq!(
            got,
            vec![
                Achievement::FirstSteps,
                Achievement::SpeedDemon,
                Achievement::PerfectPush,
                Achievement::PureSkill,
                Achievement::ParExcellence,
            ]
        );
        // second identical completion unlocks nothing new
        assert!(a.level_completed(done(true, true, false)).is_empty());
    }

    #[test]
    fn over_par_with_undo_only_first_steps() {
        let mut a = Achievements::default();
        assert_eq!(a.level_completed(done(false, false, true)), vec![Achievement::FirstSteps]);
        assert_eq!(a.stats().levels_under_par, 0);
    }

    #[test]
    fn streak_resets_when_over_par() {
        let mut a = Achievements::default();
        a.level_completed(done(true, false, true));
        a.level_completed(done(true, false, true));
        a.level_completed(done(false, false, true));
        assert_eq!(a.stats().consecutive_under_par, 0);
        a.level_completed(done(true, false, true));
        a.level_completed(done(true, false, true));
        assert!(!a.is_unlocked(Achievement::SpeedRunner));
        let got = a.level_completed(done(true, false, true));
        assert_eq!(got, vec![Achievement::SpeedRunner]);
        assert_eq!(a.stats().levels_under_par, 5);
    }

    #[test]
    fn final_and_all_levels() {
        let mut a = Achievements::default();
        let mut d = done(false, false, true);
        d.final_level = true;
        d.all_levels_done = true;
        let got = a.level_completed(d);
        assert!(got.contains(&Achievement::Legend));
        assert!(got.contains(&Achievement::Master));
    }

    #[test]
    fn box_master_at_one_hundred_pushes() {
        let mut a = Achievements::default();
        for _ in 0..99 {
            assert_eq!(a.record(Counter::TotalPushes), None);
        }
        assert_eq!(a.record(Counter::TotalPushes), Some(Achievement::BoxMaster));
        assert_eq!(a.record(Counter::TotalPushes), None);
        assert_eq!(a.stats().get(Counter::TotalPushes), 101);
    }

    #[test]
    fn time_lord_at_fifty_undos() {
        let mut a = Achievements::default();
        let unlocked: Vec<_> = (0..60).filter_map(|_| a.record(Counter::TotalUndos)).collect();
        assert_eq!(unlocked, vec![Achievement::TimeLord]);
    }

    #[test]
    fn every_achievement_has_text() {
        for a in Achievement::ALL {
            assert!(!a.name().is_empty());
            assert!(!a.description().is_empty());
        }
    }
}
