/// Level parser: text rows -> normalized, immutable `LevelModel`.
///
/// Rows may be ragged; `width` is the longest row and missing cells are
/// floor. Count checks run before a model is returned, so a level whose
/// box and target counts disagree never reaches play.

use std::collections::HashSet;

use thiserror::Error;

use super::position::Position;
use super::tile::{Cell, Tile};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("layout has no player start ('@' or '+')")]
    MissingPlayer,
    #[error("layout has {0} player starts, expected exactly one")]
    MultiplePlayers(usize),
    #[error("layout has {boxes} boxes but {targets} targets")]
    BoxTargetMismatch { boxes: usize, targets: usize },
    #[error("layout has no boxes")]
    NoBoxes,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelModel {
    pub width: usize,
    pub height: usize,
    pub walls: HashSet<Position>,
    pub targets: HashSet<Position>,
    pub initial_boxes: HashSet<Position>,
    pub initial_player: Position,
}

/// Parse layout rows into a validated level.
pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<LevelModel, ParseError> {
    let height = rows.len();
    let width = rows.iter().map(|r| r.as_ref().chars().count()).max().unwrap_or(0);

    let mut walls = HashSet::new();
    let mut targets = HashSet::new();
    let mut boxes = HashSet::new();
    let mut players = Vec::new();

    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.as_ref().chars().enumerate() {
            let pos = Position::new(x as i32, y as i32);
            let cell = Cell::from_symbol(ch);
            if cell.is_wall() {
                walls.insert(pos);
            }
            if cell.is_target() {
                targets.insert(pos);
            }
            if cell.has_box() {
                boxes.insert(pos);
            }
            if cell.has_player() {
                players.push(pos);
            }
        }
    }

    let initial_player = match players.as_slice() {
        [] => return Err(ParseError::MissingPlayer),
        [only] => *only,
        many => return Err(ParseError::MultiplePlayers(many.len())),
    };
    if boxes.is_empty() {
        return Err(ParseError::NoBoxes);
    }
    if boxes.len() != targets.len() {
        return Err(ParseError::BoxTargetMismatch { boxes: boxes.len(), targets: targets.len() });
    }

    Ok(LevelModel { width, height, walls, targets, initial_boxes: boxes, initial_player })
}

impl LevelModel {
    /// Terrain at `pos`: Wall, Target or Floor. Out of bounds reads as wall.
    pub fn terrain_at(&self, pos: Position) -> Tile {
        if !pos.within(self.width, self.height) || self.walls.contains(&pos) {
            Tile::Wall
        } else if self.targets.contains(&pos) {
            Tile::Target
        } else {
            Tile::Floor
        }
    }

    #[inline]
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.within(self.width, self.height)
    }

    pub fn box_count(&self) -> usize {
        self.initial_boxes.len()
    }
}

/// Encode terrain plus the given occupants into symbol rows.
pub fn render_rows(level: &LevelModel, player: Position, boxes: &HashSet<Position>) -> Vec<String> {
    (0..level.height as i32)
        .map(|y| {
            (0..level.width as i32)
                .map(|x| {
                    let pos = Position::new(x, y);
                    let occupant = if pos == player {
                        Some(Tile::Player)
                    } else if boxes.contains(&pos) {
                        Some(Tile::Box)
                    } else {
                        None
                    };
                    Cell { terrain: level.terrain_at(pos), occupant }.symbol()
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn parses_corridor_level() {
        let level = parse(&["#####", "#@$.#", "#####"]).unwrap();
        assert_eq!((level.width, level.height), (5, 3));
        assert_eq!(level.initial_player, p(1, 1));
        assert_eq!(level.initial_boxes, HashSet::from([p(2, 1)]));
        assert_eq!(level.targets, HashSet::from([p(3, 1)]));
        assert_eq!(level.walls.len(), 12);
    }

    #[test]
    fn composite_cells_are_box_and_target() {
        let level = parse(&["######", "#+*$.$", "######"]).unwrap();
        assert_eq!(level.initial_player, p(1, 1));
        assert_eq!(level.initial_boxes, HashSet::from([p(2, 1), p(3, 1), p(5, 1)]));
        assert_eq!(level.targets, HashSet::from([p(1, 1), p(2, 1), p(4, 1)]));
    }

    #[test]
    fn ragged_rows_pad_with_floor() {
        let level = parse(&["###", "#@$.  #", "#"]).unwrap();
        assert_eq!(level.width, 7);
        assert_eq!(level.height, 3);
        assert_eq!(level.terrain_at(p(5, 0)), Tile::Floor);
        assert_eq!(level.terrain_at(p(6, 2)), Tile::Floor);
        assert_eq!(level.terrain_at(p(7, 0)), Tile::Wall); // out of bounds
    }

    #[test]
    fn missing_player() {
        assert_eq!(parse(&["#$.#"]), Err(ParseError::MissingPlayer));
    }

    #[test]
    fn multiple_players() {
        assert_eq!(parse(&["@$.+"]), Err(ParseError::MultiplePlayers(2)));
    }

    #[test]
    fn box_without_target() {
        assert_eq!(
            parse(&["#@#", "#$#", "###"]),
            Err(ParseError::BoxTargetMismatch { boxes: 1, targets: 0 })
        );
    }

    #[test]
    fn no_boxes() {
        assert_eq!(parse(&["#@.#"]), Err(ParseError::NoBoxes));
        assert_eq!(parse(&["#@#"]), Err(ParseError::NoBoxes));
    }

    #[test]
    fn empty_input_has_no_player() {
        let rows: [&str; 0] = [];
        assert_eq!(parse(&rows), Err(ParseError::MissingPlayer));
    }

    #[test]
    fn rectangular_layout_encodes_back() {
        let rows = ["#######", "#.@ $*#", "#######"];
        let level = parse(&rows).unwrap();
        assert_eq!(render_rows(&level, level.initial_player, &level.initial_boxes), rows);
    }
}
