/// Grid coordinates and movement directions.
///
/// `(0, 0)` is the top-left cell; x grows rightward, y grows downward.
/// Coordinates are signed so that a step off the left/top edge is
/// representable and can be rejected by a bounds check instead of wrapping.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// The neighbouring cell one step in `dir`.
    #[inline]
    pub fn step(self, dir: Direction) -> Position {
        let (dx, dy) = dir.delta();
        Position { x: self.x + dx, y: self.y + dy }
    }

    /// Is this position inside `[0, width) x [0, height)`?
    #[inline]
    pub fn within(self, width: usize, height: usize) -> bool {
        self.x >= 0 && self.y >= 0 && (self.x as usize) < width && (self.y as usize) < height
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit delta `(dx, dy)`.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_follows_screen_axes() {
        let p = Position::new(2, 2);
        assert_eq!(p.step(Direction::Up), Position::new(2, 1));
        assert_eq!(p.step(Direction::Down), Position::new(2, 3));
        assert_eq!(p.step(Direction::Left), Position::new(1, 2));
        assert_eq!(p.step(Direction::Right), Position::new(3, 2));
    }

    #[test]
    fn within_rejects_negative_and_edge() {
        assert!(Position::new(0, 0).within(3, 2));
        assert!(Position::new(2, 1).within(3, 2));
        assert!(!Position::new(3, 1).within(3, 2));
        assert!(!Position::new(0, 2).within(3, 2));
        assert!(!Position::new(-1, 0).within(3, 2));
        assert!(!Position::new(0, -1).within(3, 2));
    }
}
