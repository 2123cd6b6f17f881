/// Tile kinds and the layout symbol alphabet.
/// Symbol semantics are centralized here so the parser and the renderer
/// never compare raw characters themselves.
///
/// ## Symbol legend
///   '#' = Wall                  ' ' = Floor (any unknown char too)
///   '.' = Target                '$' = Box on floor
///   '*' = Box on target         '@' = Player on floor
///   '+' = Player on target

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Tile {
    Wall,
    Floor,
    Target,
    Box,
    Player,
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Floor
    }
}

/// One decoded layout cell: terrain underneath, plus an optional occupant.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Cell {
    pub terrain: Tile,
    pub occupant: Option<Tile>,
}

impl Cell {
    pub const FLOOR: Cell = Cell { terrain: Tile::Floor, occupant: None };

    pub fn from_symbol(ch: char) -> Cell {
        match ch {
            '#' => Cell { terrain: Tile::Wall, occupant: None },
            '.' => Cell { terrain: Tile::Target, occupant: None },
            '$' => Cell { terrain: Tile::Floor, occupant: Some(Tile::Box) },
            '*' => Cell { terrain: Tile::Target, occupant: Some(Tile::Box) },
            '@' => Cell { terrain: Tile::Floor, occupant: Some(Tile::Player) },
            '+' => Cell { terrain: Tile::Target, occupant: Some(Tile::Player) },
            _ => Cell::FLOOR,
        }
    }

    /// Encode back into the layout alphabet.
    pub fn symbol(self) -> char {
        match (self.terrain, self.occupant) {
            (Tile::Wall, _) => '#',
            (Tile::Target, Some(Tile::Box)) => '*',
            (Tile::Target, Some(Tile::Player)) => '+',
            (Tile::Target, _) => '.',
            (_, Some(Tile::Box)) => '$',
            (_, Some(Tile::Player)) => '@',
            (Tile::Floor | Tile::Box | Tile::Player, _) => ' ',
        }
    }

    pub fn is_wall(self) -> bool {
        self.terrain == Tile::Wall
    }

    pub fn is_target(self) -> bool {
        self.terrain == Tile::Target
    }

    pub fn has_box(self) -> bool {
        self.occupant == Some(Tile::Box)
    }

    pub fn has_player(self) -> bool {
        self.occupant == Some(Tile::Player)
    }
}
