/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each puzzle square is drawn two columns wide so the board looks square
/// in a typical terminal font.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::{ControlsConfig, DisplayConfig};
use crate::domain::tile::{Cell as Square, Tile};
use crate::sim::achievements::Achievement;
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Palette ──

const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const GREEN: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const WALL_BG: Color = Color::Rgb { r: 90, g: 70, b: 60 };
const CURSOR_BG: Color = Color::Rgb { r: 30, g: 60, b: 30 };

// ── Renderer ──

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const SELECT_VISIBLE: usize = 16;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    display: DisplayConfig,
    help: String,
}

impl Renderer {
    pub fn new(display: DisplayConfig, controls: &ControlsConfig) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            display,
            help: help_line(controls),
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Rows available for the level list on the select screen.
    pub fn select_visible(&self) -> usize {
        SELECT_VISIBLE.min(self.term_h.saturating_sub(10)).max(1)
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();
        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::LevelSelect => self.compose_level_select(world),
            Phase::Playing => self.compose_game(world),
            Phase::LevelComplete => {
                self.compose_game(world);
                self.compose_complete_banner(world);
            }
            Phase::GameComplete => self.compose_game_complete(world),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState) {
        let entry = w.entry();
        let puzzle = &w.puzzle;

        let mut hud = format!(" {}. {}  [{}]", w.current_level + 1, entry.name, entry.difficulty);
        if self.display.show_move_counter {
            hud.push_str(&format!("  Moves:{}/{}", puzzle.moves(), entry.par.moves));
        }
        if self.display.show_push_counter {
            hud.push_str(&format!("  Pushes:{}/{}", puzzle.pushes(), entry.par.pushes));
        }
        hud.push_str(&format!(
            "  Boxes:{}/{}",
            puzzle.boxes_on_targets(),
            puzzle.level().box_count()
        ));
        if self.display.show_timer {
            let secs = w.elapsed().as_secs();
            hud.push_str(&format!("  {:02}:{:02}", secs / 60, secs % 60));
        }
        if !w.history.is_empty() {
            hud.push_str(&format!("  Undo:{}", w.history.len()));
        }
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        let level = puzzle.level();
        let left = (self.front.width.saturating_sub(level.width * CELL_W)) / 2;
        for (y, symbols) in puzzle.rows().iter().enumerate() {
            let row = MAP_ROW + y;
            if row >= self.front.height {
                break;
            }
            for (x, ch) in symbols.chars().enumerate() {
                self.compose_square(Square::from_symbol(ch), left + x * CELL_W, row);
            }
        }

        let msg_row = MAP_ROW + level.height + 1;
        if msg_row < self.front.height && !w.message.is_empty() {
            let msg = format!(" {} ", w.message);
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &msg, Color::Black, MSG_BG);
        }

        let help_row = MAP_ROW + level.height + 3;
        if help_row < self.front.height {
            self.front.put_str(0, help_row, &self.help, Color::DarkGrey, Color::Reset);
        }
    }

    /// One puzzle square, two terminal columns wide.
    fn compose_square(&mut self, square: Square, col: usize, row: usize) {
        let (text, fg, bg) = match (square.terrain, square.occupant) {
            (Tile::Wall, _) => ("  ", Color::White, WALL_BG),
            (Tile::Target, Some(Tile::Box)) => ("[]", GREEN, Color::Reset),
            (_, Some(Tile::Box)) => ("[]", GOLD, Color::Reset),
            (Tile::Target, Some(Tile::Player)) => ("@@", GREEN, Color::Reset),
            (_, Some(Tile::Player)) => ("@@", Color::Cyan, Color::Reset),
            (Tile::Target, _) => ("<>", Color::Red, Color::Reset),
            _ => ("  ", Color::White, Color::Reset),
        };
        self.front.put_str(col, row, text, fg, bg);
    }

    fn compose_complete_banner(&mut self, w: &WorldState) {
        let level_h = w.puzzle.level().height;
        let row = MAP_ROW + level_h + 2;
        let next = if w.catalog.is_final(w.current_level) { "finish" } else { "next level" };
        let best = w
            .progress
            .best(&w.entry().name)
            .map(|b| format!("  Best: {} moves, {} pushes", b.moves, b.pushes))
            .unwrap_or_default();
        let line = format!(" ENTER: {}   R: replay{}", next, best);
        self.front.put_str(0, row, &line, GREEN, Color::Reset);
    }

    fn compose_title(&mut self, w: &WorldState) {
        let title = [
            r"  ___                ___           _            ",
            r" | _ ) ___ __ __    | _ \ _  _  __| |_   ___  _ _ ",
            r" | _ \/ _ \\ \ /    |  _/| || |(_-<| ' \ / -_)| '_|",
            r" |___/\___//_\_\    |_|   \_,_|/__/|_||_|\___||_|  ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, GOLD, Color::Reset);
        }

        let menu_base = 9;
        self.front.put_str(8, menu_base, "ENTER   Play", GREEN, Color::Reset);
        self.front.put_str(8, menu_base + 1, "  L     Level Select", Color::White, Color::Reset);
        self.front.put_str(8, menu_base + 2, "  Q     Quit", Color::White, Color::Reset);

        let done = w
            .catalog
            .entries()
            .iter()
            .filter(|e| w.progress.is_completed(&e.name))
            .count();
        let stats = w.progress.achievements.stats();
        let info = format!(
            "{} levels, {} completed   {} pushes, {} undos",
            w.catalog.len(),
            done,
            stats.total_pushes,
            stats.total_undos
        );
        self.front.put_str(8, menu_base + 4, &info, Color::DarkGrey, Color::Reset);

        let ach_base = menu_base + 6;
        self.front.put_str(8, ach_base, "Achievements", GOLD, Color::Reset);
        for (i, a) in Achievement::ALL.iter().enumerate() {
            let unlocked = w.progress.achievements.is_unlocked(*a);
            let (mark, color) = if unlocked { ("*", GREEN) } else { ("-", Color::DarkGrey) };
            let line = format!("  {} {:<15} {}", mark, a.name(), a.description());
            self.front.put_str(8, ach_base + 1 + i, &line, color, Color::Reset);
        }

        if !w.message.is_empty() {
            let msg_row = self.front.height.saturating_sub(1);
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &format!(" {} ", w.message), Color::Black, MSG_BG);
        }
    }

    fn compose_level_select(&mut self, w: &WorldState) {
        let dim = Color::DarkGrey;
        self.front.put_str(2, 1, "LEVEL SELECT", GOLD, Color::Reset);

        let list_top = 3;
        let visible = self.select_visible();
        let total = w.catalog.len();
        let scroll = w.select_scroll;

        if scroll > 0 {
            self.front.put_str(4, list_top - 1, "^ ^ ^", dim, Color::Reset);
        }

        for (i, entry) in w.catalog.entries().iter().enumerate().skip(scroll).take(visible) {
            let row = list_top + (i - scroll);
            let best = w
                .progress
                .best(&entry.name)
                .map(|b| format!("best {}/{}", b.moves, b.pushes))
                .unwrap_or_default();
            let mark = if w.progress.is_completed(&entry.name) { "*" } else { " " };
            let line = format!(
                "{:>3}. {} {:<24} {:<8} par {:>3}/{:<3} {}",
                i + 1,
                mark,
                entry.name,
                entry.difficulty,
                entry.par.moves,
                entry.par.pushes,
                best
            );
            if i == w.select_cursor {
                for x in 0..self.front.width.min(72) {
                    self.front.set(x, row, Cell::new(' ', Color::White, CURSOR_BG));
                }
                self.front.put_str(1, row, ">", GREEN, CURSOR_BG);
                self.front.put_str(2, row, &line, GREEN, CURSOR_BG);
            } else {
                self.front.put_str(2, row, &line, Color::White, Color::Reset);
            }
        }

        if scroll + visible < total {
            self.front.put_str(4, list_top + visible, "v v v", dim, Color::Reset);
        }

        let footer = list_top + visible + 2;
        if let Some(entry) = w.catalog.entry(w.select_cursor) {
            if !entry.description.is_empty() {
                self.front.put_str(2, footer, &entry.description, Color::White, Color::Reset);
            }
        }
        self.front.put_str(
            2,
            footer + 1,
            "ENTER: Start   Up/Down: Select   PgUp/PgDn   Esc: Back",
            dim,
            Color::Reset,
        );
        if !w.message.is_empty() {
            self.front.put_str(2, footer + 2, &w.message, MSG_BG, Color::Reset);
        }
    }

    fn compose_game_complete(&mut self, w: &WorldState) {
        self.front.put_str(4, 3, "ALL LEVELS COMPLETE", GOLD, Color::Reset);
        let unlocked = w.progress.achievements.unlocked().count();
        let line = format!("Achievements: {}/{}", unlocked, Achievement::ALL.len());
        self.front.put_str(4, 5, &line, GREEN, Color::Reset);
        self.front.put_str(4, 7, "ENTER: title   L: level select   Q: quit", Color::DarkGrey, Color::Reset);
    }
}

// ── Help row ──

/// Key hints for the play screen, using the configured key names.
fn help_line(controls: &ControlsConfig) -> String {
    let mut help = String::from(" Arrows/WASD:Move");
    for (names, label) in [(&controls.undo, "Undo"), (&controls.reset, "Reset")] {
        if !names.is_empty() {
            help.push_str(&format!("  {}:{}", key_labels(names), label));
        }
    }
    help.push_str("  L:Levels");
    if !controls.menu.is_empty() {
        help.push_str(&format!("  {}:Menu", key_labels(&controls.menu)));
    }
    help.push_str("  Q:Quit");
    help
}

/// `["z", "u"]` -> `Z/U`. Named keys are shown as written.
fn key_labels(names: &[String]) -> String {
    names
        .iter()
        .map(|name| {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c.to_ascii_uppercase().to_string(),
                _ => name.clone(),
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls(undo: &[&str], reset: &[&str], menu: &[&str]) -> ControlsConfig {
        let names = |keys: &[&str]| -> Vec<String> { keys.iter().map(|k| k.to_string()).collect() };
        ControlsConfig { undo: names(undo), reset: names(reset), menu: names(menu) }
    }

    #[test]
    fn help_line_uses_default_keys() {
        let help = help_line(&controls(&["z", "u"], &["r"], &["Esc"]));
        assert_eq!(help, " Arrows/WASD:Move  Z/U:Undo  R:Reset  L:Levels  Esc:Menu  Q:Quit");
    }

    #[test]
    fn help_line_follows_rebound_keys() {
        let help = help_line(&controls(&["Backspace"], &["x", "F5"], &["Tab"]));
        assert!(help.contains("Backspace:Undo"));
        assert!(help.contains("X/F5:Reset"));
        assert!(help.contains("Tab:Menu"));
        assert!(!help.contains("Z/U"));
    }

    #[test]
    fn unbound_actions_are_left_out() {
        let help = help_line(&controls(&[], &["r"], &[]));
        assert!(!help.contains("Undo"));
        assert!(!help.contains("Menu"));
        assert!(help.contains("R:Reset"));
    }
}
