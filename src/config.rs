/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD or the
/// XDG data home. Falls back to defaults if the file is missing or
/// incomplete. Problems are collected in `warnings` and logged by `main`
/// once the logger is up.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::sim::history;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub levels_dir: PathBuf,
    pub history_depth: usize,
    pub log_file: PathBuf,
    pub log_level: String,
    pub display: DisplayConfig,
    pub controls: ControlsConfig,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct DisplayConfig {
    pub show_move_counter: bool,
    pub show_push_counter: bool,
    pub show_timer: bool,
}

/// Key names, matched by `ui::input`. Arrow keys and WASD always move.
#[derive(Clone, Debug)]
pub struct ControlsConfig {
    pub undo: Vec<String>,
    pub reset: Vec<String>,
    pub menu: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    controls: TomlControls,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_history_depth")]
    history_depth: usize,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_true")]
    show_move_counter: bool,
    #[serde(default = "default_true")]
    show_push_counter: bool,
    #[serde(default = "default_true")]
    show_timer: bool,
}

#[derive(Deserialize, Debug)]
struct TomlControls {
    #[serde(default = "default_undo")]
    undo: Vec<String>,
    #[serde(default = "default_reset")]
    reset: Vec<String>,
    #[serde(default = "default_menu")]
    menu: Vec<String>,
}

// ── Defaults ──

fn default_levels_dir() -> String { "levels".into() }
fn default_history_depth() -> usize { history::DEFAULT_CAPACITY }
fn default_log_file() -> String { "boxpusher.log".into() }
fn default_log_level() -> String { "info".into() }
fn default_true() -> bool { true }

fn default_undo() -> Vec<String> { vec!["z".into(), "u".into()] }
fn default_reset() -> Vec<String> { vec!["r".into()] }
fn default_menu() -> Vec<String> { vec!["Esc".into()] }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            history_depth: default_history_depth(),
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay { show_move_counter: true, show_push_counter: true, show_timer: true }
    }
}

impl Default for TomlControls {
    fn default() -> Self {
        TomlControls { undo: default_undo(), reset: default_reset(), menu: default_menu() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) CWD, (3) ~/.local/share/boxpusher.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = vec![];
        let toml_cfg = load_toml(&search_dirs, &mut warnings);
        GameConfig::resolve(toml_cfg, &search_dirs, warnings)
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf], mut warnings: Vec<String>) -> Self {
        let general = toml_cfg.general;

        let levels_dir = if Path::new(&general.levels_dir).is_absolute() {
            PathBuf::from(&general.levels_dir)
        } else {
            search_dirs.iter()
                .map(|d| d.join(&general.levels_dir))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(&general.levels_dir))
        };

        if general.history_depth == 0 {
            warnings.push("history_depth = 0 is not allowed; using 1".into());
        }

        GameConfig {
            levels_dir,
            history_depth: general.history_depth.max(1),
            log_file: PathBuf::from(general.log_file),
            log_level: general.log_level,
            display: DisplayConfig {
                show_move_counter: toml_cfg.display.show_move_counter,
                show_push_counter: toml_cfg.display.show_push_counter,
                show_timer: toml_cfg.display.show_timer,
            },
            controls: ControlsConfig {
                undo: toml_cfg.controls.undo,
                reset: toml_cfg.controls.reset,
                menu: toml_cfg.controls.menu,
            },
            warnings,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so data next to the real binary is still found.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/boxpusher");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return parse_toml(&text, &path.display().to_string(), warnings),
                Err(e) => warnings.push(format!("could not read {}: {e}", path.display())),
            }
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str, origin: &str, warnings: &mut Vec<String>) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warnings.push(format!("{origin} parse error: {e}; using default settings"));
            TomlConfig::default()
        }
    }
}
