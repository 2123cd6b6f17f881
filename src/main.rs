/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::error::Error;
use std::fs::OpenOptions;
use std::time::Duration;

use config::GameConfig;
use domain::position::Direction;
use sim::catalog::{BuiltinLevels, DirectorySource, LevelCatalog, LevelSource};
use sim::event::{GameEvent, Input};
use sim::save::{self, ProgressStore};
use sim::step;
use sim::world::{Phase, WorldState};
use ui::input::{Action, KeyMap};
use ui::renderer::Renderer;

/// Redraw interval while idle, so the timer keeps ticking.
const IDLE_REDRAW: Duration = Duration::from_millis(250);

fn main() {
    let config = GameConfig::load();
    init_logging(&config);
    for warning in &config.warnings {
        log::warn!("config: {}", warning);
    }

    if let Err(e) = run(&config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// `env_logger` into the configured file; the terminal belongs to the UI.
/// `RUST_LOG` overrides `log_level`.
fn init_logging(config: &GameConfig) {
    let env = env_logger::Env::default().default_filter_or(config.log_level.as_str());
    let mut builder = env_logger::Builder::from_env(env);

    let path = if config.log_file.is_absolute() {
        config.log_file.clone()
    } else {
        save::save_dir().join(&config.log_file)
    };
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("Warning: could not open log file {}: {e}", path.display());
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    let _ = builder.try_init();
}

fn build_catalog(config: &GameConfig) -> LevelCatalog {
    let builtin = BuiltinLevels;
    let user = DirectorySource::new(config.levels_dir.clone());
    let mut sources: Vec<&dyn LevelSource> = vec![&builtin];
    if config.levels_dir.is_dir() {
        log::info!("loading user levels from {}", config.levels_dir.display());
        sources.push(&user);
    }
    LevelCatalog::load(&sources)
}

/// One-line note for the title screen; the full list is in the log.
fn skipped_summary(catalog: &LevelCatalog) -> Option<String> {
    let first = catalog.skipped().first()?;
    let more = catalog.skipped().len() - 1;
    let mut msg = format!("Skipped level {}: {}", first.source, first.error);
    if more > 0 {
        msg.push_str(&format!(" (and {more} more, see log)"));
    }
    Some(msg)
}

fn run(config: &GameConfig) -> Result<(), Box<dyn Error>> {
    let catalog = build_catalog(config);
    let store = ProgressStore::default_location();
    let progress = store.load();
    let mut world = WorldState::new(catalog, progress, config.history_depth)?;
    if let Some(msg) = skipped_summary(&world.catalog) {
        world.set_message(&msg);
    }

    let keymap = KeyMap::from_config(&config.controls);
    let mut renderer = Renderer::new(config.display.clone(), &config.controls);

    if let Err(e) = renderer.init() {
        let _ = renderer.cleanup();
        return Err(format!("terminal init failed: {e}").into());
    }

    let result = game_loop(&mut world, &mut renderer, &keymap, &store);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    persist(&store, &world);

    result?;

    let done = world
        .catalog
        .entries()
        .iter()
        .filter(|e| world.progress.is_completed(&e.name))
        .count();
    println!();
    println!("Thanks for playing Box Pusher!");
    println!("Levels completed: {}/{}", done, world.catalog.len());
    Ok(())
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    keymap: &KeyMap,
    store: &ProgressStore,
) -> Result<(), Box<dyn Error>> {
    loop {
        renderer.render(world)?;

        let action = match keymap.next_action(IDLE_REDRAW)? {
            Some(action) => action,
            None => continue,
        };
        if action == Action::Quit {
            break;
        }

        let events = handle_action(world, action, renderer.select_visible());
        announce(world, &events);
        if events.iter().any(GameEvent::touches_progress) {
            persist(store, world);
        }
    }

    Ok(())
}

fn persist(store: &ProgressStore, world: &WorldState) {
    if let Err(e) = store.save(&world.progress) {
        log::warn!("could not save progress to {}: {}", store.path().display(), e);
    }
}

/// Achievement unlocks get the message bar; step already wrote the rest.
fn announce(world: &mut WorldState, events: &[GameEvent]) {
    let names: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::AchievementUnlocked(a) => Some(a.name()),
            _ => None,
        })
        .collect();
    if !names.is_empty() {
        let msg = format!("{}  Achievement: {}", world.message, names.join(", "));
        world.set_message(msg.trim());
    }
}

// ── Phase-specific key handling ──

fn handle_action(world: &mut WorldState, action: Action, visible: usize) -> Vec<GameEvent> {
    match world.phase {
        Phase::Title => match action {
            Action::Confirm => start_or_resume(world),
            Action::LevelSelect => {
                open_level_select(world, visible);
                vec![]
            }
            Action::Menu => {
                world.message.clear();
                vec![]
            }
            _ => vec![],
        },

        Phase::LevelSelect => {
            match action {
                Action::Move(Direction::Up) => move_cursor(world, -1, visible),
                Action::Move(Direction::Down) => move_cursor(world, 1, visible),
                Action::PageUp => move_cursor(world, -(visible as isize), visible),
                Action::PageDown => move_cursor(world, visible as isize, visible),
                Action::Confirm if !world.catalog.is_empty() => {
                    let index = world.select_cursor;
                    return step::step(world, Input::SelectLevel(index));
                }
                Action::Menu => world.phase = Phase::Title,
                _ => {}
            }
            vec![]
        }

        Phase::Playing => match action {
            Action::Move(dir) => step::step(world, Input::Move(dir)),
            Action::Undo => step::step(world, Input::Undo),
            Action::Reset => step::step(world, Input::Reset),
            Action::LevelSelect => {
                open_level_select(world, visible);
                vec![]
            }
            Action::Menu => {
                world.phase = Phase::Title;
                world.message.clear();
                vec![]
            }
            _ => vec![],
        },

        Phase::LevelComplete => match action {
            Action::Confirm => step::step(world, Input::NextLevel),
            Action::Reset => step::step(world, Input::Reset),
            Action::LevelSelect => {
                open_level_select(world, visible);
                vec![]
            }
            Action::Menu => {
                world.phase = Phase::Title;
                world.message.clear();
                vec![]
            }
            _ => vec![],
        },

        Phase::GameComplete => match action {
            Action::Confirm | Action::Menu => {
                world.phase = Phase::Title;
                world.message.clear();
                vec![]
            }
            Action::LevelSelect => {
                open_level_select(world, visible);
                vec![]
            }
            _ => vec![],
        },
    }
}

/// Resume an unfinished attempt, otherwise start the first level not yet
/// completed (or the first level when everything is done).
fn start_or_resume(world: &mut WorldState) -> Vec<GameEvent> {
    if world.puzzle.moves() > 0 && !world.puzzle.is_complete() {
        world.phase = Phase::Playing;
        world.set_message("Resumed");
        return vec![];
    }
    let index = world
        .catalog
        .entries()
        .iter()
        .position(|e| !world.progress.is_completed(&e.name))
        .unwrap_or(0);
    step::step(world, Input::SelectLevel(index))
}

fn open_level_select(world: &mut WorldState, visible: usize) {
    world.phase = Phase::LevelSelect;
    world.message.clear();
    world.select_cursor = world.current_level;
    world.select_scroll = world.current_level.saturating_sub(visible / 2);
}

fn move_cursor(world: &mut WorldState, delta: isize, visible: usize) {
    if world.catalog.is_empty() {
        return;
    }
    let total = world.catalog.len();
    let cursor = (world.select_cursor as isize + delta).clamp(0, total as isize - 1) as usize;
    world.select_cursor = cursor;
    if cursor < world.select_scroll {
        world.select_scroll = cursor;
    } else if cursor >= world.select_scroll + visible {
        world.select_scroll = cursor + 1 - visible;
    }
}
