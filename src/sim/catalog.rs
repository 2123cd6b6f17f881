/// Level catalog: built-in levels followed by user levels, one dense,
/// zero-based, immutable sequence.
///
/// ## Sources (catalog order):
///   1. Built-in embedded levels (fixed order)
///   2. `levels/` directory: every `.toml` / `.json` file, by file name
///
/// Sources are injected through the `LevelSource` trait; the catalog is
/// built once at startup and never mutated afterwards.
///
/// ## Record format
///
/// TOML, one level per file:
///   ```toml
///   name = "Corner Case"
///   difficulty = "Hard"
///   par_moves = 40
///   par_pushes = 12
///   layout = ["#####", "#@$.#", "#####"]
///   ```
/// or several levels as `[[level]]` tables.
///
/// JSON: a single record object, a list of record objects, a bare layout
/// (list of strings), or a list of bare layouts. `map` is accepted as an
/// alias of `layout`.
///
/// Defaults: `name = "Level N"`, `difficulty = "Unknown"`,
/// `par_moves = 50`, `par_pushes = 25`.
///
/// Records that fail validation are skipped and reported in
/// `LevelCatalog::skipped`; they never abort loading. A record fails when
/// it has no layout, a non-positive par, a layout the parser rejects or
/// one that starts solved, or a name already taken by an earlier level.
/// Names are unique across the catalog because progress is keyed by name.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::layout::{self, LevelModel, ParseError};
use crate::domain::progress::{self, Par};
use crate::domain::state::PuzzleState;

// ══════════════════════════════════════════════════════════════
// Public types
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct LevelCatalogEntry {
    pub name: String,
    pub difficulty: String,
    pub description: String,
    pub par: Par,
    /// Where the layout came from: `builtin:N` or `path[#N]`.
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("level index {index} out of range (catalog has {len} levels)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Why a level record was left out of the catalog.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not read level file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record has no `layout`")]
    MissingLayout,
    #[error("par values must be positive (moves {moves}, pushes {pushes})")]
    InvalidPar { moves: i64, pushes: i64 },
    #[error("invalid layout: {0}")]
    Parse(#[from] ParseError),
    #[error("layout is already solved")]
    AlreadySolved,
    #[error("level name {0:?} is already used")]
    DuplicateName(String),
}

#[derive(Debug)]
pub struct SkippedLevel {
    pub source: String,
    pub error: SourceError,
}

/// Raw level record as stored on disk or embedded.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LevelRecord {
    #[serde(default, alias = "map")]
    pub layout: Option<Vec<String>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub par_moves: Option<i64>,
    #[serde(default)]
    pub par_pushes: Option<i64>,
}

/// One record (or the error that replaced it), tagged with its origin.
#[derive(Debug)]
pub struct SourcedRecord {
    pub source: String,
    pub record: Result<LevelRecord, SourceError>,
}

/// Loader collaborator: yields level records in a stable order.
pub trait LevelSource {
    fn records(&self) -> Vec<SourcedRecord>;
}

pub struct LevelCatalog {
    entries: Vec<LevelCatalogEntry>,
    models: Vec<Rc<LevelModel>>,
    skipped: Vec<SkippedLevel>,
}

// ══════════════════════════════════════════════════════════════
// Catalog
// ══════════════════════════════════════════════════════════════

impl LevelCatalog {
    /// Merge all sources in order, validating every record.
    pub fn load(sources: &[&dyn LevelSource]) -> LevelCatalog {
        let mut catalog = LevelCatalog { entries: vec![], models: vec![], skipped: vec![] };

        for source in sources {
            for sourced in source.records() {
                let index = catalog.entries.len();
                let validated = sourced
                    .record
                    .and_then(|r| validate(r, index, &sourced.source))
                    .and_then(|(entry, model)| catalog.check_unique(entry, model));
                match validated {
                    Ok((entry, model)) => {
                        debug!("catalog[{index}] = {:?} from {}", entry.name, entry.source);
                        catalog.entries.push(entry);
                        catalog.models.push(model);
                    }
                    Err(error) => {
                        warn!("skipping level from {}: {error}", sourced.source);
                        catalog.skipped.push(SkippedLevel { source: sourced.source, error });
                    }
                }
            }
        }

        info!(
            "level catalog: {} levels loaded, {} skipped",
            catalog.entries.len(),
            catalog.skipped.len()
        );
        catalog
    }

    fn check_unique(
        &self,
        entry: LevelCatalogEntry,
        model: Rc<LevelModel>,
    ) -> Result<(LevelCatalogEntry, Rc<LevelModel>), SourceError> {
        if self.entries.iter().any(|e| e.name == entry.name) {
            return Err(SourceError::DuplicateName(entry.name));
        }
        Ok((entry, model))
    }

    pub fn get(&self, index: usize) -> Result<(Rc<LevelModel>, &LevelCatalogEntry), CatalogError> {
        match (self.models.get(index), self.entries.get(index)) {
            (Some(model), Some(entry)) => Ok((Rc::clone(model), entry)),
            _ => Err(CatalogError::IndexOutOfRange { index, len: self.len() }),
        }
    }

    pub fn entry(&self, index: usize) -> Option<&LevelCatalogEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[LevelCatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The last level of the catalog ("Legend").
    pub fn is_final(&self, index: usize) -> bool {
        !self.entries.is_empty() && index == self.entries.len() - 1
    }

    pub fn skipped(&self) -> &[SkippedLevel] {
        &self.skipped
    }
}

fn validate(
    record: LevelRecord,
    index: usize,
    source: &str,
) -> Result<(LevelCatalogEntry, Rc<LevelModel>), SourceError> {
    let layout = record.layout.ok_or(SourceError::MissingLayout)?;
    let moves = record.par_moves.unwrap_or(Par::DEFAULT.moves as i64);
    let pushes = record.par_pushes.unwrap_or(Par::DEFAULT.pushes as i64);
    let par = match (u32::try_from(moves), u32::try_from(pushes)) {
        (Ok(m), Ok(p)) if (Par { moves: m, pushes: p }).is_valid() => Par { moves: m, pushes: p },
        _ => return Err(SourceError::InvalidPar { moves, pushes }),
    };
    let model = Rc::new(layout::parse(&layout)?);
    if progress::is_complete(&PuzzleState::new(Rc::clone(&model))) {
        return Err(SourceError::AlreadySolved);
    }

    let entry = LevelCatalogEntry {
        name: record.name.unwrap_or_else(|| format!("Level {}", index + 1)),
        difficulty: record.difficulty.unwrap_or_else(|| "Unknown".to_string()),
        description: record.description.unwrap_or_default(),
        par,
        source: source.to_string(),
    };
    Ok((entry, model))
}

// ══════════════════════════════════════════════════════════════
// Directory source (individual .toml / .json files)
// ══════════════════════════════════════════════════════════════

pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectorySource { dir: dir.into() }
    }
}

impl LevelSource for DirectorySource {
    fn records(&self) -> Vec<SourcedRecord> {
        if !self.dir.is_dir() {
            debug!("no user level directory at {}", self.dir.display());
            return vec![];
        }
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) => {
                return vec![SourcedRecord {
                    source: self.dir.display().to_string(),
                    record: Err(SourceError::Io(e)),
                }]
            }
        };

        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file() && level_format(p).is_some())
            .collect();
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        files.iter().flat_map(|path| read_level_file(path)).collect()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum LevelFormat {
    Toml,
    Json,
}

fn level_format(path: &Path) -> Option<LevelFormat> {
    match path.extension()?.to_str()? {
        "toml" => Some(LevelFormat::Toml),
        "json" => Some(LevelFormat::Json),
        _ => None,
    }
}

fn read_level_file(path: &Path) -> Vec<SourcedRecord> {
    let source = path.display().to_string();
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return vec![SourcedRecord { source, record: Err(SourceError::Io(e)) }],
    };
    let parsed = match level_format(path) {
        Some(LevelFormat::Toml) => parse_toml_records(&content),
        Some(LevelFormat::Json) => parse_json_records(&content),
        None => Ok(vec![]),
    };
    match parsed {
        Ok(records) if records.len() == 1 => records
            .into_iter()
            .map(|r| SourcedRecord { source: source.clone(), record: Ok(r) })
            .collect(),
        Ok(records) => records
            .into_iter()
            .enumerate()
            .map(|(i, r)| SourcedRecord { source: format!("{source}#{}", i + 1), record: Ok(r) })
            .collect(),
        Err(e) => vec![SourcedRecord { source, record: Err(e) }],
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TomlLevelFile {
    Many { level: Vec<LevelRecord> },
    One(LevelRecord),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonLevelEntry {
    Bare(Vec<String>),
    Record(LevelRecord),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonLevelFile {
    Bare(Vec<String>),
    Many(Vec<JsonLevelEntry>),
    One(LevelRecord),
}

impl From<JsonLevelEntry> for LevelRecord {
    fn from(entry: JsonLevelEntry) -> Self {
        match entry {
            JsonLevelEntry::Bare(layout) => LevelRecord { layout: Some(layout), ..Default::default() },
            JsonLevelEntry::Record(r) => r,
        }
    }
}

fn parse_toml_records(content: &str) -> Result<Vec<LevelRecord>, SourceError> {
    Ok(match toml::from_str::<TomlLevelFile>(content)? {
        TomlLevelFile::Many { level } => level,
        TomlLevelFile::One(r) => vec![r],
    })
}

fn parse_json_records(content: &str) -> Result<Vec<LevelRecord>, SourceError> {
    Ok(match serde_json::from_str::<JsonLevelFile>(content)? {
        JsonLevelFile::Bare(layout) => vec![LevelRecord { layout: Some(layout), ..Default::default() }],
        JsonLevelFile::Many(entries) => entries.into_iter().map(LevelRecord::from).collect(),
        JsonLevelFile::One(r) => vec![r],
    })
}

// ══════════════════════════════════════════════════════════════
// Embedded levels
// ══════════════════════════════════════════════════════════════

pub struct BuiltinLevels;

impl LevelSource for BuiltinLevels {
    fn records(&self) -> Vec<SourcedRecord> {
        embedded_levels()
            .into_iter()
            .enumerate()
            .map(|(i, record)| SourcedRecord { source: format!("builtin:{}", i + 1), record: Ok(record) })
            .collect()
    }
}

fn embedded_levels() -> Vec<LevelRecord> {
    vec![
        make_embedded("Tutorial", "Easy", 10, 4, &[
            "##########",
            "#   @    #",
            "#  $     #",
            "#   .    #",
            "##########",
        ]),
        make_embedded("Basics", "Easy", 15, 6, &[
            "############",
            "#    .     #",
            "#  @$ .    #",
            "#    #     #",
            "#   $      #",
            "############",
        ]),
        make_embedded("Double Trouble", "Normal", 20, 8, &[
            "############",
            "#    .    .#",
            "#  @ $ $   #",
            "#    #  .  #",
            "#   $      #",
            "############",
        ]),
        make_embedded("Triple Challenge", "Normal", 25, 10, &[
            "#############",
            "#     #     #",
            "#   $ . .   #",
            "# @  ###    #",
            "#   $ .     #",
            "#   $       #",
            "#############",
        ]),
        make_embedded("Advanced Path", "Hard", 30, 12, &[
            "##############",
            "#   #    #   #",
            "#   $  $ # @ #",
            "#   #$ $ #   #",
            "# . . . .    #",
            "##############",
        ]),
        make_embedded("Way of the Sage", "Hard", 35, 14, &[
            "##############",
            "#      . . . #",
            "#  $ $ ###   #",
            "#   @        #",
            "#  $ $     . #",
            "#            #",
            "##############",
        ]),
        make_embedded("Crossing Lanes", "Hard", 40, 16, &[
            "###############",
            "#   #   #     #",
            "# @ $   $  .  #",
            "#   #   #  .  #",
            "#   $   #     #",
            "#   #   #  .  #",
            "###############",
        ]),
        make_embedded("Master Class", "Expert", 45, 18, &[
            "###############",
            "#  .  #  .  . #",
            "# $ $ # $ $   #",
            "#  #   @  #   #",
            "# $   #   $   #",
            "#  .  #  .  . #",
            "###############",
        ]),
        make_embedded("Grandmaster", "Expert", 50, 20, &[
            "###############",
            "#      . . .  #",
            "#  $ $ ###    #",
            "#  $ @ $ #    #",
            "#  $ $ # #    #",
            "#  . . .      #",
            "###############",
        ]),
        make_embedded("Legend", "Legend", 55, 22, &[
            "################",
            "#   #   #   #  #",
            "# $   $   $    #",
            "#  . . . .     #",
            "#   # @ #      #",
            "#  . .         #",
            "# $   $   $    #",
            "################",
        ]),
    ]
}

fn make_embedded(name: &str, difficulty: &str, par_moves: i64, par_pushes: i64, map: &[&str]) -> LevelRecord {
    LevelRecord {
        layout: Some(map.iter().map(|s| s.to_string()).collect()),
        name: Some(name.to_string()),
        difficulty: Some(difficulty.to_string()),
        description: None,
        par_moves: Some(par_moves),
        par_pushes: Some(par_pushes),
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
