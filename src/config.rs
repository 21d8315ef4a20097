/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// Geometry is checked by `GameConfig::validate()` before a game may start.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub field: FieldConfig,
    pub bird: BirdConfig,
    pub pipes: PipeConfig,
    pub timing: TimingConfig,
    pub score_file: PathBuf,
}

/// Play-field size in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldConfig {
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BirdConfig {
    pub x: f64,
    pub start_y: f64,
    pub width: f64,
    pub height: f64,
    pub gravity: f64, // added to velocity every frame
    pub lift: f64,    // velocity set on flap (negative = up)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipeConfig {
    pub width: f64,
    pub gap: f64,
    pub spawn_interval: u64, // frames between gap pairs
    pub min_height: u32,     // top pipe height is drawn from [min, min + range)
    pub height_range: u32,
    pub base_speed: f64,
    pub speed_step_score: u32, // +1 px/frame every this many points
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingConfig {
    pub frame_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default())
    }
}

// ── Validation ──

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("play field must have positive, finite dimensions (got {width}x{height})")]
    InvalidField { width: f64, height: f64 },
    #[error("bird size must be positive (got {width}x{height})")]
    InvalidBirdSize { width: f64, height: f64 },
    #[error("bird start rectangle (x={x}, y={y}) does not fit inside the play field")]
    BirdOutsideField { x: f64, y: f64 },
    #[error("bird gravity and lift must be finite numbers")]
    NonFinitePhysics,
    #[error("pipe {name} must be positive")]
    NonPositivePipeSetting { name: &'static str },
    #[error("pipe speed must be positive and finite (got {0})")]
    InvalidPipeSpeed(f64),
    #[error("pipe min_height ({min_height}) plus height_range ({height_range}) overflows")]
    PipeHeightOverflow { min_height: u32, height_range: u32 },
    #[error("tallest top pipe ({tallest}) plus gap ({gap}) exceeds field height ({height})")]
    GapDoesNotFit { tallest: f64, gap: f64, height: f64 },
}

impl GameConfig {
    /// Reject geometry that would produce undefined pipes or an instant loss.
    ///
    /// The gap rule keeps every bottom pipe at a non-negative height: the
    /// tallest possible top pipe (`min_height + height_range - 1`) plus the gap
    /// must fit inside the field. A 480x320 field with the default pipes fails
    /// it, since 249 + 150 > 320 would leave the bottom pipe at -79 px.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.field;
        if !(f.width.is_finite() && f.height.is_finite()) || f.width <= 0.0 || f.height <= 0.0 {
            return Err(ConfigError::InvalidField { width: f.width, height: f.height });
        }

        let b = &self.bird;
        if !(b.width > 0.0 && b.height > 0.0) {
            return Err(ConfigError::InvalidBirdSize { width: b.width, height: b.height });
        }
        if !(b.gravity.is_finite() && b.lift.is_finite()) {
            return Err(ConfigError::NonFinitePhysics);
        }
        // Strictly inside: touching an edge is already out of bounds.
        let inside_x = b.x >= 0.0 && b.x + b.width <= f.width;
        let inside_y = b.start_y > 0.0 && b.start_y + b.height < f.height;
        if !(inside_x && inside_y) {
            return Err(ConfigError::BirdOutsideField { x: b.x, y: b.start_y });
        }

        let p = &self.pipes;
        if !(p.width > 0.0) {
            return Err(ConfigError::NonPositivePipeSetting { name: "width" });
        }
        if !(p.gap > 0.0) {
            return Err(ConfigError::NonPositivePipeSetting { name: "gap" });
        }
        if p.spawn_interval == 0 {
            return Err(ConfigError::NonPositivePipeSetting { name: "spawn_interval" });
        }
        if p.height_range == 0 {
            return Err(ConfigError::NonPositivePipeSetting { name: "height_range" });
        }
        // Top heights are drawn from `min_height..min_height + height_range`.
        if p.min_height.checked_add(p.height_range).is_none() {
            return Err(ConfigError::PipeHeightOverflow {
                min_height: p.min_height,
                height_range: p.height_range,
            });
        }
        if p.speed_step_score == 0 {
            return Err(ConfigError::NonPositivePipeSetting { name: "speed_step_score" });
        }
        if !(p.base_speed.is_finite() && p.base_speed > 0.0) {
            return Err(ConfigError::InvalidPipeSpeed(p.base_speed));
        }
        let tallest = f64::from(p.min_height) + f64::from(p.height_range - 1);
        if tallest + p.gap > f.height {
            return Err(ConfigError::GapDoesNotFit { tallest, gap: p.gap, height: f.height });
        }

        Ok(())
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    field: TomlField,
    #[serde(default)]
    bird: TomlBird,
    #[serde(default)]
    pipes: TomlPipes,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlField {
    #[serde(default = "default_field_width")]
    width: f64,
    #[serde(default = "default_field_height")]
    height: f64,
}

#[derive(Deserialize, Debug)]
struct TomlBird {
    #[serde(default = "default_bird_x")]
    x: f64,
    #[serde(default = "default_bird_start_y")]
    start_y: f64,
    #[serde(default = "default_bird_size")]
    width: f64,
    #[serde(default = "default_bird_size")]
    height: f64,
    #[serde(default = "default_gravity")]
    gravity: f64,
    #[serde(default = "default_lift")]
    lift: f64,
}

#[derive(Deserialize, Debug)]
struct TomlPipes {
    #[serde(default = "default_pipe_width")]
    width: f64,
    #[serde(default = "default_gap")]
    gap: f64,
    #[serde(default = "default_spawn_interval")]
    spawn_interval: u64,
    #[serde(default = "default_min_height")]
    min_height: u32,
    #[serde(default = "default_height_range")]
    height_range: u32,
    #[serde(default = "default_base_speed")]
    base_speed: f64,
    #[serde(default = "default_speed_step")]
    speed_step_score: u32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_score_file")]
    score_file: String,
}

// ── Defaults ──

fn default_field_width() -> f64 { 480.0 }
fn default_field_height() -> f64 { 480.0 }

fn default_bird_x() -> f64 { 50.0 }
fn default_bird_start_y() -> f64 { 150.0 }
fn default_bird_size() -> f64 { 20.0 }
fn default_gravity() -> f64 { 0.3 }
fn default_lift() -> f64 { -6.4 }

fn default_pipe_width() -> f64 { 40.0 }
fn default_gap() -> f64 { 150.0 }
fn default_spawn_interval() -> u64 { 90 }
fn default_min_height() -> u32 { 50 }
fn default_height_range() -> u32 { 200 }
fn default_base_speed() -> f64 { 2.0 }
fn default_speed_step() -> u32 { 10 }

fn default_frame_ms() -> u64 { 16 } // ~60 Hz display refresh

fn default_score_file() -> String { "highscore.dat".into() }

impl Default for TomlField {
    fn default() -> Self {
        TomlField {
            width: default_field_width(),
            height: default_field_height(),
        }
    }
}

impl Default for TomlBird {
    fn default() -> Self {
        TomlBird {
            x: default_bird_x(),
            start_y: default_bird_start_y(),
            width: default_bird_size(),
            height: default_bird_size(),
            gravity: default_gravity(),
            lift: default_lift(),
        }
    }
}

impl Default for TomlPipes {
    fn default() -> Self {
        TomlPipes {
            width: default_pipe_width(),
            gap: default_gap(),
            spawn_interval: default_spawn_interval(),
            min_height: default_min_height(),
            height_range: default_height_range(),
            base_speed: default_base_speed(),
            speed_step_score: default_speed_step(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming { frame_ms: default_frame_ms() }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            score_file: default_score_file(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory, (3) data dir.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let toml_cfg = load_toml(&candidate_dirs());
        GameConfig::from_toml(toml_cfg)
    }

    /// Parse a config from TOML text. Unknown keys are ignored.
    #[allow(dead_code)]
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(GameConfig::from_toml)
    }

    fn from_toml(cfg: TomlConfig) -> Self {
        GameConfig {
            field: FieldConfig {
                width: cfg.field.width,
                height: cfg.field.height,
            },
            bird: BirdConfig {
                x: cfg.bird.x,
                start_y: cfg.bird.start_y,
                width: cfg.bird.width,
                height: cfg.bird.height,
                gravity: cfg.bird.gravity,
                lift: cfg.bird.lift,
            },
            pipes: PipeConfig {
                width: cfg.pipes.width,
                gap: cfg.pipes.gap,
                spawn_interval: cfg.pipes.spawn_interval,
                min_height: cfg.pipes.min_height,
                height_range: cfg.pipes.height_range,
                base_speed: cfg.pipes.base_speed,
                speed_step_score: cfg.pipes.speed_step_score,
            },
            timing: TimingConfig {
                frame_ms: cfg.timing.frame_ms.max(1),
            },
            score_file: PathBuf::from(cfg.general.score_file),
        }
    }
}

/// Candidate directories to search: exe dir + CWD + data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a linked binary still finds its neighbours.
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
        let xdg = PathBuf::from(&home).join(".local/share/flapterm");
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
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => {
                    tracing::debug!(path = %path.display(), "loaded config");
                    return cfg;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "config.toml parse error, using defaults");
                    return TomlConfig::default();
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read config");
            }
        }
    }
    TomlConfig::default()
}
