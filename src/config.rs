/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use log::{info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub scoring: ScoringConfig,
    pub gamepad: GamepadConfig,
    pub high_score_path: PathBuf,
    pub seed: Option<u64>,
    pub max_frame_dt: f32,
    pub music: bool,
}

/// All durations in seconds; `fall_speed` in tiles per second.
#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub swap_duration: f32,
    pub fall_speed: f32,
    pub match_delay: f32,
    pub wrong_move_duration: f32,
    pub hint_idle: f32,
    pub intro_duration: f32,
    pub popup_lifetime: f32,
    pub frame_ms: u64,
}

#[derive(Clone, Debug)]
pub struct ScoringConfig {
    pub match_bonus: u32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub select: Vec<String>,
    pub cancel: Vec<String>,
    pub hint: Vec<String>,
    pub music: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    scoring: TomlScoring,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_swap_duration")]
    swap_duration: f32,
    #[serde(default = "default_fall_speed")]
    fall_speed: f32,
    #[serde(default = "default_match_delay")]
    match_delay: f32,
    #[serde(default = "default_wrong_move")]
    wrong_move_duration: f32,
    #[serde(default = "default_hint_idle")]
    hint_idle: f32,
    #[serde(default = "default_intro")]
    intro_duration: f32,
    #[serde(default = "default_popup_lifetime")]
    popup_lifetime: f32,
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlScoring {
    #[serde(default = "default_match_bonus")]
    match_bonus: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_select")]
    select: Vec<String>,
    #[serde(default = "default_pad_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_pad_hint")]
    hint: Vec<String>,
    #[serde(default = "default_pad_music")]
    music: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_high_score_file")]
    high_score_file: String,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default = "default_max_frame_dt")]
    max_frame_dt: f32,
    #[serde(default = "default_music")]
    music: bool,
}

// ── Defaults ──

fn default_swap_duration() -> f32 { 0.15 }
fn default_fall_speed() -> f32 { 11.4 }   // 8 px/frame @ 60fps over 42 px tiles
fn default_match_delay() -> f32 { 0.2 }
fn default_wrong_move() -> f32 { 0.3 }
fn default_hint_idle() -> f32 { 15.0 }
fn default_intro() -> f32 { 5.0 }
fn default_popup_lifetime() -> f32 { 1.0 }
fn default_frame_ms() -> u64 { 16 }
fn default_match_bonus() -> u32 { 10 }
fn default_high_score_file() -> String { "highscore.txt".into() }
fn default_max_frame_dt() -> f32 { 0.1 }
fn default_music() -> bool { true }

fn default_pad_select() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_pad_cancel() -> Vec<String> { vec!["B".into()] }
fn default_pad_hint() -> Vec<String> { vec!["Y".into()] }
fn default_pad_music() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            swap_duration: default_swap_duration(),
            fall_speed: default_fall_speed(),
            match_delay: default_match_delay(),
            wrong_move_duration: default_wrong_move(),
            hint_idle: default_hint_idle(),
            intro_duration: default_intro(),
            popup_lifetime: default_popup_lifetime(),
            frame_ms: default_frame_ms(),
        }
    }
}

impl Default for TomlScoring {
    fn default() -> Self {
        TomlScoring { match_bonus: default_match_bonus() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            select: default_pad_select(),
            cancel: default_pad_cancel(),
            hint: default_pad_hint(),
            music: default_pad_music(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            high_score_file: default_high_score_file(),
            seed: None,
            max_frame_dt: default_max_frame_dt(),
            music: default_music(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TomlTiming::default().into()
    }
}

impl From<TomlTiming> for TimingConfig {
    fn from(t: TomlTiming) -> Self {
        // Zero or negative durations would stall or divide by zero.
        TimingConfig {
            swap_duration: positive_or(t.swap_duration, default_swap_duration()),
            fall_speed: positive_or(t.fall_speed, default_fall_speed()),
            match_delay: t.match_delay.max(0.0),
            wrong_move_duration: t.wrong_move_duration.max(0.0),
            hint_idle: t.hint_idle.max(0.0),
            intro_duration: t.intro_duration.max(0.0),
            popup_lifetime: positive_or(t.popup_lifetime, default_popup_lifetime()),
            frame_ms: t.frame_ms.max(1),
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        TomlGamepad::default().into()
    }
}

impl From<TomlGamepad> for GamepadConfig {
    fn from(g: TomlGamepad) -> Self {
        GamepadConfig { select: g.select, cancel: g.cancel, hint: g.hint, music: g.music }
    }
}

fn positive_or(v: f32, fallback: f32) -> f32 {
    if v > 0.0 && v.is_finite() { v } else { fallback }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) ~/.local/share/cascade.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse a config from TOML text. Used by `load` and by tests.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(Self::from_toml(cfg, &[]))
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let high_score_path = resolve_data_path(&toml_cfg.general.high_score_file, search_dirs);

        GameConfig {
            timing: toml_cfg.timing.into(),
            scoring: ScoringConfig {
                match_bonus: toml_cfg.scoring.match_bonus,
            },
            gamepad: toml_cfg.gamepad.into(),
            high_score_path,
            seed: toml_cfg.general.seed,
            max_frame_dt: positive_or(toml_cfg.general.max_frame_dt, default_max_frame_dt()),
            music: toml_cfg.general.music,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), &[])
    }
}

/// Absolute paths are kept. Relative paths resolve against the first
/// candidate dir that already holds the file, else the first candidate dir.
fn resolve_data_path(name: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let p = Path::new(name);
    if p.is_absolute() {
        return p.to_path_buf();
    }
    search_dirs
        .iter()
        .map(|d| d.join(name))
        .find(|candidate| candidate.exists())
        .or_else(|| search_dirs.first().map(|d| d.join(name)))
        .unwrap_or_else(|| p.to_path_buf())
}

/// Candidate directories to search: exe dir + CWD + XDG data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/cascade)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/cascade");
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
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => {
                        info!("loaded {}", path.display());
                        return cfg;
                    }
                    Err(e) => {
                        warn!("config.toml parse error: {e}; using default settings");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_gives_defaults() {
        let cfg = GameConfig::parse("").unwrap();
        assert_eq!(cfg.scoring.match_bonus, 10);
        assert!((cfg.timing.swap_duration - 0.15).abs() < 1e-6);
        assert!((cfg.timing.match_delay - 0.2).abs() < 1e-6);
        assert!((cfg.timing.wrong_move_duration - 0.3).abs() < 1e-6);
        assert_eq!(cfg.seed, None);
        assert!(cfg.music);
        assert_eq!(cfg.high_score_path, PathBuf::from("highscore.txt"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::parse(
            "[scoring]\nmatch_bonus = 25\n\n[general]\nseed = 1234\n",
        )
        .unwrap();
        assert_eq!(cfg.scoring.match_bonus, 25);
        assert_eq!(cfg.seed, Some(1234));
        assert!((cfg.timing.hint_idle - 15.0).abs() < 1e-6);
        assert_eq!(cfg.gamepad.select, vec!["A".to_string(), "X".to_string()]);
    }

    #[test]
    fn non_positive_durations_fall_back() {
        let cfg = GameConfig::parse(
            "[timing]\nswap_duration = 0.0\nfall_speed = -3.0\nmatch_delay = -1.0\n",
        )
        .unwrap();
        assert!((cfg.timing.swap_duration - 0.15).abs() < 1e-6);
        assert!((cfg.timing.fall_speed - 11.4).abs() < 1e-6);
        assert_eq!(cfg.timing.match_delay, 0.0);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(GameConfig::parse("[timing\nswap_duration = ").is_err());
    }

    #[test]
    fn absolute_high_score_path_kept() {
        let cfg = GameConfig::parse("[general]\nhigh_score_file = \"/tmp/hs.txt\"\n").unwrap();
        assert_eq!(cfg.high_score_path, PathBuf::from("/tmp/hs.txt"));
    }
}
