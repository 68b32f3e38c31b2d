/// High score persistence.
///
/// ## File format:
///   A single decimal integer, optionally followed by a newline.
///   Anything after the leading digits is ignored; a missing or
///   unreadable file reads as 0.
///
/// Storage sits behind `HighScoreStore` so the game loop never touches
/// the filesystem directly.

use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{info, warn};

pub trait HighScoreStore {
    /// The stored best score, or 0 when nothing usable is stored.
    fn load(&self) -> u32;
    fn save(&mut self, score: u32) -> anyhow::Result<()>;
}

// ══════════════════════════════════════════════════════════════
// File-backed store
// ══════════════════════════════════════════════════════════════

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for FileStore {
    fn load(&self) -> u32 {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => match parse_score(&content) {
                Some(score) => {
                    info!("high score {} loaded from {}", score, self.path.display());
                    score
                }
                None => {
                    warn!("{} holds no score, starting from 0", self.path.display());
                    0
                }
            },
            // First run: no file yet.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => {
                warn!("cannot read {}: {}", self.path.display(), e);
                0
            }
        }
    }

    fn save(&mut self, score: u32) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        std::fs::write(&self.path, format!("{}\n", score))
            .with_context(|| format!("writing high score to {}", self.path.display()))
    }
}

/// Leading run of ASCII digits, after optional whitespace.
fn parse_score(content: &str) -> Option<u32> {
    let trimmed = content.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

// ══════════════════════════════════════════════════════════════
// In-memory store (tests)
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    pub value: Option<u32>,
    pub writes: usize,
}

#[cfg(test)]
impl HighScoreStore for MemoryStore {
    fn load(&self) -> u32 {
        self.value.unwrap_or(0)
    }

    fn save(&mut self, score: u32) -> anyhow::Result<()> {
        self.value = Some(score);
        self.writes += 1;
        Ok(())
    }
}
