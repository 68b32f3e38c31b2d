/// WorldState: the complete state of a running game.
///
/// ## Layers
///
/// The board and its two parallel grids share coordinates:
///   - `board`: the symbols. Mutated only by `sim::step` (swap commit,
///     gravity).
///   - `matched`: mask from the latest detection pass, drawn highlighted.
///   - `falls`: remaining fall distance per cell, in tile units.
///
/// ## Interaction
///
/// `pending` holds exactly one of: nothing, one selected tile, or one swap
/// in flight. A swap is in flight iff `phase == Phase::Swapping`.
///
/// Everything is owned here and passed by `&mut` into the step functions;
/// the renderer only ever reads it.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{GameConfig, TimingConfig};
use crate::domain::board::{Board, FallGrid, Mask, Pos, BOARD_SIZE};
use crate::domain::hint::Hint;
use super::effects::Effects;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Intro,
    Idle,
    Swapping,
    Animating,
    MatchDelay,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SwapIntent {
    pub from: Pos,
    pub to: Pos,
    /// 0.0 → 1.0 over the swap duration.
    pub progress: f32,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Pending {
    Nothing,
    Selected(Pos),
    Swap(SwapIntent),
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct WrongMove {
    pub from: Pos,
    pub to: Pos,
    pub remaining: f32,
}

pub struct WorldState {
    // ── Board layers ──
    pub board: Board,
    pub matched: Mask,
    pub falls: FallGrid,

    // ── Flow ──
    pub phase: Phase,
    /// Phase to enter once the intro splash ends.
    pub post_intro: Phase,
    pub pending: Pending,
    pub intro_timer: f32,
    pub match_delay_timer: f32,
    pub cascade_depth: u32,

    // ── Feedback ──
    pub cursor: Pos,
    pub wrong_move: Option<WrongMove>,
    pub hint: Option<Hint>,
    pub idle_timer: f32,
    pub effects: Effects,
    pub music_on: bool,

    // ── Score ──
    pub score: u32,
    pub high_score: u32,

    // ── Tuning ──
    pub timing: TimingConfig,
    pub match_bonus: u32,

    pub rng: StdRng,
}

// ── Construction ──

impl WorldState {
    /// Fresh random board. Call `step::begin` before the first tick.
    pub fn new(config: &GameConfig, high_score: u32) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let board = Board::random(&mut rng);
        let mut world = Self::with_board(board, config.timing.clone(), config.scoring.match_bonus, rng);
        world.high_score = high_score;
        world.music_on = config.music;
        world
    }

    /// A world in `Idle` around a given board, skipping the intro.
    pub fn with_board(board: Board, timing: TimingConfig, match_bonus: u32, rng: StdRng) -> Self {
        WorldState {
            board,
            matched: Mask::default(),
            falls: FallGrid::default(),
            phase: Phase::Idle,
            post_intro: Phase::Idle,
            pending: Pending::Nothing,
            intro_timer: 0.0,
            match_delay_timer: 0.0,
            cascade_depth: 0,
            cursor: Pos::new(BOARD_SIZE / 2, BOARD_SIZE / 2),
            wrong_move: None,
            hint: None,
            idle_timer: 0.0,
            effects: Effects::default(),
            music_on: true,
            score: 0,
            high_score: 0,
            timing,
            match_bonus,
            rng,
        }
    }
}

// ── Read-only queries for the presentation layer ──

impl WorldState {
    pub fn selected(&self) -> Option<Pos> {
        match self.pending {
            Pending::Selected(p) => Some(p),
            _ => None,
        }
    }

    pub fn swap_in_flight(&self) -> Option<SwapIntent> {
        match self.pending {
            Pending::Swap(s) => Some(s),
            _ => None,
        }
    }

    /// Draw displacement `(dx, dy)` in tiles for a cell taking part in the
    /// swap animation. The two tiles slide towards each other's cell.
    pub fn swap_displacement(&self, p: Pos) -> Option<(f32, f32)> {
        let s = self.swap_in_flight()?;
        let t = s.progress.clamp(0.0, 1.0);
        let dx = s.to.x as f32 - s.from.x as f32;
        let dy = s.to.y as f32 - s.from.y as f32;
        if p == s.from {
            Some((dx * t, dy * t))
        } else if p == s.to {
            Some((-dx * t, -dy * t))
        } else {
            None
        }
    }

    pub fn is_wrong_cell(&self, p: Pos) -> bool {
        self.wrong_move.map_or(false, |w| w.from == p || w.to == p)
    }

    pub fn is_hint_cell(&self, p: Pos) -> bool {
        self.hint.map_or(false, |h| h.contains(p))
    }

    /// Intro progress 0.0 → 1.0.
    pub fn intro_progress(&self) -> f32 {
        if self.timing.intro_duration <= 0.0 {
            1.0
        } else {
            (self.intro_timer / self.timing.intro_duration).min(1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> WorldState {
        let mut rng = StdRng::seed_from_u64(3);
        let board = Board::random(&mut rng);
        WorldState::with_board(board, TimingConfig::default(), 10, rng)
    }

    #[test]
    fn swap_displacement_mirrors_both_tiles() {
        let mut w = world();
        let (a, b) = (Pos::new(2, 2), Pos::new(3, 2));
        w.pending = Pending::Swap(SwapIntent { from: a, to: b, progress: 0.5 });
        assert_eq!(w.swap_displacement(a), Some((0.5, 0.0)));
        assert_eq!(w.swap_displacement(b), Some((-0.5, 0.0)));
        assert_eq!(w.swap_displacement(Pos::new(0, 0)), None);
        assert_eq!(w.selected(), None);
    }

    #[test]
    fn seeded_worlds_start_identical() {
        let cfg = GameConfig { seed: Some(77), ..GameConfig::default() };
        let a = WorldState::new(&cfg, 0);
        let b = WorldState::new(&cfg, 120);
        assert_eq!(a.board, b.board);
        assert_eq!(b.high_score, 120);
    }
}
