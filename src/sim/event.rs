/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and logging;
/// the core never calls an audio or particle API directly.

use crate::domain::board::Pos;
use crate::domain::matcher::Orientation;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    IntroFinished,
    TileSelected { pos: Pos },
    SelectionCleared,
    SwapStarted { from: Pos, to: Pos },
    /// One per qualifying 3-window, so a run of 4 emits two.
    MatchFound { origin: Pos, orientation: Orientation, points: u32 },
    WrongMove { from: Pos, to: Pos },
    TilesLanded,
    /// A match formed without player input; depth 1 is the first chain link.
    Cascade { depth: u32 },
    Settled,
    HintShown { from: Pos, to: Pos },
    NewHighScore { score: u32 },
}
