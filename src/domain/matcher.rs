/// Match detection: pure scan of the board for 3-in-a-row windows.
///
/// The scan is a sliding window, not a maximal-run search. Every start
/// position whose three consecutive cells agree counts as one window, so a
/// run of 4 yields two windows and a run of 5 yields three. Each window is
/// one scoring/feedback event for the caller; the mask simply ORs them.
///
/// Rows are scanned left → right (all rows first), then columns top → bottom.

use super::board::{Board, Mask, Pos, BOARD_SIZE};
use super::tile::Symbol;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// One qualifying 3-window. `origin` is its leftmost / topmost cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MatchWindow {
    pub origin: Pos,
    pub orientation: Orientation,
    pub symbol: Symbol,
}

impl MatchWindow {
    pub fn cells(&self) -> [Pos; 3] {
        let Pos { x, y } = self.origin;
        match self.orientation {
            Orientation::Horizontal => [Pos::new(x, y), Pos::new(x + 1, y), Pos::new(x + 2, y)],
            Orientation::Vertical => [Pos::new(x, y), Pos::new(x, y + 1), Pos::new(x, y + 2)],
        }
    }
}

/// Result of one detection pass.
#[derive(Clone, Debug, Default)]
pub struct MatchScan {
    pub mask: Mask,
    pub windows: Vec<MatchWindow>,
}

impl MatchScan {
    pub fn found(&self) -> bool {
        !self.windows.is_empty()
    }
}

/// Full detection pass: fresh mask plus every qualifying window in scan order.
pub fn find_matches(board: &Board) -> MatchScan {
    let mut scan = MatchScan::default();
    for_each_window(board, |w| {
        for p in w.cells() {
            scan.mask[p] = true;
        }
        scan.windows.push(w);
        true
    });
    scan
}

/// Does the board contain at least one 3-window? Stops at the first one.
pub fn has_match(board: &Board) -> bool {
    let mut found = false;
    for_each_window(board, |_| {
        found = true;
        false
    });
    found
}

/// Would swapping `a` and `b` leave the board with at least one match?
/// Evaluated on a scratch copy; `board` is never touched.
pub fn would_match(board: &Board, a: Pos, b: Pos) -> bool {
    let mut scratch = *board;
    scratch.swap(a, b);
    has_match(&scratch)
}

/// Visit windows in scan order. The visitor returns false to stop early.
fn for_each_window(board: &Board, mut visit: impl FnMut(MatchWindow) -> bool) {
    for y in 0..BOARD_SIZE {
        for x in 0..BOARD_SIZE - 2 {
            let t = board.get(Pos::new(x, y));
            if t == board.get(Pos::new(x + 1, y)) && t == board.get(Pos::new(x + 2, y)) {
                let w = MatchWindow {
                    origin: Pos::new(x, y),
                    orientation: Orientation::Horizontal,
                    symbol: t,
                };
                if !visit(w) {
                    return;
                }
            }
        }
    }

    for x in 0..BOARD_SIZE {
        for y in 0..BOARD_SIZE - 2 {
            let t = board.get(Pos::new(x, y));
            if t == board.get(Pos::new(x, y + 1)) && t == board.get(Pos::new(x, y + 2)) {
                let w = MatchWindow {
                    origin: Pos::new(x, y),
                    orientation: Orientation::Vertical,
                    symbol: t,
                };
                if !visit(w) {
                    return;
                }
            }
        }
    }
}
