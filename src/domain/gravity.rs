/// Gravity resolution: remove matched cells, compact each column downward,
/// and refill the top with fresh random symbols.
///
/// Fall distances are in tile units:
///   - survivor moved from row `src` to row `dst`:  `dst - src`
///   - new tile placed at row `dst`:               `dst + 1` (drops in from above the board)
///   - survivor that did not move:                 `0`
///
/// Columns are independent. Survivors keep their relative order.

use rand::Rng;

use super::board::{random_symbol, Board, FallGrid, Mask, Pos, BOARD_SIZE};

/// Tile size in fall-offset units.
pub const TILE_SIZE: f32 = 1.0;

#[derive(Clone, Debug)]
pub struct Resolution {
    pub falls: FallGrid,
    /// Number of freshly generated tiles placed this pass.
    pub spawned: usize,
}

pub fn resolve_matches<R: Rng + ?Sized>(board: &mut Board, matched: &Mask, rng: &mut R) -> Resolution {
    let mut falls = FallGrid::default();
    let mut spawned = 0;

    for x in 0..BOARD_SIZE {
        // write_y counts down from the bottom; rows below it are final.
        let mut write_y = BOARD_SIZE;
        for y in (0..BOARD_SIZE).rev() {
            let src = Pos::new(x, y);
            if matched[src] {
                continue;
            }
            write_y -= 1;
            let dst = Pos::new(x, write_y);
            if write_y != y {
                board.set(dst, board.get(src));
            }
            falls[dst] = (write_y - y) as f32 * TILE_SIZE;
        }

        for y in (0..write_y).rev() {
            let dst = Pos::new(x, y);
            board.set(dst, random_symbol(rng));
            falls[dst] = (y + 1) as f32 * TILE_SIZE;
            spawned += 1;
        }
    }

    Resolution { falls, spawned }
}

/// Advance every fall offset by `amount`, flooring at zero.
/// Returns true while any cell is still travelling.
pub fn advance_falls(falls: &mut FallGrid, amount: f32) -> bool {
    for p in Pos::all() {
        let d = &mut falls[p];
        if *d > 0.0 {
            *d = (*d - amount).max(0.0);
        }
    }
    !falls.settled()
}
