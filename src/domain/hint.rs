/// Hint search: the first adjacent swap that would create a match.
///
/// Scan order:
///   1. horizontal pairs, row-major   ((0,0)-(1,0), (1,0)-(2,0), ... (6,7)-(7,7))
///   2. vertical pairs, column-major  ((0,0)-(0,1), (0,1)-(0,2), ... (7,6)-(7,7))
///
/// Not the best move, only the first. Each trial is evaluated on a scratch
/// copy through `would_match`, so the board is never mutated.

use super::board::{Board, Pos, BOARD_SIZE};
use super::matcher::would_match;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Hint {
    pub from: Pos,
    pub to: Pos,
}

impl Hint {
    pub fn contains(&self, p: Pos) -> bool {
        self.from == p || self.to == p
    }
}

pub fn find_hint(board: &Board) -> Option<Hint> {
    candidate_swaps().find(|h| would_match(board, h.from, h.to))
}

/// Whether any move is left on the board at all.
pub fn has_moves(board: &Board) -> bool {
    find_hint(board).is_some()
}

fn candidate_swaps() -> impl Iterator<Item = Hint> {
    let horizontal = (0..BOARD_SIZE).flat_map(|y| {
        (0..BOARD_SIZE - 1).map(move |x| Hint { from: Pos::new(x, y), to: Pos::new(x + 1, y) })
    });
    let vertical = (0..BOARD_SIZE).flat_map(|x| {
        (0..BOARD_SIZE - 1).map(move |y| Hint { from: Pos::new(x, y), to: Pos::new(x, y + 1) })
    });
    horizontal.chain(vertical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::board::are_adjacent;
    use crate::domain::matcher::{find_matches, has_match, Orientation};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Cyclic pattern with no matches and no single-swap match either.
    const DEAD: [&str; 8] = [
        "#@$%&#@$",
        "$%&#@$%&",
        "&#@$%&#@",
        "@$%&#@$%",
        "%&#@$%&#",
        "#@$%&#@$",
        "$%&#@$%&",
        "&#@$%&#@",
    ];

    fn board(rows: &[&str]) -> Board {
        Board::from_rows(rows).expect("valid test board")
    }

    #[test]
    fn candidates_cover_all_adjacent_pairs_in_order() {
        let all: Vec<Hint> = candidate_swaps().collect();
        assert_eq!(all.len(), 2 * BOARD_SIZE * (BOARD_SIZE - 1));
        assert!(all.iter().all(|h| are_adjacent(h.from, h.to)));
        assert_eq!(all[0], Hint { from: Pos::new(0, 0), to: Pos::new(1, 0) });
        assert_eq!(all[7], Hint { from: Pos::new(0, 1), to: Pos::new(1, 1) });
        assert_eq!(all[56], Hint { from: Pos::new(0, 0), to: Pos::new(0, 1) });
    }

    #[test]
    fn dead_board_has_no_hint() {
        let b = board(&DEAD);
        assert!(!has_match(&b));
        assert_eq!(find_hint(&b), None);
        assert!(!has_moves(&b));
    }

    #[test]
    fn finds_horizontal_swap_first() {
        let mut rows = DEAD;
        // Swapping (2,0)<->(3,0) gives "###" on row 0.
        rows[0] = "##%#&@$%";
        let b = board(&rows);
        assert!(!has_match(&b));
        let h = find_hint(&b).expect("hint");
        assert_eq!(h, Hint { from: Pos::new(2, 0), to: Pos::new(3, 0) });
    }

    #[test]
    fn finds_vertical_swap_when_no_horizontal_exists() {
        let mut rows = DEAD;
        // Column 7: '@','@','%','@'; swapping (7,2)<->(7,3) lines up three '@'.
        rows[0] = "#@$%&#@@";
        rows[1] = "$%&#@$%@";
        rows[2] = "&#@$%&#%";
        rows[3] = "@$%&#@$@";
        let b = board(&rows);
        assert!(!has_match(&b));
        assert_eq!(find_hint(&b), Some(Hint { from: Pos::new(7, 2), to: Pos::new(7, 3) }));
    }

    #[test]
    fn horizontal_swap_counts_when_it_only_lines_up_a_column() {
        let mut rows = DEAD;
        // Column 0 reads '#','#','&'; moving the '#' at (1,2) left makes "###" vertically.
        rows[1] = "#%&#@$%&";
        let b = board(&rows);
        assert!(!has_match(&b));
        let h = find_hint(&b).expect("hint");
        assert_eq!(h, Hint { from: Pos::new(0, 2), to: Pos::new(1, 2) });

        let mut trial = b;
        trial.swap(h.from, h.to);
        let scan = find_matches(&trial);
        assert!(scan.found());
        assert!(scan.windows.iter().all(|w| w.orientation == Orientation::Vertical));
    }

    #[test]
    fn hint_is_idempotent_and_board_unchanged() {
        let mut r = StdRng::seed_from_u64(99);
        for _ in 0..25 {
            let b = Board::random(&mut r);
            let before = b;
            let first = find_hint(&b);
            let second = find_hint(&b);
            assert_eq!(first, second);
            assert_eq!(b, before);
        }
    }

    #[test]
    fn returned_hint_really_matches() {
        let mut r = StdRng::seed_from_u64(5);
        for _ in 0..25 {
            let b = Board::random(&mut r);
            if let Some(h) = find_hint(&b) {
                assert!(are_adjacent(h.from, h.to));
                let mut trial = b;
                trial.swap(h.from, h.to);
                assert!(has_match(&trial));
            }
        }
    }
}
