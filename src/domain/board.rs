/// Board model: the 8x8 grid of symbols plus the parallel per-cell grids
/// (matched mask, fall offsets) that share its coordinates.
///
/// Coordinates: `Pos { x, y }` with x = column (left → right) and
/// y = row (top → bottom). Storage is row-major `[y][x]`.
///
/// Out-of-range access is a contract violation and panics; callers
/// translate and validate coordinates before they reach the board.

use std::ops::{Index, IndexMut};

use rand::Rng;

use super::tile::Symbol;

pub const BOARD_SIZE: usize = 8;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Pos { x, y }
    }

    #[inline]
    pub fn in_bounds(self) -> bool {
        self.x < BOARD_SIZE && self.y < BOARD_SIZE
    }

    /// Neighbour in the given direction, or None at the board edge.
    pub fn offset(self, dx: i32, dy: i32) -> Option<Pos> {
        let x = self.x as i32 + dx;
        let y = self.y as i32 + dy;
        if x < 0 || y < 0 {
            return None;
        }
        let p = Pos::new(x as usize, y as usize);
        p.in_bounds().then_some(p)
    }

    /// Every board position in row-major order.
    pub fn all() -> impl Iterator<Item = Pos> {
        (0..BOARD_SIZE).flat_map(|y| (0..BOARD_SIZE).map(move |x| Pos::new(x, y)))
    }
}

/// True iff the Manhattan distance between `a` and `b` is exactly 1.
/// Diagonals and identical cells are not adjacent.
pub fn are_adjacent(a: Pos, b: Pos) -> bool {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y) == 1
}

/// Uniform choice over the symbol alphabet.
pub fn random_symbol<R: Rng + ?Sized>(rng: &mut R) -> Symbol {
    Symbol::random(rng)
}

// ── Grid<T>: per-cell data parallel to the board ──

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Grid<T> {
    cells: [[T; BOARD_SIZE]; BOARD_SIZE],
}

/// `mask[pos] == true` ↔ the cell takes part in a 3-window this pass.
pub type Mask = Grid<bool>;

/// Remaining fall distance per cell, in tile units.
pub type FallGrid = Grid<f32>;

impl<T: Copy> Grid<T> {
    pub fn filled(value: T) -> Self {
        Grid { cells: [[value; BOARD_SIZE]; BOARD_SIZE] }
    }
}

impl<T: Copy + Default> Default for Grid<T> {
    fn default() -> Self {
        Grid::filled(T::default())
    }
}

impl<T> Index<Pos> for Grid<T> {
    type Output = T;
    #[inline]
    fn index(&self, p: Pos) -> &T {
        &self.cells[p.y][p.x]
    }
}

impl<T> IndexMut<Pos> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, p: Pos) -> &mut T {
        &mut self.cells[p.y][p.x]
    }
}

#[cfg(test)]
impl Mask {
    pub fn any(&self) -> bool {
        self.cells.iter().flatten().any(|&m| m)
    }

    pub fn count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&m| m).count()
    }
}

impl FallGrid {
    /// True once every offset has settled at exactly zero.
    pub fn settled(&self) -> bool {
        self.cells.iter().flatten().all(|&d| d == 0.0)
    }
}

// ── Board ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Board {
    cells: [[Symbol; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Uniform random fill. May contain matches; callers resolve them.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cells = [[Symbol::Hash; BOARD_SIZE]; BOARD_SIZE];
        for row in &mut cells {
            for cell in row.iter_mut() {
                *cell = random_symbol(rng);
            }
        }
        Board { cells }
    }

    /// Build a board from 8 strings of 8 glyphs each ('#', '@', '$', '%', '&').
    /// Returns None on any malformed row or unknown glyph.
    #[cfg(test)]
    pub fn from_rows(rows: &[&str]) -> Option<Self> {
        if rows.len() != BOARD_SIZE {
            return None;
        }
        let mut cells = [[Symbol::Hash; BOARD_SIZE]; BOARD_SIZE];
        for (y, row) in rows.iter().enumerate() {
            let glyphs: Vec<char> = row.chars().collect();
            if glyphs.len() != BOARD_SIZE {
                return None;
            }
            for (x, &c) in glyphs.iter().enumerate() {
                cells[y][x] = Symbol::from_glyph(c)?;
            }
        }
        Some(Board { cells })
    }

    #[inline]
    pub fn get(&self, p: Pos) -> Symbol {
        assert!(p.in_bounds(), "board read out of range: {:?}", p);
        self.cells[p.y][p.x]
    }

    #[inline]
    pub fn set(&mut self, p: Pos, s: Symbol) {
        assert!(p.in_bounds(), "board write out of range: {:?}", p);
        self.cells[p.y][p.x] = s;
    }

    /// Exchange two cells. No validity check; adjacency is the caller's job.
    pub fn swap(&mut self, a: Pos, b: Pos) {
        let tmp = self.get(a);
        self.set(a, self.get(b));
        self.set(b, tmp);
    }

    /// Copy of column `x`, top to bottom.
    #[cfg(test)]
    pub fn column(&self, x: usize) -> [Symbol; BOARD_SIZE] {
        std::array::from_fn(|y| self.get(Pos::new(x, y)))
    }

    /// Rows as glyph strings, for logs and test diagnostics.
    pub fn to_rows(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|s| s.glyph()).collect())
            .collect()
    }
}
