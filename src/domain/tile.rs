/// Tile symbols and their properties.
/// The alphabet is fixed at five values; glyphs and palette indices are
/// queried via methods so symbol semantics stay centralized here.

use rand::Rng;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Symbol {
    Hash,    // '#'
    At,      // '@'
    Dollar,  // '$'
    Percent, // '%'
    Amp,     // '&'
}

impl Symbol {
    pub const ALL: [Symbol; 5] = [
        Symbol::Hash,
        Symbol::At,
        Symbol::Dollar,
        Symbol::Percent,
        Symbol::Amp,
    ];

    /// Character drawn for this symbol.
    pub fn glyph(self) -> char {
        match self {
            Symbol::Hash    => '#',
            Symbol::At      => '@',
            Symbol::Dollar  => '$',
            Symbol::Percent => '%',
            Symbol::Amp     => '&',
        }
    }

    #[cfg(test)]
    pub fn from_glyph(c: char) -> Option<Symbol> {
        Symbol::ALL.into_iter().find(|s| s.glyph() == c)
    }

    /// Stable index into the alphabet, used by the renderer palette.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Uniform choice over the alphabet. Only consumes the random source.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Symbol {
        Symbol::ALL[rng.gen_range(0..Symbol::ALL.len())]
    }
}
