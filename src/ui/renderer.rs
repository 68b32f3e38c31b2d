/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each board tile is a `TILE_W` × `TILE_H` block of terminal cells. The
/// board is centred horizontally; `BoardLayout` owns the mapping between
/// tile units and terminal cells in both directions, so mouse clicks go
/// through the same arithmetic the drawing does.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::board::{Pos, BOARD_SIZE};
use crate::domain::tile::Symbol;
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Same RGB for `Clear` and every empty cell so row gaps never show.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Replace only the glyph and foreground, keeping what is underneath.
    fn overlay(&mut self, x: usize, y: usize, ch: char, fg: Color) {
        if x < self.width && y < self.height {
            let bg = self.get(x, y).bg;
            self.set(x, y, Cell::new(ch, fg, bg));
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, bg);
    }
}

// ── Layout ──

pub const TILE_W: usize = 4;
pub const TILE_H: usize = 2;
const BOARD_COLS: usize = BOARD_SIZE * TILE_W;
const BOARD_ROWS: usize = BOARD_SIZE * TILE_H;

const HUD_ROW: usize = 0;
const BOARD_ROW: usize = 2;

/// Where the board sits on screen for the current terminal size.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BoardLayout {
    pub origin_x: usize,
    pub origin_y: usize,
}

impl BoardLayout {
    pub fn for_terminal(term_w: usize) -> Self {
        BoardLayout {
            origin_x: term_w.saturating_sub(BOARD_COLS) / 2,
            origin_y: BOARD_ROW,
        }
    }

    /// Grid cell under terminal cell `(col, row)`, if any.
    pub fn cell_at(&self, col: usize, row: usize) -> Option<Pos> {
        if col < self.origin_x || row < self.origin_y {
            return None;
        }
        let p = Pos::new((col - self.origin_x) / TILE_W, (row - self.origin_y) / TILE_H);
        p.in_bounds().then_some(p)
    }

    /// Terminal cell for a point in tile units, or None when off-screen
    /// to the top/left.
    fn to_screen(&self, tx: f32, ty: f32) -> Option<(usize, usize)> {
        let col = self.origin_x as f32 + tx * TILE_W as f32;
        let row = self.origin_y as f32 + ty * TILE_H as f32;
        if col < 0.0 || row < 0.0 {
            return None;
        }
        Some((col.round() as usize, row.round() as usize))
    }

    fn in_board(&self, col: usize, row: usize) -> bool {
        (self.origin_x..self.origin_x + BOARD_COLS).contains(&col)
            && (self.origin_y..self.origin_y + BOARD_ROWS).contains(&row)
    }
}

// ── Palette ──

fn symbol_bg(s: Symbol) -> Color {
    const PALETTE: [(u8, u8, u8); 5] = [
        (170, 60, 60),  // #
        (60, 120, 190), // @
        (200, 170, 50), // $
        (80, 160, 80),  // %
        (150, 80, 170), // &
    ];
    let (r, g, b) = PALETTE[s.index()];
    Color::Rgb { r, g, b }
}

fn brighten(c: Color, amount: u8) -> Color {
    match c {
        Color::Rgb { r, g, b } => Color::Rgb {
            r: r.saturating_add(amount),
            g: g.saturating_add(amount),
            b: b.saturating_add(amount),
        },
        other => other,
    }
}

/// Blend `(r,g,b)` towards the board background by `alpha` (0..=1).
fn fade(r: u8, g: u8, b: u8, alpha: f32) -> Color {
    let a = alpha.clamp(0.0, 1.0);
    let mix = |c: u8, base: u8| (base as f32 + (c as f32 - base as f32) * a) as u8;
    Color::Rgb { r: mix(r, 22), g: mix(g, 22), b: mix(b, 35) }
}

fn board_bg(p: Pos) -> Color {
    if (p.x + p.y) % 2 == 0 {
        Color::Rgb { r: 34, g: 34, b: 50 }
    } else {
        Color::Rgb { r: 28, g: 28, b: 42 }
    }
}

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const SELECT_FG: Color = Color::Rgb { r: 255, g: 240, b: 120 };
const CURSOR_FG: Color = Color::Rgb { r: 230, g: 230, b: 230 };
const HINT_FG: Color = Color::Rgb { r: 90, g: 230, b: 255 };
const WRONG_BG: Color = Color::Rgb { r: 200, g: 30, b: 30 };
const MATCH_BG: Color = Color::Rgb { r: 110, g: 110, b: 140 };

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    layout: BoardLayout,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            layout: BoardLayout::for_terminal(0),
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Grid cell under a terminal cell, using the layout of the last frame.
    pub fn cell_at(&self, col: u16, row: u16) -> Option<Pos> {
        self.layout.cell_at(col as usize, row as usize)
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.layout = BoardLayout::for_terminal(w);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Only the intro boundary needs a clean slate; in-game phases share a screen.
        let was_intro = self.last_phase == Some(Phase::Intro);
        if self.last_phase.is_none() || was_intro != (world.phase == Phase::Intro) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }
        self.last_phase = Some(world.phase);

        self.front.clear();
        match world.phase {
            Phase::Intro => self.compose_intro(world),
            _ => self.compose_game(world),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // No ResetColor here: the terminal default may differ from BASE_BG.
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_intro(&mut self, w: &WorldState) {
        let title = [
            r"  ___  _    ___  ___  _    ___  ___  ",
            r" / __|/_\  / __|/ __|/_\  |   \| __| ",
            r"| (__/ _ \ \__ \ (__/ _ \ | |) | _|  ",
            r" \___/_/ \_\|___/\___/_/ \_\|___/|___| ",
        ];
        let top = self.front.height.saturating_sub(10) / 2;
        let gold = Color::Rgb { r: 255, g: 200, b: 50 };
        for (i, line) in title.iter().enumerate() {
            self.front.put_centered(top + i, line, gold, Color::Reset);
        }

        let bar_w = 30;
        let filled = (w.intro_progress() * bar_w as f32) as usize;
        let bar: String = (0..bar_w).map(|i| if i < filled { '█' } else { '░' }).collect();
        self.front.put_centered(top + 6, &bar, Color::Rgb { r: 80, g: 200, b: 255 }, Color::Reset);

        let best = format!("Best {}", w.high_score);
        self.front.put_centered(top + 8, &best, Color::DarkGrey, Color::Reset);
        self.front.put_centered(top + 9, "Space to start", Color::White, Color::Reset);
    }

    fn compose_game(&mut self, w: &WorldState) {
        self.compose_hud(w);
        self.compose_board_bg(w);
        self.compose_tiles(w);
        self.compose_markers(w);
        self.compose_particles(w);
        self.compose_popups(w);

        let help_row = self.layout.origin_y + BOARD_ROWS + 1;
        if help_row < self.front.height {
            let help = " Click/Space:Select  Arrows/WASD:Move  H:Hint  M:Music  Q:Quit ";
            self.front.put_centered(help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_hud(&mut self, w: &WorldState) {
        for x in 0..self.front.width {
            self.front.set(x, HUD_ROW, Cell::new(' ', Color::White, HUD_BG));
        }

        let score_fg = if w.effects.pulse.active() {
            // Brighter the further the pulse is from rest.
            let t = ((w.effects.pulse.scale - 1.0).clamp(0.0, 1.0) * 255.0) as u8;
            Color::Rgb { r: 255, g: 255, b: 255 - t }
        } else {
            Color::White
        };
        let score = format!(" Score {:<7}", w.score);
        self.front.put_str(0, HUD_ROW, &score, score_fg, HUD_BG);

        let best = format!("Best {:<7}", w.high_score);
        self.front.put_str(score.len() + 1, HUD_ROW, &best, Color::Rgb { r: 180, g: 180, b: 220 }, HUD_BG);

        let music = if w.music_on { "♪ on " } else { "♪ off" };
        let mx = self.front.width.saturating_sub(7);
        self.front.put_str(mx, HUD_ROW, music, Color::Rgb { r: 120, g: 220, b: 120 }, HUD_BG);
    }

    fn compose_board_bg(&mut self, w: &WorldState) {
        let flash = w.phase == Phase::Animating;
        for y in 0..BOARD_SIZE {
            for x in 0..BOARD_SIZE {
                let p = Pos::new(x, y);
                let bg = if flash && w.matched[p] { MATCH_BG } else { board_bg(p) };
                self.fill_tile(p.x as f32, p.y as f32, |_, _| Cell::new(' ', Color::White, bg));
            }
        }
    }

    fn compose_tiles(&mut self, w: &WorldState) {
        // Swapping tiles last so they slide over their neighbours.
        let swapping = |p: Pos| w.swap_displacement(p).is_some();
        let order = Pos::all().filter(|p| !swapping(*p))
            .chain(Pos::all().filter(|p| swapping(*p)));

        for p in order {
            let sym = w.board.get(p);
            let (dx, dy) = w.swap_displacement(p).unwrap_or((0.0, 0.0));
            let tx = p.x as f32 + dx;
            let ty = p.y as f32 + dy - w.falls[p];

            let mut bg = symbol_bg(sym);
            if w.is_wrong_cell(p) {
                bg = WRONG_BG;
            }
            if w.selected() == Some(p) {
                bg = brighten(bg, 50);
            }
            let glyph = sym.glyph();
            self.fill_tile(tx, ty, |col, row| {
                let ch = if row == 0 && (col == 1 || col == 2) { glyph } else { ' ' };
                Cell::new(ch, Color::Rgb { r: 245, g: 245, b: 245 }, bg)
            });
        }
    }

    /// Corner brackets for cursor, selection, and hint.
    fn compose_markers(&mut self, w: &WorldState) {
        if w.phase != Phase::Idle {
            return;
        }
        let blink = (w.idle_timer * 3.0) as u32 % 2 == 0;
        if blink {
            for p in Pos::all().filter(|&p| w.is_hint_cell(p)) {
                self.mark(p, '◇', HINT_FG);
            }
        }
        self.mark(w.cursor, '▸', CURSOR_FG);
        if let Some(p) = w.selected() {
            self.mark(p, '■', SELECT_FG);
        }
    }

    fn mark(&mut self, p: Pos, ch: char, fg: Color) {
        let col = self.layout.origin_x + p.x * TILE_W;
        let row = self.layout.origin_y + p.y * TILE_H + 1;
        self.front.overlay(col, row, ch, fg);
    }

    fn compose_particles(&mut self, w: &WorldState) {
        for pt in &w.effects.particles {
            let Some((col, row)) = self.layout.to_screen(pt.x, pt.y) else { continue };
            if self.layout.in_board(col, row) {
                self.front.overlay(col, row, '*', fade(255, 255, pt.tint, pt.alpha));
            }
        }
    }

    fn compose_popups(&mut self, w: &WorldState) {
        for pop in &w.effects.popups {
            let Some((col, row)) = self.layout.to_screen(pop.x, pop.y) else { continue };
            let text = format!("+{}", pop.amount);
            let fg = fade(255, 255, 120, pop.alpha);
            for (i, ch) in text.chars().enumerate() {
                let c = (col + i).saturating_sub(text.len() / 2);
                if self.layout.in_board(c, row) {
                    self.front.overlay(c, row, ch, fg);
                }
            }
        }
    }

    /// Draw one tile-sized block at tile coordinates `(tx, ty)`, clipped to
    /// the board. `cell(col, row)` gets the offset within the tile.
    fn fill_tile(&mut self, tx: f32, ty: f32, cell: impl Fn(usize, usize) -> Cell) {
        let col0 = self.layout.origin_x as f32 + tx * TILE_W as f32;
        let row0 = self.layout.origin_y as f32 + ty * TILE_H as f32;
        for r in 0..TILE_H {
            let row = (row0 + r as f32).round();
            for c in 0..TILE_W {
                let col = (col0 + c as f32).round();
                if row < 0.0 || col < 0.0 {
                    continue;
                }
                let (col, row) = (col as usize, row as usize);
                if self.layout.in_board(col, row) {
                    self.front.set(col, row, cell(c, r));
                }
            }
        }
    }
}
