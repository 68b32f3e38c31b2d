/// The step functions: input handling and per-frame advancement.
///
/// Phase flow:
///   Intro → Idle → Swapping → (Idle | Animating) → MatchDelay → (Animating | Idle)
///
/// Processing order inside `step` (each stage sees the previous stage's
/// result in the same frame):
///   1. Intro timer
///   2. Swap progress / commit
///   3. Effects (popups, particles, score pulse)
///   4. Wrong-move indicator
///   5. Fall animation
///   6. Match delay → cascade re-check
///   7. Idle hint timer
///   8. High score
///
/// A swap commit (apply → detect → resolve or revert) happens entirely
/// inside one call, so no reader ever sees a half-applied swap.

use log::{debug, info};

use crate::domain::board::{are_adjacent, Pos};
use crate::domain::gravity;
use crate::domain::hint::{find_hint, has_moves};
use crate::domain::matcher::{find_matches, MatchScan};
use super::event::GameEvent;
use super::world::{Pending, Phase, SwapIntent, WorldState, WrongMove};

// ══════════════════════════════════════════════════════════════
// Game start
// ══════════════════════════════════════════════════════════════

/// Resolve any matches already present on the fresh board, remember where
/// play should resume, and enter the intro splash.
pub fn begin(world: &mut WorldState) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if !run_detection(world, &mut events) {
        world.phase = Phase::Idle;
    }
    world.post_intro = world.phase;
    world.phase = Phase::Intro;
    world.intro_timer = 0.0;
    events
}

pub fn skip_intro(world: &mut WorldState) -> Vec<GameEvent> {
    if world.phase != Phase::Intro {
        return vec![];
    }
    world.phase = world.post_intro;
    vec![GameEvent::IntroFinished]
}

// ══════════════════════════════════════════════════════════════
// Input
// ══════════════════════════════════════════════════════════════

/// A primary click on a grid cell. Only honoured in `Idle`.
///
/// First click selects. A second click on an adjacent cell starts the swap
/// animation; on any other cell it just drops the selection.
pub fn click(world: &mut WorldState, pos: Pos) -> Vec<GameEvent> {
    if world.phase != Phase::Idle || !pos.in_bounds() {
        return vec![];
    }

    world.idle_timer = 0.0;
    world.hint = None;
    world.cursor = pos;

    match world.pending {
        Pending::Nothing => {
            world.pending = Pending::Selected(pos);
            vec![GameEvent::TileSelected { pos }]
        }
        Pending::Selected(first) => {
            if are_adjacent(first, pos) {
                world.pending = Pending::Swap(SwapIntent { from: first, to: pos, progress: 0.0 });
                world.phase = Phase::Swapping;
                vec![GameEvent::SwapStarted { from: first, to: pos }]
            } else {
                world.pending = Pending::Nothing;
                vec![GameEvent::SelectionCleared]
            }
        }
        // Unreachable while Idle; a swap always leaves Idle.
        Pending::Swap(_) => vec![],
    }
}

/// Any left-button press, on the board or off it, restarts the idle
/// countdown and hides the hint.
pub fn pointer_pressed(world: &mut WorldState) {
    world.idle_timer = 0.0;
    world.hint = None;
}

/// Click at the keyboard/gamepad cursor.
pub fn click_cursor(world: &mut WorldState) -> Vec<GameEvent> {
    let pos = world.cursor;
    click(world, pos)
}

pub fn move_cursor(world: &mut WorldState, dx: i32, dy: i32) {
    if let Some(p) = world.cursor.offset(dx, dy) {
        world.cursor = p;
    }
}

/// Drop a pending selection without swapping.
pub fn cancel_selection(world: &mut WorldState) -> Vec<GameEvent> {
    if let Pending::Selected(_) = world.pending {
        world.pending = Pending::Nothing;
        return vec![GameEvent::SelectionCleared];
    }
    vec![]
}

/// Flip background music; honoured in every phase.
pub fn toggle_music(world: &mut WorldState) -> bool {
    world.music_on = !world.music_on;
    world.music_on
}

/// Show a hint right away instead of waiting for the idle timer.
pub fn request_hint(world: &mut WorldState) -> Vec<GameEvent> {
    if world.phase != Phase::Idle {
        return vec![];
    }
    let mut events = Vec::new();
    show_hint(world, &mut events);
    events
}

// ══════════════════════════════════════════════════════════════
// Frame advance
// ══════════════════════════════════════════════════════════════

/// Advance every timer and animation by `dt` seconds.
pub fn step(world: &mut WorldState, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();

    if world.phase == Phase::Intro {
        world.intro_timer += dt;
        if world.intro_timer >= world.timing.intro_duration {
            world.phase = world.post_intro;
            events.push(GameEvent::IntroFinished);
        }
        return events;
    }

    resolve_swap(world, dt, &mut events);
    world.effects.update(dt);
    resolve_wrong_move(world, dt);
    resolve_falls(world, dt, &mut events);
    resolve_match_delay(world, dt, &mut events);
    resolve_idle_hint(world, dt, &mut events);
    resolve_high_score(world, &mut events);

    events
}

fn resolve_swap(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    if world.phase != Phase::Swapping {
        return;
    }
    let Pending::Swap(mut intent) = world.pending else {
        // Swapping without an intent cannot be resumed; fall back to Idle.
        world.phase = Phase::Idle;
        return;
    };

    intent.progress += dt / world.timing.swap_duration;
    if intent.progress < 1.0 {
        world.pending = Pending::Swap(intent);
        return;
    }

    world.pending = Pending::Nothing;
    world.board.swap(intent.from, intent.to);
    world.cascade_depth = 0;
    if !run_detection(world, events) {
        world.board.swap(intent.from, intent.to);
        world.wrong_move = Some(WrongMove {
            from: intent.from,
            to: intent.to,
            remaining: world.timing.wrong_move_duration,
        });
        world.phase = Phase::Idle;
        events.push(GameEvent::WrongMove { from: intent.from, to: intent.to });
    }
}

fn resolve_wrong_move(world: &mut WorldState, dt: f32) {
    if let Some(w) = world.wrong_move.as_mut() {
        w.remaining -= dt;
        if w.remaining <= 0.0 {
            world.wrong_move = None;
        }
    }
}

fn resolve_falls(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    if world.phase != Phase::Animating {
        return;
    }
    let still_moving = gravity::advance_falls(&mut world.falls, world.timing.fall_speed * dt);
    if !still_moving {
        world.phase = Phase::MatchDelay;
        world.match_delay_timer = world.timing.match_delay;
        events.push(GameEvent::TilesLanded);
    }
}

fn resolve_match_delay(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    if world.phase != Phase::MatchDelay {
        return;
    }
    world.match_delay_timer -= dt;
    if world.match_delay_timer > 0.0 {
        return;
    }
    if run_detection(world, events) {
        world.cascade_depth += 1;
        events.push(GameEvent::Cascade { depth: world.cascade_depth });
    } else {
        world.phase = Phase::Idle;
        world.cascade_depth = 0;
        events.push(GameEvent::Settled);
        debug!("settled:\n{}", world.board.to_rows().join("\n"));
        if !has_moves(&world.board) {
            info!("no moves left on the board");
        }
    }
}

fn resolve_idle_hint(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    if world.phase != Phase::Idle {
        world.idle_timer = 0.0;
        world.hint = None;
        return;
    }
    world.idle_timer += dt;
    if world.idle_timer >= world.timing.hint_idle && world.hint.is_none() {
        show_hint(world, events);
    }
}

fn resolve_high_score(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.score > world.high_score {
        world.high_score = world.score;
        events.push(GameEvent::NewHighScore { score: world.score });
    }
}

// ══════════════════════════════════════════════════════════════
// Shared pieces
// ══════════════════════════════════════════════════════════════

/// Detect on the current board. On a match: award every window, run
/// gravity, and enter `Animating`. Returns whether anything matched.
fn run_detection(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    let scan = find_matches(&world.board);
    world.matched = scan.mask;
    if !scan.found() {
        return false;
    }
    award(world, &scan, events);

    let res = gravity::resolve_matches(&mut world.board, &world.matched, &mut world.rng);
    debug!("resolved {} windows, {} new tiles", scan.windows.len(), res.spawned);
    world.falls = res.falls;
    world.phase = Phase::Animating;
    true
}

/// One bonus, popup, particle burst, and event per window.
fn award(world: &mut WorldState, scan: &MatchScan, events: &mut Vec<GameEvent>) {
    let points = world.match_bonus;
    for w in &scan.windows {
        world.score = world.score.saturating_add(points);
        world.effects.spawn_popup(w.origin, points, world.timing.popup_lifetime);
        world.effects.spawn_particles(w.origin, &mut world.rng);
        world.effects.kick_pulse();
        debug!("{:?} '{}' at {:?}", w.orientation, w.symbol.glyph(), w.origin);
        events.push(GameEvent::MatchFound {
            origin: w.origin,
            orientation: w.orientation,
            points,
        });
    }
    world.wrong_move = None;
}

fn show_hint(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    world.hint = find_hint(&world.board);
    if let Some(h) = world.hint {
        events.push(GameEvent::HintShown { from: h.from, to: h.to });
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;
    use crate::domain::board::{Board, BOARD_SIZE};
    use crate::domain::matcher::has_match;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// No matches and no single-swap matches.
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

    /// DEAD with row 0 changed so (2,0)<->(3,0) makes "###".
    const ONE_MOVE: [&str; 8] = [
        "##%#&@$%",
        "$%&#@$%&",
        "&#@$%&#@",
        "@$%&#@$%",
        "%&#@$%&#",
        "#@$%&#@$",
        "$%&#@$%&",
        "&#@$%&#@",
    ];

    const DT: f32 = 1.0 / 60.0;

    fn world_with(rows: &[&str]) -> WorldState {
        let board = Board::from_rows(rows).expect("valid test board");
        WorldState::with_board(board, TimingConfig::default(), 10, StdRng::seed_from_u64(11))
    }

    /// Tick until `pred` holds, failing after thirty simulated seconds.
    fn run_until(w: &mut WorldState, mut pred: impl FnMut(&WorldState) -> bool) -> Vec<GameEvent> {
        let mut all = Vec::new();
        for _ in 0..1800 {
            all.extend(step(w, DT));
            if pred(w) {
                return all;
            }
        }
        panic!("condition not reached; phase = {:?}", w.phase);
    }

    fn assert_pending_invariant(w: &WorldState) {
        match w.pending {
            Pending::Swap(_) => assert_eq!(w.phase, Phase::Swapping),
            _ => assert_ne!(w.phase, Phase::Swapping),
        }
    }

    // ── Selection ──

    #[test]
    fn first_click_selects_without_state_change() {
        let mut w = world_with(&DEAD);
        let ev = click(&mut w, Pos::new(3, 3));
        assert_eq!(ev, vec![GameEvent::TileSelected { pos: Pos::new(3, 3) }]);
        assert_eq!(w.selected(), Some(Pos::new(3, 3)));
        assert_eq!(w.phase, Phase::Idle);
    }

    #[test]
    fn non_adjacent_second_click_is_rejected() {
        let mut w = world_with(&ONE_MOVE);
        let before = w.board;
        click(&mut w, Pos::new(0, 0));
        let ev = click(&mut w, Pos::new(2, 2));
        assert_eq!(ev, vec![GameEvent::SelectionCleared]);
        assert_eq!(w.board, before);
        assert_eq!(w.phase, Phase::Idle);
        assert_eq!(w.pending, Pending::Nothing);
    }

    #[test]
    fn clicking_same_tile_twice_clears_selection() {
        let mut w = world_with(&DEAD);
        click(&mut w, Pos::new(1, 1));
        click(&mut w, Pos::new(1, 1));
        assert_eq!(w.pending, Pending::Nothing);
        assert_eq!(w.phase, Phase::Idle);
    }

    #[test]
    fn clicks_ignored_outside_idle() {
        let mut w = world_with(&ONE_MOVE);
        click(&mut w, Pos::new(2, 0));
        click(&mut w, Pos::new(3, 0));
        assert_eq!(w.phase, Phase::Swapping);
        assert!(click(&mut w, Pos::new(5, 5)).is_empty());
        assert!(matches!(w.pending, Pending::Swap(_)));
    }

    #[test]
    fn out_of_range_click_ignored() {
        let mut w = world_with(&DEAD);
        assert!(click(&mut w, Pos::new(BOARD_SIZE, 0)).is_empty());
        assert_eq!(w.pending, Pending::Nothing);
    }

    // ── Swap outcomes ──

    #[test]
    fn swap_without_match_reverts_and_flags_wrong_move() {
        let mut w = world_with(&DEAD);
        let before = w.board;
        click(&mut w, Pos::new(4, 4));
        click(&mut w, Pos::new(5, 4));
        assert_eq!(w.phase, Phase::Swapping);

        let events = run_until(&mut w, |w| w.phase == Phase::Idle);
        assert_eq!(w.board, before);
        assert_eq!(w.score, 0);
        assert!(events.contains(&GameEvent::WrongMove { from: Pos::new(4, 4), to: Pos::new(5, 4) }));
        assert!(w.is_wrong_cell(Pos::new(4, 4)) && w.is_wrong_cell(Pos::new(5, 4)));
        assert_eq!(w.pending, Pending::Nothing);

        // The indicator lasts a fixed duration, then clears.
        let frames = (w.timing.wrong_move_duration / DT).ceil() as usize + 1;
        for _ in 0..frames {
            step(&mut w, DT);
        }
        assert!(w.wrong_move.is_none());
    }

    #[test]
    fn swap_with_match_scores_and_animates() {
        let mut w = world_with(&ONE_MOVE);
        click(&mut w, Pos::new(2, 0));
        click(&mut w, Pos::new(3, 0));
        let events = run_until(&mut w, |w| w.phase != Phase::Swapping);
        assert_eq!(w.phase, Phase::Animating);
        assert!(w.score >= 10);
        assert!(events.iter().any(|e| matches!(e, GameEvent::MatchFound { origin, .. } if *origin == Pos::new(0, 0))));
        assert!(!w.falls.settled());
        assert!(w.matched[Pos::new(0, 0)] && w.matched[Pos::new(1, 0)] && w.matched[Pos::new(2, 0)]);
        assert!(!w.effects.popups.is_empty());
    }

    #[test]
    fn full_turn_returns_to_idle_with_settled_board() {
        let mut w = world_with(&ONE_MOVE);
        click(&mut w, Pos::new(2, 0));
        click(&mut w, Pos::new(3, 0));
        let events = run_until(&mut w, |w| {
            assert_pending_invariant(w);
            w.phase == Phase::Idle
        });
        assert!(events.contains(&GameEvent::TilesLanded));
        assert!(events.contains(&GameEvent::Settled));
        assert!(w.falls.settled());
        assert!(!has_match(&w.board));
        assert_eq!(w.cascade_depth, 0);
    }

    #[test]
    fn score_never_decreases_across_random_play() {
        let mut w = WorldState::with_board(
            Board::random(&mut StdRng::seed_from_u64(21)),
            TimingConfig::default(),
            10,
            StdRng::seed_from_u64(22),
        );
        begin(&mut w);
        skip_intro(&mut w);
        let mut last = w.score;
        for turn in 0..40 {
            if w.phase == Phase::Idle {
                let a = Pos::new(turn % BOARD_SIZE, (turn / 3) % BOARD_SIZE);
                let b = a.offset(1, 0).or_else(|| a.offset(-1, 0)).unwrap();
                click(&mut w, a);
                click(&mut w, b);
            }
            for _ in 0..30 {
                step(&mut w, DT);
                assert!(w.score >= last);
                assert_pending_invariant(&w);
                last = w.score;
            }
        }
    }

    // ── Falls and cascades ──

    #[test]
    fn animating_waits_for_every_offset() {
        let mut w = world_with(&DEAD);
        w.phase = Phase::Animating;
        w.falls[Pos::new(0, 0)] = 1.0;
        step(&mut w, DT);
        assert_eq!(w.phase, Phase::Animating);
        run_until(&mut w, |w| w.phase != Phase::Animating);
        assert_eq!(w.phase, Phase::MatchDelay);
        assert!(w.falls.settled());
    }

    #[test]
    fn match_delay_rechecks_and_chains_cascade() {
        let mut rows = DEAD;
        rows[7] = "@@@$%&#@";
        let mut w = world_with(&rows);
        w.phase = Phase::MatchDelay;
        w.match_delay_timer = 0.05;
        let ev = step(&mut w, 0.1);
        assert_eq!(w.phase, Phase::Animating);
        assert!(ev.contains(&GameEvent::Cascade { depth: 1 }));
        assert_eq!(w.score, 10);
    }

    #[test]
    fn match_delay_without_match_goes_idle() {
        let mut w = world_with(&DEAD);
        w.phase = Phase::MatchDelay;
        w.match_delay_timer = w.timing.match_delay;
        let ev = run_until(&mut w, |w| w.phase == Phase::Idle);
        assert!(ev.contains(&GameEvent::Settled));
    }

    // ── Intro ──

    #[test]
    fn begin_enters_intro_and_restores_post_phase() {
        let mut rows = DEAD;
        rows[3] = "%%%&#@$%";
        let mut w = world_with(&rows);
        let ev = begin(&mut w);
        assert_eq!(w.phase, Phase::Intro);
        assert_eq!(w.post_intro, Phase::Animating);
        assert!(ev.iter().any(|e| matches!(e, GameEvent::MatchFound { .. })));

        // Nothing advances during the intro.
        let falls = w.falls;
        step(&mut w, 1.0);
        assert_eq!(w.falls, falls);

        let dur = w.timing.intro_duration;
        let ev = step(&mut w, dur);
        assert!(ev.contains(&GameEvent::IntroFinished));
        assert_eq!(w.phase, Phase::Animating);
    }

    #[test]
    fn clean_board_begins_idle_after_intro() {
        let mut w = world_with(&DEAD);
        begin(&mut w);
        assert_eq!(w.post_intro, Phase::Idle);
        assert!(click(&mut w, Pos::new(0, 0)).is_empty());
        skip_intro(&mut w);
        assert_eq!(w.phase, Phase::Idle);
    }

    // ── Hints ──

    #[test]
    fn idle_timer_surfaces_hint_and_click_clears_it() {
        let mut w = world_with(&ONE_MOVE);
        w.timing.hint_idle = 0.5;
        let before = w.board;
        let ev = run_until(&mut w, |w| w.hint.is_some());
        assert!(ev.contains(&GameEvent::HintShown { from: Pos::new(2, 0), to: Pos::new(3, 0) }));
        assert_eq!(w.board, before);
        assert!(w.is_hint_cell(Pos::new(2, 0)));

        click(&mut w, Pos::new(7, 7));
        assert!(w.hint.is_none());
        assert_eq!(w.idle_timer, 0.0);
    }

    #[test]
    fn press_off_the_board_still_resets_idle_hint() {
        let mut w = world_with(&ONE_MOVE);
        w.timing.hint_idle = 0.5;
        run_until(&mut w, |w| w.hint.is_some());
        let board = w.board;

        pointer_pressed(&mut w);
        assert!(w.hint.is_none());
        assert_eq!(w.idle_timer, 0.0);
        assert_eq!(w.pending, Pending::Nothing);
        assert_eq!(w.board, board);

        // The countdown starts over rather than firing on the next frame.
        step(&mut w, DT);
        assert!(w.hint.is_none());
    }

    #[test]
    fn dead_board_never_shows_hint() {
        let mut w = world_with(&DEAD);
        assert!(request_hint(&mut w).is_empty());
        assert!(w.hint.is_none());
    }

    // ── High score ──

    #[test]
    fn high_score_follows_running_score() {
        let mut w = world_with(&DEAD);
        w.high_score = 5;
        w.score = 20;
        let ev = step(&mut w, DT);
        assert_eq!(w.high_score, 20);
        assert!(ev.contains(&GameEvent::NewHighScore { score: 20 }));
        assert!(!step(&mut w, DT).iter().any(|e| matches!(e, GameEvent::NewHighScore { .. })));
    }

    // ── Cursor ──

    #[test]
    fn cursor_clamps_to_board_and_clicks_there() {
        let mut w = world_with(&DEAD);
        w.cursor = Pos::new(0, 0);
        move_cursor(&mut w, -1, 0);
        assert_eq!(w.cursor, Pos::new(0, 0));
        move_cursor(&mut w, 1, 1);
        assert_eq!(w.cursor, Pos::new(1, 1));
        click_cursor(&mut w);
        assert_eq!(w.selected(), Some(Pos::new(1, 1)));
        cancel_selection(&mut w);
        assert_eq!(w.selected(), None);
    }

    #[test]
    fn music_toggles_back_and_forth() {
        let mut w = world_with(&DEAD);
        assert!(w.music_on);
        assert!(!toggle_music(&mut w));
        assert!(toggle_music(&mut w));
    }
}
