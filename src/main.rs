/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::KeyCode;
use log::{debug, info, warn};

use config::GameConfig;
use sim::event::GameEvent;
use sim::save::{FileStore, HighScoreStore};
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q')];
const KEYS_CANCEL: &[KeyCode] = &[KeyCode::Backspace, KeyCode::Char('x')];

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = GameConfig::load();
    let mut store = FileStore::new(&config.high_score_path);
    info!("high score file: {}", store.path().display());
    let mut world = WorldState::new(&config, store.load());
    let opening = step::begin(&mut world);
    log_events(&opening);

    let mut renderer = Renderer::new();
    renderer.init().context("initialising terminal")?;

    let sound = SoundEngine::new(world.music_on);

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &mut store, &config);
    let cleanup = renderer.cleanup();

    // Terminal is restored before anything is printed or returned.
    save_high_score(&mut store, world.high_score);
    result?;
    cleanup.context("restoring terminal")?;

    println!();
    println!("Final score: {}   Best: {}", world.score, world.high_score);
    Ok(())
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    store: &mut dyn HighScoreStore,
    config: &GameConfig,
) -> anyhow::Result<()> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new(&config.gamepad);
    let frame = Duration::from_millis(config.timing.frame_ms);
    let mut last = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) {
            info!("quit requested");
            break;
        }

        let mut events = handle_input(world, &kb, &gp, renderer, sound);

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32().min(config.max_frame_dt);
        last = now;
        events.extend(step::step(world, dt));

        dispatch_events(&events, sound, store);

        renderer.render(world).context("drawing frame")?;
        std::thread::sleep(frame);
    }

    Ok(())
}

/// Apply this frame's keyboard, mouse, and gamepad input to the world.
fn handle_input(
    world: &mut WorldState,
    kb: &InputState,
    gp: &GamepadState,
    renderer: &Renderer,
    sound: Option<&SoundEngine>,
) -> Vec<GameEvent> {
    let mut events = Vec::new();

    if kb.was_pressed(KeyCode::Char('m')) || gp.music_pressed() {
        let on = step::toggle_music(world);
        info!("music {}", if on { "on" } else { "off" });
        if let Some(sfx) = sound {
            sfx.set_music(on);
        }
    }

    if world.phase == Phase::Intro {
        let skip = kb.any_pressed(KEYS_CONFIRM)
            || !kb.clicks.is_empty()
            || gp.select_pressed()
            || gp.cancel_pressed();
        if skip {
            events.extend(step::skip_intro(world));
        }
        return events;
    }

    if let Some((dx, dy)) = kb.cursor_step().or_else(|| gp.cursor_step()) {
        step::move_cursor(world, dx, dy);
    }

    for &(col, row) in &kb.clicks {
        step::pointer_pressed(world);
        if let Some(pos) = renderer.cell_at(col, row) {
            events.extend(step::click(world, pos));
        }
    }
    if kb.any_pressed(KEYS_CONFIRM) || gp.select_pressed() {
        events.extend(step::click_cursor(world));
    }
    if kb.any_pressed(KEYS_CANCEL) || gp.cancel_pressed() {
        events.extend(step::cancel_selection(world));
    }
    if kb.was_pressed(KeyCode::Char('h')) || gp.hint_pressed() {
        events.extend(step::request_hint(world));
    }

    events
}

/// Route events to sound and persistence.
fn dispatch_events(events: &[GameEvent], sound: Option<&SoundEngine>, store: &mut dyn HighScoreStore) {
    log_events(events);

    // One chime per frame, however many windows matched.
    let mut chimed = false;
    for event in events {
        if let GameEvent::NewHighScore { score } = event {
            save_high_score(store, *score);
        }
        let Some(sfx) = sound else { continue };
        match event {
            GameEvent::TileSelected { .. } => sfx.play_select(),
            GameEvent::SwapStarted { .. } => sfx.play_swap(),
            GameEvent::MatchFound { .. } if !chimed => {
                sfx.play_match();
                chimed = true;
            }
            GameEvent::Cascade { depth } => {
                sfx.play_cascade(*depth);
                chimed = true;
            }
            GameEvent::WrongMove { .. } => sfx.play_wrong(),
            GameEvent::TilesLanded => sfx.play_land(),
            GameEvent::NewHighScore { .. } => sfx.play_high_score(),
            _ => {}
        }
    }
}

fn save_high_score(store: &mut dyn HighScoreStore, score: u32) {
    if let Err(e) = store.save(score) {
        warn!("high score not saved: {e:#}");
    }
}

fn log_events(events: &[GameEvent]) {
    for event in events {
        debug!("{:?}", event);
    }
}
