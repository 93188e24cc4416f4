//! Terminal demo: runs the game in a terminal.
//!
//! Click "Start", then walk with the arrow keys and jump with space.
//! Press `q` or Ctrl-C to quit. Logs go to stderr; redirect it to keep the
//! screen clean:
//!
//! ```text
//! RUST_LOG=teleport=debug cargo run --example terminal 2>teleport.log
//! ```

use std::io;
use std::thread;
use std::time::{Duration, Instant};
use teleport::{
    CrosstermSource, EventSource, Game, GameConfig, SessionConfig, TerminalConfig,
    TerminalRenderer, TerminalSession,
};
use tracing_subscriber::EnvFilter;

const FRAME_BUDGET: Duration = Duration::from_millis(16);
const CELL_SIZE: (i32, i32) = (8, 16);
/// Longer than the usual auto-repeat delay, so a held key stays down.
const KEY_HOLD: Duration = Duration::from_millis(550);

fn main() -> teleport::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let session = TerminalSession::start(SessionConfig::default())?;
    let (cols, rows) = session.size();

    let config = TerminalConfig {
        cell_width: CELL_SIZE.0,
        cell_height: CELL_SIZE.1,
        ..TerminalConfig::default()
    }
    .with_image("assets/hex.png", '.', 192, 128)
    .with_image("assets/spacepsn.png", '@', 128, 32)
    .with_image("assets/door.png", '#', 256, 64)
    .with_image("assets/orb.png", 'o', 32, 32)
    .with_image("assets/orb_shadow.png", '_', 32, 16)
    .with_image("assets/selection.png", '~', 20, 12)
    .with_image("assets/button.png", '=', 256, 128)
    .with_image("assets/cursor.png", '+', 32, 16);
    let mut renderer = TerminalRenderer::new(io::stdout(), cols, rows, config);
    let mut events = CrosstermSource::new(CELL_SIZE.0, CELL_SIZE.1, Some(KEY_HOLD));

    let mut game = Game::new(&GameConfig::default(), &mut renderer)?;
    let result = run(&mut game, &mut renderer, &mut events);
    game.destroy();
    drop(session);
    result
}

fn run(
    game: &mut Game,
    renderer: &mut TerminalRenderer<io::Stdout>,
    events: &mut CrosstermSource,
) -> teleport::Result<()> {
    loop {
        let frame_start = Instant::now();
        while let Some(event) = events.next_event(Duration::ZERO)? {
            game.handle_event(event);
        }
        if game.quitting() {
            return Ok(());
        }
        game.draw(renderer)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_BUDGET {
            thread::sleep(FRAME_BUDGET - elapsed);
        }
    }
}
