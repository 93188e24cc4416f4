//! Game: the top-level owner of the bus, the clock and the scene.
//!
//! [`Game`] wires every actor to one [`Bus`], owns the scene trees and runs
//! one compositor pass per [`draw`](Game::draw). All of its methods are
//! meant to be called from the render thread.
//!
//! # Shutdown
//!
//! [`destroy`](Game::destroy) stops the clock first, broadcasts `quit`,
//! then destroys each scene tree, which sends direct quit commands and
//! joins every actor thread. Teardown is complete when it returns.

mod config;
mod menu;

pub use config::{GameConfig, OrbPlacement};
pub use menu::Menu;

use crate::actor::{
    Clock, Control, Cursor, Director, DirectorLogic, Door, GameState, Orb, Player,
};
use crate::bus::{topic, Bus, Payload};
use crate::error::Result;
use crate::input::{InputEvent, KeyCode};
use crate::layout::{Rect, WorldView};
use crate::render::{Colour, OffsetGuard, Renderer};
use crate::scene::{Group, Label, Node, TemplateLibrary};
use crossbeam_channel::Sender;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Screen position of the HUD caption.
const HUD_ORIGIN: (i32, i32) = (16, 16);

/// The running game.
#[derive(Debug)]
pub struct Game {
    bus: Bus,
    clock: Clock,
    director: Director,
    player: Sender<Control>,
    world: Group,
    hud: Group,
    menu: Menu,
    cursor: Cursor,
    destroyed: bool,
}

impl Game {
    /// Load every entity and start all actors.
    ///
    /// Fails if any texture can not be loaded; actors already started are
    /// signalled to stop.
    pub fn new(config: &GameConfig, renderer: &mut dyn Renderer) -> Result<Self> {
        let bus = Bus::new();
        let templates = TemplateLibrary::default();
        let capacity = config.mailbox_capacity;

        let mut world = Group::new();
        Self::add_hex_field(&mut world, &templates, config.hex_grid)?;
        for placement in &config.orbs {
            let mut orb = Orb::new(&bus, &templates, (placement.x, placement.y, placement.z))?;
            orb.selected = placement.selected;
            world.add_child(orb);
        }
        for &position in &config.doors {
            let door = Door::new(renderer, &bus, &templates, position, config.door_tick, capacity)?;
            world.add_child(door);
        }
        let player = Player::new(renderer, &bus, &templates, config.player_start, capacity)?;
        let player_control = player.controller();
        world.add_child(player);

        let state = if config.show_menu {
            GameState::Menu
        } else {
            GameState::Running
        };
        let menu_visible = Arc::new(AtomicBool::new(config.show_menu));
        let logic = DirectorLogic::new(WorldView::new(config.view, config.world), config.floor_y, state);
        let director = Director::new(
            &bus,
            logic,
            player_control.clone(),
            Arc::clone(&menu_visible),
            capacity,
        )?;

        let menu = Menu::new(renderer, &bus, &templates, config.view, menu_visible)?;
        let cursor = Cursor::new(&bus, &templates)?;

        let mut hud = Group::new();
        let mut caption = Label::new(renderer, &config.title, Colour::WHITE)?;
        (caption.x, caption.y) = HUD_ORIGIN;
        hud.add_child(caption);

        let clock = {
            let director = director.snapshot();
            Clock::spawn(bus.clone(), config.clock_interval, move || {
                director.load().state == GameState::Running
            })?
        };

        info!(?state, "game started");
        Ok(Self {
            bus,
            clock,
            director,
            player: player_control,
            world,
            hud,
            menu,
            cursor,
            destroyed: false,
        })
    }

    /// Backdrop of hexagonal tiles, offset on alternate rows.
    fn add_hex_field(world: &mut Group, templates: &TemplateLibrary, grid: (i32, i32)) -> Result<()> {
        let (across, down) = grid;
        for i in 0..down {
            for j in 0..across {
                let wobble = -((i * 7 + j * 3) % 5) * 2;
                let hex = templates
                    .sprite("hex")?
                    .at(192 * j + 96 * (i % 2) - 32, wobble, 32 * (i - 1));
                world.add_child(hex);
            }
        }
        Ok(())
    }

    /// Forward an input event to `input.event`.
    ///
    /// While the game is running, keys also drive the player: arrows walk,
    /// up or space jumps, `e` teleports.
    pub fn handle_event(&self, event: InputEvent) {
        self.bus.publish(topic::INPUT, Payload::Input(event));
        if self.state() != GameState::Running {
            return;
        }
        if let Some(control) = player_control(event) {
            if self.player.send(control).is_err() {
                debug!(?control, "player has gone");
            }
        }
    }

    /// Run one compositor pass and present it.
    ///
    /// World content is drawn under the camera offset; HUD, menu and cursor
    /// are drawn in screen coordinates. A failed frame is logged and
    /// returned to the caller.
    pub fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        let result = self.draw_frame(renderer);
        if let Err(err) = &result {
            error!(%err, "frame failed");
        }
        result
    }

    fn draw_frame(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        // Offsets left behind by a failed frame must not shift this one.
        renderer.reset_offset();
        renderer.clear()?;
        let view = self.view();
        {
            let mut r = OffsetGuard::push(renderer, -view.x, -view.y);
            self.world.draw(&mut *r)?;
        }
        self.hud.draw(renderer)?;
        self.menu.draw(renderer)?;
        self.cursor.draw(renderer)?;
        renderer.present()
    }

    /// Run a console command and return its output.
    pub fn exec(&self, command: &str) -> String {
        let argv: Vec<&str> = command.split(' ').collect();
        match argv[0] {
            "quit" => {
                self.bus.publish(topic::MENU_ACTION, Payload::Text("quit".to_string()));
                String::new()
            }
            "help" if argv.len() == 1 => "help: Usage: help <command>".to_string(),
            "help" => "help: Not yet implemented".to_string(),
            "" => String::new(),
            _ => "Bad command or file name".to_string(),
        }
    }

    /// Whether the game has entered its terminal state.
    pub fn quitting(&self) -> bool {
        self.state() == GameState::Quitting
    }

    /// Current game state.
    pub fn state(&self) -> GameState {
        self.director.state()
    }

    /// Current camera rectangle.
    pub fn view(&self) -> Rect {
        self.director.view().view
    }

    /// The bus every actor is wired to.
    pub const fn bus(&self) -> &Bus {
        &self.bus
    }

    /// World-space scene tree.
    pub const fn world(&self) -> &Group {
        &self.world
    }

    /// Screen-space HUD tree.
    pub const fn hud(&self) -> &Group {
        &self.hud
    }

    /// The start menu.
    pub const fn menu(&self) -> &Menu {
        &self.menu
    }

    /// Stop the clock, shut every actor down and release the scene.
    ///
    /// Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        self.clock.join();
        self.bus.publish(topic::QUIT, Payload::quit());
        self.world.destroy();
        self.hud.destroy();
        self.menu.destroy();
        self.cursor.destroy();
        self.director.shutdown();
        info!("game destroyed");
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Map a key event to a player command.
fn player_control(event: InputEvent) -> Option<Control> {
    use KeyCode::{Char, Left, Right, Up};

    Some(match event {
        InputEvent::KeyDown(Left) => Control::StartWalkLeft,
        InputEvent::KeyUp(Left) => Control::StopWalkLeft,
        InputEvent::KeyDown(Right) => Control::StartWalkRight,
        InputEvent::KeyUp(Right) => Control::StopWalkRight,
        InputEvent::KeyDown(Up | Char(' ')) => Control::StartJump,
        InputEvent::KeyUp(Up | Char(' ')) => Control::StopJump,
        InputEvent::KeyUp(Char('e')) => Control::Teleport,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::testing::wait_until;
    use crate::bus::Mailbox;
    use crate::input::MouseButton;
    use crate::render::{DrawCall, RecordingRenderer};
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(2);

    fn small_config() -> GameConfig {
        GameConfig {
            hex_grid: (2, 2),
            ..GameConfig::default()
        }
    }

    fn click(game: &Game, x: i32, y: i32) {
        game.handle_event(InputEvent::MouseDown { x, y, button: MouseButton::Left });
        game.handle_event(InputEvent::MouseUp { x, y, button: MouseButton::Left });
    }

    #[test]
    fn test_starts_at_menu_and_draws_in_layers() {
        let mut r = RecordingRenderer::new();
        let mut game = Game::new(&small_config(), &mut r).unwrap();
        assert_eq!(game.state(), GameState::Menu);
        assert!(game.menu().is_visible());
        assert_eq!(game.world().len(), 4 + 1 + 1 + 1);

        r.clear_calls();
        game.draw(&mut r).unwrap();
        let calls = r.calls();
        assert_eq!(calls.first(), Some(&DrawCall::Clear));
        assert_eq!(calls.last(), Some(&DrawCall::Present));
        assert_eq!(r.copies_of("assets/button.png").count(), 2);
        let (last, _, _) = r.copies().last().unwrap();
        assert_eq!(r.texture_name(last), Some("assets/cursor.png"));
        assert_eq!(r.offset_depth(), 0);

        game.destroy();
    }

    #[test]
    fn test_start_button_runs_game_and_hides_menu() {
        let mut r = RecordingRenderer::new();
        let mut game = Game::new(&small_config(), &mut r).unwrap();
        click(&game, 512, 344);
        assert!(wait_until(WAIT, || game.state() == GameState::Running));
        assert!(!game.menu().is_visible());

        r.clear_calls();
        game.draw(&mut r).unwrap();
        assert_eq!(r.copies_of("assets/button.png").count(), 0);
        game.destroy();
    }

    #[test]
    fn test_camera_follows_player() {
        let config = GameConfig {
            show_menu: false,
            player_start: (2000.0, 600.0),
            ..small_config()
        };
        let mut r = RecordingRenderer::new();
        let mut game = Game::new(&config, &mut r).unwrap();
        assert!(wait_until(WAIT, || game.view().x == 2000 - 768));

        r.clear_calls();
        game.draw(&mut r).unwrap();
        let (_, dst, _) = r.copies_of("assets/spacepsn.png").next().unwrap();
        assert_eq!(dst, Rect::new(768, 600, 32, 32));
        game.destroy();
    }

    #[test]
    fn test_keys_walk_the_player_while_running() {
        let config = GameConfig {
            show_menu: false,
            ..small_config()
        };
        let mut r = RecordingRenderer::new();
        let mut game = Game::new(&config, &mut r).unwrap();
        let watcher = Mailbox::new(64);
        game.bus().subscribe(topic::PLAYER_LOCATION, &watcher);

        game.handle_event(InputEvent::KeyDown(KeyCode::Right));
        let moved = wait_until(WAIT, || {
            while let Some(message) = watcher.try_recv() {
                if let Payload::Position { x, .. } = message.payload {
                    if x > 480 {
                        return true;
                    }
                }
            }
            false
        });
        assert!(moved);

        drop(watcher);
        game.destroy();
    }

    #[test]
    fn test_quit_paths() {
        let mut r = RecordingRenderer::new();
        let mut game = Game::new(&small_config(), &mut r).unwrap();
        game.handle_event(InputEvent::Quit);
        assert!(wait_until(WAIT, || game.quitting()));
        game.destroy();

        let mut game = Game::new(&small_config(), &mut r).unwrap();
        assert_eq!(game.exec("quit"), "");
        assert!(wait_until(WAIT, || game.quitting()));
        game.destroy();
    }

    #[test]
    fn test_console_commands() {
        let mut r = RecordingRenderer::new();
        let mut game = Game::new(&small_config(), &mut r).unwrap();
        assert_eq!(game.exec("help"), "help: Usage: help <command>");
        assert_eq!(game.exec("help quit"), "help: Not yet implemented");
        assert_eq!(game.exec(""), "");
        assert_eq!(game.exec("teleport"), "Bad command or file name");
        assert!(!game.quitting());
        game.destroy();
    }

    #[test]
    fn test_destroy_releases_every_subscription() {
        let mut r = RecordingRenderer::new();
        let mut game = Game::new(&small_config(), &mut r).unwrap();
        game.draw(&mut r).unwrap();
        let bus = game.bus().clone();
        game.destroy();
        game.destroy();
        for t in [topic::CLOCK, topic::INPUT, topic::PLAYER_LOCATION, topic::QUIT, topic::MENU_ACTION] {
            assert_eq!(bus.subscriber_count(t), 0, "{t}");
        }
    }

    #[test]
    fn test_missing_texture_fails_construction() {
        let mut r = RecordingRenderer::new();
        r.fail_on("assets/door.png");
        assert!(Game::new(&small_config(), &mut r).is_err());
    }

    #[test]
    fn test_frame_starts_from_zero_offset() {
        let config = small_config();
        let mut r = RecordingRenderer::new();
        let mut game = Game::new(&config, &mut r).unwrap();
        r.push_offset(500, 500);
        game.draw(&mut r).unwrap();
        assert_eq!(r.offset_depth(), 0);
        let (_, dst, _) = r.copies_of(&config.title).next().unwrap();
        assert_eq!((dst.x, dst.y), HUD_ORIGIN);
        game.destroy();
    }

    #[test]
    fn test_failed_frame_is_returned() {
        let mut r = RecordingRenderer::new();
        let mut game = Game::new(&small_config(), &mut r).unwrap();
        r.set_fail_copies(true);
        assert!(game.draw(&mut r).is_err());
        game.destroy();
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(player_control(InputEvent::KeyDown(KeyCode::Left)), Some(Control::StartWalkLeft));
        assert_eq!(player_control(InputEvent::KeyUp(KeyCode::Char(' '))), Some(Control::StopJump));
        assert_eq!(player_control(InputEvent::KeyUp(KeyCode::Char('e'))), Some(Control::Teleport));
        assert_eq!(player_control(InputEvent::KeyDown(KeyCode::Char('e'))), None);
        assert_eq!(player_control(InputEvent::Quit), None);
    }
}
