//! Game configuration.

use crate::bus::DEFAULT_MAILBOX_CAPACITY;
use crate::layout::Rect;
use std::time::Duration;

/// Where an orb floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrbPlacement {
    /// X position.
    pub x: i32,
    /// Height above the ground.
    pub y: i32,
    /// Depth.
    pub z: i32,
    /// Draw the selection ring.
    pub selected: bool,
}

/// Configuration for a [`Game`](super::Game).
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Screen-sized view rectangle, in world coordinates.
    pub view: Rect,
    /// The whole world.
    pub world: Rect,
    /// Interval of the global clock.
    pub clock_interval: Duration,
    /// Interval of each door's animation tick.
    pub door_tick: Duration,
    /// Capacity of every actor mailbox and control channel.
    pub mailbox_capacity: usize,
    /// Player start position.
    pub player_start: (f64, f64),
    /// Y at and below which a falling player lands.
    pub floor_y: i32,
    /// Door positions.
    pub doors: Vec<(i32, i32)>,
    /// Orbs.
    pub orbs: Vec<OrbPlacement>,
    /// Hex tiles across and down the backdrop.
    pub hex_grid: (i32, i32),
    /// HUD caption.
    pub title: String,
    /// Start at the menu. When unset the game runs immediately.
    pub show_menu: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            view: Rect::new(0, 0, 1024, 768),
            world: Rect::new(0, 0, 4096, 768),
            clock_interval: Duration::from_millis(10),
            door_tick: Duration::from_millis(100),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            player_start: (480.0, 600.0),
            floor_y: 600,
            doors: vec![(3800, 568)],
            orbs: vec![OrbPlacement {
                x: 150,
                y: 22,
                z: 100,
                selected: true,
            }],
            hex_grid: (8, 25),
            title: "Press E to Teleport".to_string(),
            show_menu: true,
        }
    }
}
