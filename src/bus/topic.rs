//! Well-known topic names.

/// Periodic clock ticks. Payload: [`Payload::Tick`](super::Payload::Tick).
pub const CLOCK: &str = "clock";

/// Input events forwarded by the game. Payload: [`Payload::Input`](super::Payload::Input).
pub const INPUT: &str = "input.event";

/// Player position after each physics update. Payload: [`Payload::Position`](super::Payload::Position).
pub const PLAYER_LOCATION: &str = "player.location";

/// Shutdown broadcast. Payload: `Control("quit")`.
pub const QUIT: &str = "quit";

/// Menu button actions. Payload: [`Payload::Text`](super::Payload::Text).
pub const MENU_ACTION: &str = "menu.action";
