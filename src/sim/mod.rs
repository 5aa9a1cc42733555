//! Frame simulation module
//!
//! All gameplay logic lives here. This module must stay free of platform code:
//! - Frame delta scaled rates, one `tick` per rendered frame
//! - Seeded RNG only (carried in `GameState`)
//! - Effects and sounds leave as `GameEvent`s
//! - No rendering or platform dependencies

pub mod body;
pub mod boss;
pub mod camera;
pub mod collision;
pub mod effects;
pub mod grid;
pub mod ids;
pub mod interaction;
pub mod message;
pub mod minigame;
pub mod probe;
pub mod projectile;
pub mod queue;
pub mod state;
pub mod tick;
pub mod timeline;
pub mod view;

pub use body::{Facing, PhysicsBody, Pose};
pub use collision::{Collisions, Rect};
pub use grid::{Tile, TileGrid, TileKind};
pub use interaction::{InteractionRegistry, NpcBlueprint, NpcKind, PuzzleBlueprint, TextKey};
pub use probe::{Probe, ProbeToggle};
pub use projectile::ProjectileSet;
pub use queue::{FirewallRule, Packet, PacketQueue, RuleStack};
pub use state::{GameEvent, GameState, LevelState, SessionStats};
pub use tick::{Reload, TickInput, TickOutcome, tick};
pub use timeline::{Action, Gate, Rule, Script, SpawnPattern, Timeline};
pub use view::FrameView;
