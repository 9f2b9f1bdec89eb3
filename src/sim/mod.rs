//! Gameplay-side spatial layer: entities placed in the region graph and
//! the queries gameplay logic asks about them.

mod components;
pub mod events;
mod queries;
mod service;
mod spacial;
mod zones;

pub use components::{Body, Position, Zone};
pub use events::{Activation, Delivery, EventKind, EventQueue, GameEvent, Subscription};
pub use queries::EntityHit;
pub use service::{SpatialError, SpatialWorld};
pub use spacial::ZoneIndex;
pub use zones::{ZoneChange, zone_change};
