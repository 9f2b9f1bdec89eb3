//! Portal-based 2.5D raycaster.
//!
//! * [`world`] holds the region graph, camera and texture bank.
//! * [`visibility`] walks the graph along a ray and reports every edge it
//!   crosses.
//! * [`renderer`] turns those crossings into wall/floor/ceiling columns.
//! * [`sim`] answers gameplay questions (what is along this ray, what is
//!   near this point, which zones did I just enter) on the same graph.

pub mod config;
pub mod geom;
pub mod renderer;
pub mod sim;
pub mod visibility;
pub mod world;

pub use config::RenderConfig;
