mod builder;
mod camera;
mod geometry;
mod helpers;
mod texture;

pub use geometry::{Edge, EdgeId, EdgeKind, Region, RegionId, SceneGraph};

pub use builder::{SceneBuilder, SceneError};

pub use camera::Camera;

pub use texture::{NO_TEXTURE, Texture, TextureBank, TextureError, TextureId};
