//! Rendering abstraction layer.
//!
//! *The region graph never touches a pixel buffer directly.*
//! A type implementing [`Renderer`] walks the graph for a [`Camera`] and
//! paints into anything that implements [`RenderTarget`].
//!
//! * [`FrameBuffer`] is the plain in-memory target; windowing code copies
//!   its `pixels` to the screen.
//! * [`Software`] is the CPU column renderer.

use thiserror::Error;

use crate::{
    visibility::TraversalError,
    world::{Camera, RegionId, SceneGraph, TextureBank},
};

/// Pixel format of the software frame-buffer (0xAARRGGBB).
pub type Rgba = u32;

/// Anything the column renderer can paint into.
pub trait RenderTarget {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// Callers guarantee `x < width()` and `y < height()`.
    fn put_pixel(&mut self, x: usize, y: usize, colour: Rgba);
    fn fill(&mut self, colour: Rgba);
}

/// Row-major ARGB buffer.
#[derive(Clone, Debug, Default)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgba>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    /// (Re)allocate for a new resolution; contents are cleared.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, 0);
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        self.pixels[y * self.width + x]
    }
}

impl RenderTarget for FrameBuffer {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }
    #[inline]
    fn height(&self) -> usize {
        self.height
    }
    #[inline]
    fn put_pixel(&mut self, x: usize, y: usize, colour: Rgba) {
        self.pixels[y * self.width + x] = colour;
    }
    fn fill(&mut self, colour: Rgba) {
        self.pixels.fill(colour);
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error(transparent)]
    Traversal(#[from] TraversalError),

    #[error("camera stands in unknown region {0}")]
    UnknownRegion(RegionId),
}

/// A back-end that paints one full frame per call.
pub trait Renderer {
    fn render_scene<T: RenderTarget>(
        &mut self,
        target: &mut T,
        scene: &SceneGraph,
        camera: &Camera,
        bank: &TextureBank,
    ) -> Result<(), RenderError>;
}

pub mod software;

pub use software::Software;
