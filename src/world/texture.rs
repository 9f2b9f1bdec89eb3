// Format-agnostic repository of textures handed over by the asset loader.
// The renderer and the region graph interact through `TextureId` only.

use std::collections::HashMap;

use crate::renderer::Rgba;

/// Runtime handle for a texture in this bank.
///
/// *Guaranteed* to remain stable for the lifetime of the bank.
pub type TextureId = u16;

/// `TextureId` whose pixels are the checkerboard fallback.
/// Always = 0 because `TextureBank::new()` inserts it first.
pub const NO_TEXTURE: TextureId = 0;

/// CPU-side storage: 32-bit **ARGB** (0xAARRGGBB) in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub name: String,
    pub w: usize,
    pub h: usize,
    pub pixels: Vec<Rgba>,
}

/// Convenience checkerboard 8×8 (dark/light grey).
impl Default for Texture {
    fn default() -> Self {
        Texture::checker("CHECKER", 8, 0xFF_A0_A0_A0, 0xFF_40_40_40)
    }
}

impl Texture {
    /// Square `size`×`size` checkerboard of single-pixel cells.
    pub fn checker(name: &str, size: usize, light: Rgba, dark: Rgba) -> Self {
        let mut pixels = vec![0; size * size];
        for y in 0..size {
            for x in 0..size {
                pixels[y * size + x] = if (x ^ y) & 1 == 0 { light } else { dark };
            }
        }
        Texture {
            name: name.to_string(),
            w: size,
            h: size,
            pixels,
        }
    }

    /// Single-colour texture, handy for tests and debug views.
    pub fn solid(name: &str, w: usize, h: usize, colour: Rgba) -> Self {
        Texture {
            name: name.to_string(),
            w,
            h,
            pixels: vec![colour; w * h],
        }
    }

    /// Texel at integer coordinates, wrapped into range.
    #[inline]
    pub fn texel(&self, u: i64, v: i64) -> Rgba {
        let u = u.rem_euclid(self.w as i64) as usize;
        let v = v.rem_euclid(self.h as i64) as usize;
        self.pixels[v * self.w + u]
    }
}

/// Things that can go wrong when using the bank.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextureError {
    /// Attempted to insert a second texture with an existing name.
    #[error("texture name `{0}` already present in bank")]
    Duplicate(String),

    /// Requested ID is outside `0 .. bank.len()`.
    #[error("texture id {0} out of range")]
    BadId(TextureId),

    /// Pixel buffer does not match the declared size.
    #[error("texture `{name}` has {got} pixels, expected {w}×{h}")]
    BadSize {
        name: String,
        w: usize,
        h: usize,
        got: usize,
    },
}

/// A format-agnostic cache of textures.
///
/// * Does **not** know about PNG or any file format; that is left to the caller.
/// * Stores exactly one copy of every name.
/// * ID **0** is always the “missing” checkerboard.
pub struct TextureBank {
    by_name: HashMap<String, TextureId>,
    data: Vec<Texture>,
}

impl TextureBank {
    // ---------------------------------------------------------------------
    // Constructors
    // ---------------------------------------------------------------------

    /// Create an empty bank with a mandatory *missing* texture used as
    /// fallback.  The texture is inserted under the fixed name `"MISSING"`
    /// and obtains the handle **0**.
    ///
    /// The fallback is sampled whenever an id is unknown, so it is held to
    /// the same size rules as [`TextureBank::insert`].
    pub fn new(missing_tex: Texture) -> Result<Self, TextureError> {
        check_size("MISSING", &missing_tex)?;
        Ok(Self::with_fallback(missing_tex))
    }

    pub fn default_with_checker() -> Self {
        Self::with_fallback(Texture::default())
    }

    fn with_fallback(missing_tex: Texture) -> Self {
        let mut by_name = HashMap::new();
        by_name.insert("MISSING".into(), NO_TEXTURE);
        Self {
            by_name,
            data: vec![missing_tex],
        }
    }

    // ---------------------------------------------------------------------
    // Query helpers
    // ---------------------------------------------------------------------

    /// Number of textures stored (including the “missing” one).
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.len() == 1
    } // only checker

    /// Obtain the id for a *loaded* texture by name.
    /// Returns `None` if the name is unknown.
    pub fn id(&self, name: &str) -> Option<TextureId> {
        self.by_name.get(name).copied()
    }

    /// Borrow a texture by id, with bounds-checking.
    pub fn texture(&self, id: TextureId) -> Result<&Texture, TextureError> {
        self.data.get(id as usize).ok_or(TextureError::BadId(id))
    }

    /// Borrow a texture, falling back to the checkerboard for bad ids.
    #[inline]
    pub fn texture_or_missing(&self, id: TextureId) -> &Texture {
        self.data.get(id as usize).unwrap_or(&self.data[NO_TEXTURE as usize])
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Insert a texture under `name`.
    ///
    /// * Returns the newly assigned `TextureId`.
    /// * Fails if the name already exists (`Duplicate`) or the pixel
    ///   buffer does not match `w`×`h` (`BadSize`).
    pub fn insert<S: Into<String>>(
        &mut self,
        name: S,
        tex: Texture,
    ) -> Result<TextureId, TextureError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(TextureError::Duplicate(name));
        }
        check_size(&name, &tex)?;
        let id = self.data.len() as TextureId;
        self.data.push(tex);
        self.by_name.insert(name, id);
        Ok(id)
    }
}

/// Non-empty, and the pixel buffer is exactly `w`×`h`.
fn check_size(name: &str, tex: &Texture) -> Result<(), TextureError> {
    if tex.w == 0 || tex.h == 0 || tex.pixels.len() != tex.w * tex.h {
        return Err(TextureError::BadSize {
            name: name.to_string(),
            w: tex.w,
            h: tex.h,
            got: tex.pixels.len(),
        });
    }
    Ok(())
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
