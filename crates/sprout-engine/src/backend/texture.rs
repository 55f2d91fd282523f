use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::RenderError;
use crate::geometry::{pixel_to_texel, Quad};

/// A loaded texture and its size in texture pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture<H> {
    pub handle: H,
    pub width: u32,
    pub height: u32,
}

impl<H> Texture<H> {
    /// Normalizes texture-pixel coordinates against this texture's size.
    #[inline]
    pub fn pixel_to_texel(&self, quad: Quad) -> Quad {
        pixel_to_texel(quad, self.width, self.height)
    }
}

/// Path-keyed texture cache.
///
/// Loading the same path twice returns the first handle without decoding again.
#[derive(Debug)]
pub struct TextureCache<H> {
    entries: HashMap<PathBuf, Texture<H>>,
}

impl<H: Clone> TextureCache<H> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns the cached texture for `path`, loading it with `load` on a miss.
    pub fn get_or_load<F>(&mut self, path: &Path, load: F) -> Result<Texture<H>, RenderError>
    where
        F: FnOnce(&Path) -> Result<Texture<H>, RenderError>,
    {
        if let Some(texture) = self.entries.get(path) {
            log::trace!("texture cache hit: {}", path.display());
            return Ok(texture.clone());
        }

        let texture = load(path)?;
        log::debug!(
            "loaded texture {} ({}x{})",
            path.display(),
            texture.width,
            texture.height
        );
        self.entries.insert(path.to_path_buf(), texture.clone());
        Ok(texture)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every cached handle.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<H: Clone> Default for TextureCache<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake(width: u32, height: u32) -> impl FnOnce(&Path) -> Result<Texture<u32>, RenderError> {
        move |_| Ok(Texture { handle: width * 1000 + height, width, height })
    }

    #[test]
    fn second_load_is_a_cache_hit() {
        let mut cache = TextureCache::new();
        let a = cache.get_or_load(Path::new("sprites/a.png"), fake(16, 16)).unwrap();
        let b = cache
            .get_or_load(Path::new("sprites/a.png"), |_| panic!("decoded twice"))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_paths_load_separately() {
        let mut cache = TextureCache::new();
        cache.get_or_load(Path::new("a.png"), fake(16, 16)).unwrap();
        cache.get_or_load(Path::new("b.png"), fake(32, 8)).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_load_is_not_cached() {
        let mut cache: TextureCache<u32> = TextureCache::new();
        let err = cache.get_or_load(Path::new("missing.png"), |p| {
            Err(RenderError::Texture { path: p.to_path_buf(), message: "not found".into() })
        });
        assert!(err.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn texel_conversion_uses_texture_size() {
        let tex = Texture { handle: 0u32, width: 16, height: 16 };
        let quad = tex.pixel_to_texel([[16.0, 16.0]; 6]);
        assert!(quad.iter().all(|p| *p == [1.0, 1.0]));
    }
}
