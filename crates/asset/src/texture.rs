//! Texture loading and data structures.
//! RGBA8 images for material maps plus 1x1 fallbacks.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::mtl::{MaterialLibrary, Shading};

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

impl TextureData {
    /// Create a new texture with given dimensions and RGBA8 format.
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            (width * height * 4) as usize,
            "Data size doesn't match RGBA8 format"
        );
        Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        }
    }

    /// Single-pixel texture.
    pub fn solid_rgba8(pixel: [u8; 4]) -> Self {
        Self::new_rgba8(1, 1, pixel.to_vec())
    }

    /// Load texture from an image file (PNG or JPEG).
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        log::info!("Loading texture from {:?}", path);

        let img = image::open(path).with_context(|| format!("Failed to open image {:?}", path))?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let data = rgba.into_raw();

        log::info!("Loaded texture {}x{} with {} bytes", width, height, data.len());

        Ok(Self::new_rgba8(width, height, data))
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgba8 => 4,
        }
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        let expected_size = (self.width * self.height * self.bytes_per_pixel()) as usize;
        self.data.len() == expected_size && self.width > 0 && self.height > 0
    }

    /// Both sides are powers of two (mipmaps allowed).
    pub fn is_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }
}

pub const DEFAULT_WHITE: [u8; 4] = [255, 255, 255, 255];
/// Flat tangent-space normal.
pub const DEFAULT_NORMAL: [u8; 4] = [127, 127, 255, 0];
/// Stands in for a map that failed to load.
pub const PLACEHOLDER: [u8; 4] = [128, 192, 255, 255];

/// Material map textures keyed by the filename used in the MTL file.
#[derive(Clone, Debug)]
pub struct TextureCache {
    default_white: TextureData,
    default_normal: TextureData,
    textures: HashMap<String, TextureData>,
}

impl Default for TextureCache {
    fn default() -> Self {
        Self {
            default_white: TextureData::solid_rgba8(DEFAULT_WHITE),
            default_normal: TextureData::solid_rgba8(DEFAULT_NORMAL),
            textures: HashMap::new(),
        }
    }
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every distinct map of `library`, resolved against `base_dir`.
    /// Files that fail to load are replaced by the placeholder texture.
    pub fn load_library(&mut self, library: &MaterialLibrary, base_dir: &Path) {
        for name in library.texture_files() {
            if self.textures.contains_key(name) {
                continue;
            }
            let path = resolve_relative(base_dir, name);
            let texture = match TextureData::load(&path) {
                Ok(texture) => texture,
                Err(err) => {
                    log::warn!("Texture '{}' unavailable ({:#}), using placeholder", name, err);
                    TextureData::solid_rgba8(PLACEHOLDER)
                }
            };
            self.textures.insert(name.to_string(), texture);
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, texture: TextureData) {
        self.textures.insert(name.into(), texture);
    }

    pub fn get(&self, name: &str) -> Option<&TextureData> {
        self.textures.get(name)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn default_white(&self) -> &TextureData {
        &self.default_white
    }

    pub fn default_normal(&self) -> &TextureData {
        &self.default_normal
    }

    pub fn diffuse_for(&self, shading: &Shading) -> &TextureData {
        self.lookup(shading.diffuse_map.as_deref(), &self.default_white)
    }

    pub fn specular_for(&self, shading: &Shading) -> &TextureData {
        self.lookup(shading.specular_map.as_deref(), &self.default_white)
    }

    pub fn normal_for(&self, shading: &Shading) -> &TextureData {
        self.lookup(shading.normal_map.as_deref(), &self.default_normal)
    }

    fn lookup<'a>(&'a self, name: Option<&str>, fallback: &'a TextureData) -> &'a TextureData {
        name.and_then(|n| self.textures.get(n)).unwrap_or(fallback)
    }
}

/// Join `name` onto `base_dir` unless it is already absolute. MTL files
/// written on Windows use `\` separators.
pub fn resolve_relative(base_dir: &Path, name: &str) -> PathBuf {
    let normalized = name.replace('\\', "/");
    let candidate = Path::new(&normalized);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base_dir.join(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mtl::parse_mtl;

    #[test]
    fn solid_texture_is_valid() {
        let tex = TextureData::solid_rgba8(DEFAULT_NORMAL);
        assert!(tex.is_valid());
        assert!(tex.is_power_of_two());
        assert_eq!(tex.data, vec![127, 127, 255, 0]);
    }

    #[test]
    fn missing_files_become_placeholders() {
        let lib = parse_mtl("newmtl A\nmap_Kd nope.png\nmap_Bump nope.png\n").unwrap();
        let mut cache = TextureCache::new();
        cache.load_library(&lib, Path::new("/definitely/not/here"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("nope.png").unwrap().data, PLACEHOLDER.to_vec());
    }

    #[test]
    fn lookups_fall_back_to_defaults() {
        let mut cache = TextureCache::new();
        cache.insert("wood.png", TextureData::solid_rgba8([1, 2, 3, 4]));
        let shading = Shading {
            diffuse_map: Some("wood.png".to_string()),
            normal_map: Some("missing.png".to_string()),
            ..Shading::default()
        };
        assert_eq!(cache.diffuse_for(&shading).data, vec![1, 2, 3, 4]);
        assert_eq!(cache.specular_for(&shading), cache.default_white());
        assert_eq!(cache.normal_for(&shading), cache.default_normal());
    }

    #[test]
    fn loads_png_from_disk() {
        let dir = std::env::temp_dir().join(format!("asset-texture-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let img = image::RgbaImage::from_pixel(2, 4, image::Rgba([10, 20, 30, 255]));
        img.save(dir.join("tile.png")).unwrap();

        let lib = parse_mtl("newmtl A\nmap_Kd tile.png\n").unwrap();
        let mut cache = TextureCache::new();
        cache.load_library(&lib, &dir);
        let tex = cache.get("tile.png").unwrap();
        assert_eq!((tex.width, tex.height), (2, 4));
        assert!(tex.is_valid());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn relative_names_join_base() {
        let base = Path::new("/assets/balloon");
        assert_eq!(
            resolve_relative(base, "tex\\skin.png"),
            PathBuf::from("/assets/balloon/tex/skin.png")
        );
        assert_eq!(resolve_relative(base, "/abs.png"), PathBuf::from("/abs.png"));
    }
}
