//! Path-keyed texture deduplication
//!
//! Each [`Model`](crate::gfx::scene::Model) owns one cache. Loading a path the
//! cache has already seen returns the existing handle without decoding the
//! image again. Entries are never evicted.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode image '{}'", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image '{}' is {width}x{height} with {len} bytes of RGBA data", path.display())]
    InvalidImage {
        path: PathBuf,
        width: u32,
        height: u32,
        len: usize,
    },

    #[error("image '{}' is {width}x{height}, the device allows at most {max} per side", path.display())]
    TooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max: u32,
    },

    #[error("cube map face '{}' is {actual:?}, expected {expected:?}", path.display())]
    CubeFaceMismatch {
        path: PathBuf,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("cube map face '{}' is {width}x{height}, faces must be square", path.display())]
    NonSquareCubeFace {
        path: PathBuf,
        width: u32,
        height: u32,
    },
}

/// Decoded RGBA8 pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl DecodedImage {
    /// Checks that the buffer is non-empty and holds exactly `width * height` texels
    pub fn validate(&self, path: &Path) -> Result<(), TextureError> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.width == 0 || self.height == 0 || self.rgba.len() != expected {
            return Err(TextureError::InvalidImage {
                path: path.to_path_buf(),
                width: self.width,
                height: self.height,
                len: self.rgba.len(),
            });
        }
        Ok(())
    }

    /// Checks that neither side exceeds the device's `max_dimension`
    pub fn check_fits(&self, path: &Path, max_dimension: u32) -> Result<(), TextureError> {
        if self.width > max_dimension || self.height > max_dimension {
            return Err(TextureError::TooLarge {
                path: path.to_path_buf(),
                width: self.width,
                height: self.height,
                max: max_dimension,
            });
        }
        Ok(())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Checks six faces can form one cube map and returns their shared size
///
/// Every face must be valid, square, no larger than `max_dimension` and the
/// size of the first one.
pub fn validate_cube_faces(
    faces: &[(PathBuf, DecodedImage); 6],
    max_dimension: u32,
) -> Result<(u32, u32), TextureError> {
    let (first_path, first) = &faces[0];
    let expected = first.dimensions();
    if expected.0 != expected.1 {
        return Err(TextureError::NonSquareCubeFace {
            path: first_path.clone(),
            width: expected.0,
            height: expected.1,
        });
    }

    for (path, face) in faces {
        face.validate(path)?;
        face.check_fits(path, max_dimension)?;
        if face.dimensions() != expected {
            return Err(TextureError::CubeFaceMismatch {
                path: path.clone(),
                expected,
                actual: face.dimensions(),
            });
        }
    }
    Ok(expected)
}

/// Turns an image file into RGBA8 pixels
pub trait ImageDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, TextureError>;
}

/// Decodes from disk with the `image` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageFileDecoder;

impl ImageDecoder for ImageFileDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, TextureError> {
        let image = image::open(path)
            .map_err(|source| TextureError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        let decoded = DecodedImage {
            width,
            height,
            rgba: image.into_raw(),
        };
        decoded.validate(path)?;
        Ok(decoded)
    }
}

/// Index of an entry in a [`TextureCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(usize);

pub struct TextureCache<T> {
    entries: Vec<T>,
    by_path: HashMap<PathBuf, TextureId>,
}

impl<T> Default for TextureCache<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            by_path: HashMap::new(),
        }
    }
}

impl<T> TextureCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle cached for `path`, decoding and uploading on a miss
    ///
    /// `upload` turns the decoded pixels into whatever the cache stores (a GPU
    /// texture in the renderer). Images wider or taller than `max_dimension`
    /// are rejected. Nothing is cached when decoding or validation fails.
    pub fn get_or_load<F>(
        &mut self,
        path: &Path,
        decoder: &dyn ImageDecoder,
        max_dimension: u32,
        upload: F,
    ) -> Result<TextureId, TextureError>
    where
        F: FnOnce(&Path, &DecodedImage) -> T,
    {
        if let Some(&id) = self.by_path.get(path) {
            log::debug!("texture cache hit: {}", path.display());
            return Ok(id);
        }

        let image = decoder.decode(path)?;
        image.validate(path)?;
        image.check_fits(path, max_dimension)?;
        log::debug!(
            "decoded texture {} ({}x{})",
            path.display(),
            image.width,
            image.height
        );

        let id = TextureId(self.entries.len());
        self.entries.push(upload(path, &image));
        self.by_path.insert(path.to_path_buf(), id);
        Ok(id)
    }

    pub fn get(&self, id: TextureId) -> Option<&T> {
        self.entries.get(id.0)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const MAX: u32 = 4096;

    fn solid(width: u32, height: u32) -> DecodedImage {
        DecodedImage {
            width,
            height,
            rgba: vec![128; width as usize * height as usize * 4],
        }
    }

    fn cube_faces(sizes: [(u32, u32); 6]) -> [(PathBuf, DecodedImage); 6] {
        sizes.map(|(w, h)| (PathBuf::from(format!("sky_{w}x{h}.bmp")), solid(w, h)))
    }

    /// Decodes every path to the same image
    struct FixedDecoder(DecodedImage);

    impl ImageDecoder for FixedDecoder {
        fn decode(&self, _path: &Path) -> Result<DecodedImage, TextureError> {
            Ok(self.0.clone())
        }
    }

    /// Hands out a 1x1 texel per call and counts how often it was asked
    #[derive(Default)]
    struct CountingDecoder {
        calls: Cell<usize>,
    }

    impl ImageDecoder for CountingDecoder {
        fn decode(&self, _path: &Path) -> Result<DecodedImage, TextureError> {
            self.calls.set(self.calls.get() + 1);
            Ok(DecodedImage {
                width: 1,
                height: 1,
                rgba: vec![255, 0, 0, 255],
            })
        }
    }

    struct BrokenDecoder;

    impl ImageDecoder for BrokenDecoder {
        fn decode(&self, _path: &Path) -> Result<DecodedImage, TextureError> {
            Ok(DecodedImage {
                width: 4,
                height: 4,
                rgba: Vec::new(),
            })
        }
    }

    #[test]
    fn test_same_path_returns_same_handle_without_second_decode() {
        let decoder = CountingDecoder::default();
        let mut cache: TextureCache<String> = TextureCache::new();
        let path = Path::new("models/tree/bark.png");

        let first = cache
            .get_or_load(path, &decoder, MAX, |p, _| p.display().to_string())
            .unwrap();
        let second = cache
            .get_or_load(path, &decoder, MAX, |_, _| panic!("uploaded twice"))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(decoder.calls.get(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(first).map(String::as_str), Some("models/tree/bark.png"));
    }

    #[test]
    fn test_distinct_paths_get_distinct_handles() {
        let decoder = CountingDecoder::default();
        let mut cache: TextureCache<u32> = TextureCache::new();

        let bark = cache
            .get_or_load(Path::new("bark.png"), &decoder, MAX, |_, img| img.width)
            .unwrap();
        let leaf = cache
            .get_or_load(Path::new("leaf.png"), &decoder, MAX, |_, img| img.width)
            .unwrap();

        assert_ne!(bark, leaf);
        assert_eq!(decoder.calls.get(), 2);
        assert!(cache.contains(Path::new("leaf.png")));
    }

    #[test]
    fn test_invalid_decode_is_an_error_and_not_cached() {
        let mut cache: TextureCache<()> = TextureCache::new();
        let result = cache.get_or_load(Path::new("broken.bmp"), &BrokenDecoder, MAX, |_, _| ());

        assert!(matches!(
            result,
            Err(TextureError::InvalidImage { width: 4, height: 4, len: 0, .. })
        ));
        assert!(cache.is_empty());
        assert!(!cache.contains(Path::new("broken.bmp")));
    }

    #[test]
    fn test_oversized_image_is_rejected_before_upload() {
        let mut cache: TextureCache<()> = TextureCache::new();
        let decoder = FixedDecoder(solid(MAX + 1, 1));
        let path = Path::new("huge_diffuse.png");

        let result = cache.get_or_load(path, &decoder, MAX, |_, _| panic!("uploaded"));

        assert!(matches!(
            result,
            Err(TextureError::TooLarge { width: 4097, height: 1, max: 4096, .. })
        ));
        assert!(!cache.contains(path));
    }

    #[test]
    fn test_image_at_the_limit_fits() {
        let image = solid(1, 64);
        assert!(image.check_fits(Path::new("tall.png"), 64).is_ok());
        assert!(image.check_fits(Path::new("tall.png"), 63).is_err());
    }

    #[test]
    fn test_matching_square_faces_form_a_cube() {
        let faces = cube_faces([(8, 8); 6]);
        assert_eq!(validate_cube_faces(&faces, MAX).unwrap(), (8, 8));
    }

    #[test]
    fn test_non_square_faces_are_rejected() {
        let faces = cube_faces([(8, 4); 6]);
        assert!(matches!(
            validate_cube_faces(&faces, MAX),
            Err(TextureError::NonSquareCubeFace { width: 8, height: 4, .. })
        ));
    }

    #[test]
    fn test_face_of_another_size_is_rejected() {
        let faces = cube_faces([(8, 8), (8, 8), (8, 8), (16, 16), (8, 8), (8, 8)]);
        let err = validate_cube_faces(&faces, MAX).unwrap_err();
        assert!(matches!(
            err,
            TextureError::CubeFaceMismatch { expected: (8, 8), actual: (16, 16), .. }
        ));
    }

    #[test]
    fn test_oversized_cube_faces_are_rejected() {
        let faces = cube_faces([(32, 32); 6]);
        assert!(matches!(
            validate_cube_faces(&faces, 16),
            Err(TextureError::TooLarge { max: 16, .. })
        ));
    }

    #[test]
    fn test_missing_file_reports_decode_error() {
        let path = std::env::temp_dir().join("deferred-renderer-no-such-texture.png");
        let result = ImageFileDecoder.decode(&path);
        assert!(matches!(result, Err(TextureError::Decode { .. })));
    }
}
