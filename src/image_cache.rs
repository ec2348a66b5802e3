//! Decoded image cache with least-recently-used eviction.
//!
//! The cache is keyed by the image path rendered as a string. It holds at most
//! `capacity` decoded images; inserting past that evicts the entry that was
//! accessed least recently. Decode failures are never stored, so a broken file
//! is retried on every visit.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::error::DecodeError;

/// A decoded RGBA8 image.
///
/// Cloning is cheap and shares the pixel buffer; the buffer is never mutated
/// once the image sits in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    data: Arc<Vec<u8>>,
    width: u32,
    height: u32,
}

impl DecodedImage {
    /// Wrap raw RGBA8 pixels (`width * height * 4` bytes).
    pub fn from_rgba8(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(data.len(), (width as usize) * (height as usize) * 4);
        Self {
            data: Arc::new(data),
            width,
            height,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether two handles point at the same pixel buffer.
    pub fn shares_pixels_with(&self, other: &DecodedImage) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

/// Turns an image path into pixels.
pub trait ImageDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError>;
}

/// Decoder backed by the `image` crate.
///
/// The file is read into memory first so that any path the OS can open works,
/// independent of how the decoder handles file names.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDecoder;

impl ImageDecoder for FileDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
        let bytes = std::fs::read(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let rgba = image::load_from_memory(&bytes)
            .map_err(|source| DecodeError::Image {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();

        let (width, height) = rgba.dimensions();
        log::debug!("Decoded {:?}: {}x{}", path, width, height);
        Ok(DecodedImage::from_rgba8(rgba.into_raw(), width, height))
    }
}

/// Cache key for an image path.
pub fn cache_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

struct CacheSlot {
    image: DecodedImage,
    /// Access stamp; also the slot's key in `ImageCache::recency`
    last_used: u64,
}

/// Bounded LRU store of decoded images.
pub struct ImageCache {
    capacity: usize,
    entries: HashMap<String, CacheSlot>,
    /// Access stamp -> key, oldest first
    recency: BTreeMap<u64, String>,
    clock: u64,
}

impl ImageCache {
    /// Create a cache holding at most `capacity` images (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity + 1),
            recency: BTreeMap::new(),
            clock: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check residency without touching recency.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up an image, marking it most recently used on a hit.
    pub fn get(&mut self, key: &str) -> Option<DecodedImage> {
        let stamp = self.next_stamp();
        let slot = self.entries.get_mut(key)?;
        self.recency.remove(&slot.last_used);
        slot.last_used = stamp;
        self.recency.insert(stamp, key.to_string());
        Some(slot.image.clone())
    }

    /// Store an image as most recently used.
    ///
    /// Returns the key evicted to stay within capacity, if any.
    pub fn insert(&mut self, key: String, image: DecodedImage) -> Option<String> {
        let stamp = self.next_stamp();
        if let Some(old) = self.entries.insert(
            key.clone(),
            CacheSlot {
                image,
                last_used: stamp,
            },
        ) {
            self.recency.remove(&old.last_used);
        }
        self.recency.insert(stamp, key);

        if self.entries.len() <= self.capacity {
            return None;
        }

        let (_, evicted) = self.recency.pop_first()?;
        self.entries.remove(&evicted);
        log::debug!("Evicted {} from image cache (size: {})", evicted, self.len());
        Some(evicted)
    }

    /// Return the cached image for `path`, decoding and inserting it on a miss.
    pub fn get_or_decode(
        &mut self,
        path: &Path,
        decoder: &dyn ImageDecoder,
    ) -> Result<DecodedImage, DecodeError> {
        let key = cache_key(path);
        if let Some(image) = self.get(&key) {
            log::trace!("Image cache hit: {}", key);
            return Ok(image);
        }

        let image = decoder.decode(path)?;
        self.insert(key, image.clone());
        Ok(image)
    }

    /// Keys from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<&str> {
        self.recency.values().map(String::as_str).collect()
    }

    /// Drop every entry (e.g. when another folder is selected).
    pub fn clear(&mut self) {
        let count = self.entries.len();
        self.entries.clear();
        self.recency.clear();
        if count > 0 {
            log::info!("Cleared image cache ({} entries)", count);
        }
    }

    fn next_stamp(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::path::PathBuf;

    /// Decoder that fabricates 1x1 images and records every attempt.
    #[derive(Default)]
    pub(crate) struct CountingDecoder {
        pub attempts: RefCell<Vec<PathBuf>>,
        pub failing: RefCell<HashSet<PathBuf>>,
    }

    impl CountingDecoder {
        pub fn fail_on(&self, path: impl Into<PathBuf>) {
            self.failing.borrow_mut().insert(path.into());
        }

        pub fn heal(&self, path: impl Into<PathBuf>) {
            let path: PathBuf = path.into();
            self.failing.borrow_mut().remove(&path);
        }

        pub fn attempts_for(&self, path: &Path) -> usize {
            self.attempts.borrow().iter().filter(|p| *p == path).count()
        }
    }

    impl ImageDecoder for CountingDecoder {
        fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
            self.attempts.borrow_mut().push(path.to_path_buf());
            if self.failing.borrow().contains(path) {
                return Err(DecodeError::Io {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::InvalidData, "corrupt"),
                });
            }
            Ok(DecodedImage::from_rgba8(vec![0, 0, 0, 255], 1, 1))
        }
    }

    fn pixel() -> DecodedImage {
        DecodedImage::from_rgba8(vec![1, 2, 3, 4], 1, 1)
    }

    #[test]
    fn test_capacity_floor() {
        let cache = ImageCache::new(0);
        assert_eq!(cache.capacity(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_evicts_least_recently_inserted() {
        let mut cache = ImageCache::new(2);
        assert_eq!(cache.insert("a".into(), pixel()), None);
        assert_eq!(cache.insert("b".into(), pixel()), None);
        assert_eq!(cache.insert("c".into(), pixel()), Some("a".to_string()));
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("a"));
    }

    #[test]
    fn test_get_promotes_entry() {
        let mut cache = ImageCache::new(2);
        cache.insert("a".into(), pixel());
        cache.insert("b".into(), pixel());
        assert!(cache.get("a").is_some());
        assert_eq!(cache.insert("c".into(), pixel()), Some("b".to_string()));
        assert!(cache.contains("a"));
        assert!(cache.contains("c"));
    }

    #[test]
    fn test_contains_does_not_promote() {
        let mut cache = ImageCache::new(2);
        cache.insert("a".into(), pixel());
        cache.insert("b".into(), pixel());
        assert!(cache.contains("a"));
        assert_eq!(cache.insert("c".into(), pixel()), Some("a".to_string()));
    }

    #[test]
    fn test_reinsert_refreshes_without_growth() {
        let mut cache = ImageCache::new(2);
        cache.insert("a".into(), pixel());
        cache.insert("b".into(), pixel());
        assert_eq!(cache.insert("a".into(), pixel()), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys_by_recency(), vec!["b", "a"]);
    }

    #[test]
    fn test_lru_invariant_over_mixed_sequence() {
        let capacity = 3;
        let mut cache = ImageCache::new(capacity);
        // Reference model: most recent at the back
        let mut model: Vec<String> = Vec::new();

        let ops: Vec<(bool, usize)> = (0..200).map(|i| (i % 3 != 0, (i * 7 + i / 5) % 6)).collect();
        for (is_insert, k) in ops {
            let key = format!("k{}", k);
            if is_insert {
                let evicted = cache.insert(key.clone(), pixel());
                model.retain(|m| m != &key);
                model.push(key);
                let expected = if model.len() > capacity {
                    Some(model.remove(0))
                } else {
                    None
                };
                assert_eq!(evicted, expected);
            } else {
                let hit = cache.get(&key).is_some();
                assert_eq!(hit, model.contains(&key));
                if hit {
                    model.retain(|m| m != &key);
                    model.push(key);
                }
            }
            assert!(cache.len() <= capacity);
            let model_keys: Vec<&str> = model.iter().map(String::as_str).collect();
            assert_eq!(cache.keys_by_recency(), model_keys);
        }
    }

    #[test]
    fn test_hit_shares_buffer() {
        let mut cache = ImageCache::new(2);
        let image = pixel();
        cache.insert("a".into(), image.clone());
        let hit = cache.get("a").unwrap();
        assert!(hit.shares_pixels_with(&image));
    }

    #[test]
    fn test_get_or_decode_caches_success() {
        let decoder = CountingDecoder::default();
        let mut cache = ImageCache::new(4);
        let path = Path::new("img1.png");
        cache.get_or_decode(path, &decoder).unwrap();
        cache.get_or_decode(path, &decoder).unwrap();
        assert_eq!(decoder.attempts_for(path), 1);
    }

    #[test]
    fn test_decode_failure_not_cached() {
        let decoder = CountingDecoder::default();
        decoder.fail_on("broken.png");
        let mut cache = ImageCache::new(4);
        let path = Path::new("broken.png");

        assert!(cache.get_or_decode(path, &decoder).is_err());
        assert!(!cache.contains(&cache_key(path)));
        assert!(cache.get_or_decode(path, &decoder).is_err());
        assert_eq!(decoder.attempts_for(path), 2);

        decoder.heal("broken.png");
        assert!(cache.get_or_decode(path, &decoder).is_ok());
        assert_eq!(decoder.attempts_for(path), 3);
        assert!(cache.contains(&cache_key(path)));
    }

    #[test]
    fn test_clear() {
        let mut cache = ImageCache::new(2);
        cache.insert("a".into(), pixel());
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.keys_by_recency().is_empty());
    }

    #[test]
    fn test_file_decoder_reads_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let decoded = FileDecoder.decode(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
        assert_eq!(&decoded.data()[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_file_decoder_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        assert!(matches!(
            FileDecoder.decode(&missing),
            Err(DecodeError::Io { .. })
        ));

        let corrupt = dir.path().join("corrupt.png");
        std::fs::write(&corrupt, b"not an image").unwrap();
        let err = FileDecoder.decode(&corrupt).unwrap_err();
        assert!(matches!(err, DecodeError::Image { .. }));
        assert_eq!(err.path(), &corrupt);
    }
}
