//! Neighborhood preloading.
//!
//! Warms the image cache for a window of indices around the active image so
//! that stepping to a neighbor is a cache hit. Warming runs synchronously on
//! the calling thread and never changes the active index.

use std::ops::RangeInclusive;

use crate::image_cache::{ImageCache, ImageDecoder, cache_key};
use crate::sequence::ImageSequence;

/// Indices within `radius` of `center`, clipped to `[0, len)`.
///
/// Returns an empty range for an empty sequence.
pub fn preload_window(center: usize, radius: usize, len: usize) -> RangeInclusive<usize> {
    if len == 0 {
        return RangeInclusive::new(1, 0);
    }
    let start = center.saturating_sub(radius);
    let end = center.saturating_add(radius).min(len - 1);
    start..=end
}

/// Window indices ordered by distance from `center`, the next image before
/// the previous one at equal distance.
pub fn nearest_first(center: usize, radius: usize, len: usize) -> Vec<usize> {
    let mut order: Vec<usize> = preload_window(center, radius, len).collect();
    order.sort_by_key(|&index| (index.abs_diff(center), index < center));
    order
}

/// Decode the images in the window that are not yet cached, nearest first.
///
/// At most `capacity - 1` images are decoded so the active image, which the
/// caller has just touched, is never evicted. Resident entries are left alone
/// (their recency is not refreshed). Decode failures are logged and skipped.
/// Returns how many images were decoded.
pub fn warm(
    center: usize,
    radius: usize,
    sequence: &ImageSequence,
    cache: &mut ImageCache,
    decoder: &dyn ImageDecoder,
) -> usize {
    let budget = cache.capacity().saturating_sub(1);
    let mut decoded = 0;
    for index in nearest_first(center, radius, sequence.len()) {
        if decoded >= budget {
            log::trace!("Preload budget of {} images reached", budget);
            break;
        }
        let Some(entry) = sequence.get(index) else {
            continue;
        };
        let key = cache_key(&entry.path);
        if cache.contains(&key) {
            continue;
        }

        log::debug!("Preloading image {} ({:?})", index, entry.path);
        match decoder.decode(&entry.path) {
            Ok(image) => {
                cache.insert(key, image);
                decoded += 1;
            }
            Err(e) => log::warn!("Preload failed for image {}: {}", index, e),
        }
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_cache::tests::CountingDecoder;
    use std::path::PathBuf;

    fn sequence(count: usize) -> ImageSequence {
        ImageSequence::from_paths((0..count).map(|i| PathBuf::from(format!("img{}.png", i))))
    }

    #[test]
    fn test_window_clipping() {
        assert_eq!(preload_window(5, 3, 20), 2..=8);
        assert_eq!(preload_window(1, 3, 20), 0..=4);
        assert_eq!(preload_window(18, 3, 20), 15..=19);
        assert_eq!(preload_window(0, 0, 1), 0..=0);
        assert!(preload_window(0, 3, 0).is_empty());
    }

    #[test]
    fn test_nearest_first_order() {
        assert_eq!(nearest_first(5, 2, 20), vec![5, 6, 4, 7, 3]);
        assert_eq!(nearest_first(0, 2, 20), vec![0, 1, 2]);
        assert_eq!(nearest_first(9, 3, 10), vec![9, 8, 7, 6]);
        assert!(nearest_first(0, 3, 0).is_empty());
    }

    #[test]
    fn test_small_cache_keeps_active_image() {
        let sequence = sequence(10);
        let mut cache = ImageCache::new(3);
        let decoder = CountingDecoder::default();
        cache
            .get_or_decode(&PathBuf::from("img5.png"), &decoder)
            .unwrap();

        let decoded = warm(5, 3, &sequence, &mut cache, &decoder);
        assert_eq!(decoded, 2);
        assert!(cache.contains("img5.png"));
        assert!(cache.contains("img6.png"));
        assert!(cache.contains("img4.png"));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_warm_fills_window() {
        let sequence = sequence(10);
        let mut cache = ImageCache::new(30);
        let decoder = CountingDecoder::default();

        let decoded = warm(5, 3, &sequence, &mut cache, &decoder);
        assert_eq!(decoded, 7);
        for i in 2..=8 {
            assert!(cache.contains(&format!("img{}.png", i)));
        }
        assert!(!cache.contains("img1.png"));
        assert!(!cache.contains("img9.png"));
    }

    #[test]
    fn test_warm_skips_resident() {
        let sequence = sequence(10);
        let mut cache = ImageCache::new(30);
        let decoder = CountingDecoder::default();

        warm(5, 3, &sequence, &mut cache, &decoder);
        let decoded = warm(6, 3, &sequence, &mut cache, &decoder);
        assert_eq!(decoded, 1);
        assert_eq!(decoder.attempts.borrow().len(), 8);
    }

    #[test]
    fn test_warm_skips_failures() {
        let sequence = sequence(5);
        let mut cache = ImageCache::new(30);
        let decoder = CountingDecoder::default();
        decoder.fail_on("img1.png");

        let decoded = warm(0, 3, &sequence, &mut cache, &decoder);
        assert_eq!(decoded, 3);
        assert!(!cache.contains("img1.png"));

        // Failures are retried on the next warm
        warm(0, 3, &sequence, &mut cache, &decoder);
        assert_eq!(decoder.attempts_for(PathBuf::from("img1.png").as_path()), 2);
    }

    #[test]
    fn test_warm_empty_sequence() {
        let mut cache = ImageCache::new(30);
        let decoder = CountingDecoder::default();
        assert_eq!(warm(0, 3, &ImageSequence::default(), &mut cache, &decoder), 0);
    }
}
