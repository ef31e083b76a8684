//! Depth bucketing and radix sort for draw ordering

/// Quantize a view-space depth into a 30 bit bucket
///
/// Depths at or beyond `far` all land in the top bucket, so the key never
/// overflows the u32 radix domain.
pub fn depth_key(depth: f32, far: f32) -> u32 {
    const SCALE: f32 = (1u32 << 30) as f32;
    let normalized = (depth / far).clamp(0.0, 1.0);
    (SCALE * normalized) as u32
}

/// Stable least-significant-digit radix sort on u32 keys
///
/// Four passes of 256 buckets. Stability keeps submission order for draws
/// that share a depth bucket.
pub fn radix_sort_by_key<T: Copy, F: Fn(&T) -> u32>(items: &mut Vec<T>, key: F) {
    if items.len() <= 1 {
        return;
    }

    let mut scratch: Vec<T> = Vec::with_capacity(items.len());
    // scratch is fully overwritten each pass before being read
    scratch.resize(items.len(), items[0]);

    for pass in 0..4 {
        let shift = pass * 8;
        let mut counts = [0usize; 256];
        for item in items.iter() {
            counts[((key(item) >> shift) & 0xFF) as usize] += 1;
        }

        let mut offsets = [0usize; 256];
        let mut total = 0;
        for (offset, &count) in offsets.iter_mut().zip(counts.iter()) {
            *offset = total;
            total += count;
        }

        for item in items.iter() {
            let bucket = ((key(item) >> shift) & 0xFF) as usize;
            scratch[offsets[bucket]] = *item;
            offsets[bucket] += 1;
        }

        std::mem::swap(items, &mut scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_scales_linearly_with_depth() {
        assert_eq!(depth_key(0.0, 100.0), 0);
        assert_eq!(depth_key(100.0, 100.0), 1 << 30);
        assert_eq!(depth_key(50.0, 100.0), 1 << 29);
    }

    #[test]
    fn key_clamps_out_of_range_depths() {
        assert_eq!(depth_key(-5.0, 100.0), 0);
        assert_eq!(depth_key(250.0, 100.0), 1 << 30);
    }

    #[test]
    fn matches_std_sort() {
        let mut items: Vec<u32> = vec![
            0, u32::MAX, 1 << 30, 77, 12345, 3, 77, 999_999_999, 42, 1 << 16,
        ];
        let mut expected = items.clone();
        expected.sort();
        radix_sort_by_key(&mut items, |&v| v);
        assert_eq!(items, expected);
    }

    #[test]
    fn sort_is_stable() {
        // Same key, distinct payloads: payload order must survive
        let mut items: Vec<(u32, u32)> = vec![(5, 0), (1, 1), (5, 2), (1, 3), (5, 4)];
        radix_sort_by_key(&mut items, |&(k, _)| k);
        assert_eq!(items, vec![(1, 1), (1, 3), (5, 0), (5, 2), (5, 4)]);
    }

    #[test]
    fn empty_and_single() {
        let mut empty: Vec<u32> = Vec::new();
        radix_sort_by_key(&mut empty, |&v| v);
        assert!(empty.is_empty());

        let mut one = vec![7u32];
        radix_sort_by_key(&mut one, |&v| v);
        assert_eq!(one, vec![7]);
    }
}
