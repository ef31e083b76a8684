//! Per-vertex stream stamping

use super::allocator::SlotId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fills the per-vertex slot id and debug color streams
///
/// Every vertex of a slot carries the same values, so the fragment stage can
/// recover the slot from a flat varying.
pub struct AttributeStamper {
    rng: StdRng,
}

impl AttributeStamper {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded construction for reproducible colors
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Fill a slot id stream range with the slot's id
    pub fn stamp_slot_id(&self, dst: &mut [u32], slot: SlotId) {
        dst.fill(slot.get());
    }

    /// Pick a random pastel debug color, quantized to RGBA8
    pub fn debug_color(&mut self) -> [u8; 4] {
        let hue: f32 = self.rng.gen();
        let saturation = 0.5 + 0.3 * self.rng.gen::<f32>();
        let lightness = 0.4 + 0.2 * self.rng.gen::<f32>();

        let [r, g, b] = hsl_to_rgb(hue, saturation, lightness);
        [
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
            255,
        ]
    }
}

impl Default for AttributeStamper {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert HSL (all components in [0, 1]) to RGB
fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    if s == 0.0 {
        return [l, l, l];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    [
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    ]
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_id_stamp_is_uniform() {
        let stamper = AttributeStamper::with_seed(1);
        let mut stream = vec![0u32; 16];
        stamper.stamp_slot_id(&mut stream, SlotId::new(42));
        assert!(stream.iter().all(|&v| v == 42));
    }

    #[test]
    fn restamping_overwrites_every_element() {
        let stamper = AttributeStamper::with_seed(1);
        let mut stream = vec![0u32; 8];
        stamper.stamp_slot_id(&mut stream, SlotId::new(3));
        stamper.stamp_slot_id(&mut stream, SlotId::new(7));
        assert!(stream.iter().all(|&v| v == 7));
    }

    #[test]
    fn hsl_primaries() {
        let [r, g, b] = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!((r - 1.0).abs() < 1e-5 && g.abs() < 1e-5 && b.abs() < 1e-5);

        let [r, g, b] = hsl_to_rgb(1.0 / 3.0, 1.0, 0.5);
        assert!(r.abs() < 1e-5 && (g - 1.0).abs() < 1e-5 && b.abs() < 1e-5);

        let [r, g, b] = hsl_to_rgb(0.5, 0.0, 0.7);
        assert_eq!([r, g, b], [0.7, 0.7, 0.7]);
    }

    #[test]
    fn debug_colors_are_opaque_midtones() {
        let mut stamper = AttributeStamper::with_seed(7);
        for _ in 0..32 {
            let [r, g, b, a] = stamper.debug_color();
            assert_eq!(a, 255);
            // Saturation and lightness ranges keep channels away from both
            // extremes being hit simultaneously.
            let max = r.max(g).max(b);
            let min = r.min(g).min(b);
            assert!(max > min, "fully grey color from saturated HSL");
        }
    }

    #[test]
    fn seeded_stamper_is_deterministic() {
        let mut a = AttributeStamper::with_seed(99);
        let mut b = AttributeStamper::with_seed(99);
        for _ in 0..8 {
            assert_eq!(a.debug_color(), b.debug_color());
        }
    }
}
