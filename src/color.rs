use crate::types::FeatureId;
use image::Rgba;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

const NO_DATA: Rgba<u8> = Rgba([0, 0, 0, 255]);

// Alpha for chart fills, roughly 0.2 opacity.
const BACKGROUND_ALPHA: u8 = 51;

/// Choropleth color for a normalised reading: red at 0 through yellow to
/// green at 1. Missing data is black.
///
/// This is a straight hue sweep in sRGB. The dashboard interpolated in LCH,
/// so only the endpoints match it; midpoints here are brighter and more
/// yellow (0.5 is pure `#ffff00`).
pub fn gradient(value: Option<f64>) -> Rgba<u8> {
    let Some(value) = value else {
        return NO_DATA;
    };
    let t = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };

    // Hue sweep 0..120 degrees at full saturation and value.
    let hue = t * 2.0;
    let (r, g) = if hue <= 1.0 { (1.0, hue) } else { (2.0 - hue, 1.0) };
    Rgba([channel(r), channel(g), 0, 255])
}

fn channel(v: f64) -> u8 {
    (v * 255.0).round() as u8
}

pub fn to_hex(color: Rgba<u8>) -> String {
    let [r, g, b, _] = color.0;
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Line and fill colors for one entity's chart series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesColor {
    pub border: Rgba<u8>,
    pub background: Rgba<u8>,
}

/// Random but stable colors per entity for the lifetime of one session.
pub struct ColorAssignmentCache {
    rng: StdRng,
    colors: HashMap<FeatureId, SeriesColor>,
}

impl ColorAssignmentCache {
    pub fn new() -> Self {
        ColorAssignmentCache {
            rng: StdRng::from_entropy(),
            colors: HashMap::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        ColorAssignmentCache {
            rng: StdRng::seed_from_u64(seed),
            colors: HashMap::new(),
        }
    }

    pub fn get(&mut self, id: FeatureId) -> SeriesColor {
        let rng = &mut self.rng;
        *self.colors.entry(id).or_insert_with(|| {
            let [r, g, b]: [u8; 3] = rng.gen();
            SeriesColor {
                border: Rgba([r, g, b, 255]),
                background: Rgba([r, g, b, BACKGROUND_ALPHA]),
            }
        })
    }

    pub fn peek(&self, id: FeatureId) -> Option<SeriesColor> {
        self.colors.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn clear(&mut self) {
        self.colors.clear();
    }
}

impl Default for ColorAssignmentCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_runs_red_to_green() {
        assert_eq!(gradient(Some(0.0)), Rgba([255, 0, 0, 255]));
        assert_eq!(gradient(Some(0.5)), Rgba([255, 255, 0, 255]));
        assert_eq!(gradient(Some(1.0)), Rgba([0, 255, 0, 255]));
        assert_eq!(gradient(None), NO_DATA);
    }

    #[test]
    fn gradient_clamps_out_of_range_values() {
        assert_eq!(gradient(Some(-0.3)), gradient(Some(0.0)));
        assert_eq!(gradient(Some(7.0)), gradient(Some(1.0)));
    }

    #[test]
    fn hex_conversion() {
        assert_eq!(to_hex(Rgba([15, 192, 192, 255])), "#0fc0c0");
        assert_eq!(to_hex(Rgba([150, 10, 10, 51])), "#960a0a");
    }

    #[test]
    fn cache_returns_the_same_colors_per_id() {
        let mut cache = ColorAssignmentCache::with_seed(7);
        let first = cache.get(3);
        cache.get(4);
        assert_eq!(cache.get(3), first);
        assert_eq!(cache.peek(3), Some(first));
        assert_eq!(cache.len(), 2);

        assert_eq!(first.border.0[..3], first.background.0[..3]);
        assert_eq!(first.border.0[3], 255);
        assert_eq!(first.background.0[3], BACKGROUND_ALPHA);
    }

    #[test]
    fn seeded_caches_agree() {
        let mut a = ColorAssignmentCache::with_seed(42);
        let mut b = ColorAssignmentCache::with_seed(42);
        for id in [9, 1, 5] {
            assert_eq!(a.get(id), b.get(id));
        }
    }

    #[test]
    fn clearing_ends_the_session() {
        let mut cache = ColorAssignmentCache::with_seed(1);
        cache.get(1);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.peek(1), None);
    }
}
