use image::RgbImage;

/// Inclusive HSV band. Hue in degrees [0, 360), saturation and value in
/// [0, 1].
#[derive(Debug, Clone, Copy)]
pub struct HsvRange {
    pub hue: (f32, f32),
    pub saturation: (f32, f32),
    pub value: (f32, f32),
}

impl HsvRange {
    /// Lava: bright orange/red through yellow.
    pub fn lava() -> Self {
        Self {
            hue: (0.0, 60.0),
            saturation: (0.59, 1.0),
            value: (0.59, 1.0),
        }
    }

    fn contains(&self, h: f32, s: f32, v: f32) -> bool {
        self.hue.0 <= h
            && h <= self.hue.1
            && self.saturation.0 <= s
            && s <= self.saturation.1
            && self.value.0 <= v
            && v <= self.value.1
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardReport {
    pub detected: bool,
    /// Coverage fraction of the scanned region, 0.0 - 1.0.
    pub danger_level: f32,
}

impl HazardReport {
    pub fn clear() -> Self {
        Self {
            detected: false,
            danger_level: 0.0,
        }
    }
}

/// Fraction of the frame (from the bottom) the classifier scans. Hazards
/// that matter are the ones at the agent's feet.
const REGION_FRACTION: f32 = 0.4;
const DANGER_THRESHOLD: f32 = 0.05;

/// Cheap, deterministic color classifier: no inference, just an HSV
/// threshold over the bottom of the frame. This is the only hazard
/// signal the reflex layer trusts.
pub struct HazardDetector {
    range: HsvRange,
    threshold: f32,
}

impl HazardDetector {
    pub fn new() -> Self {
        Self {
            range: HsvRange::lava(),
            threshold: DANGER_THRESHOLD,
        }
    }

    pub fn with_range(range: HsvRange) -> Self {
        Self {
            range,
            threshold: DANGER_THRESHOLD,
        }
    }

    pub fn assess(&self, frame: &RgbImage) -> HazardReport {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return HazardReport::clear();
        }

        let region_h = ((height as f32) * REGION_FRACTION) as u32;
        if region_h == 0 {
            return HazardReport::clear();
        }
        let top = height - region_h;

        let mut matched: u64 = 0;
        for y in top..height {
            for x in 0..width {
                let p = frame.get_pixel(x, y);
                let (h, s, v) = rgb_to_hsv(p.0[0], p.0[1], p.0[2]);
                if self.range.contains(h, s, v) {
                    matched += 1;
                }
            }
        }

        let total = (region_h as u64) * (width as u64);
        let coverage = matched as f32 / total as f32;
        HazardReport {
            detected: coverage > self.threshold,
            danger_level: coverage,
        }
    }
}

impl Default for HazardDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// RGB -> HSV with hue in degrees [0, 360), s/v in [0, 1].
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let saturation = if max == 0.0 { 0.0 } else { delta / max };
    (hue, saturation, max)
}
