//! Colour grading for the shaded render mode

/// Default brightness gain for shaded rendering
pub const SHADED_GAIN: f32 = 1.2;
/// Default saturation multiplier for shaded rendering
pub const SHADED_SATURATION: f32 = 1.7;

/// Hue, saturation, lightness; hue in [0, 1)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    /// Convert from RGB; channels above 1 are accepted
    pub fn from_rgb([r, g, b]: [f32; 3]) -> Self {
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (min + max) * 0.5;

        if min == max {
            return Self { h: 0.0, s: 0.0, l };
        }

        let delta = max - min;
        let s = if l <= 0.5 { delta / (max + min) } else { delta / (2.0 - max - min) };
        let h = if max == r {
            (g - b) / delta + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };

        Self { h: h / 6.0, s, l }
    }

    /// Convert to RGB
    ///
    /// Hue wraps; saturation and lightness are clamped to [0, 1].
    pub fn to_rgb(self) -> [f32; 3] {
        let h = self.h.rem_euclid(1.0);
        let s = self.s.clamp(0.0, 1.0);
        let l = self.l.clamp(0.0, 1.0);

        if s == 0.0 {
            return [l, l, l];
        }

        let hi = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let lo = 2.0 * l - hi;
        [
            hue_to_channel(lo, hi, h + 1.0 / 3.0),
            hue_to_channel(lo, hi, h),
            hue_to_channel(lo, hi, h - 1.0 / 3.0),
        ]
    }
}

fn hue_to_channel(lo: f32, hi: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        lo + (hi - lo) * 6.0 * t
    } else if t < 0.5 {
        hi
    } else if t < 2.0 / 3.0 {
        lo + (hi - lo) * 6.0 * (2.0 / 3.0 - t)
    } else {
        lo
    }
}

/// Brighten and saturate an RGB888 colour
///
/// The colour is normalised, scaled by `gain`, then its HSL saturation is
/// multiplied by `saturation_factor` and clamped to 1.
pub fn boost(color: [u8; 3], gain: f32, saturation_factor: f32) -> [f32; 3] {
    let scaled = color.map(|c| c as f32 / 255.0 * gain);
    let mut hsl = Hsl::from_rgb(scaled);
    hsl.s = (hsl.s * saturation_factor).min(1.0);
    hsl.to_rgb()
}
