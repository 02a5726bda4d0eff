//! Count → size and count → color laws shared by cluster badges, grid cells
//! and single-location markers.

use crate::config::SizingConfig;

/// 24-bit color
pub type Rgb = (u8, u8, u8);

pub const HIGH_ALERT: Rgb = (231, 76, 60);
pub const MID: Rgb = (241, 196, 15);
pub const LOW: Rgb = (46, 204, 113);

/// Logarithmic size: compresses differences at high counts.
pub fn visual_size(count: u64, sizing: &SizingConfig) -> f64 {
    let raw = sizing.base + ((count as f64) + 1.0).log10() * sizing.scale_factor;
    raw.clamp(sizing.min, sizing.max)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorTier {
    High,
    Mid,
    Low,
}

impl ColorTier {
    pub fn for_count(count: u64, sizing: &SizingConfig) -> Self {
        if count > sizing.high_threshold {
            ColorTier::High
        } else if count > sizing.mid_threshold {
            ColorTier::Mid
        } else {
            ColorTier::Low
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            ColorTier::High => HIGH_ALERT,
            ColorTier::Mid => MID,
            ColorTier::Low => LOW,
        }
    }
}

/// `log10(count + 1) / log10(max + 1)`, in [0, 1]
pub fn log_intensity(count: u64, max: u64) -> f64 {
    let max = max.max(1);
    let v = ((count as f64) + 1.0).log10() / ((max as f64) + 1.0).log10();
    v.clamp(0.0, 1.0)
}

/// Blue (cold) to red (hot) sweep on a fixed scale
pub fn hue(intensity: f64) -> f64 {
    (1.0 - intensity.clamp(0.0, 1.0)) * 240.0
}

/// Fully saturated color for an intensity in [0, 1]
pub fn hue_color(intensity: f64) -> Rgb {
    hsl_to_rgb(hue(intensity), 1.0, 0.5)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = (h / 60.0).rem_euclid(6.0);
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u8 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_u8(r), to_u8(g), to_u8(b))
}
