//! 8-bit HSV conversion with hue on the 0..180 scale.

/// Size of the hue circle in 8-bit HSV
pub const HUE_RANGE: f32 = 180.0;

/// Convert an RGB pixel to `(h, s, v)` with `h` in [0, 180) and `s`, `v` in [0, 255]
pub fn rgb_to_hsv(rgb: [u8; 3]) -> (f32, f32, f32) {
    let r = rgb[0] as f32;
    let g = rgb[1] as f32;
    let b = rgb[2] as f32;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { delta / max * 255.0 } else { 0.0 };

    let h_deg = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h_deg = if h_deg < 0.0 { h_deg + 360.0 } else { h_deg };

    ((h_deg / 2.0) % HUE_RANGE, s, v)
}

/// Inverse of [`rgb_to_hsv`]; inputs outside their ranges are wrapped (hue) or clamped
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let h_deg = h.rem_euclid(HUE_RANGE) * 2.0;
    let s = (s / 255.0).clamp(0.0, 1.0);
    let v = v.clamp(0.0, 255.0);

    let c = v * s;
    let sector = h_deg / 60.0;
    let x = c * (1.0 - (sector % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match sector as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [
        to_channel(r + m),
        to_channel(g + m),
        to_channel(b + m),
    ]
}

fn to_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
