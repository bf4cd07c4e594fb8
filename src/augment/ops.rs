use crate::augment::color::{hsv_to_rgb, rgb_to_hsv, HUE_RANGE};
use image::{imageops, Rgb, RgbImage};
use imageproc::filter::separable_filter_equal;
use rand::{Rng, RngCore};

/// 1D taps of the fixed 5x5 Gaussian kernel (binomial, sigma ~1.1)
pub const GAUSSIAN_5_TAPS: [f32; 5] = [0.0625, 0.25, 0.375, 0.25, 0.0625];

/// Mirror the image left to right
pub fn flip_horizontal(img: &RgbImage) -> RgbImage {
    imageops::flip_horizontal(img)
}

/// `pixel * contrast + brightness`, saturated to [0, 255] per channel
pub fn scale_abs(img: &RgbImage, contrast: f32, brightness: i32) -> RgbImage {
    let beta = brightness as f32;
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        for c in pixel.0.iter_mut() {
            *c = (*c as f32 * contrast + beta).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Add zero-mean Gaussian noise drawn independently per pixel and channel
pub fn add_gaussian_noise(img: &RgbImage, std_dev: f32, rng: &mut dyn RngCore) -> RgbImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        for c in pixel.0.iter_mut() {
            let noise = std_dev * standard_normal(rng);
            *c = (*c as f32 + noise).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Box-Muller sample from N(0, 1)
fn standard_normal(rng: &mut dyn RngCore) -> f32 {
    // u1 in (0, 1] keeps ln finite
    let u1: f32 = 1.0 - rng.random::<f32>();
    let u2: f32 = rng.random::<f32>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}

/// Smooth with the fixed 5x5 Gaussian kernel
pub fn gaussian_blur_5x5(img: &RgbImage) -> RgbImage {
    separable_filter_equal(img, &GAUSSIAN_5_TAPS)
}

/// Shift hue by `hue_shift` (mod 180) and scale saturation and value
pub fn jitter_hsv(img: &RgbImage, hue_shift: i32, saturation: f32, value: f32) -> RgbImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        let (h, s, v) = rgb_to_hsv(pixel.0);
        let h = (h + hue_shift as f32).rem_euclid(HUE_RANGE);
        let s = (s * saturation).clamp(0.0, 255.0);
        let v = (v * value).clamp(0.0, 255.0);
        *pixel = Rgb(hsv_to_rgb(h, s, v));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn gradient() -> RgbImage {
        RgbImage::from_fn(8, 4, |x, y| Rgb([(x * 30) as u8, (y * 60) as u8, 100]))
    }

    #[test]
    fn flip_mirrors_columns() {
        let img = gradient();
        let flipped = flip_horizontal(&img);
        assert_eq!(flipped.get_pixel(0, 2), img.get_pixel(7, 2));
        assert_eq!(flipped.get_pixel(7, 0), img.get_pixel(0, 0));
    }

    #[test]
    fn scale_abs_saturates() {
        let img = RgbImage::from_pixel(2, 2, Rgb([0, 100, 250]));
        let out = scale_abs(&img, 1.3, 30);
        assert_eq!(out.get_pixel(0, 0).0, [30, 160, 255]);
        let out = scale_abs(&img, 0.7, -30);
        assert_eq!(out.get_pixel(1, 1).0, [0, 40, 145]);
    }

    #[test]
    fn identity_scale_is_a_no_op() {
        let img = gradient();
        assert_eq!(scale_abs(&img, 1.0, 0), img);
    }

    #[test]
    fn noise_is_reproducible_from_seed() {
        let img = RgbImage::from_pixel(16, 16, Rgb([128, 128, 128]));
        let a = add_gaussian_noise(&img, 15.0, &mut ChaCha8Rng::seed_from_u64(7));
        let b = add_gaussian_noise(&img, 15.0, &mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(a, b);
        assert_ne!(a, img);
    }

    #[test]
    fn blur_keeps_flat_regions_and_dimensions() {
        let img = RgbImage::from_pixel(9, 7, Rgb([40, 80, 120]));
        let out = gaussian_blur_5x5(&img);
        assert_eq!(out.dimensions(), (9, 7));
        let p = out.get_pixel(4, 3).0;
        for (got, want) in p.iter().zip([40u8, 80, 120]) {
            assert!((*got as i32 - want as i32).abs() <= 1);
        }
    }

    #[test]
    fn blur_softens_an_edge() {
        let img = RgbImage::from_fn(10, 3, |x, _| if x < 5 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) });
        let out = gaussian_blur_5x5(&img);
        let left = out.get_pixel(4, 1).0[0];
        let right = out.get_pixel(5, 1).0[0];
        assert!(left > 0 && left < 255);
        assert!(right > 0 && right < 255);
    }

    #[test]
    fn neutral_hsv_jitter_is_close_to_identity() {
        let img = gradient();
        let out = jitter_hsv(&img, 0, 1.0, 1.0);
        for (a, b) in img.pixels().zip(out.pixels()) {
            for c in 0..3 {
                assert!((a.0[c] as i32 - b.0[c] as i32).abs() <= 1);
            }
        }
    }

    #[test]
    fn hue_shift_rotates_red_towards_green() {
        let img = RgbImage::from_pixel(1, 1, Rgb([255, 0, 0]));
        let out = jitter_hsv(&img, 10, 1.0, 1.0);
        let p = out.get_pixel(0, 0).0;
        assert_eq!(p[0], 255);
        assert!(p[1] > 0);
        assert_eq!(p[2], 0);
    }
}
