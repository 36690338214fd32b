//! Visual complexity measurement.
//!
//! Complexity is the Shannon entropy of the 8-bit luminance histogram. Flat
//! artwork (logos, screenshots of text) lands near zero; photographs usually
//! land well above 6.

use image::{DynamicImage, GrayImage};

use crate::types::ComplexityScore;

use super::decode::DecodedImage;

/// Number of histogram bins (one per 8-bit luminance level).
pub const HISTOGRAM_BINS: usize = 256;

/// Computes a [`ComplexityScore`] from decoded pixels.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComplexityAnalyzer;

impl ComplexityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Score a decoded image.
    pub fn analyze(&self, decoded: &DecodedImage) -> ComplexityScore {
        self.analyze_image(&decoded.image)
    }

    /// Score a raw image. Multi-channel images are reduced to luminance first.
    pub fn analyze_image(&self, image: &DynamicImage) -> ComplexityScore {
        let histogram = match image {
            DynamicImage::ImageLuma8(gray) => luminance_histogram(gray),
            other => luminance_histogram(&other.to_luma8()),
        };
        entropy(&histogram)
    }
}

/// Count pixels per luminance level.
pub fn luminance_histogram(gray: &GrayImage) -> [u64; HISTOGRAM_BINS] {
    let mut histogram = [0u64; HISTOGRAM_BINS];
    for &level in gray.as_raw() {
        histogram[level as usize] += 1;
    }
    histogram
}

/// Shannon entropy in bits of a histogram, over its non-zero bins.
///
/// An empty histogram scores zero.
pub fn entropy(histogram: &[u64]) -> ComplexityScore {
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return ComplexityScore::ZERO;
    }

    let total = total as f64;
    let bits: f64 = histogram
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum();

    // A single occupied bin yields -1·log2(1) = -0.0; normalize the sign.
    if bits <= 0.0 {
        return ComplexityScore::ZERO;
    }
    ComplexityScore(bits.min(ComplexityScore::MAX.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbImage, RgbaImage};

    #[test]
    fn test_flat_image_has_zero_entropy() {
        let pixels = RgbImage::from_pixel(64, 64, image::Rgb([200, 40, 90]));
        let img = DynamicImage::ImageRgb8(pixels);
        let score = ComplexityAnalyzer::new().analyze_image(&img);
        assert_eq!(score, ComplexityScore::ZERO);
        assert!(score.value().is_sign_positive());
    }

    #[test]
    fn test_uniform_histogram_has_eight_bits() {
        // Every luminance level appears exactly 4 times
        let gray = GrayImage::from_fn(256, 4, |x, _| Luma([x as u8]));
        let score = ComplexityAnalyzer::new().analyze_image(&DynamicImage::ImageLuma8(gray));
        assert!((score.value() - 8.0).abs() < 1e-9, "got {}", score);
    }

    #[test]
    fn test_two_levels_give_one_bit() {
        let gray = GrayImage::from_fn(10, 10, |x, _| Luma([if x < 5 { 0 } else { 255 }]));
        let score = ComplexityAnalyzer::new().analyze_image(&DynamicImage::ImageLuma8(gray));
        assert!((score.value() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_histogram_is_zero() {
        assert_eq!(entropy(&[0u64; HISTOGRAM_BINS]), ComplexityScore::ZERO);
        assert_eq!(entropy(&[]), ComplexityScore::ZERO);
    }

    #[test]
    fn test_zero_sized_image_is_zero() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
        assert_eq!(
            ComplexityAnalyzer::new().analyze_image(&img),
            ComplexityScore::ZERO
        );
    }

    #[test]
    fn test_gradient_scores_high() {
        let img = RgbImage::from_fn(512, 64, |x, y| {
            let v = ((x + y) % 256) as u8;
            image::Rgb([v, v, v])
        });
        let score = ComplexityAnalyzer::new().analyze_image(&DynamicImage::ImageRgb8(img));
        assert!(score.value() > 7.5);
        assert!(score <= ComplexityScore::MAX);
    }

    #[test]
    fn test_histogram_counts_every_pixel() {
        let gray = GrayImage::from_fn(7, 3, |x, _| Luma([x as u8]));
        let histogram = luminance_histogram(&gray);
        assert_eq!(histogram.iter().sum::<u64>(), 21);
        assert_eq!(histogram[0], 3);
        assert_eq!(histogram[6], 3);
        assert_eq!(histogram[7], 0);
    }
}
