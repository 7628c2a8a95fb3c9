use image::{imageops::FilterType, DynamicImage};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Side length of the sampling grid. 8×8 gives a 64-bit fingerprint.
pub const HASH_GRID: u32 = 8;

/// Upper bound of [`PerceptualHash::distance`].
pub const MAX_DISTANCE: u32 = HASH_GRID * HASH_GRID;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// Average hash (aHash) of an image's coarse luminance structure.
///
/// Bit 63 is the top-left sample and bit 0 the bottom-right one; a bit is
/// set when its sample is at or above the grid mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PerceptualHash(pub u64);

impl PerceptualHash {
    /// Hash an already decoded image.
    pub fn from_image(img: &DynamicImage) -> Self {
        let luma = img.to_luma8();
        let grid = image::imageops::resize(&luma, HASH_GRID, HASH_GRID, FilterType::Triangle);
        let samples: Vec<u8> = grid.pixels().map(|p| p.0[0]).collect();

        if samples.is_empty() {
            return Self(0);
        }

        let mean = samples.iter().map(|&s| f64::from(s)).sum::<f64>() / samples.len() as f64;
        let bits = samples.iter().fold(0u64, |bits, &s| {
            (bits << 1) | u64::from(f64::from(s) >= mean)
        });

        Self(bits)
    }

    /// Decode the file at `path` and hash it.
    pub fn from_path(path: &Path) -> Result<Self, HashError> {
        let img = image::ImageReader::open(path)?
            .with_guessed_format()?
            .decode()?;
        Ok(Self::from_image(&img))
    }

    /// Hamming distance: number of differing bits, in `0..=MAX_DISTANCE`.
    pub fn distance(&self, other: &PerceptualHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

impl fmt::Display for PerceptualHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// 64×64 image split into dark and light blocks along a fixed pattern.
    fn blocks(dark: [u8; 3], light: [u8; 3]) -> DynamicImage {
        let img = RgbImage::from_fn(64, 64, |x, y| {
            if (x / 16 + y / 32) % 2 == 0 {
                Rgb(dark)
            } else {
                Rgb(light)
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    fn gradient() -> DynamicImage {
        let img = RgbImage::from_fn(64, 64, |x, y| {
            let v = ((x * 3 + y) % 256) as u8;
            Rgb([v, v / 2, 255 - v])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_identical_images_have_zero_distance() {
        for img in [blocks([20, 20, 20], [230, 230, 230]), gradient()] {
            let a = PerceptualHash::from_image(&img);
            let b = PerceptualHash::from_image(&img.clone());
            assert_eq!(a.distance(&a), 0);
            assert_eq!(a.distance(&b), 0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = PerceptualHash::from_image(&blocks([20, 20, 20], [230, 230, 230]));
        let b = PerceptualHash::from_image(&gradient());
        assert_eq!(a.distance(&b), b.distance(&a));
    }

    #[test]
    fn test_distance_zero_only_for_equal_hashes() {
        let a = PerceptualHash(0b1011);
        let b = PerceptualHash(0b1010);
        assert_eq!(a.distance(&b), 1);
        assert_ne!(a, b);
        assert_eq!(PerceptualHash(0).distance(&PerceptualHash(u64::MAX)), MAX_DISTANCE);
    }

    #[test]
    fn test_triangle_inequality() {
        let hashes = [
            PerceptualHash::from_image(&blocks([20, 20, 20], [230, 230, 230])),
            PerceptualHash::from_image(&blocks([230, 230, 230], [20, 20, 20])),
            PerceptualHash::from_image(&gradient()),
            PerceptualHash(0xdead_beef_0000_ffff),
        ];
        for a in &hashes {
            for b in &hashes {
                for c in &hashes {
                    assert!(a.distance(c) <= a.distance(b) + b.distance(c));
                }
            }
        }
    }

    #[test]
    fn test_small_perturbation_gives_small_distance() {
        let base = PerceptualHash::from_image(&blocks([40, 60, 80], [200, 180, 160]));
        let nudged = PerceptualHash::from_image(&blocks([42, 62, 82], [202, 182, 162]));
        assert!(base.distance(&nudged) <= 5);
    }

    #[test]
    fn test_inverted_regions_give_large_distance() {
        let a = PerceptualHash::from_image(&blocks([0, 0, 0], [255, 255, 255]));
        let b = PerceptualHash::from_image(&blocks([255, 255, 255], [0, 0, 0]));
        assert!(a.distance(&b) > 20);
    }

    #[test]
    fn test_from_path_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(PerceptualHash::from_path(&path).is_err());
    }

    #[test]
    fn test_display_is_fixed_width_hex() {
        assert_eq!(PerceptualHash(0xff).to_string(), "00000000000000ff");
    }
}
