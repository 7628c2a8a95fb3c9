use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb};
use std::path::Path;
use thiserror::Error;

/// Longest edge of the thumbnail the estimate is computed on.
pub const SAMPLE_SIZE: u32 = 512;

#[derive(Debug, Error)]
pub enum SaturationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// HSV saturation of one pixel on the 0-255 scale.
fn pixel_saturation(Rgb([r, g, b]): Rgb<u8>) -> u8 {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max == 0 {
        return 0;
    }
    (u32::from(max - min) * 255 / u32::from(max)) as u8
}

fn median(values: &mut [u8]) -> f64 {
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (f64::from(values[mid - 1]) + f64::from(values[mid])) / 2.0
    } else {
        f64::from(values[mid])
    }
}

/// Median saturation of `img` in `[0, 1]`.
///
/// The median keeps a mostly grey image with a few vivid highlights low.
/// Images larger than [`SAMPLE_SIZE`] are downscaled first, preserving aspect.
pub fn estimate_saturation(img: &DynamicImage) -> f64 {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }

    let sample = if width > SAMPLE_SIZE || height > SAMPLE_SIZE {
        img.resize(SAMPLE_SIZE, SAMPLE_SIZE, FilterType::Triangle)
    } else {
        img.clone()
    };

    let mut sats: Vec<u8> = sample.to_rgb8().pixels().map(|&p| pixel_saturation(p)).collect();
    if sats.is_empty() {
        return 0.0;
    }

    median(&mut sats) / 255.0
}

/// Decode the file at `path` and estimate its saturation.
pub fn estimate_saturation_at(path: &Path) -> Result<f64, SaturationError> {
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?;
    Ok(estimate_saturation(&img))
}
