use crate::core::saturation::estimate_saturation_at;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const MIN_WIDTH: u32 = 1920;
pub const MIN_HEIGHT: u32 = 1080;
pub const MAX_PER_GROUP: usize = 25;

/// Saturation threshold used by `--skip-bw`.
pub const SKIP_BW_SATURATION: f64 = 0.08;

/// Thresholds and limits governing one curation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurationPolicy {
    pub min_width: u32,
    pub min_height: u32,
    pub landscape_only: bool,
    /// Minimum median saturation; `None` or `<= 0` disables the check.
    pub min_saturation: Option<f64>,
    /// Hamming distance at or below which a later image counts as a duplicate.
    pub dedup_hamming: Option<u32>,
    pub max_per_group: usize,
}

impl Default for CurationPolicy {
    fn default() -> Self {
        Self {
            min_width: MIN_WIDTH,
            min_height: MIN_HEIGHT,
            landscape_only: true,
            min_saturation: None,
            dedup_hamming: None,
            max_per_group: MAX_PER_GROUP,
        }
    }
}

impl CurationPolicy {
    fn saturation_threshold(&self) -> Option<f64> {
        self.min_saturation.filter(|&t| t > 0.0)
    }
}

/// An image file that passed every active predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Only computed when the policy has a saturation threshold.
    pub saturation: Option<f64>,
}

impl Candidate {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned()
    }
}

/// Why an image failed the predicate set.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Undecodable { reason: String },
    Portrait { width: u32, height: u32 },
    TooSmall { width: u32, height: u32 },
    SaturationUnavailable { reason: String },
    LowSaturation { saturation: f64, threshold: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Undecodable { reason } => write!(f, "not a readable image: {reason}"),
            Rejection::Portrait { width, height } => write!(f, "portrait ({width}x{height})"),
            Rejection::TooSmall { width, height } => write!(f, "too small ({width}x{height})"),
            Rejection::SaturationUnavailable { reason } => {
                write!(f, "saturation unavailable: {reason}")
            }
            Rejection::LowSaturation {
                saturation,
                threshold,
            } => write!(f, "saturation {saturation:.3} below {threshold:.3}"),
        }
    }
}

/// Size and orientation checks, in order. Pure so they can be tested without files.
pub fn check_dimensions(width: u32, height: u32, policy: &CurationPolicy) -> Result<(), Rejection> {
    if policy.landscape_only && width < height {
        return Err(Rejection::Portrait { width, height });
    }
    if width < policy.min_width || height < policy.min_height {
        return Err(Rejection::TooSmall { width, height });
    }
    Ok(())
}

/// Run the predicate set against the file at `path`, cheapest checks first.
///
/// Only the header is read for the size checks; the full decode happens
/// when a saturation threshold is active.
pub fn evaluate(path: &Path, policy: &CurationPolicy) -> Result<Candidate, Rejection> {
    let (width, height) = image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(image::ImageError::from)
        .and_then(|reader| reader.into_dimensions())
        .map_err(|e| Rejection::Undecodable {
            reason: e.to_string(),
        })?;

    check_dimensions(width, height, policy)?;

    let saturation = match policy.saturation_threshold() {
        Some(threshold) => {
            let saturation =
                estimate_saturation_at(path).map_err(|e| Rejection::SaturationUnavailable {
                    reason: e.to_string(),
                })?;
            if saturation < threshold {
                return Err(Rejection::LowSaturation {
                    saturation,
                    threshold,
                });
            }
            Some(saturation)
        }
        None => None,
    };

    Ok(Candidate {
        path: path.to_path_buf(),
        width,
        height,
        saturation,
    })
}
