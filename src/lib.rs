//! Wallpaper pipeline: download per-artist galleries, then curate them into
//! a flat directory of landscape, high-resolution, de-duplicated images.

pub mod config;
pub mod core;
pub mod download;

pub use crate::core::curator::{
    Curator, GroupReport, IdentityShuffler, RandomShuffler, Shuffler,
};
pub use crate::core::hash::PerceptualHash;
pub use crate::core::pipeline::{Pipeline, RunReport};
pub use crate::core::predicate::{Candidate, CurationPolicy, Rejection};
pub use config::{Config, PathOverrides, ResolvedPaths};
pub use download::{DownloadError, Downloader};
