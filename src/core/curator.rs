use crate::core::discovery::discover_images;
use crate::core::hash::{HashError, PerceptualHash};
use crate::core::predicate::{evaluate, Candidate, CurationPolicy};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};

/// Permutation applied to the kept set before the per-group cap is taken.
pub trait Shuffler {
    fn shuffle(&mut self, candidates: &mut [Candidate]);
}

/// Uniform Fisher-Yates shuffle driven by `R`.
pub struct RandomShuffler<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomShuffler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomShuffler<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Shuffler for RandomShuffler<R> {
    fn shuffle(&mut self, candidates: &mut [Candidate]) {
        candidates.shuffle(&mut self.rng);
    }
}

/// Leaves the order untouched, so selection keeps the first `max_per_group`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityShuffler;

impl Shuffler for IdentityShuffler {
    fn shuffle(&mut self, _candidates: &mut [Candidate]) {}
}

/// What happened to one group during a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupReport {
    pub slug: String,
    pub source_dir: PathBuf,
    pub source_missing: bool,
    /// Image files discovered before any decode.
    pub discovered: usize,
    /// Candidates passing every predicate.
    pub valid: usize,
    /// Candidates left after deduplication.
    pub kept: usize,
    /// Destination paths actually written.
    pub selected: Vec<PathBuf>,
}

impl GroupReport {
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }
}

/// Output file name for a selected candidate: `<slug>__<basename>`.
pub fn output_name(slug: &str, candidate: &Candidate) -> String {
    format!("{}__{}", slug, candidate.file_name())
}

/// Greedy first-wins deduplication over `candidates` in their given order.
///
/// A candidate is kept iff its hash is farther than `threshold` from every
/// hash kept so far. Candidates whose hash cannot be computed are dropped.
pub fn deduplicate<F>(candidates: Vec<Candidate>, threshold: u32, mut hash_of: F) -> Vec<Candidate>
where
    F: FnMut(&Candidate) -> Result<PerceptualHash, HashError>,
{
    let mut kept = Vec::with_capacity(candidates.len());
    let mut hashes: Vec<PerceptualHash> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let hash = match hash_of(&candidate) {
            Ok(hash) => hash,
            Err(e) => {
                log::warn!("hash failed for {}: {}", candidate.path.display(), e);
                continue;
            }
        };

        if let Some(existing) = hashes.iter().find(|existing| hash.distance(existing) <= threshold) {
            log::debug!(
                "dedup skip ({}) {}: {} ~ {}",
                threshold,
                candidate.file_name(),
                hash,
                existing
            );
            continue;
        }

        hashes.push(hash);
        kept.push(candidate);
    }

    kept
}

/// Copy bytes, permissions and access/modification times from `src` to `dest`.
///
/// `fs::copy` has already applied the source permissions, so the times are
/// set through a read-only handle; a read-only source stays copyable.
pub fn copy_with_metadata(src: &Path, dest: &Path) -> io::Result<()> {
    fs::copy(src, dest)?;

    let metadata = fs::metadata(src)?;
    let mut times = FileTimes::new().set_modified(metadata.modified()?);
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    File::open(dest)?.set_times(times)?;
    Ok(())
}

/// Applies a [`CurationPolicy`] to one group at a time.
pub struct Curator<S: Shuffler> {
    policy: CurationPolicy,
    shuffler: S,
}

impl Curator<RandomShuffler<StdRng>> {
    pub fn with_random(policy: CurationPolicy) -> Self {
        Self::new(policy, RandomShuffler::from_entropy())
    }
}

impl<S: Shuffler> Curator<S> {
    pub fn new(policy: CurationPolicy, shuffler: S) -> Self {
        Self { policy, shuffler }
    }

    /// Discover images under `dir` and keep those passing the predicate set.
    ///
    /// Returns the number of discovered image files alongside the survivors.
    pub fn collect_valid(&self, dir: &Path) -> (usize, Vec<Candidate>) {
        let paths = discover_images(dir);
        let discovered = paths.len();

        let valid = paths
            .iter()
            .filter_map(|path| match evaluate(path, &self.policy) {
                Ok(candidate) => Some(candidate),
                Err(rejection) => {
                    log::debug!("skip {}: {}", path.display(), rejection);
                    None
                }
            })
            .collect();

        (discovered, valid)
    }

    /// Shuffle `kept` and truncate it to the policy's cap.
    pub fn select(&mut self, mut kept: Vec<Candidate>) -> Vec<Candidate> {
        if kept.is_empty() {
            return kept;
        }
        self.shuffler.shuffle(&mut kept);
        kept.truncate(self.policy.max_per_group);
        kept
    }

    /// Copy each selected candidate into `curated_dir` under its prefixed name.
    ///
    /// A failed copy is logged and left out of the returned list. Candidates
    /// sharing a basename overwrite each other; the destination is listed once.
    pub fn materialize(&self, slug: &str, selected: &[Candidate], curated_dir: &Path) -> Vec<PathBuf> {
        let mut written: Vec<PathBuf> = Vec::with_capacity(selected.len());
        for candidate in selected {
            let dest = curated_dir.join(output_name(slug, candidate));
            match copy_with_metadata(&candidate.path, &dest) {
                Ok(()) if written.contains(&dest) => {
                    log::debug!("overwrote {} with {}", dest.display(), candidate.path.display())
                }
                Ok(()) => written.push(dest),
                Err(e) => log::warn!(
                    "copy failed {} → {}: {}",
                    candidate.path.display(),
                    dest.display(),
                    e
                ),
            }
        }
        written
    }

    /// Curate `<download_root>/<slug>` into the flat `curated_dir`.
    ///
    /// Never fails: missing sources, bad files and failed copies only shrink
    /// the result.
    pub fn curate_group(&mut self, slug: &str, download_root: &Path, curated_dir: &Path) -> GroupReport {
        let source_dir = download_root.join(slug);
        let mut report = GroupReport {
            slug: slug.to_string(),
            source_dir: source_dir.clone(),
            ..GroupReport::default()
        };

        if !source_dir.is_dir() {
            log::warn!("No download dir for {}, skipping.", slug);
            report.source_missing = true;
            return report;
        }

        let (discovered, valid) = self.collect_valid(&source_dir);
        report.discovered = discovered;
        report.valid = valid.len();

        let kept = match self.policy.dedup_hamming {
            Some(threshold) => {
                deduplicate(valid, threshold, |c| PerceptualHash::from_path(&c.path))
            }
            None => valid,
        };
        report.kept = kept.len();

        if kept.is_empty() {
            log::info!(
                "No valid landscape images (>= {}x{}) for {}",
                self.policy.min_width,
                self.policy.min_height,
                slug
            );
            return report;
        }

        let selected = self.select(kept);
        log::info!(
            "{}: {} valid images, selecting {}",
            slug,
            report.kept,
            selected.len()
        );

        report.selected = self.materialize(slug, &selected, curated_dir);
        report
    }
}
