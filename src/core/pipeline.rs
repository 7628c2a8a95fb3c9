use crate::core::curator::{Curator, GroupReport, Shuffler};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Aggregated outcome of one curation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub finished_at: DateTime<Utc>,
    pub curated_dir: PathBuf,
    pub cleared: usize,
    pub groups: Vec<GroupReport>,
}

impl RunReport {
    pub fn total_selected(&self) -> usize {
        self.groups.iter().map(GroupReport::selected_count).sum()
    }
}

/// Remove regular files directly inside `dir`. Subdirectories are left alone.
///
/// Returns the number of files removed.
pub fn clear_flat_files(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {:?}", dir))? {
        let path = entry?.path();
        if path.is_file() {
            fs::remove_file(&path).with_context(|| format!("Failed to remove {:?}", path))?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Drives a [`Curator`] over every group and owns the destination lifecycle.
pub struct Pipeline<S: Shuffler> {
    curator: Curator<S>,
    progress: ProgressBar,
}

impl<S: Shuffler> Pipeline<S> {
    pub fn new(curator: Curator<S>) -> Self {
        Self {
            curator,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Curate every group in `groups` from `download_root` into `curated_dir`.
    ///
    /// With `clear_curated`, flat files already in `curated_dir` are removed
    /// once before the first group. Only failing to prepare the destination
    /// is an error; group-level problems end up in the report.
    pub fn run<I, G>(
        &mut self,
        groups: I,
        download_root: &Path,
        curated_dir: &Path,
        clear_curated: bool,
    ) -> Result<RunReport>
    where
        I: IntoIterator<Item = G>,
        G: AsRef<str>,
    {
        fs::create_dir_all(curated_dir)
            .with_context(|| format!("Failed to create directory {:?}", curated_dir))?;

        let cleared = if clear_curated {
            let removed = clear_flat_files(curated_dir)?;
            log::debug!("cleared {} file(s) from {}", removed, curated_dir.display());
            removed
        } else {
            0
        };

        let groups: Vec<G> = groups.into_iter().collect();
        self.progress.set_length(groups.len() as u64);
        log::info!("Filtering and balancing per artist...");

        let mut reports = Vec::with_capacity(groups.len());
        for slug in &groups {
            let slug = slug.as_ref();
            self.progress.set_message(slug.to_string());
            let report = self.curator.curate_group(slug, download_root, curated_dir);
            reports.push(report);
            self.progress.inc(1);
        }
        self.progress.finish_and_clear();

        let report = RunReport {
            finished_at: Utc::now(),
            curated_dir: curated_dir.to_path_buf(),
            cleared,
            groups: reports,
        };

        log::info!(
            "Done: {} image(s) from {} group(s)",
            report.total_selected(),
            report.groups.len()
        );
        log::info!("Output directory: {}", curated_dir.display());
        Ok(report)
    }
}

/// Progress bar the CLI hands to [`Pipeline::with_progress`].
pub fn group_progress_bar() -> Result<ProgressBar> {
    let bar = ProgressBar::new(0);
    bar.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}",
    )?);
    Ok(bar)
}
