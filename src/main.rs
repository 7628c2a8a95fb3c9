use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use wallcurate::config::{config_search_order, Config, PathOverrides};
use wallcurate::core::pipeline::group_progress_bar;
use wallcurate::core::predicate::{CurationPolicy, MAX_PER_GROUP, SKIP_BW_SATURATION};
use wallcurate::download::{Downloader, DEFAULT_ABORT_AFTER};
use wallcurate::{Curator, Pipeline, RandomShuffler};

#[derive(Parser, Debug)]
#[command(name = "wallcurate", version, about = "Download and curate wallpapers per artist")]
struct Cli {
    /// Read configuration from this file only
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Show per-file diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Step 1: download/update raw images per artist using gallery-dl
    Download {
        /// Directory for per-artist downloads
        #[arg(value_name = "DIR")]
        download_dir: Option<PathBuf>,
        /// Stop gallery-dl after N consecutive skipped files (0 disables)
        #[arg(long, value_name = "N", default_value_t = DEFAULT_ABORT_AFTER)]
        abort_after: u32,
    },

    /// Step 2: curate wallpapers from the downloaded pool into a flat directory
    Curate {
        /// Source directory containing per-artist downloads
        #[arg(value_name = "DIR")]
        download_dir: Option<PathBuf>,
        /// Destination flat directory for curated wallpapers
        #[arg(value_name = "DIR")]
        curated_dir: Option<PathBuf>,
        /// Do not wipe the curated directory before curating
        #[arg(long)]
        no_clear: bool,
        /// Minimum median saturation (0-1) to keep an image
        #[arg(long, value_name = "F")]
        min_saturation: Option<f64>,
        /// Shorthand for --min-saturation 0.08
        #[arg(long)]
        skip_bw: bool,
        /// Skip images within this aHash distance of an earlier one (e.g. 5-10)
        #[arg(long, value_name = "N")]
        dedup_hamming: Option<u32>,
        /// Maximum curated images per artist
        #[arg(long, value_name = "N", default_value_t = MAX_PER_GROUP)]
        max_per_artist: usize,
        /// Seed the shuffle for a reproducible selection
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,
        /// Only curate these artists (repeatable)
        #[arg(long = "artist", value_name = "SLUG")]
        artists: Vec<String>,
        /// Write a JSON summary of the run
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut clog = colog::default_builder();
    clog.filter(
        None,
        if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        },
    );
    clog.init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load(&config_search_order()),
    };

    match cli.command {
        Commands::Download {
            download_dir,
            abort_after,
        } => {
            let paths = config.resolve_paths(&PathOverrides {
                download_root: download_dir,
                ..PathOverrides::default()
            });
            let artists = config.artist_sources();

            println!("▶ Downloading {} artist(s) into {}", artists.len(), paths.download_root.display());
            let report = benchmark("downloading", || {
                Downloader::system(abort_after).download_artists(&artists, &paths.download_root)
            })?;

            println!(
                "✅ {}/{} download(s) succeeded",
                report.succeeded, report.attempted
            );
            for failure in &report.failures {
                println!("   ⚠️  {} ({}): {}", failure.slug, failure.url, failure.reason);
            }
        }

        Commands::Curate {
            download_dir,
            curated_dir,
            no_clear,
            min_saturation,
            skip_bw,
            dedup_hamming,
            max_per_artist,
            seed,
            artists,
            report,
        } => {
            let paths = config.resolve_paths(&PathOverrides {
                download_root: download_dir,
                curated_dir,
                ..PathOverrides::default()
            });

            let policy = CurationPolicy {
                min_saturation: min_saturation.or(skip_bw.then_some(SKIP_BW_SATURATION)),
                dedup_hamming,
                max_per_group: max_per_artist,
                ..CurationPolicy::default()
            };

            let slugs: Vec<String> = if artists.is_empty() {
                config.artist_sources().into_keys().collect()
            } else {
                artists
            };

            fs::create_dir_all(&paths.download_root).with_context(|| {
                format!("Failed to create directory {:?}", paths.download_root)
            })?;

            let curator = match seed {
                Some(seed) => Curator::new(policy, RandomShuffler::seeded(seed)),
                None => Curator::with_random(policy),
            };
            let mut pipeline = Pipeline::new(curator).with_progress(group_progress_bar()?);

            let run = benchmark("curating", || {
                pipeline.run(&slugs, &paths.download_root, &paths.curated_dir, !no_clear)
            })?;

            println!("\n✨ Curated {} artist(s):", run.groups.len());
            for group in &run.groups {
                if group.source_missing {
                    println!("   ⚠️  {}: no download dir", group.slug);
                } else {
                    println!(
                        "   ▶ {}: {} valid, {} after dedup, {} selected",
                        group.slug,
                        group.valid,
                        group.kept,
                        group.selected_count()
                    );
                }
            }
            println!("✅ {} image(s) in {}", run.total_selected(), run.curated_dir.display());

            if let Some(report_path) = report {
                let json = serde_json::to_string_pretty(&run)?;
                fs::write(&report_path, json)
                    .with_context(|| format!("Failed to write report {:?}", report_path))?;
                println!("🗂️  Wrote run report to {}", report_path.display());
            }
        }
    }

    Ok(())
}

/// Run `f()`, print how long it took (with `label`), and return its result.
fn benchmark<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    println!("⏱ {} took {:.2?}", label, start.elapsed());
    result
}
