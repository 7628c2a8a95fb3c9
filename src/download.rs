//! Step 1: fetch raw images per artist with `gallery-dl`.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

pub const GALLERY_DL: &str = "gallery-dl";

/// Stop after this many consecutive skipped files unless overridden.
pub const DEFAULT_ABORT_AFTER: u32 = 20;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("`{program}` not found on PATH")]
    ToolNotFound { program: String },

    #[error("`{program}` exited with {}", describe_exit(.code))]
    ToolFailed { program: String, code: Option<i32> },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}

/// Runs an external program to completion.
pub trait ToolRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<(), DownloadError>;
}

/// [`ToolRunner`] backed by `std::process::Command`, inheriting stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<(), DownloadError> {
        let status = Command::new(program).args(args).status().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                DownloadError::ToolNotFound {
                    program: program.to_string(),
                }
            } else {
                DownloadError::Io(e)
            }
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(DownloadError::ToolFailed {
                program: program.to_string(),
                code: status.code(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadFailure {
    pub slug: String,
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<DownloadFailure>,
}

pub struct Downloader<R: ToolRunner> {
    runner: R,
    abort_after: u32,
}

impl Downloader<SystemRunner> {
    pub fn system(abort_after: u32) -> Self {
        Self::new(SystemRunner, abort_after)
    }
}

impl<R: ToolRunner> Downloader<R> {
    /// `abort_after == 0` disables gallery-dl's early abort.
    pub fn new(runner: R, abort_after: u32) -> Self {
        Self {
            runner,
            abort_after,
        }
    }

    /// Arguments for one `gallery-dl` invocation.
    pub fn command_args(&self, target_dir: &Path, url: &str) -> Vec<String> {
        let mut args = vec!["-d".to_string(), target_dir.to_string_lossy().into_owned()];
        if self.abort_after > 0 {
            args.push("--abort".to_string());
            args.push(self.abort_after.to_string());
        }
        args.push(url.to_string());
        args
    }

    /// Download one URL into `target_dir`, creating it first.
    pub fn download_url(&self, target_dir: &Path, url: &str) -> Result<(), DownloadError> {
        std::fs::create_dir_all(target_dir)?;
        log::info!("[{}] {} → {}", GALLERY_DL, url, target_dir.display());
        self.runner.run(GALLERY_DL, &self.command_args(target_dir, url))
    }

    /// Download every artist's URLs into `<download_root>/<slug>`.
    ///
    /// A missing tool or a failed invocation is reported and the remaining
    /// URLs are still attempted.
    pub fn download_artists(
        &self,
        artists: &BTreeMap<String, Vec<String>>,
        download_root: &Path,
    ) -> Result<DownloadReport, DownloadError> {
        std::fs::create_dir_all(download_root)?;

        let mut report = DownloadReport::default();
        for (slug, urls) in artists {
            let target_dir: PathBuf = download_root.join(slug);
            for url in urls {
                report.attempted += 1;
                match self.download_url(&target_dir, url) {
                    Ok(()) => report.succeeded += 1,
                    Err(e) => {
                        match &e {
                            DownloadError::ToolNotFound { program } => log::error!(
                                "`{}` not found. Install it, e.g. `pip install --user {}`",
                                program,
                                program
                            ),
                            DownloadError::ToolFailed { program, .. } => {
                                log::error!("{} failed for {} ({}): {}", program, slug, url, e)
                            }
                            DownloadError::Io(_) => {
                                log::error!("download failed for {} ({}): {}", slug, url, e)
                            }
                        }
                        report.failures.push(DownloadFailure {
                            slug: slug.clone(),
                            url: url.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Records invocations and answers each with a canned outcome.
    struct FakeRunner {
        calls: RefCell<Vec<(String, Vec<String>)>>,
        outcome: fn() -> Result<(), DownloadError>,
    }

    impl FakeRunner {
        fn new(outcome: fn() -> Result<(), DownloadError>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                outcome,
            }
        }
    }

    impl ToolRunner for &FakeRunner {
        fn run(&self, program: &str, args: &[String]) -> Result<(), DownloadError> {
            self.calls
                .borrow_mut()
                .push((program.to_string(), args.to_vec()));
            (self.outcome)()
        }
    }

    fn artists() -> BTreeMap<String, Vec<String>> {
        BTreeMap::from([
            (
                "a".to_string(),
                vec![
                    "http://example.com/1".to_string(),
                    "http://example.com/2".to_string(),
                ],
            ),
            ("b".to_string(), vec!["http://example.com/3".to_string()]),
        ])
    }

    #[test]
    fn test_invokes_gallery_dl_per_url() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("_dl");
        let runner = FakeRunner::new(|| Ok(()));

        let report = Downloader::new(&runner, DEFAULT_ABORT_AFTER)
            .download_artists(&artists(), &target)
            .unwrap();

        assert!(target.join("a").is_dir());
        assert!(target.join("b").is_dir());
        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded, 3);

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|(program, _)| program == GALLERY_DL));
        assert_eq!(
            calls[0].1,
            vec![
                "-d".to_string(),
                target.join("a").to_string_lossy().into_owned(),
                "--abort".to_string(),
                "20".to_string(),
                "http://example.com/1".to_string(),
            ]
        );
    }

    #[test]
    fn test_abort_zero_omits_flag() {
        let runner = FakeRunner::new(|| Ok(()));
        let args = Downloader::new(&runner, 0).command_args(Path::new("/x"), "http://u");
        assert_eq!(args, vec!["-d", "/x", "http://u"]);
    }

    #[test]
    fn test_missing_binary_is_reported_and_does_not_stop_others() {
        let tmp = TempDir::new().unwrap();
        let runner = FakeRunner::new(|| {
            Err(DownloadError::ToolNotFound {
                program: GALLERY_DL.to_string(),
            })
        });

        let report = Downloader::new(&runner, 5)
            .download_artists(&artists(), tmp.path())
            .unwrap();

        assert_eq!(runner.calls.borrow().len(), 3);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failures.len(), 3);
        assert!(report.failures[0].reason.contains("not found"));
    }

    #[test]
    fn test_failed_exit_is_distinct_from_missing_binary() {
        let tmp = TempDir::new().unwrap();
        let runner = FakeRunner::new(|| {
            Err(DownloadError::ToolFailed {
                program: GALLERY_DL.to_string(),
                code: Some(3),
            })
        });

        let report = Downloader::new(&runner, 5)
            .download_artists(&artists(), tmp.path())
            .unwrap();

        assert_eq!(report.failures.len(), 3);
        assert_eq!(report.failures[0].slug, "a");
        assert!(report.failures[0].reason.contains("code 3"));
        assert!(!report.failures[0].reason.contains("not found"));
    }

    #[test]
    fn test_system_runner_detects_missing_program() {
        let result = SystemRunner.run("wallcurate-definitely-missing-tool", &[]);
        assert!(matches!(result, Err(DownloadError::ToolNotFound { .. })));
    }
}
