//! Configuration for the wallpaper pipeline.
//!
//! A TOML file provides path overrides and the artist table:
//!
//! ```toml
//! [paths]
//! wallpaper_root = "~/Pictures/wallpaper"
//! download_root = "~/Pictures/wallpaper/downloaded"
//! curated_dir = "~/Pictures/wallpaper/curated"
//!
//! [artists]
//! sparth = ["https://www.artstation.com/sparth"]
//! ```
//!
//! Nothing here caches: callers load once and hold on to the [`Config`].

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a config file that takes precedence over the defaults.
pub const CONFIG_ENV: &str = "WALLPIPE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub wallpaper_root: Option<PathBuf>,
    pub download_root: Option<PathBuf>,
    pub curated_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub artists: BTreeMap<String, Vec<String>>,
    /// File the config was read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Explicit path overrides, usually from the command line.
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub wallpaper_root: Option<PathBuf>,
    pub download_root: Option<PathBuf>,
    pub curated_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub wallpaper_root: PathBuf,
    pub download_root: PathBuf,
    pub curated_dir: PathBuf,
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

pub fn default_wallpaper_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join("Pictures")
        .join("wallpaper")
}

/// Locations checked for a config file, first existing one wins:
/// `$WALLPIPE_CONFIG`, `./wallpipe.toml`, then `<config dir>/wallpipe/config.toml`.
pub fn config_search_order() -> Vec<PathBuf> {
    let env_path = std::env::var_os(CONFIG_ENV)
        .filter(|value| !value.is_empty())
        .map(|value| expand_home(Path::new(&value)));

    let mut order: Vec<PathBuf> = env_path.into_iter().collect();
    if let Ok(cwd) = std::env::current_dir() {
        order.push(cwd.join("wallpipe.toml"));
    }
    if let Some(config_dir) = dirs::config_dir() {
        order.push(config_dir.join("wallpipe").join("config.toml"));
    }
    order
}

impl Config {
    /// Read and parse one config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Load the first existing file in `search_order`.
    ///
    /// No file means defaults. A file that exists but cannot be read or
    /// parsed is reported and also yields defaults; later candidates are not
    /// consulted.
    pub fn load(search_order: &[PathBuf]) -> Self {
        let Some(path) = search_order.iter().find(|p| p.is_file()) else {
            log::debug!("no config file found, using defaults");
            return Self::default();
        };

        match Self::from_file(path) {
            Ok(config) => {
                log::debug!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Resolve paths: explicit override, then config value, then default.
    pub fn resolve_paths(&self, overrides: &PathOverrides) -> ResolvedPaths {
        let wallpaper_root = overrides
            .wallpaper_root
            .clone()
            .or_else(|| self.paths.wallpaper_root.clone())
            .map(|p| expand_home(&p))
            .unwrap_or_else(default_wallpaper_root);

        let download_root = overrides
            .download_root
            .clone()
            .or_else(|| self.paths.download_root.clone())
            .map(|p| expand_home(&p))
            .unwrap_or_else(|| wallpaper_root.join("downloaded"));

        let curated_dir = overrides
            .curated_dir
            .clone()
            .or_else(|| self.paths.curated_dir.clone())
            .map(|p| expand_home(&p))
            .unwrap_or_else(|| wallpaper_root.join("curated"));

        ResolvedPaths {
            wallpaper_root,
            download_root,
            curated_dir,
        }
    }

    /// Artist slug → gallery URLs. The `[artists]` table wins when non-empty.
    pub fn artist_sources(&self) -> BTreeMap<String, Vec<String>> {
        if self.artists.is_empty() {
            default_artist_sources()
        } else {
            self.artists.clone()
        }
    }
}

pub fn default_artist_sources() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 8] = [
        (
            "maciej_kuciara",
            &[
                "https://www.artstation.com/maciej",
                "https://www.behance.net/maciejkuciara",
            ],
        ),
        (
            "jama_jurabaev",
            &[
                "https://www.artstation.com/jama",
                "https://jamajurabaev.deviantart.com/",
            ],
        ),
        (
            "ian_mcque",
            &[
                "https://www.artstation.com/mcque65",
                "https://mcque.deviantart.com/",
            ],
        ),
        (
            "paul_chadeisson",
            &[
                "https://www.artstation.com/pao",
                "https://www.behance.net/paulchadei99e8",
                "https://paooo.deviantart.com/",
            ],
        ),
        ("sparth", &["https://www.artstation.com/sparth"]),
        (
            "jan_urschel",
            &[
                "https://www.artstation.com/janurschel",
                "https://www.behance.net/janurschel",
                "https://janurschel.deviantart.com/",
            ],
        ),
        ("rob_tuytel", &["https://www.artstation.com/tuytel"]),
        (
            "ian_hubert",
            &[
                "https://www.artstation.com/ianhubert",
                "https://www.deviantart.com/mrdodobird",
            ],
        ),
    ];

    table
        .iter()
        .map(|(slug, urls)| {
            (
                slug.to_string(),
                urls.iter().map(|u| u.to_string()).collect(),
            )
        })
        .collect()
}
