//! `tiger-fetch` downloads Census TIGER/Line archives and extracts them into the dataset
//! directory layout the loader expects.
//!
//! A fetch resolves the requested geographies to remote directories under
//! `{base_url}/TIGER{year}/`, lists the archives each directory links, keeps those
//! relevant to the requested states, then downloads and extracts them one at a time.
//!
//! # Examples
//!
//! ```no_run
//! use tiger_fetch::{FetchConfig, fetch};
//!
//! # async fn run() -> tiger_fetch::Result<()> {
//! let config = FetchConfig {
//!     states: vec!["OR".to_string()],
//!     geographies: vec!["tract".to_string()],
//!     ..FetchConfig::default()
//! };
//! let report = fetch(&config).await?;
//! println!("{} archive(s) extracted", report.archives.len());
//! # Ok(())
//! # }
//! ```

pub mod download;
pub mod listing;
pub mod states;

use std::path::{Path, PathBuf};

use chrono::Datelike;
use log::{info, warn};
use reqwest::Client;
use thiserror::Error;
use tiger_core::geography::{find_by_remote_dir, find_geography_type, get_geography_types};

use crate::download::{download_archive, extract_archive};
use crate::listing::{filter_for_state, parse_listing, remote_dir_url};

/// Census server root holding the `TIGER{year}` directories.
pub const DEFAULT_BASE_URL: &str = "https://www2.census.gov/geo/tiger";

/// Earliest TIGER/Line year with the archive layout this crate understands.
pub const FIRST_YEAR: u16 = 2010;

/// Errors raised while fetching archives.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP request failed or returned a non-success status
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A local file or directory could not be read or written
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// The file or directory
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// A downloaded archive is not a valid zip file
    #[error("Failed to extract '{path}': {source}")]
    Archive {
        /// The archive
        path: PathBuf,
        /// The underlying error
        #[source]
        source: zip::result::ZipError,
    },

    /// A state abbreviation has no FIPS code
    #[error("Unknown state '{0}'")]
    UnknownState(String),

    /// A geography name matches neither a registry code nor a remote directory
    #[error("Unknown geography '{0}'")]
    UnknownGeography(String),

    /// The year is outside the published range
    #[error("Year {year} is not available (expected {FIRST_YEAR} to {latest})")]
    InvalidYear {
        /// The requested year
        year: u16,
        /// The latest accepted year
        latest: u16,
    },
}

impl FetchError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn archive(path: &Path, source: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Type alias for Results using `FetchError`.
pub type Result<T> = std::result::Result<T, FetchError>;

/// Options for a fetch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Census server root
    pub base_url: String,
    /// Data year
    pub year: u16,
    /// State postal abbreviations; empty means every state
    pub states: Vec<String>,
    /// Geography codes or remote directory names; empty means every auto-download type
    pub geographies: Vec<String>,
    /// Where archives are saved
    pub download_dir: PathBuf,
    /// Where archives are extracted, one directory per archive
    pub extract_dir: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            year: 2014,
            states: Vec::new(),
            geographies: Vec::new(),
            download_dir: PathBuf::from("downloads"),
            extract_dir: PathBuf::from("extracted_files"),
        }
    }
}

/// The resolved work of a fetch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    /// Data year
    pub year: u16,
    /// Remote directories to list, uppercase, in order
    pub remote_dirs: Vec<String>,
    /// FIPS codes of the selected states; empty means no filtering
    pub fips_codes: Vec<&'static str>,
}

impl FetchConfig {
    /// Validates the options and resolves them into a [`FetchPlan`].
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidYear`], [`FetchError::UnknownState`] or
    /// [`FetchError::UnknownGeography`] for the first invalid option.
    pub fn plan(&self) -> Result<FetchPlan> {
        let latest = latest_year();
        if !(FIRST_YEAR..=latest).contains(&self.year) {
            return Err(FetchError::InvalidYear {
                year: self.year,
                latest,
            });
        }

        let fips_codes = self
            .states
            .iter()
            .map(|s| states::fips_code(s).ok_or_else(|| FetchError::UnknownState(s.clone())))
            .collect::<Result<Vec<_>>>()?;

        let mut remote_dirs: Vec<String> = Vec::new();
        if self.geographies.is_empty() {
            for geo in get_geography_types().into_iter().filter(|g| g.auto_download) {
                push_unique(&mut remote_dirs, geo.remote_dir.to_string());
            }
        } else {
            for name in &self.geographies {
                push_unique(&mut remote_dirs, resolve_remote_dir(name)?);
            }
        }

        Ok(FetchPlan {
            year: self.year,
            remote_dirs,
            fips_codes,
        })
    }
}

/// One archive fetched and extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedArchive {
    /// Remote directory the archive was listed in
    pub remote_dir: String,
    /// Downloaded archive
    pub archive: PathBuf,
    /// Dataset directory it was extracted into
    pub extracted: PathBuf,
}

/// Summary of a fetch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Archives in the order they were fetched
    pub archives: Vec<FetchedArchive>,
}

/// Downloads and extracts every archive selected by `config`.
///
/// Archives are fetched sequentially. The first failure stops the run; archives already
/// extracted stay on disk.
///
/// # Errors
///
/// Returns an error for invalid options, unreachable listings or archives, and archives
/// that cannot be written or extracted.
pub async fn fetch(config: &FetchConfig) -> Result<FetchReport> {
    let plan = config.plan()?;
    for dir in [&config.download_dir, &config.extract_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| FetchError::io(dir, e))?;
    }

    let client = Client::builder()
        .user_agent(concat!("tiger/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let mut report = FetchReport::default();
    for remote_dir in &plan.remote_dirs {
        let url = remote_dir_url(&config.base_url, plan.year, remote_dir);
        info!("Finding files in {url}");

        let listing = client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let names = select_archives(&parse_listing(&listing), &plan.fips_codes);
        if names.is_empty() {
            warn!("No matching archives in {url}");
        }

        for name in names {
            let archive = download_archive(&client, &format!("{url}{name}"), &config.download_dir).await?;
            let extract_dir = config.extract_dir.clone();
            let source = archive.clone();
            let extracted = tokio::task::spawn_blocking(move || extract_archive(&source, &extract_dir))
                .await
                .map_err(|e| FetchError::io(&archive, std::io::Error::other(e)))??;

            report.archives.push(FetchedArchive {
                remote_dir: remote_dir.clone(),
                archive,
                extracted,
            });
        }
    }

    info!("Fetched {} archive(s)", report.archives.len());
    Ok(report)
}

/// Applies the state filter for every selected state, keeping each archive once.
#[must_use]
pub fn select_archives(names: &[String], fips_codes: &[&str]) -> Vec<String> {
    if fips_codes.is_empty() {
        return names.to_vec();
    }
    let mut selected = Vec::new();
    for fips in fips_codes {
        for name in filter_for_state(names, fips) {
            push_unique(&mut selected, name);
        }
    }
    selected
}

fn resolve_remote_dir(name: &str) -> Result<String> {
    if let Some(geo) = find_geography_type(name) {
        return Ok(geo.remote_dir.to_string());
    }
    find_by_remote_dir(name)
        .first()
        .map(|geo| geo.remote_dir.to_string())
        .ok_or_else(|| FetchError::UnknownGeography(name.to_string()))
}

fn latest_year() -> u16 {
    u16::try_from(chrono::Local::now().year()).unwrap_or(u16::MAX)
}

fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}
