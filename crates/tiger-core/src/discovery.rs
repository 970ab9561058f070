//! Dataset directory classification and grouping.
//!
//! Extracted TIGER archives land in directories named
//! `{label}_{year}_{state_code}_{geo_type}` (for example `tl_2014_41_tract`). This module
//! parses those names, finds the shapefile inside each directory and groups shapefiles that
//! load into the same table under the key `{table_fragment}_{year}`.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{DiscoveryError, Result};
use crate::geography::find_geography_type;

/// The four positional tokens of a dataset directory name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoDescriptor {
    /// Product label, `tl` for TIGER/Line.
    pub label: String,
    /// Vintage year of the data.
    pub year: u16,
    /// State FIPS code, or `us` for national files.
    pub state_code: String,
    /// Raw Census geography code.
    pub geo_type: String,
}

impl GeoDescriptor {
    /// Parses a directory name, returning `None` if it is not a dataset directory.
    ///
    /// The name must consist of exactly four non-empty alphanumeric tokens joined by
    /// underscores, and the year token must be a four-digit number.
    ///
    /// # Examples
    ///
    /// ```
    /// use tiger_core::discovery::GeoDescriptor;
    ///
    /// let geo = GeoDescriptor::parse("tl_2014_41_tabblock10").unwrap();
    /// assert_eq!(geo.year, 2014);
    /// assert_eq!(geo.state_code, "41");
    /// assert_eq!(geo.geo_type, "tabblock10");
    ///
    /// assert!(GeoDescriptor::parse("downloads").is_none());
    /// assert!(GeoDescriptor::parse("tl_2014_41").is_none());
    /// ```
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let tokens: Vec<&str> = name.split('_').collect();
        let [label, year, state_code, geo_type] = tokens.as_slice() else {
            return None;
        };

        let well_formed = tokens
            .iter()
            .all(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_alphanumeric()));
        if !well_formed {
            return None;
        }

        if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        Some(Self {
            label: (*label).to_string(),
            year: year.parse().ok()?,
            state_code: (*state_code).to_string(),
            geo_type: (*geo_type).to_string(),
        })
    }

    /// Returns the table group key, or `None` if the geography code is unmapped.
    ///
    /// # Examples
    ///
    /// ```
    /// use tiger_core::discovery::GeoDescriptor;
    ///
    /// let geo = GeoDescriptor::parse("tl_2014_53_bg").unwrap();
    /// assert_eq!(geo.group_key().as_deref(), Some("block_group_2014"));
    /// ```
    #[must_use]
    pub fn group_key(&self) -> Option<String> {
        find_geography_type(&self.geo_type).map(|geo| format!("{}_{}", geo.table, self.year))
    }
}

impl fmt::Display for GeoDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.label, self.year, self.state_code, self.geo_type
        )
    }
}

/// A classified dataset directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    /// Parsed directory name.
    pub descriptor: GeoDescriptor,
    /// Table group the dataset belongs to.
    pub group_key: String,
    /// Shapefiles found in the directory, in name order.
    pub shapefiles: Vec<PathBuf>,
}

/// A dataset directory that matched the naming pattern but could not be grouped.
#[derive(Debug)]
pub struct RejectedDataset {
    /// The dataset directory.
    pub path: PathBuf,
    /// Why it was rejected.
    pub error: DiscoveryError,
}

/// Result of scanning a data directory.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Group key to the ordered shapefile paths loaded into that table.
    ///
    /// The first path of each group is the schema template.
    pub groups: BTreeMap<String, Vec<PathBuf>>,
    /// Matching directories that could not be grouped.
    pub rejected: Vec<RejectedDataset>,
}

impl Discovery {
    /// Returns `true` if nothing loadable was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of shapefiles across all groups.
    #[must_use]
    pub fn shapefile_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Classifies one directory.
///
/// Returns `Ok(None)` if the directory name does not match the dataset pattern.
///
/// # Errors
///
/// Returns [`DiscoveryError::UnknownGeographyType`] if the geography code has no table
/// mapping, [`DiscoveryError::MissingShapefile`] if the directory holds no `.shp` file, and
/// [`DiscoveryError::ReadDir`] if it cannot be listed.
pub fn classify_dataset(dir: &Path) -> std::result::Result<Option<Dataset>, DiscoveryError> {
    let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
        return Ok(None);
    };
    let Some(descriptor) = GeoDescriptor::parse(name) else {
        return Ok(None);
    };

    let group_key =
        descriptor
            .group_key()
            .ok_or_else(|| DiscoveryError::UnknownGeographyType {
                path: dir.to_path_buf(),
                code: descriptor.geo_type.clone(),
            })?;

    let shapefiles = find_shapefiles(dir)?;
    if shapefiles.is_empty() {
        return Err(DiscoveryError::MissingShapefile {
            path: dir.to_path_buf(),
        });
    }

    Ok(Some(Dataset {
        descriptor,
        group_key,
        shapefiles,
    }))
}

/// Scans the immediate subdirectories of `root` and groups their shapefiles.
///
/// Subdirectories are visited in name order, so repeated scans of the same tree
/// produce identical groups with identical path order. A root without matching
/// subdirectories yields an empty [`Discovery`].
///
/// # Errors
///
/// Returns an error only if `root` itself cannot be listed. Problems with individual
/// dataset directories are collected in [`Discovery::rejected`].
pub fn discover_groups(root: &Path) -> Result<Discovery> {
    let mut discovery = Discovery::default();

    for dir in sorted_entries(root)?.into_iter().filter(|p| p.is_dir()) {
        match classify_dataset(&dir) {
            Ok(Some(dataset)) => {
                debug!(
                    "Classified {} into group {}",
                    dataset.descriptor, dataset.group_key
                );
                discovery
                    .groups
                    .entry(dataset.group_key)
                    .or_default()
                    .extend(dataset.shapefiles);
            },
            Ok(None) => debug!("Skipping non-dataset directory {}", dir.display()),
            Err(error) => {
                warn!("Rejected dataset directory: {error}");
                discovery.rejected.push(RejectedDataset { path: dir, error });
            },
        }
    }

    Ok(discovery)
}

fn find_shapefiles(dir: &Path) -> std::result::Result<Vec<PathBuf>, DiscoveryError> {
    Ok(sorted_entries(dir)?
        .into_iter()
        .filter(|p| p.is_file() && is_shapefile(p))
        .collect())
}

fn is_shapefile(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("shp"))
}

fn sorted_entries(dir: &Path) -> std::result::Result<Vec<PathBuf>, DiscoveryError> {
    let read_err = |source| DiscoveryError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(dir)
        .map_err(read_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(read_err)?;
    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn dataset_dir(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir(&dir).unwrap();
        for ext in ["shp", "shx", "dbf", "prj"] {
            File::create(dir.join(format!("{name}.{ext}"))).unwrap();
        }
        dir
    }

    #[test]
    fn test_parse_extracts_four_tokens() {
        let geo = GeoDescriptor::parse("tl_2014_41_tract").unwrap();
        assert_eq!(
            geo,
            GeoDescriptor {
                label: "tl".to_string(),
                year: 2014,
                state_code: "41".to_string(),
                geo_type: "tract".to_string(),
            }
        );
        assert_eq!(geo.to_string(), "tl_2014_41_tract");
    }

    #[test]
    fn test_parse_national_file() {
        let geo = GeoDescriptor::parse("tl_2014_us_county").unwrap();
        assert_eq!(geo.state_code, "us");
        assert_eq!(geo.group_key().as_deref(), Some("county_2014"));
    }

    #[test]
    fn test_parse_rejects_malformed_names() {
        for name in [
            "",
            "tract",
            "tl_2014_41",
            "tl_2014_41_tract_extra",
            "tl__41_tract",
            "tl_14_41_tract",
            "tl_yyyy_41_tract",
            "tl_2014_41_tract.zip",
            "tl-2014-41-tract",
        ] {
            assert!(GeoDescriptor::parse(name).is_none(), "{name} should not parse");
        }
    }

    #[test]
    fn test_group_key_unmapped() {
        let geo = GeoDescriptor::parse("tl_2014_41_roads").unwrap();
        assert!(geo.group_key().is_none());
    }

    #[test]
    fn test_discover_groups_by_type_and_year() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        dataset_dir(root, "tl_2014_53_tract");
        dataset_dir(root, "tl_2014_41_tract");
        dataset_dir(root, "tl_2013_41_tract");
        dataset_dir(root, "tl_2014_41_bg");
        fs::create_dir(root.join("downloads")).unwrap();

        let discovery = discover_groups(root).unwrap();

        let keys: Vec<_> = discovery.groups.keys().cloned().collect();
        assert_eq!(keys, vec!["block_group_2014", "tract_2013", "tract_2014"]);

        let tract = &discovery.groups["tract_2014"];
        assert_eq!(tract.len(), 2);
        assert!(tract[0].ends_with("tl_2014_41_tract/tl_2014_41_tract.shp"));
        assert!(tract[1].ends_with("tl_2014_53_tract/tl_2014_53_tract.shp"));
        assert_eq!(discovery.shapefile_count(), 4);
        assert!(discovery.rejected.is_empty());
    }

    #[test]
    fn test_discover_is_deterministic() {
        let temp = TempDir::new().unwrap();
        for name in ["tl_2014_06_bg", "tl_2014_41_bg", "tl_2014_53_bg", "tl_2014_41_tract"] {
            dataset_dir(temp.path(), name);
        }

        let first = discover_groups(temp.path()).unwrap();
        let second = discover_groups(temp.path()).unwrap();
        assert_eq!(first.groups, second.groups);
    }

    #[test]
    fn test_discover_empty_root() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("not_a_dataset")).unwrap();
        File::create(temp.path().join("tl_2014_41_tract.zip")).unwrap();

        let discovery = discover_groups(temp.path()).unwrap();
        assert!(discovery.is_empty());
        assert!(discovery.rejected.is_empty());
    }

    #[test]
    fn test_unknown_geography_is_rejected_not_dropped() {
        let temp = TempDir::new().unwrap();
        dataset_dir(temp.path(), "tl_2014_41_roads");
        dataset_dir(temp.path(), "tl_2014_41_tract");

        let discovery = discover_groups(temp.path()).unwrap();
        assert_eq!(discovery.groups.len(), 1);
        assert_eq!(discovery.rejected.len(), 1);
        assert!(matches!(
            &discovery.rejected[0].error,
            DiscoveryError::UnknownGeographyType { code, .. } if code == "roads"
        ));
    }

    #[test]
    fn test_directory_without_shapefile() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("tl_2014_41_tract");
        fs::create_dir(&dir).unwrap();
        File::create(dir.join("tl_2014_41_tract.dbf")).unwrap();

        let err = classify_dataset(&dir).unwrap_err();
        assert!(matches!(err, DiscoveryError::MissingShapefile { .. }));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        let result = discover_groups(&temp.path().join("absent"));
        assert!(result.is_err());
    }
}
