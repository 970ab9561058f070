//! Geography type registry for Census TIGER/Line datasets.
//!
//! This module provides a static registry mapping raw Census geography codes (the last
//! token of a dataset directory name such as `tl_2014_41_tract`) to the canonical fragment
//! used in table names, together with the remote directory the archives are published in.
//!
//! # Examples
//!
//! ```
//! use tiger_core::geography::{find_geography_type, get_geography_types};
//!
//! let tract = find_geography_type("tract").expect("tract should exist");
//! assert_eq!(tract.table, "tract");
//!
//! let bg = find_geography_type("BG").expect("lookup ignores case");
//! assert_eq!(bg.table, "block_group");
//!
//! for geo in get_geography_types() {
//!     println!("{} -> {}", geo.code, geo.table);
//! }
//! ```

/// Extent of the files published for a geography type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// One file per state, named with the state FIPS code.
    State,
    /// A single national file, named with `us`.
    National,
}

impl Scope {
    /// Returns the string representation of this scope.
    ///
    /// # Examples
    ///
    /// ```
    /// use tiger_core::geography::Scope;
    ///
    /// assert_eq!(Scope::State.as_str(), "State");
    /// assert_eq!(Scope::National.as_str(), "National");
    /// ```
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Scope::State => "State",
            Scope::National => "National",
        }
    }
}

/// A Census geography type and the table fragment it loads into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeographyType {
    /// Raw code as it appears in archive and directory names (e.g. `"tabblock10"`).
    pub code: &'static str,
    /// Canonical table-name fragment (e.g. `"block10"`).
    pub table: &'static str,
    /// Directory under `TIGER{year}/` holding the archives (e.g. `"TABBLOCK"`).
    pub remote_dir: &'static str,
    /// Whether archives are published per state or nationally.
    pub scope: Scope,
    /// Whether a fetch without explicit geographies includes this type.
    ///
    /// Block and ZCTA archives are very large and must be requested explicitly.
    pub auto_download: bool,
}

impl GeographyType {
    /// Creates a new registry entry.
    #[must_use]
    pub const fn new(
        code: &'static str,
        table: &'static str,
        remote_dir: &'static str,
        scope: Scope,
        auto_download: bool,
    ) -> Self {
        Self {
            code,
            table,
            remote_dir,
            scope,
            auto_download,
        }
    }
}

/// Returns the complete registry of known geography types.
#[must_use]
pub fn get_geography_types() -> Vec<GeographyType> {
    use Scope::{National, State};

    vec![
        GeographyType::new("state", "state", "STATE", National, true),
        GeographyType::new("county", "county", "COUNTY", National, true),
        GeographyType::new("place", "place", "PLACE", State, true),
        GeographyType::new("cousub", "county_subdivision", "COUSUB", State, true),
        GeographyType::new("tract", "tract", "TRACT", State, true),
        GeographyType::new("bg", "block_group", "BG", State, true),
        GeographyType::new("tabblock", "block", "TABBLOCK", State, false),
        GeographyType::new("tabblock10", "block10", "TABBLOCK", State, false),
        GeographyType::new("zcta510", "zcta5", "ZCTA5", National, false),
    ]
}

/// Finds a geography type by its raw code (case-insensitive).
///
/// Returns `None` if the code has no table mapping.
///
/// # Examples
///
/// ```
/// use tiger_core::geography::find_geography_type;
///
/// assert_eq!(find_geography_type("tabblock10").map(|g| g.table), Some("block10"));
/// assert!(find_geography_type("roads").is_none());
/// ```
#[must_use]
pub fn find_geography_type(code: &str) -> Option<GeographyType> {
    get_geography_types()
        .into_iter()
        .find(|g| g.code.eq_ignore_ascii_case(code))
}

/// Finds the geography types published under a remote directory (case-insensitive).
///
/// Several codes can share a directory (`tabblock` and `tabblock10` both live in
/// `TABBLOCK`), so this returns every match.
#[must_use]
pub fn find_by_remote_dir(remote_dir: &str) -> Vec<GeographyType> {
    get_geography_types()
        .into_iter()
        .filter(|g| g.remote_dir.eq_ignore_ascii_case(remote_dir))
        .collect()
}

/// Returns the distinct remote directory names, lowercased, in registry order.
#[must_use]
pub fn get_remote_dir_names() -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for geo in get_geography_types() {
        let name = geo.remote_dir.to_ascii_lowercase();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Returns all geography codes in alphabetically sorted order.
#[must_use]
pub fn get_geography_codes() -> Vec<&'static str> {
    let mut codes: Vec<_> = get_geography_types().iter().map(|g| g.code).collect();
    codes.sort_unstable();
    codes
}
