//! Report types for load runs.
//!
//! This module defines the data structures returned by the pipeline describing what was
//! created, loaded, skipped and failed.

use std::path::PathBuf;

/// Whether the target schema had to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    /// The schema was created by this run
    Created,
    /// The schema already existed
    AlreadyExists,
}

/// Outcome of loading one table group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOutcome {
    /// Table created, filled, keyed and indexed
    Loaded,
    /// Load aborted; the message names the cause
    Failed(String),
}

impl GroupOutcome {
    /// Returns the display label for this outcome.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            GroupOutcome::Loaded => "Loaded",
            GroupOutcome::Failed(_) => "Failed",
        }
    }
}

/// Information about one table group after a run.
#[derive(Debug, Clone)]
pub struct GroupReport {
    /// Group key, also the table name
    pub key: String,
    /// Schema-qualified table name
    pub table: String,
    /// Shapefiles belonging to the group
    pub sources: Vec<PathBuf>,
    /// Rows committed
    pub rows: u64,
    /// Outcome
    pub outcome: GroupOutcome,
}

impl GroupReport {
    /// Returns `true` if the group loaded completely.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.outcome == GroupOutcome::Loaded
    }
}

/// A dataset directory skipped during discovery.
#[derive(Debug, Clone)]
pub struct RejectedInfo {
    /// The directory
    pub path: PathBuf,
    /// Why it was skipped
    pub reason: String,
}

/// Summary of a load run.
#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Target schema
    pub schema: String,
    /// Whether the schema was created
    pub schema_status: SchemaStatus,
    /// Per-group results, in group key order
    pub groups: Vec<GroupReport>,
    /// Dataset directories that could not be grouped
    pub rejected: Vec<RejectedInfo>,
}

impl LoadReport {
    /// Total rows committed across all groups.
    #[must_use]
    pub fn total_rows(&self) -> u64 {
        self.groups.iter().map(|g| g.rows).sum()
    }

    /// Groups that did not load completely.
    #[must_use]
    pub fn failed_groups(&self) -> Vec<&GroupReport> {
        self.groups.iter().filter(|g| !g.is_loaded()).collect()
    }

    /// Returns `true` if every group loaded and no directory was rejected.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.groups.iter().all(GroupReport::is_loaded)
    }
}
