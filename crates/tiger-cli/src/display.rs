//! Display utilities for formatting CLI output.
//!
//! This module provides table row structures and formatting functions
//! for presenting discovery, fetch and load results in a human-readable format.

use std::path::Path;

use tabled::{Table, Tabled};

use tiger_core::discovery::Discovery;
use tiger_core::geography::GeographyType;
use tiger_core::types::{LoadReport, SchemaStatus};
use tiger_fetch::FetchReport;

/// Table row representation for one loaded (or failed) group.
#[derive(Tabled)]
pub struct GroupRow {
    /// Group key.
    #[tabled(rename = "Group")]
    pub key: String,
    /// Schema-qualified table.
    #[tabled(rename = "Table")]
    pub table: String,
    /// Number of shapefiles in the group.
    #[tabled(rename = "Shapefiles")]
    pub shapefiles: usize,
    /// Rows committed.
    #[tabled(rename = "Rows")]
    pub rows: u64,
    /// Outcome label.
    #[tabled(rename = "Status")]
    pub status: String,
}

/// Table row for a discovered group before loading.
#[derive(Tabled)]
pub struct DiscoveryRow {
    #[tabled(rename = "Group")]
    pub key: String,
    #[tabled(rename = "Shapefiles")]
    pub shapefiles: usize,
    /// Template shapefile the table schema is read from.
    #[tabled(rename = "Template")]
    pub template: String,
}

/// Table row for a skipped dataset directory.
#[derive(Tabled)]
pub struct RejectedRow {
    #[tabled(rename = "Directory")]
    pub directory: String,
    #[tabled(rename = "Reason")]
    pub reason: String,
}

/// Table row representation for displaying geography registry entries.
#[derive(Tabled)]
pub struct GeographyRow {
    /// Raw Census code.
    #[tabled(rename = "Code")]
    pub code: String,
    /// Table-name fragment.
    #[tabled(rename = "Table")]
    pub table: String,
    /// Remote directory holding the archives.
    #[tabled(rename = "Remote Dir")]
    pub remote_dir: String,
    /// State or National.
    #[tabled(rename = "Scope")]
    pub scope: String,
    /// Whether a default fetch includes it.
    #[tabled(rename = "Auto")]
    pub auto_download: String,
}

/// Table row for a fetched archive.
#[derive(Tabled)]
pub struct ArchiveRow {
    #[tabled(rename = "Remote Dir")]
    pub remote_dir: String,
    #[tabled(rename = "Archive")]
    pub archive: String,
    #[tabled(rename = "Extracted To")]
    pub extracted: String,
}

fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    )
}

/// Display the result of a load run.
pub fn display_load_report(report: &LoadReport) {
    let status = match report.schema_status {
        SchemaStatus::Created => "created",
        SchemaStatus::AlreadyExists => "already existed",
    };
    println!("\nSchema: {} ({status})", report.schema);

    if report.groups.is_empty() {
        println!("\nNo table groups found.");
    } else {
        println!("\n=== Groups ===");
        let rows: Vec<GroupRow> = report
            .groups
            .iter()
            .map(|g| GroupRow {
                key: g.key.clone(),
                table: g.table.clone(),
                shapefiles: g.sources.len(),
                rows: g.rows,
                status: g.outcome.as_str().to_string(),
            })
            .collect();
        println!("{}", Table::new(rows));
    }

    for group in report.failed_groups() {
        if let tiger_core::types::GroupOutcome::Failed(reason) = &group.outcome {
            println!("{}: {reason}", group.key);
        }
    }

    display_rejected(
        report
            .rejected
            .iter()
            .map(|r| (r.path.as_path(), r.reason.clone())),
    );

    println!("\nTotal rows loaded: {}", report.total_rows());
}

/// Display the groups found in a data directory.
pub fn display_discovery(root: &Path, discovery: &Discovery) {
    println!("\nData directory: {}", root.display());

    if discovery.is_empty() {
        println!("\nNo table groups found.");
    } else {
        println!(
            "\n=== Groups ({} groups, {} shapefiles) ===",
            discovery.groups.len(),
            discovery.shapefile_count()
        );
        let rows: Vec<DiscoveryRow> = discovery
            .groups
            .iter()
            .map(|(key, paths)| DiscoveryRow {
                key: key.clone(),
                shapefiles: paths.len(),
                template: paths.first().map(|p| file_name(p)).unwrap_or_default(),
            })
            .collect();
        println!("{}", Table::new(rows));
    }

    display_rejected(
        discovery
            .rejected
            .iter()
            .map(|r| (r.path.as_path(), r.error.to_string())),
    );
}

fn display_rejected<'a>(rejected: impl Iterator<Item = (&'a Path, String)>) {
    let rows: Vec<RejectedRow> = rejected
        .map(|(path, reason)| RejectedRow {
            directory: file_name(path),
            reason,
        })
        .collect();
    if !rows.is_empty() {
        println!("\n=== Skipped Directories ===");
        println!("{}", Table::new(rows));
    }
}

/// Display the geography registry.
pub fn display_geographies(geographies: &[GeographyType]) {
    println!("\nGeography Types ({} total):\n", geographies.len());

    let rows: Vec<GeographyRow> = geographies
        .iter()
        .map(|g| GeographyRow {
            code: g.code.to_string(),
            table: g.table.to_string(),
            remote_dir: g.remote_dir.to_string(),
            scope: g.scope.as_str().to_string(),
            auto_download: if g.auto_download { "Yes" } else { "No" }.to_string(),
        })
        .collect();
    println!("{}", Table::new(rows));
}

/// Display the archives retrieved by a fetch run.
pub fn display_fetch_report(report: &FetchReport) {
    if report.archives.is_empty() {
        println!("\nNo archives matched.");
        return;
    }

    println!("\n=== Archives ({} total) ===", report.archives.len());
    let rows: Vec<ArchiveRow> = report
        .archives
        .iter()
        .map(|a| ArchiveRow {
            remote_dir: a.remote_dir.clone(),
            archive: file_name(&a.archive),
            extracted: a.extracted.display().to_string(),
        })
        .collect();
    println!("{}", Table::new(rows));
}
