//! Storage seam for the load pipeline.
//!
//! The pipeline speaks to its database through [`SpatialStore`], which keeps discovery,
//! schema inference and feature streaming independent of the driver. [`crate::postgis`]
//! provides the PostgreSQL/PostGIS implementation.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::schema::TableSpec;
use crate::source::FeatureRow;
use crate::sql::Identifier;
use crate::types::SchemaStatus;

/// A database able to hold group tables.
#[async_trait]
pub trait SpatialStore: Send {
    /// Creates the target schema.
    ///
    /// An existing schema is not an error and yields [`SchemaStatus::AlreadyExists`].
    async fn create_schema(&mut self, schema: &Identifier) -> Result<SchemaStatus>;

    /// Drops the table if present and creates it empty.
    async fn recreate_table(&mut self, spec: &TableSpec) -> Result<()>;

    /// Inserts `rows` read from `source` in a single transaction and commits.
    ///
    /// On failure nothing from this batch is committed, and the error names `source`
    /// and the index of the feature that failed.
    async fn insert_batch(
        &mut self,
        spec: &TableSpec,
        source: &Path,
        rows: &[FeatureRow],
    ) -> Result<u64>;

    /// Adds the surrogate primary key and the spatial index.
    async fn finalize_table(&mut self, spec: &TableSpec) -> Result<()>;
}
