//! The load pipeline.
//!
//! [`load`] walks the extracted data directory, groups shapefiles into tables, and for each
//! group infers the schema from its first shapefile, recreates the table, streams every
//! feature in committed batches and finally adds the primary key and spatial index.
//!
//! Groups are independent. An error while inferring or loading one group (unsupported
//! field type, missing field, unreadable or rejected feature) aborts that group only; it is
//! logged, recorded in the [`LoadReport`], and the next group proceeds. Rows from batches
//! committed before the failure stay in the failed group's table until the next run
//! recreates it.

use std::path::{Path, PathBuf};

use log::{debug, error, info};

use crate::config::LoadConfig;
use crate::discovery::discover_groups;
use crate::error::Result;
use crate::schema::{TableSpec, infer_table_spec};
use crate::source::ShapefileSource;
use crate::sql::Identifier;
use crate::store::SpatialStore;
use crate::types::{GroupOutcome, GroupReport, LoadReport, RejectedInfo};

/// Runs a full load into `store`.
///
/// # Errors
///
/// Returns an error for invalid configuration, an unreadable data directory, or a failure
/// to create the target schema. Per-group failures are reported in the returned
/// [`LoadReport`] instead.
pub async fn load<S: SpatialStore>(config: &LoadConfig, store: &mut S) -> Result<LoadReport> {
    let schema = config.validate()?;
    let discovery = discover_groups(&config.data_dir)?;
    info!(
        "Found {} group(s) with {} shapefile(s) in {}",
        discovery.groups.len(),
        discovery.shapefile_count(),
        config.data_dir.display()
    );

    let schema_status = store.create_schema(&schema).await?;

    let mut groups = Vec::with_capacity(discovery.groups.len());
    for (key, paths) in &discovery.groups {
        groups.push(load_group(config, &schema, key, paths, store).await?);
    }

    let rejected = discovery
        .rejected
        .into_iter()
        .map(|r| RejectedInfo {
            path: r.path,
            reason: r.error.to_string(),
        })
        .collect();

    Ok(LoadReport {
        schema: schema.to_string(),
        schema_status,
        groups,
        rejected,
    })
}

/// Loads one group, converting group-fatal errors into a failed [`GroupReport`].
///
/// # Errors
///
/// Only errors that must end the whole run (see
/// [`TigerError::is_group_fatal`](crate::error::TigerError::is_group_fatal)) are returned.
pub async fn load_group<S: SpatialStore>(
    config: &LoadConfig,
    schema: &Identifier,
    key: &str,
    paths: &[PathBuf],
    store: &mut S,
) -> Result<GroupReport> {
    let mut report = GroupReport {
        key: key.to_string(),
        table: format!("{schema}.{key}"),
        sources: paths.to_vec(),
        rows: 0,
        outcome: GroupOutcome::Loaded,
    };

    info!("Loading group {key} from {} shapefile(s)", paths.len());
    match fill_group(config, schema, key, paths, store, &mut report.rows).await {
        Ok(()) => {
            info!("Loaded {} row(s) into {}", report.rows, report.table);
        },
        Err(e) if e.is_group_fatal() => {
            error!("Group {key} failed after {} row(s): {e}", report.rows);
            report.outcome = GroupOutcome::Failed(e.to_string());
        },
        Err(e) => return Err(e),
    }
    Ok(report)
}

async fn fill_group<S: SpatialStore>(
    config: &LoadConfig,
    schema: &Identifier,
    key: &str,
    paths: &[PathBuf],
    store: &mut S,
    rows: &mut u64,
) -> Result<()> {
    let Some(template) = paths.first() else {
        return Ok(());
    };
    let spec = infer_table_spec(
        template,
        schema,
        key,
        config.source_srid,
        config.target_srid,
    )?;

    store.recreate_table(&spec).await?;
    for path in paths {
        load_shapefile(&spec, path, config.batch_size, store, rows).await?;
    }
    store.finalize_table(&spec).await
}

/// Streams one shapefile into the group table in batches of `batch_size` rows, adding
/// each committed batch to `committed`.
///
/// # Errors
///
/// Returns the first read or insert error, which names the shapefile and feature index.
/// Batches committed before the error remain committed and are counted.
pub async fn load_shapefile<S: SpatialStore>(
    spec: &TableSpec,
    path: &Path,
    batch_size: usize,
    store: &mut S,
    committed: &mut u64,
) -> Result<()> {
    let source = ShapefileSource::open(path)?;
    source.check_columns(&spec.fields)?;

    let mut reader = source.reader()?;
    let mut batch = Vec::with_capacity(batch_size);
    let mut loaded = 0;

    for row in source.rows(&mut reader, &spec.fields) {
        batch.push(row?);
        if batch.len() >= batch_size {
            let inserted = store.insert_batch(spec, path, &batch).await?;
            loaded += inserted;
            *committed += inserted;
            debug!("Committed {loaded} row(s) from {}", path.display());
            batch.clear();
        }
    }
    if !batch.is_empty() {
        let inserted = store.insert_batch(spec, path, &batch).await?;
        loaded += inserted;
        *committed += inserted;
    }

    debug!("Finished {} with {loaded} row(s)", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DatabaseError, LoadError, TigerError};
    use crate::source::FeatureRow;
    use crate::source::fixtures::{write_names_only, write_points, write_with_date_field};
    use crate::types::SchemaStatus;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    /// Rows held by the in-memory store, per table.
    #[derive(Debug, Default)]
    struct MemoryTable {
        spec: Option<TableSpec>,
        rows: Vec<FeatureRow>,
        finalized: bool,
    }

    /// In-memory store mirroring the transactional behavior of the PostGIS store.
    #[derive(Debug, Default)]
    struct MemoryStore {
        schemas: Vec<String>,
        tables: BTreeMap<String, MemoryTable>,
        batches: usize,
        /// Reject any row whose first attribute equals this text.
        poison: Option<String>,
        refuse_schema: bool,
    }

    #[async_trait]
    impl SpatialStore for MemoryStore {
        async fn create_schema(&mut self, schema: &Identifier) -> Result<SchemaStatus> {
            if self.refuse_schema {
                return Err(DatabaseError::Statement {
                    statement: "CREATE SCHEMA".to_string(),
                    source: "permission denied".into(),
                }
                .into());
            }
            if self.schemas.contains(&schema.to_string()) {
                return Ok(SchemaStatus::AlreadyExists);
            }
            self.schemas.push(schema.to_string());
            Ok(SchemaStatus::Created)
        }

        async fn recreate_table(&mut self, spec: &TableSpec) -> Result<()> {
            self.tables.insert(
                spec.table.to_string(),
                MemoryTable {
                    spec: Some(spec.clone()),
                    ..MemoryTable::default()
                },
            );
            Ok(())
        }

        async fn insert_batch(
            &mut self,
            spec: &TableSpec,
            source: &Path,
            rows: &[FeatureRow],
        ) -> Result<u64> {
            let poison = self.poison.clone().map(|p| crate::fields::FieldValue::Text(Some(p)));
            if let Some(bad) = rows
                .iter()
                .find(|r| poison.is_some() && r.values.first() == poison.as_ref())
            {
                return Err(LoadError::FeatureInsert {
                    path: source.to_path_buf(),
                    feature_index: bad.index,
                    source: "invalid input syntax".into(),
                }
                .into());
            }
            let table = self
                .tables
                .get_mut(&spec.table.to_string())
                .expect("table must be created before insert");
            table.rows.extend_from_slice(rows);
            self.batches += 1;
            Ok(rows.len() as u64)
        }

        async fn finalize_table(&mut self, spec: &TableSpec) -> Result<()> {
            let table = self
                .tables
                .get_mut(&spec.table.to_string())
                .expect("table must exist");
            table.finalized = true;
            Ok(())
        }
    }

    fn config(root: &Path) -> LoadConfig {
        LoadConfig {
            data_dir: root.to_path_buf(),
            batch_size: 2,
            ..LoadConfig::default()
        }
    }

    fn three_cities(root: &Path) {
        write_points(
            root,
            "tl_2014_41_tract",
            &[
                (-122.6, 45.5, "Portland", 650_000.0),
                (-123.0, 44.9, "Salem", 175_000.0),
                (-123.1, 44.0, "Eugene", 177_000.0),
            ],
        );
    }

    #[tokio::test]
    async fn test_three_features_load_three_rows() {
        let temp = TempDir::new().unwrap();
        three_cities(temp.path());
        let mut store = MemoryStore::default();

        let report = load(&config(temp.path()), &mut store).await.unwrap();

        assert_eq!(report.schema_status, SchemaStatus::Created);
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].key, "tract_2014");
        assert_eq!(report.groups[0].rows, 3);
        assert!(report.is_clean());

        let table = &store.tables["tiger.tract_2014"];
        assert_eq!(table.rows.len(), 3);
        assert!(table.finalized);
        // batch size 2: one full batch plus the remainder
        assert_eq!(store.batches, 2);
        let spec = table.spec.as_ref().unwrap();
        assert_eq!((spec.source_srid, spec.target_srid), (4269, 2913));
    }

    #[tokio::test]
    async fn test_rerun_replaces_rows() {
        let temp = TempDir::new().unwrap();
        three_cities(temp.path());
        let mut store = MemoryStore::default();

        load(&config(temp.path()), &mut store).await.unwrap();
        let second = load(&config(temp.path()), &mut store).await.unwrap();

        assert_eq!(second.schema_status, SchemaStatus::AlreadyExists);
        assert_eq!(store.tables["tiger.tract_2014"].rows.len(), 3);
        assert_eq!(second.total_rows(), 3);
    }

    #[tokio::test]
    async fn test_group_merges_states_in_order() {
        let temp = TempDir::new().unwrap();
        write_points(temp.path(), "tl_2014_53_tract", &[(-122.3, 47.6, "Seattle", 1.0)]);
        write_points(temp.path(), "tl_2014_41_tract", &[(-122.6, 45.5, "Portland", 2.0)]);
        let mut store = MemoryStore::default();

        let report = load(&config(temp.path()), &mut store).await.unwrap();

        assert_eq!(report.groups[0].sources.len(), 2);
        let names: Vec<_> = store.tables["tiger.tract_2014"]
            .rows
            .iter()
            .map(|r| r.values[0].clone())
            .collect();
        assert_eq!(
            names,
            vec![
                crate::fields::FieldValue::Text(Some("Portland".to_string())),
                crate::fields::FieldValue::Text(Some("Seattle".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn test_unsupported_field_fails_only_its_group() {
        let temp = TempDir::new().unwrap();
        write_with_date_field(temp.path(), "tl_2014_41_bg");
        three_cities(temp.path());
        let mut store = MemoryStore::default();

        let report = load(&config(temp.path()), &mut store).await.unwrap();

        assert_eq!(report.groups.len(), 2);
        let bg = &report.groups[0];
        assert_eq!(bg.key, "block_group_2014");
        assert!(matches!(&bg.outcome, GroupOutcome::Failed(m) if m.contains("unsupported type Date")));
        assert!(!store.tables.contains_key("tiger.block_group_2014"));

        assert!(report.groups[1].is_loaded());
        assert_eq!(report.failed_groups().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_field_in_later_member() {
        let temp = TempDir::new().unwrap();
        write_points(temp.path(), "tl_2014_41_tract", &[(-122.6, 45.5, "Portland", 2.0)]);
        write_names_only(temp.path(), "tl_2014_53_tract");
        let mut store = MemoryStore::default();

        let report = load(&config(temp.path()), &mut store).await.unwrap();

        let group = &report.groups[0];
        assert_eq!(group.rows, 1);
        assert!(matches!(&group.outcome, GroupOutcome::Failed(m) if m.contains("'POP' is missing")));
        assert!(!store.tables["tiger.tract_2014"].finalized);
    }

    #[tokio::test]
    async fn test_insert_failure_names_feature() {
        let temp = TempDir::new().unwrap();
        three_cities(temp.path());
        let mut store = MemoryStore {
            poison: Some("Eugene".to_string()),
            ..MemoryStore::default()
        };

        let report = load(&config(temp.path()), &mut store).await.unwrap();

        let group = &report.groups[0];
        match &group.outcome {
            GroupOutcome::Failed(message) => {
                assert!(message.contains("feature 2"));
                assert!(message.contains("tl_2014_41_tract.shp"));
            },
            GroupOutcome::Loaded => panic!("group should have failed"),
        }
        // the first batch was committed before the failing one
        assert_eq!(group.rows, 2);
        assert!(!store.tables["tiger.tract_2014"].finalized);
    }

    #[tokio::test]
    async fn test_rejected_directories_are_reported() {
        let temp = TempDir::new().unwrap();
        write_points(temp.path(), "tl_2014_41_roads", &[(-122.6, 45.5, "I-5", 1.0)]);
        let mut store = MemoryStore::default();

        let report = load(&config(temp.path()), &mut store).await.unwrap();

        assert!(report.groups.is_empty());
        assert_eq!(report.rejected.len(), 1);
        assert!(report.rejected[0].reason.contains("roads"));
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn test_schema_failure_aborts_run() {
        let temp = TempDir::new().unwrap();
        three_cities(temp.path());
        let mut store = MemoryStore {
            refuse_schema: true,
            ..MemoryStore::default()
        };

        let err = load(&config(temp.path()), &mut store).await.unwrap_err();
        assert!(matches!(err, TigerError::Database(_)));
        assert!(store.tables.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_touches_nothing() {
        let temp = TempDir::new().unwrap();
        three_cities(temp.path());
        let mut store = MemoryStore::default();
        let bad = LoadConfig {
            schema: "Tiger".to_string(),
            ..config(temp.path())
        };

        let err = load(&bad, &mut store).await.unwrap_err();
        assert!(matches!(err, TigerError::Config(_)));
        assert!(store.schemas.is_empty());
    }
}
