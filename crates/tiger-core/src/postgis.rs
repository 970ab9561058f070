//! PostgreSQL/PostGIS implementation of [`SpatialStore`].
//!
//! Every statement runs in an explicit transaction: table re-creation, each insert batch
//! and the post-load key/index step commit independently, so an interrupted run never
//! leaves a half-applied batch behind.

use std::path::Path;

use async_trait::async_trait;
use bytes::BytesMut;
use log::{debug, error, info, warn};
use tokio_postgres::error::SqlState;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_postgres::{Client, NoTls, Statement};

use crate::config::ConnectionConfig;
use crate::error::{DatabaseError, DatabaseErrorExt, LoadError, Result};
use crate::fields::{FieldValue, SqlType};
use crate::schema::TableSpec;
use crate::source::FeatureRow;
use crate::sql::{self, Identifier};
use crate::store::SpatialStore;
use crate::types::SchemaStatus;

/// A connected PostGIS database.
pub struct PostgisStore {
    client: Client,
    /// Insert statement prepared for the table currently being loaded.
    prepared: Option<(String, Statement)>,
}

impl PostgisStore {
    /// Connects to the database described by `config`.
    ///
    /// The connection task is spawned on the current tokio runtime and ends when the
    /// store is dropped.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for missing parameters, or
    /// [`DatabaseError::Connection`] if the server cannot be reached or rejects the login.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        config.validate()?;
        let target = config.describe();

        let (client, connection) = config
            .to_pg_config()
            .connect(NoTls)
            .await
            .map_err(|e| DatabaseError::Connection {
                target: target.clone(),
                source: Box::new(e),
            })?;

        let label = target.clone();
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("Connection to {label} closed with error: {e}");
            }
        });

        info!("Connected to {target}");
        Ok(Self {
            client,
            prepared: None,
        })
    }

    /// Runs an arbitrary query. Used by callers that want to inspect loaded tables.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Statement`] if the query fails.
    pub async fn query(
        &self,
        statement: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<tokio_postgres::Row>> {
        self.client
            .query(statement, params)
            .await
            .with_statement(statement)
    }

    async fn insert_statement(&mut self, spec: &TableSpec) -> Result<Statement> {
        if let Some((sql, statement)) = &self.prepared {
            if *sql == spec.insert_statement {
                return Ok(statement.clone());
            }
        }

        let mut types = vec![Type::TEXT, Type::INT4, Type::INT4];
        types.extend(spec.fields.iter().map(|f| param_type(f.sql_type)));

        let statement = self
            .client
            .prepare_typed(&spec.insert_statement, &types)
            .await
            .with_statement(&spec.insert_statement)?;
        self.prepared = Some((spec.insert_statement.clone(), statement.clone()));
        Ok(statement)
    }
}

#[async_trait]
impl SpatialStore for PostgisStore {
    async fn create_schema(&mut self, schema: &Identifier) -> Result<SchemaStatus> {
        let statement = sql::create_schema(schema);
        match self.client.batch_execute(&statement).await {
            Ok(()) => {
                info!("Created schema {schema}");
                Ok(SchemaStatus::Created)
            },
            Err(e) if e.code() == Some(&SqlState::DUPLICATE_SCHEMA) => {
                warn!("Schema {schema} already exists, continuing");
                Ok(SchemaStatus::AlreadyExists)
            },
            Err(e) => Err(e).with_statement(&statement),
        }
    }

    async fn recreate_table(&mut self, spec: &TableSpec) -> Result<()> {
        let tx = self.client.transaction().await.with_statement("BEGIN")?;
        tx.batch_execute(&spec.drop_statement)
            .await
            .with_statement(&spec.drop_statement)?;
        tx.batch_execute(&spec.create_statement)
            .await
            .with_statement(&spec.create_statement)?;
        tx.commit().await.with_statement("COMMIT")?;

        self.prepared = None;
        debug!("Recreated table {}", spec.table);
        Ok(())
    }

    async fn insert_batch(
        &mut self,
        spec: &TableSpec,
        source: &Path,
        rows: &[FeatureRow],
    ) -> Result<u64> {
        let statement = self.insert_statement(spec).await?;
        let tx = self.client.transaction().await.with_statement("BEGIN")?;

        for row in rows {
            let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(3 + row.values.len());
            params.push(&row.wkt);
            params.push(&spec.source_srid);
            params.push(&spec.target_srid);
            params.extend(row.values.iter().map(|v| v as &(dyn ToSql + Sync)));

            tx.execute(&statement, &params)
                .await
                .map_err(|e| LoadError::FeatureInsert {
                    path: source.to_path_buf(),
                    feature_index: row.index,
                    source: Box::new(e),
                })?;
        }

        tx.commit().await.with_statement("COMMIT")?;
        Ok(rows.len() as u64)
    }

    async fn finalize_table(&mut self, spec: &TableSpec) -> Result<()> {
        let primary_key = spec.primary_key_statement();
        let index = spec.spatial_index_statement();

        let tx = self.client.transaction().await.with_statement("BEGIN")?;
        tx.batch_execute(&primary_key)
            .await
            .with_statement(&primary_key)?;
        tx.batch_execute(&index).await.with_statement(&index)?;
        tx.commit().await.with_statement("COMMIT")?;

        debug!("Added primary key and spatial index to {}", spec.table);
        Ok(())
    }
}

fn param_type(sql_type: SqlType) -> Type {
    match sql_type {
        SqlType::Text => Type::TEXT,
        SqlType::Numeric => Type::FLOAT8,
    }
}

impl ToSql for FieldValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> std::result::Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            FieldValue::Text(value) => value.to_sql_checked(ty, out),
            FieldValue::Real(value) => value.to_sql_checked(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        <Option<String> as ToSql>::accepts(ty) || <Option<f64> as ToSql>::accepts(ty)
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_types() {
        assert_eq!(param_type(SqlType::Text), Type::TEXT);
        assert_eq!(param_type(SqlType::Numeric), Type::FLOAT8);
    }

    #[test]
    fn test_field_value_encoding() {
        let mut out = BytesMut::new();
        let text = FieldValue::Text(Some("Salem".to_string()));
        assert!(matches!(text.to_sql(&Type::TEXT, &mut out), Ok(IsNull::No)));
        assert_eq!(&out[..], b"Salem");

        let mut out = BytesMut::new();
        let real = FieldValue::Real(Some(1.5));
        assert!(matches!(real.to_sql(&Type::FLOAT8, &mut out), Ok(IsNull::No)));
        assert_eq!(out.len(), 8);

        let mut out = BytesMut::new();
        let null = FieldValue::Real(None);
        assert!(matches!(null.to_sql(&Type::FLOAT8, &mut out), Ok(IsNull::Yes)));
    }

    #[test]
    fn test_field_value_rejects_wrong_parameter_type() {
        let mut out = BytesMut::new();
        let text = FieldValue::Text(Some("x".to_string()));
        assert!(text.to_sql(&Type::FLOAT8, &mut out).is_err());
    }
}
