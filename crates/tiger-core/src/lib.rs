//! `tiger-core` is the core library for `tiger`, loading Census TIGER/Line shapefiles into
//! PostGIS.
//!
//! This crate includes:
//! - **Geography Registry**: The Census geography codes that map to tables.
//! - **Discovery**: Classification of extracted dataset directories into table groups.
//! - **Schema Inference**: Column definitions derived from a group's template shapefile.
//! - **Loading**: Batched, reprojected feature inserts through the [`store::SpatialStore`]
//!   seam, with [`postgis::PostgisStore`] as the database implementation.
//!
//! The [`pipeline`] module ties these together and is what the CLI calls.

pub mod config;
pub mod discovery;
pub mod error;
pub mod fields;
pub mod geography;
pub mod pipeline;
pub mod postgis;
pub mod schema;
pub mod source;
pub mod sql;
pub mod store;
pub mod types;
