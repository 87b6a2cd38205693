//! shelf-catalog: SQLite media catalog adapter for shelf
//!
//! This crate provides the implementation of the MetadataCatalog trait
//! using sqlx. Rows describe media hosted outside the object store and are
//! filed under virtual folders of the same tree.

pub mod sqlite;

pub use sqlite::SqliteCatalog;
