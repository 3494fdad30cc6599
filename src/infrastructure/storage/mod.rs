//! Storage infrastructure

pub mod migrations;

pub use migrations::{Migration, PostgresMigrator, directory_migrations};
