//! Storage module for the trail database and configuration.

pub mod config;
pub mod database;
pub mod migrator;
pub mod review_store;
pub mod schema;
pub mod trail_store;
pub mod user_store;

pub use config::{AppConfig, PlaybackSettings, StorageSettings};
pub use database::{Database, StoreError};
pub use migrator::{Migration, MigrationError, MigrationReport, Migrator, CURRENT_VERSION};
pub use review_store::ReviewStore;
pub use trail_store::TrailStore;
pub use user_store::UserStore;
