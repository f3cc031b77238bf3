//! Storage module for database access, configuration, and catalog entities.

pub mod burger_store;
pub mod config;
pub mod database;
pub mod schema;

pub use burger_store::{Burger, BurgerStore, Restaurant, StoreError};
pub use config::{load_config, save_config, ConfigError, EngineConfig};
pub use database::{Database, DatabaseError};
