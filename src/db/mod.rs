// src/db/mod.rs

//! SQLite-backed installed-package store
//!
//! All persistent state lives in one SQLite database: the installed
//! packages, their recorded dependencies, reverse use edges, and the
//! repository registration order consumed by candidate sorting.

pub mod models;
pub mod schema;

pub use models::{InstalledDependency, InstalledPackage, RepositoryEntry, UsedByEntry};
pub use schema::migrate;
