// src/lib.rs

//! Quarry Package Manager
//!
//! Source package manager built around a restartable dependency
//! resolution engine.
//!
//! # Architecture
//!
//! - Resolvents: one package-slot per destination is the unit of
//!   resolution
//! - Constraints carry reasons: every requirement knows why it exists
//! - Whole-graph restarts: conflicts feed a learned preset into a
//!   fresh pass instead of backtracking node by node
//! - Database-backed installed state: SQLite records what is merged,
//!   its dependencies, and repository registration order

pub mod config;
pub mod db;
pub mod env;
mod error;
pub mod name;
pub mod package;
pub mod resolver;
pub mod spec;
pub mod version;

pub use config::ResolverConfig;
pub use env::{
    Environment, Filter, FilteredGenerator, Generator, Repository, Selection, SelectionCache,
    StandardEnvironment,
};
pub use error::{Error, Result};
pub use name::{NameParseError, QualifiedName};
pub use package::{DepKind, Dependency, Mask, MaskKind, OriginKind, PackageId};
pub use resolver::{
    Decision, DestinationType, Resolved, Resolvent, Resolver, SlotNameOrNull, SuggestRestart,
};
pub use spec::PackageSpec;
pub use version::{PackageVersion, VersionConstraint};
