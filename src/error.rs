// src/error.rs

//! Crate-wide error type for quarry
//!
//! Fatal failures only: malformed configuration, database problems,
//! unusable input. Recoverable resolver signals (restart suggestions,
//! undecidable resolvents) are not errors and live in the resolver
//! module as ordinary values.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// All fatal error conditions
#[derive(Debug, Error)]
pub enum Error {
    /// Database access failed
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    /// Filesystem access failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted plan could not be encoded or decoded
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be parsed
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration contents are unusable (e.g. an unparsable spec in
    /// an allow-list); aborts the run per the two-tier failure model
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A package name could not be parsed
    #[error("invalid package name '{name}': {reason}")]
    Name { name: String, reason: String },

    /// A version string could not be parsed
    #[error("invalid version '{version}': {reason}")]
    Version { version: String, reason: String },

    /// A package spec string could not be parsed
    #[error("invalid package spec '{spec}': {reason}")]
    Spec { spec: String, reason: String },

    /// The resolver restarted more times than the configured cap allows
    #[error("resolution restarted {count} times (cap {cap}); giving up")]
    RestartCapExceeded { count: u32, cap: u32 },

    /// Internal invariant violation
    #[error("internal error: {0}")]
    Internal(String),
}
