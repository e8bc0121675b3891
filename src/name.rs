// src/name.rs

//! Qualified package names
//!
//! Packages are identified by the format `category/name`:
//!
//! - `app-editors/vim` - vim from the app-editors category
//! - `sys-libs/zlib` - zlib from the sys-libs category
//! - `virtual/mta` - a virtual package
//!
//! Both components are required. The qualified name is the stable
//! identity used for resolution keys and database rows; versions and
//! slots are tracked separately.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A qualified package name in `category/name` form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Category the package belongs to (e.g. "app-editors")
    pub category: String,
    /// Unqualified package name (e.g. "vim")
    pub name: String,
}

impl QualifiedName {
    /// Create a new qualified name
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }

    /// Parse a qualified name from string format `category/name`
    pub fn parse(s: &str) -> Result<Self, NameParseError> {
        let slash_pos = s
            .find('/')
            .ok_or_else(|| NameParseError::MissingSlash(s.to_string()))?;

        let category = &s[..slash_pos];
        let name = &s[slash_pos + 1..];

        if category.is_empty() {
            return Err(NameParseError::EmptyCategory(s.to_string()));
        }
        if name.is_empty() {
            return Err(NameParseError::EmptyName(s.to_string()));
        }
        if name.contains('/') {
            return Err(NameParseError::ExtraSlash(s.to_string()));
        }

        // Validate characters (alphanumeric, dots, hyphens, underscores, plus)
        let valid_chars = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | '+');

        if !category.chars().all(valid_chars) {
            return Err(NameParseError::InvalidCategory(category.to_string()));
        }
        if !name.chars().all(valid_chars) {
            return Err(NameParseError::InvalidName(name.to_string()));
        }

        Ok(Self {
            category: category.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

impl FromStr for QualifiedName {
    type Err = NameParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Errors from parsing a qualified name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameParseError {
    #[error("missing '/' separator in '{0}'")]
    MissingSlash(String),
    #[error("more than one '/' in '{0}'")]
    ExtraSlash(String),
    #[error("empty category in '{0}'")]
    EmptyCategory(String),
    #[error("empty package name in '{0}'")]
    EmptyName(String),
    #[error("invalid characters in category '{0}'")]
    InvalidCategory(String),
    #[error("invalid characters in package name '{0}'")]
    InvalidName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let n = QualifiedName::parse("app-editors/vim").unwrap();
        assert_eq!(n.category, "app-editors");
        assert_eq!(n.name, "vim");
        assert_eq!(n.to_string(), "app-editors/vim");
    }

    #[test]
    fn test_parse_plus_in_name() {
        let n = QualifiedName::parse("dev-libs/libsigc++").unwrap();
        assert_eq!(n.name, "libsigc++");
    }

    #[test]
    fn test_parse_missing_slash() {
        assert!(matches!(
            QualifiedName::parse("vim"),
            Err(NameParseError::MissingSlash(_))
        ));
    }

    #[test]
    fn test_parse_extra_slash() {
        assert!(matches!(
            QualifiedName::parse("a/b/c"),
            Err(NameParseError::ExtraSlash(_))
        ));
    }

    #[test]
    fn test_parse_empty_components() {
        assert!(matches!(
            QualifiedName::parse("/vim"),
            Err(NameParseError::EmptyCategory(_))
        ));
        assert!(matches!(
            QualifiedName::parse("app/"),
            Err(NameParseError::EmptyName(_))
        ));
    }

    #[test]
    fn test_parse_invalid_chars() {
        assert!(matches!(
            QualifiedName::parse("app editors/vim"),
            Err(NameParseError::InvalidCategory(_))
        ));
    }

    #[test]
    fn test_ordering() {
        let a = QualifiedName::parse("app/aa").unwrap();
        let b = QualifiedName::parse("app/bb").unwrap();
        assert!(a < b);
    }
}
