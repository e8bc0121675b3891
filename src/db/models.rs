// src/db/models.rs

//! Row models for the installed-package store

use crate::error::Result;
use crate::name::QualifiedName;
use crate::package::{DepKind, Dependency, OriginKind, PackageId};
use crate::spec::PackageSpec;
use crate::version::PackageVersion;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use std::str::FromStr;

/// One installed package
#[derive(Debug, Clone)]
pub struct InstalledPackage {
    pub id: Option<i64>,
    pub category: String,
    pub name: String,
    pub version: String,
    pub slot: String,
    /// Repository the package was merged from
    pub source_repository: String,
    /// True when the user asked for this package directly
    pub explicit: bool,
    pub install_date: Option<DateTime<Utc>>,
}

impl InstalledPackage {
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        slot: impl Into<String>,
        source_repository: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            category: category.into(),
            name: name.into(),
            version: version.into(),
            slot: slot.into(),
            source_repository: source_repository.into(),
            explicit: false,
            install_date: None,
        }
    }

    pub fn with_explicit(mut self, explicit: bool) -> Self {
        self.explicit = explicit;
        self
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let date: Option<String> = row.get(7)?;
        Ok(Self {
            id: Some(row.get(0)?),
            category: row.get(1)?,
            name: row.get(2)?,
            version: row.get(3)?,
            slot: row.get(4)?,
            source_repository: row.get(5)?,
            explicit: row.get::<_, i64>(6)? != 0,
            install_date: date
                .and_then(|d| DateTime::parse_from_rfc3339(&d).ok())
                .map(|d| d.with_timezone(&Utc)),
        })
    }

    const COLUMNS: &'static str =
        "id, category, name, version, slot, source_repository, explicit, install_date";

    /// Insert this package into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO installed_packages (category, name, version, slot, source_repository, explicit, install_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &self.category,
                &self.name,
                &self.version,
                &self.slot,
                &self.source_repository,
                self.explicit as i64,
                Utc::now().to_rfc3339(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// List all installed packages
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM installed_packages ORDER BY category, name, slot",
            Self::COLUMNS
        ))?;
        let rows = stmt.query_map([], Self::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Find all installed slots of a package
    pub fn find_by_name(conn: &Connection, name: &QualifiedName) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM installed_packages WHERE category = ?1 AND name = ?2 ORDER BY slot",
            Self::COLUMNS
        ))?;
        let rows = stmt.query_map(params![&name.category, &name.name], Self::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Remove this package row and its dependent rows
    pub fn delete(&self, conn: &Connection) -> Result<()> {
        if let Some(id) = self.id {
            conn.execute("DELETE FROM installed_packages WHERE id = ?1", [id])?;
        }
        Ok(())
    }

    /// Convert this row into a resolver-facing id
    pub fn to_package_id(&self, conn: &Connection) -> Result<PackageId> {
        let name = QualifiedName::new(self.category.clone(), self.name.clone());
        let version = PackageVersion::parse(&self.version)?;
        let mut id = PackageId::new(
            name,
            version,
            self.slot.clone(),
            self.source_repository.clone(),
            OriginKind::Installed,
        );
        if let Some(row_id) = self.id {
            for dep in InstalledDependency::find_by_package(conn, row_id)? {
                id = id.with_dependency(dep.to_dependency()?);
            }
        }
        Ok(id)
    }
}

/// Dependency recorded for an installed package
#[derive(Debug, Clone)]
pub struct InstalledDependency {
    pub id: Option<i64>,
    pub package_id: i64,
    /// Spec text as recorded at merge time
    pub spec: String,
    pub kind: String,
}

impl InstalledDependency {
    pub fn new(package_id: i64, spec: impl Into<String>, kind: DepKind) -> Self {
        Self {
            id: None,
            package_id,
            spec: spec.into(),
            kind: kind.to_string(),
        }
    }

    /// Insert this dependency into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO installed_dependencies (package_id, spec, kind) VALUES (?1, ?2, ?3)",
            params![self.package_id, &self.spec, &self.kind],
        )?;
        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find dependencies recorded for a package row
    pub fn find_by_package(conn: &Connection, package_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, package_id, spec, kind FROM installed_dependencies WHERE package_id = ?1",
        )?;
        let rows = stmt.query_map([package_id], |row| {
            Ok(Self {
                id: Some(row.get(0)?),
                package_id: row.get(1)?,
                spec: row.get(2)?,
                kind: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Parse the recorded row back into resolver types
    pub fn to_dependency(&self) -> Result<Dependency> {
        let spec = PackageSpec::parse(&self.spec)?;
        let kind = DepKind::from_str(&self.kind)
            .map_err(|_| crate::error::Error::Internal(format!("bad dep kind '{}'", self.kind)))?;
        Ok(Dependency::new(spec, kind))
    }
}

/// Reverse use edge: some other package used this one at build time
#[derive(Debug, Clone)]
pub struct UsedByEntry {
    pub id: Option<i64>,
    pub package_id: i64,
    pub user_category: String,
    pub user_name: String,
}

impl UsedByEntry {
    pub fn new(package_id: i64, user: &QualifiedName) -> Self {
        Self {
            id: None,
            package_id,
            user_category: user.category.clone(),
            user_name: user.name.clone(),
        }
    }

    /// Insert this edge into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO used_by (package_id, user_category, user_name) VALUES (?1, ?2, ?3)",
            params![self.package_id, &self.user_category, &self.user_name],
        )?;
        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find everything recorded as using a package row
    pub fn find_by_package(conn: &Connection, package_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, package_id, user_category, user_name FROM used_by WHERE package_id = ?1",
        )?;
        let rows = stmt.query_map([package_id], |row| {
            Ok(Self {
                id: Some(row.get(0)?),
                package_id: row.get(1)?,
                user_category: row.get(2)?,
                user_name: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

/// Repository registration entry; position defines the candidate
/// tie-break order
#[derive(Debug, Clone)]
pub struct RepositoryEntry {
    pub id: Option<i64>,
    pub name: String,
    pub position: i64,
}

impl RepositoryEntry {
    pub fn new(name: impl Into<String>, position: i64) -> Self {
        Self {
            id: None,
            name: name.into(),
            position,
        }
    }

    /// Insert this repository into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO repositories (name, position) VALUES (?1, ?2)",
            params![&self.name, self.position],
        )?;
        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// List repositories in registration order
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT id, name, position FROM repositories ORDER BY position")?;
        let rows = stmt.query_map([], |row| {
            Ok(Self {
                id: Some(row.get(0)?),
                name: row.get(1)?,
                position: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
