//! Serde mirror of the Prisma DMMF (Data Model Meta Format) tree.
//!
//! Only the slice of the DMMF that matters for schema derivation is modeled:
//! `datamodel.models`, each model's fields, and the `dbName` overrides.
//! Everything else in the document is ignored during deserialization.

use crate::error::{GuardError, GuardResult};
use serde::Deserialize;
use std::path::Path;

/// Top-level DMMF document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dmmf {
    #[serde(default)]
    pub datamodel: Datamodel,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Datamodel {
    #[serde(default)]
    pub models: Vec<Model>,
}

/// A Prisma model: maps to one table.
#[derive(Debug, Clone, Deserialize)]
pub struct Model {
    pub name: String,
    /// Explicit table name from `@@map`, if any.
    #[serde(default, rename = "dbName")]
    pub db_name: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// A model field. Relation fields (kind `object`) have no storage column.
#[derive(Debug, Clone, Deserialize)]
pub struct Field {
    pub name: String,
    /// Explicit column name from `@map`, if any.
    #[serde(default, rename = "dbName")]
    pub db_name: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
}

impl Field {
    pub fn is_relation(&self) -> bool {
        self.kind.as_deref() == Some("object")
    }
}

/// Load a DMMF document from a JSON file.
pub fn load_dmmf(path: impl AsRef<Path>) -> GuardResult<Dmmf> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| GuardError::io(path, e))?;
    parse_dmmf(&raw)
}

/// Parse a DMMF document from a JSON string.
pub fn parse_dmmf(raw: &str) -> GuardResult<Dmmf> {
    Ok(serde_json::from_str(raw)?)
}
