use crate::error::{OrmError, OrmResult};
use serde::Deserialize;
use std::path::Path;

/// Default column names shared by most tables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CentralFields {
    pub ctime_field: String,
    pub utime_field: String,
    pub is_active_field: String,
    pub is_deleted_field: String,
    pub status_field: String,
}

impl Default for CentralFields {
    fn default() -> Self {
        Self {
            ctime_field: "ctime".to_string(),
            utime_field: "utime".to_string(),
            is_active_field: "is_active".to_string(),
            is_deleted_field: "is_deleted".to_string(),
            status_field: "status".to_string(),
        }
    }
}

/// Static description of one table.
///
/// ```toml
/// table_name = "users"
/// primary_key = "id"
/// columns = ["id", "name", "email", "ctime", "utime", "is_deleted"]
///
/// [central_fields]
/// is_deleted_field = "deleted"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableModelConfig {
    pub table_name: String,
    pub primary_key: String,
    pub columns: Vec<String>,
    /// Missing entries fall back to [`CentralFields::default`].
    #[serde(default)]
    pub central_fields: CentralFields,
}

impl TableModelConfig {
    pub fn new<I, T>(table_name: impl Into<String>, primary_key: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            table_name: table_name.into(),
            primary_key: primary_key.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            central_fields: CentralFields::default(),
        }
    }

    pub fn with_central_fields(mut self, fields: CentralFields) -> Self {
        self.central_fields = fields;
        self
    }

    pub fn from_toml_str(raw: &str) -> OrmResult<Self> {
        Ok(toml::from_str(raw)?)
    }
}

/// A file describing several tables under `[[tables]]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelsFile {
    #[serde(default)]
    pub tables: Vec<TableModelConfig>,
}

impl ModelsFile {
    pub fn from_toml_str(raw: &str) -> OrmResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> OrmResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            OrmError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn table(&self, name: &str) -> Option<&TableModelConfig> {
        self.tables.iter().find(|t| t.table_name == name)
    }
}
