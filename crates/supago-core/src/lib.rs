use serde::{Deserialize, Deserializer, Serialize};

// Configuration types shared across all Supago crates
pub mod config;

pub use config::{ConfigError, ServerConfig, SupabaseConfig, SupagoConfig};

/// One column of a remote table, as exposed by the `<table>_schema` view,
/// the `get_table_schema` function, or `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: bool,
    /// Empty when the column has no default; never null.
    #[serde(default, deserialize_with = "null_as_default")]
    pub column_default: String,
}

impl ColumnSchema {
    pub fn new(
        column_name: impl Into<String>,
        data_type: impl Into<String>,
        is_nullable: bool,
        column_default: impl Into<String>,
    ) -> Self {
        Self {
            column_name: column_name.into(),
            data_type: data_type.into(),
            is_nullable,
            column_default: column_default.into(),
        }
    }

    /// Whether the column carries a server-side default.
    pub fn has_default(&self) -> bool {
        !self.column_default.is_empty()
    }
}

/// Column metadata of a single table.
///
/// `columns` is in the table's physical ordinal order and that order is
/// preserved from the wire to every consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchemaResult {
    pub table_name: String,
    /// `get_table_schema` returns `null` here when the table has no columns.
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<ColumnSchema>,
}

impl TableSchemaResult {
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnSchema>) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
        }
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.column_name == name)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
