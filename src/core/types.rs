use super::Value;
use serde::{Deserialize, Serialize};

/// Column description as declared by the data source or synthesized by an
/// operator. The type tag is an uppercase string ("INTEGER", "TEXT", ...)
/// matching `Value::type_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub primary: bool,
    pub unique: bool,
    pub auto_increment: bool,
    pub default: Option<Value>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            primary: false,
            unique: false,
            auto_increment: false,
            default: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary = true;
        self.unique = true;
        self.nullable = false;
        self
    }

    pub fn unique_key(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Table metadata handed out by the data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub row_count: i64,
}

impl TableInfo {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnInfo>) -> Self {
        Self {
            name: name.into(),
            columns,
            row_count: 0,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_builder() {
        let col = ColumnInfo::new("id", "INTEGER").primary_key().auto_increment();
        assert!(col.primary);
        assert!(col.unique);
        assert!(!col.nullable);
        assert!(col.auto_increment);
    }

    #[test]
    fn test_table_lookup() {
        let info = TableInfo::new(
            "users",
            vec![
                ColumnInfo::new("id", "INTEGER").primary_key(),
                ColumnInfo::new("name", "TEXT"),
            ],
        );
        assert!(info.column("name").is_some());
        assert!(info.column("missing").is_none());
    }
}
