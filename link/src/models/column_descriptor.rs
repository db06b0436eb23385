use serde::{Deserialize, Serialize};

/// Driver-reported nullability of a result column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nullability {
    /// The column may contain SQL NULL
    Nullable,
    /// The driver guarantees the column never contains SQL NULL
    NotNull,
    /// The driver could not tell
    #[default]
    Unknown,
}

/// Native integer width/signedness hint exposed by some drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

/// Metadata for one result column, produced once per query.
///
/// # Example (JSON representation)
///
/// ```json
/// {
///   "name": "age",
///   "database_type_name": "INT",
///   "nullability": "not_null",
///   "scan_kind": "u32"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name as reported by the cursor
    pub name: String,

    /// Database type name, e.g. "VARCHAR", "BIGINT", "TIMESTAMP", "JSON"
    pub database_type_name: String,

    #[serde(default)]
    pub nullability: Nullability,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_kind: Option<ScanKind>,
}

impl ColumnDescriptor {
    /// Create a descriptor with unknown nullability and no scan hint
    pub fn new(name: impl Into<String>, database_type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            database_type_name: database_type_name.into(),
            nullability: Nullability::Unknown,
            scan_kind: None,
        }
    }

    pub fn with_nullability(mut self, nullability: Nullability) -> Self {
        self.nullability = nullability;
        self
    }

    pub fn with_scan_kind(mut self, scan_kind: ScanKind) -> Self {
        self.scan_kind = Some(scan_kind);
        self
    }

    /// Shorthand for `with_nullability(Nullability::NotNull)`
    pub fn not_null(self) -> Self {
        self.with_nullability(Nullability::NotNull)
    }

    /// Shorthand for `with_nullability(Nullability::Nullable)`
    pub fn nullable(self) -> Self {
        self.with_nullability(Nullability::Nullable)
    }

    /// True when decoded values for this column are produced unwrapped.
    pub fn is_not_null(&self) -> bool {
        self.nullability == Nullability::NotNull
    }
}
