use serde::{Deserialize, Serialize};

/// SQL placeholder and typing convention.
///
/// - `MySql`: anonymous `?` placeholders, no casts
/// - `PostgreSql`: numbered `$N` placeholders, values carry `::TYPE` casts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    MySql,
    PostgreSql,
}

impl Dialect {
    /// Placeholder token for the argument at 1-based position `position`.
    pub fn placeholder(&self, position: usize) -> String {
        match self {
            Dialect::MySql => "?".to_string(),
            Dialect::PostgreSql => format!("${}", position),
        }
    }

    pub fn requires_casts(&self) -> bool {
        matches!(self, Dialect::PostgreSql)
    }
}
