use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::sync::Arc;

use super::decoded_value::DecodedValue;

/// One result row in generic mode: column name to decoded value.
///
/// Column names are shared across every row of the same query. Iteration
/// follows cursor column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<DecodedValue>,
}

impl Row {
    pub(crate) fn new(columns: Arc<[String]>, values: Vec<DecodedValue>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Look up a column by name. With duplicate names the last one wins.
    pub fn get(&self, column: &str) -> Option<&DecodedValue> {
        self.columns
            .iter()
            .rposition(|name| name == column)
            .and_then(|idx| self.values.get(idx))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DecodedValue)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }

    /// Convert into an unordered map keyed by column name.
    pub fn into_map(self) -> HashMap<String, DecodedValue> {
        let mut map = HashMap::with_capacity(self.values.len());
        for (name, value) in self.columns.iter().zip(self.values) {
            map.insert(name.clone(), value);
        }
        map
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
