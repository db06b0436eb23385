use super::row::Row;

/// Materialized result of [`crate::query`].
///
/// Exactly one shape is produced per call, decided by the options:
/// generic rows or bound records, optionally collapsed to a single item.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput<T = ()> {
    /// Generic rows in cursor order
    Rows(Vec<Row>),
    /// Bound records in cursor order
    Records(Vec<T>),
    /// First generic row (single-result mode)
    Row(Row),
    /// First bound record (single-result mode)
    Record(T),
    /// Single-result mode matched no rows. Not an error.
    Empty,
}

impl<T> QueryOutput<T> {
    pub fn is_empty(&self) -> bool {
        match self {
            QueryOutput::Rows(rows) => rows.is_empty(),
            QueryOutput::Records(records) => records.is_empty(),
            QueryOutput::Row(_) | QueryOutput::Record(_) => false,
            QueryOutput::Empty => true,
        }
    }

    /// Number of items carried.
    pub fn len(&self) -> usize {
        match self {
            QueryOutput::Rows(rows) => rows.len(),
            QueryOutput::Records(records) => records.len(),
            QueryOutput::Row(_) | QueryOutput::Record(_) => 1,
            QueryOutput::Empty => 0,
        }
    }

    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            QueryOutput::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn into_records(self) -> Option<Vec<T>> {
        match self {
            QueryOutput::Records(records) => Some(records),
            _ => None,
        }
    }

    pub fn into_row(self) -> Option<Row> {
        match self {
            QueryOutput::Row(row) => Some(row),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<T> {
        match self {
            QueryOutput::Record(record) => Some(record),
            _ => None,
        }
    }
}
