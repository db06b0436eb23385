//! Type-driven decoding of raw column bytes.
//!
//! A [`ColumnDecoder`] is resolved once per column per query from the
//! driver-reported type name, nullability and scan hint, then applied to
//! every cell of that column.
//!
//! Decoding is best-effort: malformed numeric or temporal text degrades to
//! the type's zero value and malformed JSON degrades to
//! [`DecodedValue::Absent`]. A single bad cell never fails the whole row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::models::{ColumnDescriptor, DecodedValue, RawCell, ScanKind, Value};

const TIMESTAMP_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_LAYOUT: &str = "%Y-%m-%d";
const TIME_LAYOUT: &str = "%H:%M:%S%.f";

/// Semantic family of a database type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Float,
    /// Integer family; the width comes from the scan hint or the type name
    Integer,
    Bool,
    Timestamp,
    Date,
    Time,
    Json,
    /// Explicit NULL-typed column
    Null,
}

/// Classify a driver-reported type name (case-insensitive).
///
/// Unrecognized names fall back to [`ColumnKind::Text`].
pub fn classify(database_type_name: &str) -> ColumnKind {
    let name = database_type_name.trim().to_ascii_uppercase();
    let base = name.strip_prefix("UNSIGNED ").unwrap_or(&name);
    let base = base.strip_suffix(" UNSIGNED").unwrap_or(base);

    match base {
        "FLOAT" | "DOUBLE" | "DECIMAL" | "NUMERIC" | "REAL" | "FLOAT4" | "FLOAT8"
        | "DOUBLE PRECISION" => ColumnKind::Float,
        "INT" | "INTEGER" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "BIGINT" | "INT2" | "INT4"
        | "INT8" => ColumnKind::Integer,
        "BOOL" | "BOOLEAN" => ColumnKind::Bool,
        "DATETIME" | "TIMESTAMP" | "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE"
        | "TIMESTAMP WITHOUT TIME ZONE" => ColumnKind::Timestamp,
        "DATE" => ColumnKind::Date,
        "TIME" | "TIME WITHOUT TIME ZONE" => ColumnKind::Time,
        "JSON" | "JSONB" => ColumnKind::Json,
        "NULL" => ColumnKind::Null,
        // CHAR, VARCHAR, TEXT, NVARCHAR, *TEXT and anything unknown
        _ => ColumnKind::Text,
    }
}

fn is_unsigned_name(database_type_name: &str) -> bool {
    database_type_name.to_ascii_uppercase().contains("UNSIGNED")
}

/// Decoding plan for one column, shared read-only across all rows.
#[derive(Debug, Clone)]
pub struct ColumnDecoder {
    kind: ColumnKind,
    int_kind: ScanKind,
    not_null: bool,
    raw: bool,
}

impl ColumnDecoder {
    /// Resolve the plan for `column`. With `raw_results` every cell is
    /// returned as a copy of its bytes regardless of the reported type.
    pub fn new(column: &ColumnDescriptor, raw_results: bool) -> Self {
        let kind = classify(&column.database_type_name);
        let int_kind = column.scan_kind.unwrap_or(if is_unsigned_name(&column.database_type_name) {
            ScanKind::U64
        } else {
            ScanKind::I64
        });

        Self {
            kind,
            int_kind,
            not_null: column.is_not_null(),
            raw: raw_results,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Decode one cell of this column.
    pub fn decode(&self, cell: RawCell) -> DecodedValue {
        if self.raw {
            return match cell {
                RawCell::Null if self.not_null => DecodedValue::Bare(Value::Bytes(Vec::new())),
                RawCell::Null => DecodedValue::Absent,
                RawCell::Bytes(bytes) => DecodedValue::wrap(Some(Value::Bytes(bytes)), self.not_null),
            };
        }

        if self.kind == ColumnKind::Null {
            return DecodedValue::Absent;
        }

        let text = match &cell {
            RawCell::Bytes(bytes) => Some(String::from_utf8_lossy(bytes)),
            RawCell::Null => None,
        };

        match text {
            None if self.not_null => {
                // Driver promised NOT NULL; trust it and hand back the zero value.
                DecodedValue::wrap(self.zero_value(), true)
            },
            None => DecodedValue::Absent,
            Some(text) => DecodedValue::wrap(self.parse(&text), self.not_null),
        }
    }

    fn parse(&self, text: &str) -> Option<Value> {
        match self.kind {
            ColumnKind::Text => Some(Value::Text(text.to_string())),
            ColumnKind::Float => Some(Value::Float(text.trim().parse::<f64>().unwrap_or(0.0))),
            ColumnKind::Integer => Some(parse_int(self.int_kind, text.trim())),
            ColumnKind::Bool => Some(Value::Bool(parse_bool(text))),
            ColumnKind::Timestamp => Some(Value::Timestamp(parse_timestamp(text).unwrap_or_default())),
            ColumnKind::Date => Some(Value::Date(parse_date(text).unwrap_or_default())),
            ColumnKind::Time => Some(Value::Time(parse_time(text).unwrap_or_default())),
            ColumnKind::Json => serde_json::from_str(text).ok().map(Value::Json),
            ColumnKind::Null => None,
        }
    }

    fn zero_value(&self) -> Option<Value> {
        match self.kind {
            ColumnKind::Text => Some(Value::Text(String::new())),
            ColumnKind::Float => Some(Value::Float(0.0)),
            ColumnKind::Integer => Some(parse_int(self.int_kind, "0")),
            ColumnKind::Bool => Some(Value::Bool(false)),
            ColumnKind::Timestamp => Some(Value::Timestamp(DateTime::<Utc>::default())),
            ColumnKind::Date => Some(Value::Date(NaiveDate::default())),
            ColumnKind::Time => Some(Value::Time(NaiveTime::default())),
            ColumnKind::Json => Some(Value::Json(serde_json::Value::Null)),
            ColumnKind::Null => None,
        }
    }
}

/// Decode one cell without a precomputed plan.
pub fn decode_cell(column: &ColumnDescriptor, cell: RawCell, raw_results: bool) -> DecodedValue {
    ColumnDecoder::new(column, raw_results).decode(cell)
}

fn parse_int(kind: ScanKind, text: &str) -> Value {
    match kind {
        ScanKind::I8 => Value::I8(text.parse().unwrap_or(0)),
        ScanKind::I16 => Value::I16(text.parse().unwrap_or(0)),
        ScanKind::I32 => Value::I32(text.parse().unwrap_or(0)),
        ScanKind::I64 => Value::I64(text.parse().unwrap_or(0)),
        ScanKind::U8 => Value::U8(text.parse().unwrap_or(0)),
        ScanKind::U16 => Value::U16(text.parse().unwrap_or(0)),
        ScanKind::U32 => Value::U32(text.parse().unwrap_or(0)),
        ScanKind::U64 => Value::U64(text.parse().unwrap_or(0)),
    }
}

/// Only "true", "TRUE" and "1" are true.
pub(crate) fn parse_bool(text: &str) -> bool {
    matches!(text, "true" | "TRUE" | "1")
}

/// "YYYY-MM-DD HH:MM:SS[.frac]" as UTC, then RFC 3339.
pub(crate) fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, TIMESTAMP_LAYOUT) {
        return Some(Utc.from_utc_datetime(&naive));
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// "YYYY-MM-DD", then the date portion of an RFC 3339 timestamp in its own offset.
pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, DATE_LAYOUT) {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive())
}

pub(crate) fn parse_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), TIME_LAYOUT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Nullability;
    use serde_json::json;

    fn col(type_name: &str, nullability: Nullability) -> ColumnDescriptor {
        ColumnDescriptor::new("c", type_name).with_nullability(nullability)
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify("varchar"), ColumnKind::Text);
        assert_eq!(classify("BigInt"), ColumnKind::Integer);
        assert_eq!(classify("UNSIGNED INT"), ColumnKind::Integer);
        assert_eq!(classify("decimal"), ColumnKind::Float);
        assert_eq!(classify("timestamptz"), ColumnKind::Timestamp);
        assert_eq!(classify("jsonb"), ColumnKind::Json);
        assert_eq!(classify("GEOMETRY"), ColumnKind::Text, "unknown types fall back to text");
    }

    #[test]
    fn test_not_null_values_are_bare() {
        let column = col("INT", Nullability::NotNull);
        assert_eq!(decode_cell(&column, "42".into(), false), DecodedValue::Bare(Value::I64(42)));
    }

    #[test]
    fn test_not_null_null_cell_degrades_to_zero() {
        let cases = [
            ("VARCHAR", Value::Text(String::new())),
            ("INT", Value::I64(0)),
            ("DOUBLE", Value::Float(0.0)),
            ("BOOL", Value::Bool(false)),
            ("DATE", Value::Date(NaiveDate::default())),
        ];
        for (type_name, zero) in cases {
            let decoded = decode_cell(&col(type_name, Nullability::NotNull), RawCell::Null, false);
            assert_eq!(decoded, DecodedValue::Bare(zero), "zero value for {}", type_name);
        }
    }

    #[test]
    fn test_nullable_and_unknown_are_wrapped() {
        for nullability in [Nullability::Nullable, Nullability::Unknown] {
            let column = col("VARCHAR", nullability);
            assert_eq!(decode_cell(&column, RawCell::Null, false), DecodedValue::Absent);
            assert_eq!(
                decode_cell(&column, "bob".into(), false),
                DecodedValue::Present(Value::Text("bob".to_string()))
            );
        }
    }

    #[test]
    fn test_integer_width_follows_scan_hint() {
        let column = col("TINYINT", Nullability::NotNull).with_scan_kind(ScanKind::U8);
        assert_eq!(decode_cell(&column, "200".into(), false), DecodedValue::Bare(Value::U8(200)));

        let column = col("INT", Nullability::NotNull).with_scan_kind(ScanKind::I32);
        assert_eq!(decode_cell(&column, "-7".into(), false), DecodedValue::Bare(Value::I32(-7)));

        let column = col("BIGINT UNSIGNED", Nullability::NotNull);
        assert_eq!(
            decode_cell(&column, "18446744073709551615".into(), false),
            DecodedValue::Bare(Value::U64(u64::MAX))
        );
    }

    #[test]
    fn test_malformed_numbers_degrade_to_zero() {
        let int_col = col("INT", Nullability::Nullable);
        assert_eq!(decode_cell(&int_col, "abc".into(), false), DecodedValue::Present(Value::I64(0)));

        let float_col = col("NUMERIC", Nullability::Nullable);
        assert_eq!(decode_cell(&float_col, "1.5".into(), false), DecodedValue::Present(Value::Float(1.5)));
        assert_eq!(decode_cell(&float_col, "x1".into(), false), DecodedValue::Present(Value::Float(0.0)));
    }

    #[test]
    fn test_bool_normalization() {
        let column = col("BOOL", Nullability::NotNull);
        for (text, expected) in [("true", true), ("TRUE", true), ("1", true), ("0", false), ("yes", false)] {
            assert_eq!(
                decode_cell(&column, text.into(), false),
                DecodedValue::Bare(Value::Bool(expected)),
                "bool text {:?}",
                text
            );
        }
    }

    #[test]
    fn test_timestamp_layouts() {
        let column = col("DATETIME", Nullability::NotNull);
        let expected = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap();
        assert_eq!(
            decode_cell(&column, "2024-03-09 14:30:05".into(), false),
            DecodedValue::Bare(Value::Timestamp(expected))
        );
        assert_eq!(
            decode_cell(&column, "2024-03-09T16:30:05+02:00".into(), false),
            DecodedValue::Bare(Value::Timestamp(expected)),
            "falls back to RFC 3339 and normalizes to UTC"
        );
        assert_eq!(
            decode_cell(&column, "not a time".into(), false),
            DecodedValue::Bare(Value::Timestamp(DateTime::<Utc>::default()))
        );
    }

    #[test]
    fn test_date_and_time_layouts() {
        let date_col = col("DATE", Nullability::Nullable);
        let day = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(decode_cell(&date_col, "2023-12-31".into(), false), DecodedValue::Present(Value::Date(day)));
        assert_eq!(
            decode_cell(&date_col, "2023-12-31T23:00:00-05:00".into(), false),
            DecodedValue::Present(Value::Date(day)),
            "date portion is taken in the timestamp's own offset"
        );

        let time_col = col("TIME", Nullability::Nullable);
        let time = NaiveTime::from_hms_milli_opt(8, 15, 0, 250).unwrap();
        assert_eq!(decode_cell(&time_col, "08:15:00.25".into(), false), DecodedValue::Present(Value::Time(time)));
    }

    #[test]
    fn test_json_columns() {
        let column = col("JSON", Nullability::Nullable);
        assert_eq!(
            decode_cell(&column, r#"{"a":[1,2]}"#.into(), false),
            DecodedValue::Present(Value::Json(json!({"a": [1, 2]})))
        );
        assert_eq!(decode_cell(&column, "{broken".into(), false), DecodedValue::Absent);

        let strict = col("JSONB", Nullability::NotNull);
        assert_eq!(decode_cell(&strict, "{broken".into(), false), DecodedValue::Absent);
    }

    #[test]
    fn test_null_typed_column_is_absent() {
        let column = col("NULL", Nullability::NotNull);
        assert_eq!(decode_cell(&column, "anything".into(), false), DecodedValue::Absent);
    }

    #[test]
    fn test_raw_results_copy_bytes() {
        let column = col("INT", Nullability::NotNull);
        assert_eq!(
            decode_cell(&column, "12".into(), true),
            DecodedValue::Bare(Value::Bytes(b"12".to_vec()))
        );
        assert_eq!(
            decode_cell(&column, RawCell::Null, true),
            DecodedValue::Bare(Value::Bytes(Vec::new())),
            "NOT NULL raw cells are never wrapped"
        );
    }

    #[test]
    fn test_raw_results_follow_nullability() {
        for nullability in [Nullability::Nullable, Nullability::Unknown] {
            let column = col("VARCHAR", nullability);
            assert_eq!(
                decode_cell(&column, "x".into(), true),
                DecodedValue::Present(Value::Bytes(b"x".to_vec()))
            );
            assert_eq!(decode_cell(&column, RawCell::Null, true), DecodedValue::Absent);
        }
    }
}
