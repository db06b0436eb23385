//! Binding decoded rows into caller-defined record types.
//!
//! A destination type implements [`Record`], listing its fields as
//! `(tag, accessor)` pairs. Column names are matched against tags once per
//! query; each row then starts from `T::default()` and only the matched
//! fields are overwritten.
//!
//! Records may also opt into two capabilities, reported once per query by
//! [`Record::capabilities`]:
//! - fast scan: raw cells are parsed straight into [`ScanSlot`]s in cursor
//!   column order, skipping generic decoding
//! - post-processing: [`Record::post_process`] runs after every row is read
//!
//! # Example
//!
//! ```rust
//! use dbq_link::{Field, Record};
//!
//! #[derive(Default)]
//! struct User {
//!     id: i64,
//!     name: String,
//!     email: Option<String>,
//! }
//!
//! impl Record for User {
//!     fn fields() -> Vec<Field<Self>> {
//!         vec![
//!             Field::new("id", |u: &mut User| &mut u.id),
//!             Field::new("name", |u: &mut User| &mut u.name),
//!             Field::new("email", |u: &mut User| &mut u.email),
//!         ]
//!     }
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

use crate::decode::{parse_bool, parse_date, parse_time, parse_timestamp, ColumnDecoder};
use crate::error::{BoxError, LinkError, Result};
use crate::models::{ColumnDescriptor, DecodeHook, DecodedValue, RawCell, Value};

/// Optional behaviours a record type supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// [`Record::scan_slots`] exposes one slot per cursor column
    pub fast_scan: bool,
    /// [`Record::post_process`] should run after all rows are read
    pub post_process: bool,
}

impl Capabilities {
    pub const NONE: Capabilities = Capabilities {
        fast_scan: false,
        post_process: false,
    };
}

/// A destination record type.
#[async_trait]
pub trait Record: Default + Send + 'static {
    /// Tagged fields used by the generic binder.
    fn fields() -> Vec<Field<Self>>;

    /// Capabilities of this type. Queried once per call, never per row.
    fn capabilities() -> Capabilities {
        Capabilities::NONE
    }

    /// One scan target per cursor column, in cursor column order.
    /// Only consulted when `capabilities().fast_scan` is set.
    fn scan_slots(&mut self) -> Vec<&mut dyn ScanSlot> {
        Vec::new()
    }

    /// Hook run after every row has been read. `index` is this record's
    /// position among `count` records. Implementations should stop early
    /// once `ctx` is cancelled.
    async fn post_process(
        &mut self,
        _ctx: &CancellationToken,
        _index: usize,
        _count: usize,
    ) -> std::result::Result<(), BoxError> {
        Ok(())
    }
}

impl Record for () {
    fn fields() -> Vec<Field<Self>> {
        Vec::new()
    }
}

type Setter<T> =
    Box<dyn Fn(&mut T, DecodedValue, bool) -> std::result::Result<(), String> + Send + Sync>;

/// One tagged field of a record type.
pub struct Field<T> {
    tag: &'static str,
    setter: Setter<T>,
}

impl<T> Field<T> {
    /// Bind column `tag` to the field returned by `access`.
    pub fn new<V, F>(tag: &'static str, access: F) -> Self
    where
        V: FromDecoded,
        F: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        Self {
            tag,
            setter: Box::new(move |record: &mut T, value: DecodedValue, weak: bool| {
                *access(record) = V::from_decoded(value, weak)?;
                Ok(())
            }),
        }
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }
}

/// Per-query binding plan for the generic path.
pub(crate) struct Binder<T: Record> {
    fields: Vec<Field<T>>,
    /// Field index for each cursor column, None when no field is tagged with it
    targets: Vec<Option<usize>>,
    weak: bool,
    hook: Option<DecodeHook>,
}

impl<T: Record> Binder<T> {
    /// Validate `T`'s field tags and resolve them against `columns`.
    pub(crate) fn new(
        columns: &[ColumnDescriptor],
        weak: bool,
        hook: Option<DecodeHook>,
    ) -> Result<Self> {
        let fields = T::fields();
        let mut by_tag: HashMap<&'static str, usize> = HashMap::with_capacity(fields.len());
        for (idx, field) in fields.iter().enumerate() {
            if field.tag.trim().is_empty() {
                return Err(LinkError::configuration(format!(
                    "field #{} of {} has an empty tag",
                    idx,
                    std::any::type_name::<T>()
                )));
            }
            if by_tag.insert(field.tag, idx).is_some() {
                return Err(LinkError::configuration(format!(
                    "duplicate field tag '{}' on {}",
                    field.tag,
                    std::any::type_name::<T>()
                )));
            }
        }

        let targets = columns
            .iter()
            .map(|column| by_tag.get(column.name.as_str()).copied())
            .collect();

        Ok(Self {
            fields,
            targets,
            weak,
            hook,
        })
    }

    /// Populate a fresh record from one row of decoded values.
    pub(crate) fn bind(&self, columns: &[ColumnDescriptor], values: Vec<DecodedValue>) -> Result<T> {
        let mut record = T::default();
        for ((column, target), value) in columns.iter().zip(&self.targets).zip(values) {
            let Some(field_idx) = *target else {
                continue;
            };
            let value = match &self.hook {
                Some(hook) => hook(column, value)
                    .map_err(|e| LinkError::binding(&column.name, format!("decode hook: {}", e)))?,
                None => value,
            };
            (self.fields[field_idx].setter)(&mut record, value, self.weak)
                .map_err(|message| LinkError::binding(&column.name, message))?;
        }
        Ok(record)
    }

    /// Decode a row of raw cells, then bind it.
    pub(crate) fn decode_and_bind(
        &self,
        columns: &[ColumnDescriptor],
        decoders: &[ColumnDecoder],
        cells: Vec<RawCell>,
    ) -> Result<T> {
        let values = decoders
            .iter()
            .zip(cells)
            .map(|(decoder, cell)| decoder.decode(cell))
            .collect();
        self.bind(columns, values)
    }
}

/// Fast path: scan raw cells straight into the record's slots.
pub(crate) fn scan_record<T: Record>(columns: &[ColumnDescriptor], cells: Vec<RawCell>) -> Result<T> {
    let mut record = T::default();
    {
        let slots = record.scan_slots();
        if slots.len() != cells.len() {
            return Err(LinkError::configuration(format!(
                "{} exposes {} scan slots but the row has {} columns",
                std::any::type_name::<T>(),
                slots.len(),
                cells.len()
            )));
        }
        for ((slot, cell), column) in slots.into_iter().zip(cells).zip(columns) {
            slot.scan(cell)
                .map_err(|message| LinkError::binding(&column.name, message))?;
        }
    }
    Ok(record)
}

/// Check a fast-scan record type against the cursor once, before any row.
pub(crate) fn check_scan_slots<T: Record>(columns: &[ColumnDescriptor]) -> Result<()> {
    let mut probe = T::default();
    let slots = probe.scan_slots().len();
    if slots != columns.len() {
        return Err(LinkError::configuration(format!(
            "{} exposes {} scan slots but the query returns {} columns",
            std::any::type_name::<T>(),
            slots,
            columns.len()
        )));
    }
    Ok(())
}

/// Conversion from a decoded value into a record field.
///
/// `weak` enables lossy cross-type assignment (numbers to strings, numeric
/// strings to numbers, integers to bools). Absent values leave scalar fields
/// at their default and set `Option` fields to `None`.
///
/// Even without `weak`, a float assigned to an integer field is converted
/// with `as`: the fraction is truncated and out-of-range values saturate.
/// Raw bytes go into `String` fields when they are valid UTF-8 (lossily
/// with `weak`).
pub trait FromDecoded: Sized {
    fn from_decoded(value: DecodedValue, weak: bool) -> std::result::Result<Self, String>;
}

impl FromDecoded for DecodedValue {
    fn from_decoded(value: DecodedValue, _weak: bool) -> std::result::Result<Self, String> {
        Ok(value)
    }
}

impl FromDecoded for Option<Value> {
    fn from_decoded(value: DecodedValue, _weak: bool) -> std::result::Result<Self, String> {
        Ok(value.into_value())
    }
}

trait FromValue: Sized {
    const NAME: &'static str;

    fn from_value(value: Value, weak: bool) -> Option<Self>;
}

fn mismatch<T: FromValue>(value: &Value) -> String {
    format!("cannot assign {} value to {}", value.type_name(), T::NAME)
}

fn convert<T: FromValue>(value: Value, weak: bool) -> std::result::Result<T, String> {
    let err = mismatch::<T>(&value);
    T::from_value(value, weak).ok_or(err)
}

macro_rules! impl_from_decoded {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromDecoded for $ty {
                fn from_decoded(value: DecodedValue, weak: bool) -> std::result::Result<Self, String> {
                    match value.into_value() {
                        Some(v) => convert::<$ty>(v, weak),
                        None => Ok(<$ty>::default()),
                    }
                }
            }

            impl FromDecoded for Option<$ty> {
                fn from_decoded(value: DecodedValue, weak: bool) -> std::result::Result<Self, String> {
                    value.into_value().map(|v| convert::<$ty>(v, weak)).transpose()
                }
            }
        )*
    };
}

impl_from_decoded!(
    String,
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    NaiveDate,
    NaiveTime,
    DateTime<Utc>,
    JsonValue,
    Vec<u8>,
);

macro_rules! impl_from_value_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromValue for $ty {
                const NAME: &'static str = stringify!($ty);

                fn from_value(value: Value, weak: bool) -> Option<Self> {
                    if let Some(i) = value.as_i128() {
                        return <$ty>::try_from(i).ok();
                    }
                    match value {
                        Value::Float(f) => Some(f as $ty),
                        Value::Bool(b) if weak => Some(b as $ty),
                        Value::Text(s) if weak => {
                            let s = s.trim();
                            if s.is_empty() {
                                Some(0)
                            } else {
                                s.parse::<$ty>()
                                    .ok()
                                    .or_else(|| s.parse::<f64>().ok().map(|f| f as $ty))
                            }
                        },
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! impl_from_value_float {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromValue for $ty {
                const NAME: &'static str = stringify!($ty);

                fn from_value(value: Value, weak: bool) -> Option<Self> {
                    if let Some(f) = value.as_f64() {
                        return Some(f as $ty);
                    }
                    match value {
                        Value::Bool(b) if weak => Some(if b { 1.0 } else { 0.0 }),
                        Value::Text(s) if weak => {
                            let s = s.trim();
                            if s.is_empty() {
                                Some(0.0)
                            } else {
                                s.parse::<$ty>().ok()
                            }
                        },
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_from_value_float!(f32, f64);

impl FromValue for String {
    const NAME: &'static str = "String";

    fn from_value(value: Value, weak: bool) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s),
            Value::Bool(b) if weak => Some(if b { "1" } else { "0" }.to_string()),
            Value::Float(f) if weak => Some(f.to_string()),
            Value::Bytes(b) => match String::from_utf8(b) {
                Ok(s) => Some(s),
                Err(e) if weak => Some(String::from_utf8_lossy(e.as_bytes()).into_owned()),
                Err(_) => None,
            },
            other if weak && other.is_integer() => other.as_i128().map(|i| i.to_string()),
            _ => None,
        }
    }
}

impl FromValue for bool {
    const NAME: &'static str = "bool";

    fn from_value(value: Value, weak: bool) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(b),
            Value::Float(f) if weak => Some(f != 0.0),
            Value::Text(s) if weak => match s.trim() {
                "" => Some(false),
                "t" | "T" | "True" => Some(true),
                "f" | "F" | "FALSE" | "False" | "false" | "0" => Some(false),
                other if parse_bool(other) => Some(true),
                _ => None,
            },
            other if weak && other.is_integer() => other.as_i128().map(|i| i != 0),
            _ => None,
        }
    }
}

impl FromValue for NaiveDate {
    const NAME: &'static str = "NaiveDate";

    fn from_value(value: Value, weak: bool) -> Option<Self> {
        match value {
            Value::Date(d) => Some(d),
            Value::Timestamp(ts) if weak => Some(ts.date_naive()),
            Value::Text(s) if weak => parse_date(&s),
            _ => None,
        }
    }
}

impl FromValue for NaiveTime {
    const NAME: &'static str = "NaiveTime";

    fn from_value(value: Value, weak: bool) -> Option<Self> {
        match value {
            Value::Time(t) => Some(t),
            Value::Timestamp(ts) if weak => Some(ts.time()),
            Value::Text(s) if weak => parse_time(&s),
            _ => None,
        }
    }
}

impl FromValue for DateTime<Utc> {
    const NAME: &'static str = "DateTime<Utc>";

    fn from_value(value: Value, weak: bool) -> Option<Self> {
        match value {
            Value::Timestamp(ts) => Some(ts),
            Value::Text(s) if weak => parse_timestamp(&s),
            _ => None,
        }
    }
}

impl FromValue for JsonValue {
    const NAME: &'static str = "serde_json::Value";

    fn from_value(value: Value, _weak: bool) -> Option<Self> {
        match value {
            Value::Json(v) => Some(v),
            other => serde_json::to_value(&other).ok(),
        }
    }
}

impl FromValue for Vec<u8> {
    const NAME: &'static str = "Vec<u8>";

    fn from_value(value: Value, weak: bool) -> Option<Self> {
        match value {
            Value::Bytes(b) => Some(b),
            Value::Text(s) if weak => Some(s.into_bytes()),
            _ => None,
        }
    }
}

/// Direct scan target for the fast path.
///
/// Unlike the generic decoder this is strict: NULL into a non-`Option`
/// slot, or text that does not parse, is a binding error.
pub trait ScanSlot: Send {
    fn scan(&mut self, cell: RawCell) -> std::result::Result<(), String>;
}

trait ParseCell: Sized {
    const NAME: &'static str;

    fn parse_cell(bytes: Vec<u8>) -> Option<Self>;
}

macro_rules! impl_parse_cell_from_str {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ParseCell for $ty {
                const NAME: &'static str = stringify!($ty);

                fn parse_cell(bytes: Vec<u8>) -> Option<Self> {
                    std::str::from_utf8(&bytes).ok()?.trim().parse().ok()
                }
            }
        )*
    };
}

impl_parse_cell_from_str!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl ParseCell for String {
    const NAME: &'static str = "String";

    fn parse_cell(bytes: Vec<u8>) -> Option<Self> {
        String::from_utf8(bytes).ok()
    }
}

impl ParseCell for bool {
    const NAME: &'static str = "bool";

    fn parse_cell(bytes: Vec<u8>) -> Option<Self> {
        match std::str::from_utf8(&bytes).ok()?.trim() {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
            _ => None,
        }
    }
}

impl ParseCell for NaiveDate {
    const NAME: &'static str = "NaiveDate";

    fn parse_cell(bytes: Vec<u8>) -> Option<Self> {
        parse_date(std::str::from_utf8(&bytes).ok()?)
    }
}

impl ParseCell for NaiveTime {
    const NAME: &'static str = "NaiveTime";

    fn parse_cell(bytes: Vec<u8>) -> Option<Self> {
        parse_time(std::str::from_utf8(&bytes).ok()?)
    }
}

impl ParseCell for DateTime<Utc> {
    const NAME: &'static str = "DateTime<Utc>";

    fn parse_cell(bytes: Vec<u8>) -> Option<Self> {
        parse_timestamp(std::str::from_utf8(&bytes).ok()?)
    }
}

impl ParseCell for JsonValue {
    const NAME: &'static str = "serde_json::Value";

    fn parse_cell(bytes: Vec<u8>) -> Option<Self> {
        serde_json::from_slice(&bytes).ok()
    }
}

impl ParseCell for Vec<u8> {
    const NAME: &'static str = "Vec<u8>";

    fn parse_cell(bytes: Vec<u8>) -> Option<Self> {
        Some(bytes)
    }
}

fn parse_into<T: ParseCell>(bytes: Vec<u8>) -> std::result::Result<T, String> {
    T::parse_cell(bytes).ok_or_else(|| format!("cannot parse cell as {}", T::NAME))
}

macro_rules! impl_scan_slot {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ScanSlot for $ty {
                fn scan(&mut self, cell: RawCell) -> std::result::Result<(), String> {
                    match cell {
                        RawCell::Null => Err(format!("cannot scan NULL into {}", <$ty as ParseCell>::NAME)),
                        RawCell::Bytes(bytes) => {
                            *self = parse_into::<$ty>(bytes)?;
                            Ok(())
                        },
                    }
                }
            }

            impl ScanSlot for Option<$ty> {
                fn scan(&mut self, cell: RawCell) -> std::result::Result<(), String> {
                    *self = match cell {
                        RawCell::Null => None,
                        RawCell::Bytes(bytes) => Some(parse_into::<$ty>(bytes)?),
                    };
                    Ok(())
                }
            }
        )*
    };
}

impl_scan_slot!(
    String,
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    NaiveDate,
    NaiveTime,
    DateTime<Utc>,
    JsonValue,
    Vec<u8>,
);
