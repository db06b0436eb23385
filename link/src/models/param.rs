use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::Value as JsonValue;

use super::value::Value;

/// One bound statement argument. `None` binds SQL NULL.
pub type Param = Option<Value>;

/// A positional argument as supplied by the caller.
///
/// Lists are flattened in place before execution so that
/// `(1, [2, 3], 4)` binds four placeholders.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Param(Param),
    List(Vec<Param>),
}

impl Arg {
    pub fn null() -> Self {
        Arg::Param(None)
    }

    /// Build a list argument from any iterator of values.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: IntoParam,
    {
        Arg::List(items.into_iter().map(IntoParam::into_param).collect())
    }
}

/// Flatten list arguments in place, preserving left-to-right order across
/// all arguments and within each list.
pub fn flatten_args(args: Vec<Arg>) -> Vec<Param> {
    let mut flat = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Arg::Param(param) => flat.push(param),
            Arg::List(items) => flat.extend(items),
        }
    }
    flat
}

/// Conversion into a single bound argument.
pub trait IntoParam {
    fn into_param(self) -> Param;
}

impl IntoParam for Value {
    fn into_param(self) -> Param {
        Some(self)
    }
}

impl IntoParam for Option<Value> {
    fn into_param(self) -> Param {
        self
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Param(Some(value))
    }
}

impl From<Option<Value>> for Arg {
    fn from(value: Option<Value>) -> Self {
        Arg::Param(value)
    }
}

impl From<Vec<Value>> for Arg {
    fn from(values: Vec<Value>) -> Self {
        Arg::List(values.into_iter().map(Some).collect())
    }
}

impl From<Vec<Option<Value>>> for Arg {
    fn from(values: Vec<Option<Value>>) -> Self {
        Arg::List(values)
    }
}

macro_rules! impl_arg_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoParam for $ty {
                fn into_param(self) -> Param {
                    Some(Value::from(self))
                }
            }

            impl IntoParam for Option<$ty> {
                fn into_param(self) -> Param {
                    self.map(Value::from)
                }
            }

            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Param(value.into_param())
                }
            }

            impl From<Option<$ty>> for Arg {
                fn from(value: Option<$ty>) -> Self {
                    Arg::Param(value.into_param())
                }
            }
        )*
    };
}

// Scalars that may also appear as list elements.
macro_rules! impl_arg_list_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for Arg {
                fn from(values: Vec<$ty>) -> Self {
                    Arg::list(values)
                }
            }

            impl From<Vec<Option<$ty>>> for Arg {
                fn from(values: Vec<Option<$ty>>) -> Self {
                    Arg::list(values)
                }
            }
        )*
    };
}

impl_arg_from!(
    String,
    &str,
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
    bool,
    NaiveDate,
    NaiveTime,
    DateTime<Utc>,
    JsonValue,
    Vec<u8>,
);

// `Vec<u8>` is a bytes scalar, never a list of u8.
impl_arg_list_from!(
    String,
    &str,
    i8,
    i16,
    i32,
    i64,
    u16,
    u32,
    u64,
    f32,
    f64,
    bool,
    NaiveDate,
    NaiveTime,
    DateTime<Utc>,
);
