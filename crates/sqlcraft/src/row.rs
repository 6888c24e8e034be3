//! Row mapping traits and utilities

use crate::client::{FieldType, RowSource};
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// The cursor's current row, borrowed for the duration of one reader call.
#[derive(Clone, Copy)]
pub struct Row<'a> {
    source: &'a dyn RowSource,
}

impl std::fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_map();
        for i in 0..self.len() {
            list.entry(&self.column_name(i).unwrap_or("?"), &self.value(i).ok());
        }
        list.finish()
    }
}

impl<'a> Row<'a> {
    pub fn new(source: &'a dyn RowSource) -> Self {
        Self { source }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.source.field_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_name(&self, index: usize) -> Option<&'a str> {
        self.source.field_name(index)
    }

    pub fn field_type(&self, index: usize) -> FieldType {
        self.source.field_type(index)
    }

    /// Position of the column called `name`.
    pub fn index_of(&self, name: &str) -> OrmResult<usize> {
        (0..self.len())
            .find(|&i| self.column_name(i) == Some(name))
            .ok_or_else(|| OrmError::decode(name, "no such column"))
    }

    /// Raw value at `index`.
    pub fn value(&self, index: usize) -> OrmResult<Value> {
        self.source.value(index)
    }

    /// Typed value at `index`.
    pub fn get<T: FromValue>(&self, index: usize) -> OrmResult<T> {
        let value = self.value(index)?;
        T::from_value(value).map_err(|message| {
            OrmError::decode(self.column_name(index).unwrap_or("?"), message)
        })
    }

    /// Try to get a column value by name, returning `OrmError::Decode` on failure
    pub fn try_get<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        let index = self.index_of(column)?;
        let value = self.value(index)?;
        T::from_value(value).map_err(|message| OrmError::decode(column, message))
    }
}

/// Conversion out of a result [`Value`].
///
/// Text is accepted wherever it parses, since text-protocol transports
/// deliver every column as text.
pub trait FromValue: Sized {
    /// Convert, or describe why the value does not fit.
    fn from_value(value: Value) -> Result<Self, String>;
}

fn unexpected<T>(wanted: &str, value: &Value) -> Result<T, String> {
    Err(format!("cannot read {} value as {wanted}", value.kind()))
}

fn parse_text<T: std::str::FromStr>(wanted: &str, s: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    s.trim()
        .parse()
        .map_err(|e| format!("cannot parse {s:?} as {wanted}: {e}"))
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, String> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(n) => Ok(n != 0),
            Value::UInt(n) => Ok(n != 0),
            Value::Text(ref s) => match s.trim().to_ascii_lowercase().as_str() {
                "t" | "true" | "1" | "y" | "yes" => Ok(true),
                "f" | "false" | "0" | "n" | "no" => Ok(false),
                _ => unexpected("bool", &value),
            },
            other => unexpected("bool", &other),
        }
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, String> {
                    let wanted = stringify!($ty);
                    match value {
                        Value::Int(n) => <$ty>::try_from(n).map_err(|e| e.to_string()),
                        Value::UInt(n) => <$ty>::try_from(n).map_err(|e| e.to_string()),
                        Value::Bool(b) => Ok(<$ty>::from(b)),
                        Value::Text(s) => parse_text(wanted, &s),
                        other => unexpected(wanted, &other),
                    }
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(n) => Ok(n as f64),
            Value::UInt(n) => Ok(n as f64),
            #[cfg(feature = "rust_decimal")]
            Value::Decimal(d) => {
                use rust_decimal::prelude::ToPrimitive;
                d.to_f64().ok_or_else(|| format!("decimal {d} does not fit f64"))
            }
            Value::Text(s) => parse_text("f64", &s),
            other => unexpected("f64", &other),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, String> {
        f64::from_value(value).map(|f| f as f32)
    }
}

#[cfg(feature = "rust_decimal")]
impl FromValue for rust_decimal::Decimal {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Decimal(d) => Ok(d),
            Value::Int(n) => Ok(n.into()),
            Value::UInt(n) => Ok(n.into()),
            Value::Text(s) => parse_text("decimal", &s),
            other => unexpected("decimal", &other),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Int(n) => Ok(n.to_string()),
            Value::UInt(n) => Ok(n.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => unexpected("string", &other),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bytes(b) => Ok(b),
            // Postgres bytea text output: \x<hex>
            Value::Text(s) => match s.strip_prefix("\\x") {
                Some(h) => hex::decode(h).map_err(|e| e.to_string()),
                None => Ok(s.into_bytes()),
            },
            other => unexpected("bytes", &other),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::DateTime(dt) => Ok(dt),
            Value::Text(s) => {
                let s = s.trim();
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
                    .map_err(|e| format!("cannot parse {s:?} as datetime: {e}"))
            }
            other => unexpected("datetime", &other),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Date(d) => Ok(d),
            Value::DateTime(dt) => Ok(dt.date()),
            Value::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|e| format!("cannot parse {s:?} as date: {e}")),
            other => unexpected("date", &other),
        }
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Time(t) => Ok(t),
            Value::Text(s) => NaiveTime::parse_from_str(s.trim(), "%H:%M:%S%.f")
                .map_err(|e| format!("cannot parse {s:?} as time: {e}")),
            other => unexpected("time", &other),
        }
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => uuid::Uuid::parse_str(s.trim()).map_err(|e| e.to_string()),
            Value::Bytes(b) => uuid::Uuid::from_slice(&b).map_err(|e| e.to_string()),
            other => unexpected("uuid", &other),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => serde_json::from_str(&s).map_err(|e| e.to_string()),
            Value::Null => Ok(serde_json::Value::Null),
            Value::Bool(b) => Ok(b.into()),
            Value::Int(n) => Ok(n.into()),
            Value::UInt(n) => Ok(n.into()),
            other => unexpected("json", &other),
        }
    }
}

/// Trait for converting a result row into a Rust value.
///
/// # Example
///
/// ```ignore
/// use sqlcraft::{FromRow, Row, OrmResult};
///
/// struct User {
///     id: i64,
///     username: String,
///     email: Option<String>,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row<'_>) -> OrmResult<Self> {
///         Ok(Self {
///             id: row.try_get("id")?,
///             username: row.try_get("username")?,
///             email: row.try_get("email")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a result row into Self
    fn from_row(row: &Row<'_>) -> OrmResult<Self>;
}

macro_rules! impl_from_row_tuple {
    ($($idx:tt: $ty:ident),+) => {
        impl<$($ty: FromValue),+> FromRow for ($($ty,)+) {
            fn from_row(row: &Row<'_>) -> OrmResult<Self> {
                Ok(($(row.get::<$ty>($idx)?,)+))
            }
        }
    };
}

impl_from_row_tuple!(0: A);
impl_from_row_tuple!(0: A, 1: B);
impl_from_row_tuple!(0: A, 1: B, 2: C);
impl_from_row_tuple!(0: A, 1: B, 2: C, 3: D);
impl_from_row_tuple!(0: A, 1: B, 2: C, 3: D, 4: E);
impl_from_row_tuple!(0: A, 1: B, 2: C, 3: D, 4: E, 5: F);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{BufferedCursor, ResultSet, RowCursor};

    async fn positioned(names: &[&str], values: Vec<Value>) -> BufferedCursor {
        let mut cursor = BufferedCursor::new(vec![ResultSet::with_names(names).row(values)]);
        assert!(cursor.next_row().await.unwrap());
        cursor
    }

    #[tokio::test]
    async fn typed_access_by_index_and_name() {
        let cursor = positioned(
            &["id", "name", "score"],
            vec![
                Value::Text("42".into()),
                Value::Text("ann".into()),
                Value::Null,
            ],
        )
        .await;
        let row = Row::new(&cursor);

        assert_eq!(row.len(), 3);
        assert_eq!(row.get::<i64>(0).unwrap(), 42);
        assert_eq!(row.try_get::<String>("name").unwrap(), "ann");
        assert_eq!(row.try_get::<Option<f64>>("score").unwrap(), None);
    }

    #[tokio::test]
    async fn decode_errors_name_the_column() {
        let cursor = positioned(&["n"], vec![Value::Text("abc".into())]).await;
        let row = Row::new(&cursor);

        match row.try_get::<i32>("n").unwrap_err() {
            OrmError::Decode { column, .. } => assert_eq!(column, "n"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(row.try_get::<i32>("missing").is_err());
        assert!(row.get::<i32>(0).is_err());
    }

    #[tokio::test]
    async fn null_needs_option() {
        let cursor = positioned(&["x"], vec![Value::Null]).await;
        let row = Row::new(&cursor);
        assert!(row.get::<String>(0).is_err());
        assert_eq!(row.get::<Option<String>>(0).unwrap(), None);
    }

    #[tokio::test]
    async fn tuples_read_positionally() {
        let cursor = positioned(
            &["a", "b"],
            vec![Value::Int(1), Value::Text("t".into())],
        )
        .await;
        let (a, b) = <(i32, bool)>::from_row(&Row::new(&cursor)).unwrap();
        assert_eq!(a, 1);
        assert!(b);
    }

    #[test]
    fn text_conversions() {
        assert_eq!(
            NaiveDateTime::from_value(Value::Text("2024-01-02 03:04:05.5".into())).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_milli_opt(3, 4, 5, 500)
                .unwrap()
        );
        assert_eq!(
            Vec::<u8>::from_value(Value::Text("\\xdead".into())).unwrap(),
            vec![0xde, 0xad]
        );
        assert_eq!(
            serde_json::Value::from_value(Value::Text(r#"{"a":1}"#.into())).unwrap(),
            serde_json::json!({"a": 1})
        );
        assert!(u8::from_value(Value::Int(300)).is_err());
    }
}
