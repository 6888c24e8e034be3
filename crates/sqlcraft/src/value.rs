//! Literal values rendered into SQL text.
//!
//! Every value that ends up in a statement goes through [`Value`], so there is
//! exactly one place ([`crate::escape::write_literal`]) deciding how it is
//! spelled. Types convert in via [`ToValue`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use std::borrow::Cow;

/// A value that can be rendered as a SQL literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `NULL`
    Null,
    /// Rendered with the dialect's boolean literal.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point; non-finite values are not renderable.
    Float(f64),
    /// Exact decimal.
    #[cfg(feature = "rust_decimal")]
    Decimal(rust_decimal::Decimal),
    /// Text, rendered as a dialect string literal.
    Text(String),
    /// Binary blob, rendered as a dialect hex literal.
    Bytes(Vec<u8>),
    /// Date and time of day (`YYYY-MM-DD HH:MM:SS`).
    DateTime(NaiveDateTime),
    /// Calendar date (`YYYY-MM-DD`).
    Date(NaiveDate),
    /// Time of day (`HH:MM:SS`).
    Time(NaiveTime),
    /// Reference to a mapped table, rendered as its quoted name.
    Table(String),
}

impl Value {
    /// Whether this is `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            #[cfg(feature = "rust_decimal")]
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::DateTime(_) => "datetime",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Table(_) => "table",
        }
    }

    /// Borrow the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Reference to a table, rendered as a quoted identifier instead of a value.
///
/// ```ignore
/// stmt.append("SELECT COUNT(*) FROM {0}", &[TableRef::of::<User>()])?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef(pub String);

impl TableRef {
    /// Reference the table an entity type is mapped to.
    pub fn of<T: crate::schema::TableMeta>() -> Self {
        Self(T::table_name().to_string())
    }
}

/// Conversion into a renderable [`Value`].
pub trait ToValue {
    fn to_value(&self) -> Value;
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! impl_to_value_int {
    ($variant:ident: $($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::$variant((*self).into())
                }
            }
        )*
    };
}

impl_to_value_int!(Int: i8, i16, i32, i64);
impl_to_value_int!(UInt: u8, u16, u32, u64);

impl ToValue for isize {
    fn to_value(&self) -> Value {
        Value::Int(*self as i64)
    }
}

impl ToValue for usize {
    fn to_value(&self) -> Value {
        Value::UInt(*self as u64)
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

#[cfg(feature = "rust_decimal")]
impl ToValue for rust_decimal::Decimal {
    fn to_value(&self) -> Value {
        Value::Decimal(*self)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for Cow<'_, str> {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for char {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for [u8] {
    fn to_value(&self) -> Value {
        Value::Bytes(self.to_vec())
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }
}

impl ToValue for NaiveDate {
    fn to_value(&self) -> Value {
        Value::Date(*self)
    }
}

impl ToValue for NaiveTime {
    fn to_value(&self) -> Value {
        Value::Time(*self)
    }
}

impl<Tz: TimeZone> ToValue for DateTime<Tz> {
    fn to_value(&self) -> Value {
        Value::DateTime(self.naive_utc())
    }
}

impl ToValue for uuid::Uuid {
    fn to_value(&self) -> Value {
        Value::Text(self.hyphenated().to_string())
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for TableRef {
    fn to_value(&self) -> Value {
        Value::Table(self.0.clone())
    }
}
