use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::id::truncate_to_micros;

/// The scalar types a [`FieldSchema`](crate::schema::FieldSchema) or tag attr
/// can carry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BasicType {
    Boolean,
    Integer,
    Float,
    Decimal,
    String,
    Date,
    Datetime,
}

/// A typed attr/field value. Decimals are carried as text to preserve
/// arbitrary precision ("decimals are arbitrary precision
/// text"); datetimes are always truncated to microseconds before encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Decimal(String),
    String(String),
    Date(NaiveDate),
    Datetime(DateTime<Utc>),
    Array(Vec<Value>),
    Null,
}

impl Value {
    pub fn basic_type(&self) -> Option<BasicType> {
        match self {
            Value::Boolean(_) => Some(BasicType::Boolean),
            Value::Integer(_) => Some(BasicType::Integer),
            Value::Float(_) => Some(BasicType::Float),
            Value::Decimal(_) => Some(BasicType::Decimal),
            Value::String(_) => Some(BasicType::String),
            Value::Date(_) => Some(BasicType::Date),
            Value::Datetime(_) => Some(BasicType::Datetime),
            Value::Array(_) | Value::Null => None,
        }
    }
}

/// Native Rust scalar used as the encode/decode boundary for [`Value`].
#[derive(Debug, Clone, PartialEq)]
pub enum Native {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Decimal(BigDecimal),
    String(String),
    Date(NaiveDate),
    Datetime(DateTime<Utc>),
}

/// Encodes a native scalar into the typed wire [`Value`] for the given
/// [`BasicType`]. Fails with [`Error::WrongType`] if the native value's shape
/// does not match `basic_type`.
pub fn encode_value(basic_type: BasicType, native: &Native) -> Result<Value> {
    match (basic_type, native) {
        (BasicType::Boolean, Native::Boolean(b)) => Ok(Value::Boolean(*b)),
        (BasicType::Integer, Native::Integer(i)) => Ok(Value::Integer(*i)),
        (BasicType::Float, Native::Float(f)) => Ok(Value::Float(*f)),
        (BasicType::Decimal, Native::Decimal(d)) => Ok(Value::Decimal(d.to_string())),
        (BasicType::String, Native::String(s)) => Ok(Value::String(s.clone())),
        (BasicType::Date, Native::Date(d)) => Ok(Value::Date(*d)),
        (BasicType::Datetime, Native::Datetime(dt)) => {
            Ok(Value::Datetime(encode_datetime(*dt)))
        }
        _ => Err(Error::WrongType {
            expected: format!("{basic_type:?}"),
            found: format!("{native:?}"),
        }),
    }
}

/// Decodes a wire [`Value`] back into its native scalar.
pub fn decode_value(value: &Value) -> Result<Native> {
    match value {
        Value::Boolean(b) => Ok(Native::Boolean(*b)),
        Value::Integer(i) => Ok(Native::Integer(*i)),
        Value::Float(f) => Ok(Native::Float(*f)),
        Value::Decimal(s) => BigDecimal::from_str(s)
            .map(Native::Decimal)
            .map_err(|e| Error::data_loss(format!("invalid decimal literal '{s}': {e}"))),
        Value::String(s) => Ok(Native::String(s.clone())),
        Value::Date(d) => Ok(Native::Date(*d)),
        Value::Datetime(dt) => Ok(Native::Datetime(*dt)),
        Value::Array(_) | Value::Null => {
            Err(Error::data_loss("cannot decode array/null as a scalar native value"))
        }
    }
}

/// Truncates a datetime to microsecond precision before it is encoded,
/// matching the wire format's resolution.
pub fn encode_datetime(dt: DateTime<Utc>) -> DateTime<Utc> {
    truncate_to_micros(dt)
}

/// Encodes a [`NaiveDate`] value (dates carry no time component or timezone).
pub fn encode_date(d: NaiveDate) -> NaiveDate {
    d
}
