//! Mapping between SQLite values and [`ScalarValue`].

use rusqlite::types::{Value, ValueRef};

use narrata_core::models::ScalarValue;

/// Read a column value. Blobs have no scalar counterpart and are rendered as
/// lossy UTF-8 text.
pub fn from_value_ref(value: ValueRef<'_>) -> ScalarValue {
    match value {
        ValueRef::Null => ScalarValue::Null,
        ValueRef::Integer(i) => ScalarValue::Integer(i),
        ValueRef::Real(r) => ScalarValue::Real(r),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            ScalarValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// Convert a binding into an owned SQLite value.
pub fn to_sql_value(value: &ScalarValue) -> Value {
    match value {
        ScalarValue::Null => Value::Null,
        ScalarValue::Integer(i) => Value::Integer(*i),
        ScalarValue::Real(r) => Value::Real(*r),
        ScalarValue::Text(s) => Value::Text(s.clone()),
    }
}
