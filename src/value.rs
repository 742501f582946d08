use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::data_type::DATE_FORMAT;

/// Represents a single typed value stored in a row.
///
/// Values only come out of [`DataType::convert`](crate::DataType::convert); raw strings are never
/// stored or compared. Ordering is only meaningful between values of the
/// same variant, which is always the case within one field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    /// A 64-bit signed integer value.
    Int(i64),
    /// A UTF-8 string value, wrapped in an [Arc] for cheap cloning.
    Text(Arc<str>),
    /// A calendar date.
    Date(NaiveDate),
}

impl Value {
    /// Returns the inner integer value if this is a [Value::Int].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

/// Renders the value the way it was typed in; dates use ISO `YYYY-MM-DD`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Value {
        Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(42).as_int(), Some(42));
        assert_eq!(Value::Text("42".into()).as_int(), None);
    }

    #[test]
    fn test_ordering_within_type() {
        assert!(Value::Int(2) > Value::Int(1));
        assert!(Value::Text("SDE2".into()) < Value::Text("SDE6".into()));
        assert!(date(2022, 1, 5) < date(2022, 8, 5));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Text("Bob Dylan".into()).to_string(), "Bob Dylan");
        assert_eq!(date(2022, 6, 5).to_string(), "2022-06-05");
    }
}
