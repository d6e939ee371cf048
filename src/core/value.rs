// Copyright 2025 Leapjoin Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Runtime values with type information
//!
//! The join engine intersects sorted key streams with binary search, so it
//! needs a *total* order over every pair of values it may ever compare.
//! The ordering rules live on the [`Ord`] implementation below and are
//! pinned by tests; upstream sort operators must establish the same order.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use super::types::DataType;

/// Timestamp formats supported for parsing
/// Order matters - more specific formats first
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z", // RFC3339 with fractional seconds
    "%Y-%m-%dT%H:%M:%S%:z",    // RFC3339
    "%Y-%m-%dT%H:%M:%SZ",      // RFC3339 UTC
    "%Y-%m-%dT%H:%M:%S",       // ISO without timezone
    "%Y-%m-%d %H:%M:%S%.f",    // SQL-style with fractional seconds
    "%Y-%m-%d %H:%M:%S",       // SQL-style
];

/// A runtime value with type information
///
/// Text uses `Arc<str>` so cloning a value into the relation buffers stays
/// cheap during the drain phase.
#[derive(Debug, Clone)]
pub enum Value {
    /// NULL value with optional type hint
    Null(DataType),

    /// 64-bit signed integer
    Integer(i64),

    /// 64-bit floating point
    Float(f64),

    /// UTF-8 text string (Arc for cheap cloning)
    Text(Arc<str>),

    /// Boolean value
    Boolean(bool),

    /// Timestamp (UTC)
    Timestamp(DateTime<Utc>),
}

impl Value {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a NULL value with a type hint
    pub fn null(data_type: DataType) -> Self {
        Value::Null(data_type)
    }

    /// Create a NULL value with unknown type
    pub fn null_unknown() -> Self {
        Value::Null(DataType::Null)
    }

    /// Create an integer value
    pub fn integer(value: i64) -> Self {
        Value::Integer(value)
    }

    /// Create a float value
    pub fn float(value: f64) -> Self {
        Value::Float(value)
    }

    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(Arc::from(value.into().as_str()))
    }

    /// Create a boolean value
    pub fn boolean(value: bool) -> Self {
        Value::Boolean(value)
    }

    /// Create a timestamp value
    pub fn timestamp(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }

    // =========================================================================
    // Type accessors
    // =========================================================================

    /// Returns the data type of this value
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null(dt) => *dt,
            Value::Integer(_) => DataType::Integer,
            Value::Float(_) => DataType::Float,
            Value::Text(_) => DataType::Text,
            Value::Boolean(_) => DataType::Boolean,
            Value::Timestamp(_) => DataType::Timestamp,
        }
    }

    /// Returns true if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    // =========================================================================
    // Value extractors
    // =========================================================================

    /// Extract as i64 without coercion
    pub fn as_int64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Extract as f64, widening integers
    pub fn as_float64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Extract as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null(_) => write!(f, "NULL"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        // NULL equals NULL under the total order, regardless of type hint
        if self.is_null() && other.is_null() {
            return true;
        }
        if self.is_null() || other.is_null() {
            return false;
        }

        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                // NaN != NaN in IEEE 754, but the total order treats them equal
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            // Cross-type numeric equality: Integer(5) == Float(5.0)
            (Value::Integer(i), Value::Float(f)) | (Value::Float(f), Value::Integer(i)) => {
                *f == (*i as f64)
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

#[allow(clippy::non_canonical_partial_ord_impl)]
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Total ordering over values
///
/// The rules, pinned here and by tests:
///
/// 1. NULL orders before every non-NULL value; two NULLs are equal
///    regardless of their type hints.
/// 2. Integer and Float compare numerically against each other, so
///    `Integer(5)` equals `Float(5.0)`.
/// 3. NaN orders after every other numeric value; two NaNs are equal.
/// 4. Values of remaining mixed types order by a fixed type rank:
///    Boolean < numeric < Text < Timestamp.
/// 5. Same-type values use their natural ordering.
///
/// This ordering MUST stay consistent with `PartialEq`: since
/// `Integer(5) == Float(5.0)`, `cmp` between them returns `Equal`.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }

        // Cross-type numeric comparison: Integer vs Float
        match (self, other) {
            (Value::Integer(i), Value::Float(f)) => {
                if f.is_nan() {
                    return Ordering::Less;
                }
                return (*i as f64).partial_cmp(f).unwrap_or(Ordering::Equal);
            }
            (Value::Float(f), Value::Integer(i)) => {
                if f.is_nan() {
                    return Ordering::Greater;
                }
                return f.partial_cmp(&(*i as f64)).unwrap_or(Ordering::Equal);
            }
            _ => {}
        }

        fn type_rank(v: &Value) -> u8 {
            match v {
                Value::Null(_) => 0,
                Value::Boolean(_) => 1,
                // Integer and Float share a rank so they sort together
                Value::Integer(_) | Value::Float(_) => 2,
                Value::Text(_) => 3,
                Value::Timestamp(_) => 4,
            }
        }

        let self_rank = type_rank(self);
        let other_rank = type_rank(other);
        if self_rank != other_rank {
            return self_rank.cmp(&other_rank);
        }

        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => match (a.is_nan(), b.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            },
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Parse a timestamp string in any supported format
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    // Date-only fallback: midnight UTC
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&midnight));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type() {
        assert_eq!(Value::integer(1).data_type(), DataType::Integer);
        assert_eq!(Value::float(1.5).data_type(), DataType::Float);
        assert_eq!(Value::text("a").data_type(), DataType::Text);
        assert_eq!(Value::boolean(true).data_type(), DataType::Boolean);
        assert_eq!(Value::null(DataType::Text).data_type(), DataType::Text);
        assert!(Value::null_unknown().is_null());
    }

    #[test]
    fn test_same_type_ordering() {
        assert_eq!(Value::integer(1).cmp(&Value::integer(2)), Ordering::Less);
        assert_eq!(Value::text("a").cmp(&Value::text("b")), Ordering::Less);
        assert_eq!(
            Value::boolean(false).cmp(&Value::boolean(true)),
            Ordering::Less
        );
        assert_eq!(Value::float(1.0).cmp(&Value::float(1.0)), Ordering::Equal);
    }

    #[test]
    fn test_cross_type_numeric_ordering() {
        assert_eq!(Value::integer(1).cmp(&Value::float(1.5)), Ordering::Less);
        assert_eq!(
            Value::float(2.5).cmp(&Value::integer(2)),
            Ordering::Greater
        );
        assert_eq!(Value::integer(5).cmp(&Value::float(5.0)), Ordering::Equal);
        assert_eq!(Value::integer(5), Value::float(5.0));
    }

    #[test]
    fn test_null_ordering() {
        // NULLs order first and are equal among themselves
        assert_eq!(
            Value::null(DataType::Integer).cmp(&Value::integer(i64::MIN)),
            Ordering::Less
        );
        assert_eq!(
            Value::null(DataType::Integer).cmp(&Value::null(DataType::Text)),
            Ordering::Equal
        );
        assert_eq!(Value::null(DataType::Integer), Value::null(DataType::Text));
        assert_ne!(Value::null_unknown(), Value::integer(0));
    }

    #[test]
    fn test_nan_ordering() {
        // NaN orders after every other number; two NaNs are equal
        assert_eq!(
            Value::float(f64::NAN).cmp(&Value::float(f64::INFINITY)),
            Ordering::Greater
        );
        assert_eq!(
            Value::float(f64::NAN).cmp(&Value::float(f64::NAN)),
            Ordering::Equal
        );
        assert_eq!(
            Value::integer(i64::MAX).cmp(&Value::float(f64::NAN)),
            Ordering::Less
        );
        assert_eq!(Value::float(f64::NAN), Value::float(f64::NAN));
    }

    #[test]
    fn test_mixed_type_rank() {
        // Boolean < numeric < Text < Timestamp
        assert_eq!(
            Value::boolean(true).cmp(&Value::integer(0)),
            Ordering::Less
        );
        assert_eq!(Value::integer(99).cmp(&Value::text("0")), Ordering::Less);
        assert_eq!(
            Value::text("zzz").cmp(&Value::timestamp(Utc::now())),
            Ordering::Less
        );
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2024-01-15T10:30:00Z").is_some());
        assert!(parse_timestamp("2024-01-15 10:30:00").is_some());
        assert!(parse_timestamp("2024-01-15").is_some());
        assert!(parse_timestamp("not a timestamp").is_none());

        let a = parse_timestamp("2024-01-15T10:30:00Z").unwrap();
        let b = parse_timestamp("2024-01-15 10:30:00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_extractors() {
        assert_eq!(Value::integer(42).as_int64(), Some(42));
        assert_eq!(Value::float(1.5).as_int64(), None);
        assert_eq!(Value::integer(2).as_float64(), Some(2.0));
        assert_eq!(Value::text("hi").as_str(), Some("hi"));
        assert_eq!(Value::integer(1).as_str(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::integer(7).to_string(), "7");
        assert_eq!(Value::text("x").to_string(), "x");
        assert_eq!(Value::null_unknown().to_string(), "NULL");
        assert_eq!(Value::boolean(false).to_string(), "false");
    }
}
