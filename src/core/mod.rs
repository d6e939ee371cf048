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

//! Core types and definitions for Leapjoin
//!
//! This module contains the fundamental types used throughout the engine:
//!
//! - [`DataType`] - column data types (INTEGER, TEXT, FLOAT, etc.)
//! - [`Value`] - runtime values with a pinned total order
//! - [`Row`] - a tuple of values
//! - [`Schema`] / [`SchemaColumn`] - relation schema definitions
//! - [`Error`] - error types for configuration, data, and invariant failures

pub mod error;
pub mod row;
pub mod schema;
pub mod types;
pub mod value;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use row::Row;
pub use schema::{Schema, SchemaColumn};
pub use types::DataType;
pub use value::{parse_timestamp, Value};

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// Integration test: schema, rows, and value ordering together
    #[test]
    fn test_schema_row_integration() {
        let schema = Schema::from_columns(
            "orders",
            [
                ("id", DataType::Integer),
                ("item", DataType::Text),
                ("paid", DataType::Boolean),
            ],
        );

        let row = Row::from_values(vec![
            Value::integer(1),
            Value::text("widget"),
            Value::boolean(true),
        ]);

        assert_eq!(row.len(), schema.column_count());
        assert_eq!(schema.column_index("item"), Some(1));
        assert_eq!(row[schema.column_index("item").unwrap()], Value::text("widget"));
    }

    /// Integration test: the total order is transitive across type ranks
    #[test]
    fn test_total_order_integration() {
        let mut values = vec![
            Value::text("b"),
            Value::integer(10),
            Value::null_unknown(),
            Value::float(f64::NAN),
            Value::boolean(true),
            Value::float(2.5),
            Value::text("a"),
        ];
        values.sort();

        // NULL first, then boolean, then numerics (NaN last among them), then text
        assert!(values[0].is_null());
        assert_eq!(values[1], Value::boolean(true));
        assert_eq!(values[2], Value::float(2.5));
        assert_eq!(values[3], Value::integer(10));
        assert_eq!(values[4], Value::float(f64::NAN));
        assert_eq!(values[5], Value::text("a"));
        assert_eq!(values[6], Value::text("b"));
    }

    /// Integration test: error classes are disjoint
    #[test]
    fn test_error_classes_integration() {
        let config = Error::NoJoinVariables;
        let data = Error::BatchColumnCountMismatch {
            relation: 0,
            expected: 1,
            got: 2,
        };
        let defect = Error::invariant("unreachable branch");

        assert!(config.is_configuration() && !config.is_data() && !config.is_invariant());
        assert!(data.is_data() && !data.is_configuration() && !data.is_invariant());
        assert!(defect.is_invariant() && !defect.is_configuration() && !defect.is_data());
    }
}
