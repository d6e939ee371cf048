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

//! Error types for Leapjoin
//!
//! Errors fall into three classes with different lifetimes:
//!
//! - configuration errors are raised while a join is being set up, before
//!   any execution starts;
//! - data errors are raised during execution when an input batch disagrees
//!   with its relation's declared schema, and abort the join instance;
//! - invariant errors mark internal states that are presumed unreachable.
//!   They are never retried: continuing past one risks silently wrong join
//!   output.

use thiserror::Error;

use super::types::DataType;

/// Result type alias for Leapjoin operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for join construction and execution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Configuration errors (setup-time)
    // =========================================================================
    /// The join-variable mapping is empty
    #[error("join requires at least one join variable")]
    NoJoinVariables,

    /// A join variable has no participating fields
    #[error("join variable {variable} has no participating fields")]
    EmptyJoinVariable { variable: usize },

    /// A relation index in the mapping or projection is out of range
    #[error("relation index {relation} out of range, {relation_count} relations")]
    RelationIndexOutOfRange {
        relation: usize,
        relation_count: usize,
    },

    /// A field index in the mapping or projection is out of range
    #[error("field index {field} out of range for relation {relation}, {column_count} columns")]
    FieldIndexOutOfRange {
        relation: usize,
        field: usize,
        column_count: usize,
    },

    /// A relation participates in no join variable
    #[error("relation {relation} participates in no join variable")]
    RelationNotJoined { relation: usize },

    /// The supplied output-name list disagrees with the projection length
    #[error("output names don't match projection, expected {expected}, got {got}")]
    OutputNameCountMismatch { expected: usize, got: usize },

    /// A supplied output name occurs more than once
    #[error("duplicate output name '{0}'")]
    DuplicateOutputName(String),

    // =========================================================================
    // Data errors (execution-time, abort the join instance)
    // =========================================================================
    /// An incoming batch's column count disagrees with the relation schema
    #[error("batch for relation {relation} has {got} columns, schema declares {expected}")]
    BatchColumnCountMismatch {
        relation: usize,
        expected: usize,
        got: usize,
    },

    /// An incoming batch's declared column type disagrees with the relation schema
    #[error(
        "batch for relation {relation} declares {got} for column {column}, schema declares {expected}"
    )]
    BatchColumnTypeMismatch {
        relation: usize,
        column: usize,
        expected: DataType,
        got: DataType,
    },

    /// A row's value count disagrees with the batch schema
    #[error("row has {got} values, batch schema declares {expected} columns")]
    RowArityMismatch { expected: usize, got: usize },

    // =========================================================================
    // Lifecycle errors
    // =========================================================================
    /// An operator was pulled before being opened
    #[error("operator '{operator}' used before open")]
    NotOpen { operator: &'static str },

    // =========================================================================
    // Invariant violations (defect-class, never retried)
    // =========================================================================
    /// An internal state presumed unreachable was reached
    #[error("invariant violated: {message}")]
    Invariant { message: String },
}

impl Error {
    /// Create a new Invariant error
    pub fn invariant(message: impl Into<String>) -> Self {
        Error::Invariant {
            message: message.into(),
        }
    }

    /// Check if this is a setup-time configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::NoJoinVariables
                | Error::EmptyJoinVariable { .. }
                | Error::RelationIndexOutOfRange { .. }
                | Error::FieldIndexOutOfRange { .. }
                | Error::RelationNotJoined { .. }
                | Error::OutputNameCountMismatch { .. }
                | Error::DuplicateOutputName(_)
        )
    }

    /// Check if this is a data error surfaced from an input batch
    pub fn is_data(&self) -> bool {
        matches!(
            self,
            Error::BatchColumnCountMismatch { .. }
                | Error::BatchColumnTypeMismatch { .. }
                | Error::RowArityMismatch { .. }
        )
    }

    /// Check if this is an unrecoverable invariant violation
    pub fn is_invariant(&self) -> bool {
        matches!(self, Error::Invariant { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::NoJoinVariables.to_string(),
            "join requires at least one join variable"
        );
        assert_eq!(
            Error::RelationIndexOutOfRange {
                relation: 3,
                relation_count: 2
            }
            .to_string(),
            "relation index 3 out of range, 2 relations"
        );
        assert_eq!(
            Error::DuplicateOutputName("id".to_string()).to_string(),
            "duplicate output name 'id'"
        );
        assert_eq!(
            Error::BatchColumnTypeMismatch {
                relation: 0,
                column: 1,
                expected: DataType::Integer,
                got: DataType::Text,
            }
            .to_string(),
            "batch for relation 0 declares TEXT for column 1, schema declares INTEGER"
        );
        assert_eq!(
            Error::invariant("range min exceeds max").to_string(),
            "invariant violated: range min exceeds max"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::NoJoinVariables.is_configuration());
        assert!(Error::EmptyJoinVariable { variable: 0 }.is_configuration());
        assert!(Error::RelationNotJoined { relation: 1 }.is_configuration());
        assert!(Error::DuplicateOutputName("x".to_string()).is_configuration());

        assert!(Error::BatchColumnCountMismatch {
            relation: 0,
            expected: 2,
            got: 3
        }
        .is_data());
        assert!(!Error::BatchColumnCountMismatch {
            relation: 0,
            expected: 2,
            got: 3
        }
        .is_configuration());

        assert!(Error::invariant("x").is_invariant());
        assert!(!Error::invariant("x").is_data());
        assert!(!Error::NotOpen { operator: "x" }.is_configuration());
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(
            Error::RelationNotJoined { relation: 1 },
            Error::RelationNotJoined { relation: 1 }
        );
        assert_ne!(
            Error::RelationNotJoined { relation: 1 },
            Error::RelationNotJoined { relation: 2 }
        );
    }
}
