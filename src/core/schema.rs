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

//! Schema types - relation and column definitions
//!
//! A relation's schema is an ordered list of named, typed columns. The
//! join engine reads it for type checking during the drain phase and for
//! deriving the output schema of a projection.

use std::fmt;
use std::sync::OnceLock;

use rustc_hash::FxHashMap;

use super::types::DataType;

/// A column definition in a relation schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaColumn {
    /// Column name
    pub name: String,

    /// Data type of the column
    pub data_type: DataType,
}

impl SchemaColumn {
    /// Create a new column definition
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

impl fmt::Display for SchemaColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)
    }
}

/// Relation schema definition
#[derive(Debug)]
pub struct Schema {
    /// Name of the relation
    pub name: String,

    /// Column definitions
    pub columns: Vec<SchemaColumn>,

    /// Cached column index map (name -> index) for O(1) column lookup
    column_index_cache: OnceLock<FxHashMap<String, usize>>,
}

impl Clone for Schema {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            columns: self.columns.clone(),
            column_index_cache: OnceLock::new(), // recomputed lazily
        }
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.columns == other.columns
    }
}

impl Schema {
    /// Create a new schema
    pub fn new(name: impl Into<String>, columns: Vec<SchemaColumn>) -> Self {
        Self {
            name: name.into(),
            columns,
            column_index_cache: OnceLock::new(),
        }
    }

    /// Create a schema from (name, type) pairs
    pub fn from_columns(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = (&'static str, DataType)>,
    ) -> Self {
        Self::new(
            name,
            columns
                .into_iter()
                .map(|(n, t)| SchemaColumn::new(n, t))
                .collect(),
        )
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get a column by index
    pub fn column(&self, idx: usize) -> Option<&SchemaColumn> {
        self.columns.get(idx)
    }

    /// Get the index of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let map = self.column_index_cache.get_or_init(|| {
            self.columns
                .iter()
                .enumerate()
                .map(|(i, c)| (c.name.clone(), i))
                .collect()
        });
        map.get(name).copied()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.name)?;
        for (i, c) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_basics() {
        let schema = Schema::from_columns(
            "users",
            [("id", DataType::Integer), ("name", DataType::Text)],
        );
        assert_eq!(schema.column_count(), 2);
        assert_eq!(schema.column(0).unwrap().name, "id");
        assert_eq!(schema.column(1).unwrap().data_type, DataType::Text);
        assert!(schema.column(2).is_none());
    }

    #[test]
    fn test_column_index() {
        let schema = Schema::from_columns(
            "t",
            [("a", DataType::Integer), ("b", DataType::Float)],
        );
        assert_eq!(schema.column_index("a"), Some(0));
        assert_eq!(schema.column_index("b"), Some(1));
        assert_eq!(schema.column_index("c"), None);
    }

    #[test]
    fn test_display() {
        let schema = Schema::from_columns("t", [("a", DataType::Integer)]);
        assert_eq!(schema.to_string(), "t (a INTEGER)");
    }

    #[test]
    fn test_clone_recomputes_cache() {
        let schema = Schema::from_columns("t", [("a", DataType::Integer)]);
        assert_eq!(schema.column_index("a"), Some(0));
        let cloned = schema.clone();
        assert_eq!(cloned.column_index("a"), Some(0));
        assert_eq!(schema, cloned);
    }
}
