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

//! Per-relation iterator bookkeeping, trie-style.
//!
//! A [`TableIterator`] is a passive cursor registry: the engine addresses
//! it by field index and does all the algorithmic work itself. Per field
//! it tracks the current row and the `[min, max)` candidate range that is
//! valid at the current search depth. Ranges narrow as the search descends
//! (each field inherits, then refines, the range of the locally preceding
//! field) and are restored on backtracking.

/// A half-open row range: `min` is reachable, `max` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldRange {
    pub min: usize,
    pub max: usize,
}

impl FieldRange {
    /// Create a range.
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Number of rows in the range.
    pub fn len(&self) -> usize {
        self.max.saturating_sub(self.min)
    }

    /// Check whether the range holds no rows.
    pub fn is_empty(&self) -> bool {
        self.min >= self.max
    }
}

/// Cursor state for one relation: current field, a row pointer per field,
/// and a candidate range per field.
#[derive(Debug)]
pub struct TableIterator {
    current_field: Option<usize>,
    rows: Vec<usize>,
    ranges: Vec<FieldRange>,
}

impl TableIterator {
    /// Create an iterator for a relation with `column_count` fields.
    pub fn new(column_count: usize) -> Self {
        Self {
            current_field: None,
            rows: vec![0; column_count],
            ranges: vec![FieldRange::default(); column_count],
        }
    }

    /// The field the search is currently positioned on.
    pub fn current_field(&self) -> Option<usize> {
        self.current_field
    }

    /// Reposition onto `field`.
    pub fn set_current_field(&mut self, field: usize) {
        self.current_field = Some(field);
    }

    /// Current row of `field`.
    pub fn row(&self, field: usize) -> usize {
        self.rows[field]
    }

    /// Set the current row of `field`.
    pub fn set_row(&mut self, field: usize, row: usize) {
        self.rows[field] = row;
    }

    /// Current row of the current field.
    pub fn current_row(&self) -> Option<usize> {
        self.current_field.map(|f| self.rows[f])
    }

    /// Candidate range of `field`.
    pub fn range(&self, field: usize) -> FieldRange {
        self.ranges[field]
    }

    /// Set the candidate range of `field`.
    pub fn set_range(&mut self, field: usize, min: usize, max: usize) {
        self.ranges[field] = FieldRange::new(min, max);
    }

    /// Advance the current field's row to its range's max, marking the
    /// field exhausted for this key. Used when moving past a matched key.
    pub fn exhaust_current(&mut self) {
        if let Some(field) = self.current_field {
            self.rows[field] = self.ranges[field].max;
        }
    }
}
