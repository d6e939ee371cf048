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

//! Append-only columnar store for one join input relation.
//!
//! The join engine drains every source fully before searching, because
//! binary-search range refinement needs random access over materialized,
//! already-sorted rows. Each relation's rows land here, column by column,
//! in arrival order - no sorting, no deduplication. Once a row is
//! appended it is never updated or removed.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::core::{DataType, Error, Result, Schema, Value};
use crate::executor::batch::RowBatch;

/// Columnar buffer holding every drained row of one relation.
#[derive(Debug)]
pub struct RelationBuffer {
    /// Index of this relation among the join's children, for error context
    relation: usize,
    schema: Arc<Schema>,
    /// Column-major storage: `columns[field][row]`
    columns: Vec<Vec<Value>>,
    rows: usize,
}

impl RelationBuffer {
    /// Create an empty buffer for the relation at `relation` with the
    /// given fixed schema.
    pub fn new(relation: usize, schema: Arc<Schema>) -> Self {
        let columns = (0..schema.column_count()).map(|_| Vec::new()).collect();
        Self {
            relation,
            schema,
            columns,
            rows: 0,
        }
    }

    /// The relation's fixed schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Number of buffered rows.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Append a batch, checking its declared schema against the buffer's.
    ///
    /// The batch must declare the same column count, and each column's
    /// declared type must match the buffer's - a column declared `Null`
    /// (type unknown) is accepted into any column. A disagreement is a
    /// data error that aborts the join instance.
    pub fn append_batch(&mut self, batch: &RowBatch) -> Result<()> {
        let declared = batch.schema();
        if declared.column_count() != self.schema.column_count() {
            return Err(Error::BatchColumnCountMismatch {
                relation: self.relation,
                expected: self.schema.column_count(),
                got: declared.column_count(),
            });
        }
        for (column, (have, want)) in declared
            .columns
            .iter()
            .zip(self.schema.columns.iter())
            .enumerate()
        {
            if have.data_type != want.data_type && have.data_type != DataType::Null {
                return Err(Error::BatchColumnTypeMismatch {
                    relation: self.relation,
                    column,
                    expected: want.data_type,
                    got: have.data_type,
                });
            }
        }

        for row in batch.iter() {
            for (column, value) in row.iter().enumerate() {
                self.columns[column].push(value.clone());
            }
            self.rows += 1;
        }
        Ok(())
    }

    /// Read the value at (field, row).
    ///
    /// # Panics
    /// Panics if `field` or `row` is out of range; the engine only
    /// addresses rows inside currently-valid iterator ranges.
    pub fn value(&self, field: usize, row: usize) -> &Value {
        &self.columns[field][row]
    }

    /// Three-way comparison between a cell of this buffer and a cell of
    /// `other`, under the engine's total value order.
    pub fn compare(
        &self,
        field_a: usize,
        row_a: usize,
        other: &RelationBuffer,
        field_b: usize,
        row_b: usize,
    ) -> Ordering {
        self.value(field_a, row_a).cmp(other.value(field_b, row_b))
    }
}
