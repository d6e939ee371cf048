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

//! Batches - the unit of production and consumption across the pull
//! interface - and the output accumulator that assembles join results
//! into them.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::core::{Error, Result, Row, Schema};

/// Maximum number of rows in one batch, for both input and output.
pub const MAX_BATCH_ROWS: usize = 1024;

/// A bounded batch of rows with a declared schema.
///
/// The schema's declared column types travel with the batch; the join
/// engine checks them against each relation's fixed schema while draining.
#[derive(Debug, Clone)]
pub struct RowBatch {
    schema: Arc<Schema>,
    rows: Vec<Row>,
}

impl RowBatch {
    /// Create a batch, checking every row's arity against the schema.
    pub fn new(schema: Arc<Schema>, rows: Vec<Row>) -> Result<Self> {
        let expected = schema.column_count();
        for row in &rows {
            if row.len() != expected {
                return Err(Error::RowArityMismatch {
                    expected,
                    got: row.len(),
                });
            }
        }
        Ok(Self { schema, rows })
    }

    /// The batch's declared schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Number of rows in the batch.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the batch holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get a row by index.
    pub fn row(&self, idx: usize) -> Option<&Row> {
        self.rows.get(idx)
    }

    /// Iterate over the rows.
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Consume the batch, yielding its rows.
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl<'a> IntoIterator for &'a RowBatch {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Accumulates projected result rows and hands them out one batch at a
/// time.
///
/// The buffer is append-only between pops. It may transiently hold more
/// than one batch's worth of rows - the engine finishes a duplicate-run
/// product before suspending - but [`pop_batch`](Self::pop_batch) never
/// returns more than [`MAX_BATCH_ROWS`] rows.
#[derive(Debug)]
pub struct OutputBuffer {
    schema: Arc<Schema>,
    rows: VecDeque<Row>,
}

impl OutputBuffer {
    /// Create an empty buffer producing batches of the given schema.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            rows: VecDeque::new(),
        }
    }

    /// The output schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Append one result row.
    pub fn push(&mut self, row: Row) {
        self.rows.push_back(row);
    }

    /// Number of buffered rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the buffer holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether at least one full batch is buffered.
    pub fn is_full(&self) -> bool {
        self.rows.len() >= MAX_BATCH_ROWS
    }

    /// Pop up to one batch of buffered rows, oldest first.
    pub fn pop_batch(&mut self) -> Option<RowBatch> {
        if self.rows.is_empty() {
            return None;
        }
        let take = self.rows.len().min(MAX_BATCH_ROWS);
        let rows: Vec<Row> = self.rows.drain(..take).collect();
        Some(RowBatch {
            schema: Arc::clone(&self.schema),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, Value};

    fn int_schema() -> Arc<Schema> {
        Arc::new(Schema::from_columns("t", [("a", DataType::Integer)]))
    }

    fn int_row(v: i64) -> Row {
        Row::from_values(vec![Value::integer(v)])
    }

    #[test]
    fn test_batch_arity_check() {
        let schema = int_schema();
        assert!(RowBatch::new(Arc::clone(&schema), vec![int_row(1)]).is_ok());

        let bad = Row::from_values(vec![Value::integer(1), Value::integer(2)]);
        let err = RowBatch::new(schema, vec![bad]).unwrap_err();
        assert_eq!(err, Error::RowArityMismatch { expected: 1, got: 2 });
        assert!(err.is_data());
    }

    #[test]
    fn test_batch_iteration() {
        let batch = RowBatch::new(int_schema(), vec![int_row(1), int_row(2)]).unwrap();
        assert_eq!(batch.row_count(), 2);
        assert!(!batch.is_empty());
        assert_eq!(batch.row(0), Some(&int_row(1)));
        let collected: Vec<i64> = batch
            .iter()
            .map(|r| r.get(0).unwrap().as_int64().unwrap())
            .collect();
        assert_eq!(collected, vec![1, 2]);
    }

    #[test]
    fn test_output_buffer_pop_is_bounded() {
        let mut out = OutputBuffer::new(int_schema());
        for i in 0..(MAX_BATCH_ROWS + 10) {
            out.push(int_row(i as i64));
        }
        assert!(out.is_full());

        let first = out.pop_batch().unwrap();
        assert_eq!(first.row_count(), MAX_BATCH_ROWS);
        assert_eq!(first.row(0), Some(&int_row(0)));

        let second = out.pop_batch().unwrap();
        assert_eq!(second.row_count(), 10);
        assert_eq!(second.row(0), Some(&int_row(MAX_BATCH_ROWS as i64)));

        assert!(out.pop_batch().is_none());
        assert!(out.is_empty());
    }

    #[test]
    fn test_output_buffer_preserves_order() {
        let mut out = OutputBuffer::new(int_schema());
        out.push(int_row(3));
        out.push(int_row(1));
        out.push(int_row(2));
        let batch = out.pop_batch().unwrap();
        let collected: Vec<i64> = batch
            .iter()
            .map(|r| r.get(0).unwrap().as_int64().unwrap())
            .collect();
        assert_eq!(collected, vec![3, 1, 2]);
    }
}
