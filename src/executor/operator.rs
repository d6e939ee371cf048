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

//! Volcano-style operator interface for batch-at-a-time pull execution.
//!
//! Operators form a tree matching the physical plan; data flows from leaf
//! sources up through intermediate operators to the consumer, one bounded
//! batch per pull. The execution follows the open-next-close pattern:
//!
//! 1. `open()` - initialize the operator (called once)
//! 2. `next_batch()` - pull the next batch (called repeatedly)
//! 3. `close()` - release resources (called once at end)
//!
//! A pull is non-blocking: when an operator has nothing ready but has not
//! reached end-of-stream, it answers [`BatchPoll::Pending`] and the outer
//! scheduler decides when to re-invoke it. There is no busy-waiting.
//!
//! # Thread Safety
//!
//! Operators are `Send` to allow execution on different threads, but
//! individual operators are not `Sync` - they maintain mutable state.

use std::sync::Arc;

use crate::core::{Error, Result, Row, Schema};

use super::batch::{RowBatch, MAX_BATCH_ROWS};

/// Outcome of one pull on an operator.
#[derive(Debug)]
pub enum BatchPoll {
    /// A batch of rows is ready.
    Batch(RowBatch),

    /// No rows are currently available, but the operator has not reached
    /// end-of-stream. Re-invoke later.
    Pending,

    /// The operator will never produce further rows. Terminal and sticky.
    End,
}

impl BatchPoll {
    /// Returns true if this is the end-of-stream marker.
    pub fn is_end(&self) -> bool {
        matches!(self, BatchPoll::End)
    }

    /// Returns true if this poll carries no rows yet.
    pub fn is_pending(&self) -> bool {
        matches!(self, BatchPoll::Pending)
    }

    /// Unwrap the batch, if any.
    pub fn into_batch(self) -> Option<RowBatch> {
        match self {
            BatchPoll::Batch(batch) => Some(batch),
            BatchPoll::Pending | BatchPoll::End => None,
        }
    }
}

/// Pull-based batch iterator interface for query operators.
pub trait Operator: Send {
    /// Initialize the operator.
    ///
    /// Called once before the first `next_batch()` call. Child operators
    /// are opened here.
    fn open(&mut self) -> Result<()>;

    /// Pull the next batch from this operator.
    ///
    /// Returns:
    /// - `Ok(BatchPoll::Batch(b))` - a batch of up to [`MAX_BATCH_ROWS`] rows
    /// - `Ok(BatchPoll::Pending)` - nothing available yet, try again later
    /// - `Ok(BatchPoll::End)` - no more rows, ever
    /// - `Err(e)` - an error occurred
    ///
    /// After returning `End`, subsequent calls keep returning `End`.
    fn next_batch(&mut self) -> Result<BatchPoll>;

    /// Close the operator and release resources.
    fn close(&mut self) -> Result<()>;

    /// Get the schema for this operator's output.
    fn schema(&self) -> &Arc<Schema>;

    /// Get a descriptive name for this operator (for EXPLAIN).
    fn name(&self) -> &str;
}

/// A boxed operator for dynamic dispatch.
pub type BoxedOperator = Box<dyn Operator>;

// ============================================================================
// Helper Operators
// ============================================================================

/// An operator that produces no rows.
pub struct EmptySource {
    schema: Arc<Schema>,
    opened: bool,
}

impl EmptySource {
    /// Create an empty source with the given schema.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            opened: false,
        }
    }
}

impl Operator for EmptySource {
    fn open(&mut self) -> Result<()> {
        self.opened = true;
        Ok(())
    }

    fn next_batch(&mut self) -> Result<BatchPoll> {
        if !self.opened {
            return Err(Error::NotOpen { operator: "Empty" });
        }
        Ok(BatchPoll::End)
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn name(&self) -> &str {
        "Empty"
    }
}

/// An operator that yields batches from a pre-materialized vector of rows.
///
/// Useful for feeding already-sorted relations into a join and for tests.
/// Rows are split into batches of `chunk` rows (at most [`MAX_BATCH_ROWS`]).
pub struct MaterializedSource {
    schema: Arc<Schema>,
    rows: Vec<Row>,
    chunk: usize,
    cursor: usize,
    opened: bool,
}

impl MaterializedSource {
    /// Create a source over the given rows with full-size batches.
    pub fn new(schema: Arc<Schema>, rows: Vec<Row>) -> Self {
        Self::with_chunk_size(schema, rows, MAX_BATCH_ROWS)
    }

    /// Create a source that emits batches of at most `chunk` rows.
    pub fn with_chunk_size(schema: Arc<Schema>, rows: Vec<Row>, chunk: usize) -> Self {
        Self {
            schema,
            rows,
            chunk: chunk.clamp(1, MAX_BATCH_ROWS),
            cursor: 0,
            opened: false,
        }
    }
}

impl Operator for MaterializedSource {
    fn open(&mut self) -> Result<()> {
        self.cursor = 0;
        self.opened = true;
        Ok(())
    }

    fn next_batch(&mut self) -> Result<BatchPoll> {
        if !self.opened {
            return Err(Error::NotOpen {
                operator: "Materialized",
            });
        }
        if self.cursor >= self.rows.len() {
            return Ok(BatchPoll::End);
        }
        let end = (self.cursor + self.chunk).min(self.rows.len());
        let rows = self.rows[self.cursor..end].to_vec();
        self.cursor = end;
        Ok(BatchPoll::Batch(RowBatch::new(
            Arc::clone(&self.schema),
            rows,
        )?))
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn name(&self) -> &str {
        "Materialized"
    }
}

/// An operator that answers `Pending` for the first `delays` pulls before
/// delegating to its inner source.
///
/// Models an upstream relation whose data is not yet available - the join
/// engine must keep reporting "no output yet" until every source reaches
/// end-of-stream.
pub struct DeferredSource {
    inner: BoxedOperator,
    delays: usize,
}

impl DeferredSource {
    /// Wrap a source, deferring its first batch by `delays` pulls.
    pub fn new(inner: BoxedOperator, delays: usize) -> Self {
        Self { inner, delays }
    }
}

impl Operator for DeferredSource {
    fn open(&mut self) -> Result<()> {
        self.inner.open()
    }

    fn next_batch(&mut self) -> Result<BatchPoll> {
        if self.delays > 0 {
            self.delays -= 1;
            return Ok(BatchPoll::Pending);
        }
        self.inner.next_batch()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }

    fn schema(&self) -> &Arc<Schema> {
        self.inner.schema()
    }

    fn name(&self) -> &str {
        "Deferred"
    }
}
