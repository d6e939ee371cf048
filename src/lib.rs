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

//! # Leapjoin - worst-case-optimal multi-way join execution core
//!
//! Leapjoin implements the leapfrog triejoin algorithm: an arbitrary
//! number of pre-sorted relations is joined on a sequence of join
//! variables in a single pass, without materializing pairwise
//! intermediate results. It is the join kernel of a relational query
//! engine; scanning, expression evaluation, aggregation, and sorting
//! belong to the surrounding system.
//!
//! ## Key Properties
//!
//! - **Worst-case optimal** - running time bounded by the maximum
//!   possible output size over all inputs, with amortized-logarithmic
//!   seeks via binary search over sorted buffers
//! - **Arbitrary join structure** - each join variable is an equality
//!   group over any set of (relation, field) pairs
//! - **Duplicate expansion** - duplicate key runs are discovered by
//!   galloping search and expanded into their full Cartesian product
//! - **Cooperative pull execution** - one pull produces at most one
//!   bounded batch; the engine suspends and resumes exactly where it
//!   stopped, and never blocks on a source that has no data yet
//!
//! ## Preconditions
//!
//! Every input relation must be sorted lexicographically by its local
//! join-field order (its join fields ordered by the global variable
//! sequence). Establishing that order is the responsibility of an
//! upstream sort; it is not checked here.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use leapjoin::{
//!     BatchPoll, DataType, JoinField, LeapfrogJoin, MaterializedSource, Operator, Row, Schema,
//!     Value,
//! };
//!
//! // Two relations, both sorted on their key column.
//! let users = Arc::new(Schema::from_columns(
//!     "users",
//!     [("id", DataType::Integer), ("name", DataType::Text)],
//! ));
//! let orders = Arc::new(Schema::from_columns(
//!     "orders",
//!     [("user_id", DataType::Integer), ("total", DataType::Float)],
//! ));
//!
//! let users_src: Box<dyn Operator> = Box::new(MaterializedSource::new(
//!     users,
//!     vec![
//!         Row::from_values(vec![Value::integer(1), Value::text("ada")]),
//!         Row::from_values(vec![Value::integer(2), Value::text("grace")]),
//!     ],
//! ));
//! let orders_src: Box<dyn Operator> = Box::new(MaterializedSource::new(
//!     orders,
//!     vec![
//!         Row::from_values(vec![Value::integer(1), Value::float(9.5)]),
//!         Row::from_values(vec![Value::integer(1), Value::float(20.0)]),
//!         Row::from_values(vec![Value::integer(3), Value::float(7.0)]),
//!     ],
//! ));
//!
//! // Join users.id = orders.user_id, project (name, total).
//! let mut join = LeapfrogJoin::new(
//!     vec![users_src, orders_src],
//!     vec![vec![JoinField::new(0, 0), JoinField::new(1, 0)]],
//!     vec![JoinField::new(0, 1), JoinField::new(1, 1)],
//!     None,
//! )
//! .unwrap();
//!
//! join.open().unwrap();
//! let mut rows = Vec::new();
//! loop {
//!     match join.next_batch().unwrap() {
//!         BatchPoll::Batch(batch) => rows.extend(batch.into_rows()),
//!         BatchPoll::End => break,
//!         BatchPoll::Pending => unreachable!("materialized sources are always ready"),
//!     }
//! }
//! join.close().unwrap();
//!
//! assert_eq!(rows.len(), 2); // ada x 9.5, ada x 20.0
//! assert_eq!(rows[0].get(0), Some(&Value::text("ada")));
//! ```
//!
//! ## Modules
//!
//! - [`core`] - fundamental types ([`DataType`], [`Value`], [`Row`],
//!   [`Schema`], [`Error`])
//! - [`executor`] - the batch-pull [`Operator`] trait, batches, and the
//!   [`LeapfrogJoin`] operator

pub mod core;
pub mod executor;

// Re-export the public surface at the crate root
pub use crate::core::{
    parse_timestamp, DataType, Error, Result, Row, Schema, SchemaColumn, Value,
};
pub use crate::executor::{
    BatchPoll, BoxedOperator, DeferredSource, EmptySource, MaterializedSource, Operator,
    OutputBuffer, RowBatch, MAX_BATCH_ROWS,
};
pub use crate::executor::operators::{JoinField, JoinSchedule, LeapfrogJoin};

/// Git commit hash embedded at compile time, if available.
pub const GIT_COMMIT: Option<&str> = option_env!("LEAPJOIN_GIT_COMMIT");
