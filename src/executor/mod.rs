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

//! Query execution layer.
//!
//! Execution is pull-driven and batch-at-a-time: a consumer pulls bounded
//! batches from the root operator, which pulls from its children in turn.
//! See [`operator`] for the lifecycle contract and [`operators`] for the
//! join implementation.

pub mod batch;
pub mod operator;
pub mod operators;

pub use batch::{OutputBuffer, RowBatch, MAX_BATCH_ROWS};
pub use operator::{
    BatchPoll, BoxedOperator, DeferredSource, EmptySource, MaterializedSource, Operator,
};
