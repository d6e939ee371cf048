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

//! Join operators and their supporting structures.
//!
//! The crate's single join operator is [`LeapfrogJoin`], a worst-case-
//! optimal multi-way join over pre-sorted inputs. Its moving parts:
//!
//! - [`RelationBuffer`] - append-only columnar store per input relation
//! - [`JoinSchedule`] - one-time analysis of join variables, per-relation
//!   local field ordering, and the output projection
//! - [`TableIterator`] - per-relation row pointers and candidate ranges
//! - [`LeapfrogJoin`] - the search/seek/descend/backtrack state machine

pub mod join_schedule;
pub mod leapfrog_join;
pub mod relation_buffer;
pub mod table_iterator;

// Re-export all operators and types
pub use join_schedule::{JoinField, JoinSchedule};
pub use leapfrog_join::LeapfrogJoin;
pub use relation_buffer::RelationBuffer;
pub use table_iterator::{FieldRange, TableIterator};
