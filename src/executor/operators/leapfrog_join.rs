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

//! Leapfrog Join Operator - worst-case-optimal multi-way join.
//!
//! Implements the leapfrog triejoin algorithm (Veldhuizen,
//! <http://arxiv.org/abs/1210.0481>): an arbitrary number of relations is
//! intersected on a sequence of join variables without materializing
//! pairwise intermediate results. Each relation is drained into a columnar
//! buffer, then a depth-first state machine walks the variables: at each
//! depth the participating iterators leapfrog toward a common key (the
//! smallest-keyed iterator repeatedly binary-seeks to the current maximum
//! key), descending on a match and backtracking when a depth's
//! intersection is exhausted. Duplicate keys are expanded by refining each
//! matched position to its full run via galloping + binary search and
//! emitting the Cartesian product of the runs.
//!
//! # Preconditions
//!
//! Every input relation must arrive sorted lexicographically by its local
//! join-field order (see
//! [`JoinSchedule`](super::join_schedule::JoinSchedule)). Sorting is owned
//! by an upstream operator; it is not checked or established here, and
//! binary-search correctness depends on it.
//!
//! # Suspension
//!
//! One pull produces at most one output batch. The cursor - current
//! depth, per-depth cyclic pointers and iterator ordering, all ranges -
//! is the complete continuation and survives across pulls untouched.
//!
//! # Output order
//!
//! Results are deterministic: key combinations are emitted in ascending
//! join-variable order, and within one combination the duplicate-run
//! product follows relation index order, later relations varying fastest.

use std::cmp::Ordering;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::core::{Error, Result, Row, Schema, Value};
use crate::executor::batch::OutputBuffer;
use crate::executor::operator::{BatchPoll, BoxedOperator, Operator};

use super::join_schedule::{JoinField, JoinSchedule};
use super::relation_buffer::RelationBuffer;
use super::table_iterator::{FieldRange, TableIterator};

/// Outcome of one leapfrog search at a depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchOutcome {
    /// All participating iterators agree on a key.
    Match,
    /// The intersection at this depth is exhausted.
    AtEnd,
}

/// The engine-wide continuation: everything that must survive across
/// output-batch boundaries.
#[derive(Debug)]
struct Cursor {
    /// Current depth, `None` before the first search
    depth: Option<usize>,
    /// Per-depth cyclic pointer into the participant ordering
    pointer: Vec<usize>,
    /// Per-depth participant visit order, sorted by current key at init
    order: Vec<SmallVec<[usize; 4]>>,
    /// Terminal flag: the join will never produce further rows
    finished: bool,
}

impl Cursor {
    fn new(depth_count: usize) -> Self {
        Self {
            depth: None,
            pointer: vec![0; depth_count],
            order: vec![SmallVec::new(); depth_count],
            finished: false,
        }
    }
}

/// Worst-case-optimal multi-way join operator.
///
/// Constructed from child sources, a join-variable mapping, and an output
/// projection; all configuration validation happens in [`new`](Self::new),
/// before execution starts.
pub struct LeapfrogJoin {
    children: Vec<BoxedOperator>,
    child_schemas: Vec<Arc<Schema>>,
    schedule: JoinSchedule,

    buffers: Vec<RelationBuffer>,
    iterators: Vec<TableIterator>,
    out: OutputBuffer,

    child_eos: Vec<bool>,
    drained: bool,
    cursor: Cursor,
    opened: bool,
}

impl std::fmt::Debug for LeapfrogJoin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeapfrogJoin")
            .field("child_count", &self.children.len())
            .field("child_schemas", &self.child_schemas)
            .field("schedule", &self.schedule)
            .field("child_eos", &self.child_eos)
            .field("drained", &self.drained)
            .field("cursor", &self.cursor)
            .field("opened", &self.opened)
            .finish()
    }
}

impl LeapfrogJoin {
    /// Create a new leapfrog join.
    ///
    /// `variables[d]` lists the (relation, field) pairs that must carry
    /// equal values at join variable `d`; variables are evaluated in the
    /// given order. `projection` maps each output column to a source
    /// field; `output_names`, if supplied, must match the projection
    /// length and be pairwise distinct, otherwise names are taken from
    /// the source schemas.
    pub fn new(
        children: Vec<BoxedOperator>,
        variables: Vec<Vec<JoinField>>,
        projection: Vec<JoinField>,
        output_names: Option<Vec<String>>,
    ) -> Result<Self> {
        let child_schemas: Vec<Arc<Schema>> =
            children.iter().map(|c| Arc::clone(c.schema())).collect();
        let schedule = JoinSchedule::build(
            &child_schemas,
            &variables,
            &projection,
            output_names.as_deref(),
        )?;

        let buffers = Self::fresh_buffers(&child_schemas);
        let iterators = Self::fresh_iterators(&child_schemas);
        let out = OutputBuffer::new(Arc::clone(schedule.output_schema()));
        let child_eos = vec![false; children.len()];
        let cursor = Cursor::new(schedule.variable_count());

        Ok(Self {
            children,
            child_schemas,
            schedule,
            buffers,
            iterators,
            out,
            child_eos,
            drained: false,
            cursor,
            opened: false,
        })
    }

    fn fresh_buffers(schemas: &[Arc<Schema>]) -> Vec<RelationBuffer> {
        schemas
            .iter()
            .enumerate()
            .map(|(i, s)| RelationBuffer::new(i, Arc::clone(s)))
            .collect()
    }

    fn fresh_iterators(schemas: &[Arc<Schema>]) -> Vec<TableIterator> {
        schemas
            .iter()
            .map(|s| TableIterator::new(s.column_count()))
            .collect()
    }

    fn depth_count(&self) -> usize {
        self.schedule.variable_count()
    }

    fn participants(&self, d: usize) -> SmallVec<[JoinField; 4]> {
        self.schedule.variable(d).iter().copied().collect()
    }

    fn local_order_of(&self, jf: JoinField) -> Result<usize> {
        self.schedule.local_order(jf.relation, jf.field).ok_or_else(|| {
            Error::invariant(format!("field {} participates without a local order", jf))
        })
    }

    /// Three-way comparison of two buffer cells under the total value order.
    fn cell_cmp(&self, a: JoinField, row_a: usize, b: JoinField, row_b: usize) -> Ordering {
        self.buffers[a.relation].compare(a.field, row_a, &self.buffers[b.relation], b.field, row_b)
    }

    /// Compare two participants' keys at their current rows.
    fn key_cmp(&self, a: JoinField, b: JoinField) -> Ordering {
        self.cell_cmp(
            a,
            self.iterators[a.relation].row(a.field),
            b,
            self.iterators[b.relation].row(b.field),
        )
    }

    /// Position every participant of variable `d` at the start of its
    /// candidate range and fix the leapfrog ordering for this depth.
    ///
    /// A relation's first-local-ordered field gets the whole buffer as its
    /// range; later fields inherit the already-refined range of the
    /// locally preceding field.
    fn init_at_depth(&mut self, d: usize) -> Result<()> {
        let parts = self.participants(d);
        for jf in &parts {
            let local = self.local_order_of(*jf)?;
            if local == 0 {
                let rows = self.buffers[jf.relation].row_count();
                self.iterators[jf.relation].set_range(jf.field, 0, rows);
            } else {
                let prev = self.schedule.ordered_field(jf.relation, local - 1);
                let inherited = self.iterators[jf.relation].range(prev);
                self.iterators[jf.relation].set_range(jf.field, inherited.min, inherited.max);
            }
            self.iterators[jf.relation].set_current_field(jf.field);
            let min = self.iterators[jf.relation].range(jf.field).min;
            self.iterators[jf.relation].set_row(jf.field, min);
        }

        // Order participants by current key, stable on ties. With any
        // empty range there is no key to read; search reports AtEnd
        // before comparing, so the identity order stands.
        let mut order: SmallVec<[usize; 4]> = (0..parts.len()).collect();
        let any_empty = parts.iter().any(|jf| {
            let it = &self.iterators[jf.relation];
            it.row(jf.field) >= it.range(jf.field).max
        });
        if !any_empty {
            order.sort_by(|&a, &b| self.key_cmp(parts[a], parts[b]));
        }
        self.cursor.order[d] = order;
        self.cursor.pointer[d] = 0;
        Ok(())
    }

    /// Leapfrog search: find the next key all participants of variable
    /// `d` agree on, or report the depth exhausted.
    ///
    /// The iterator behind the cyclic pointer holds the current maximum
    /// key; the pointed-at iterator repeatedly seeks to it, becoming the
    /// new maximum, until the cycle closes on a common key.
    fn search(&mut self, d: usize) -> Result<SearchOutcome> {
        let parts = self.participants(d);
        let k = parts.len();

        // An exhausted participant means no further intersection here.
        for jf in &parts {
            let it = &self.iterators[jf.relation];
            if it.row(jf.field) >= it.range(jf.field).max {
                return Ok(SearchOutcome::AtEnd);
            }
        }

        let order = self.cursor.order[d].clone();
        let mut p = self.cursor.pointer[d];
        let mut max_at = order[(p + k - 1) % k];
        loop {
            let cur_at = order[p];
            if cur_at == max_at
                || self.key_cmp(parts[cur_at], parts[max_at]) == Ordering::Equal
            {
                self.cursor.pointer[d] = p;
                return Ok(SearchOutcome::Match);
            }
            let target_row = self.iterators[parts[max_at].relation].row(parts[max_at].field);
            if !self.seek(parts[cur_at], parts[max_at], target_row)? {
                self.cursor.pointer[d] = p;
                return Ok(SearchOutcome::AtEnd);
            }
            max_at = cur_at;
            p = (p + 1) % k;
        }
    }

    /// Leapfrog seek: move `jf` forward to the first row within its range
    /// whose key is >= the target cell. Returns false if no such row
    /// exists in the range.
    fn seek(&mut self, jf: JoinField, target: JoinField, target_row: usize) -> Result<bool> {
        let range_max = self.iterators[jf.relation].range(jf.field).max;
        let start = self.iterators[jf.relation].row(jf.field);
        if start >= range_max {
            return Err(Error::invariant("seek on an exhausted iterator range"));
        }
        let last = range_max - 1;

        // Already at or past the target.
        if self.cell_cmp(jf, start, target, target_row) != Ordering::Less {
            return Ok(true);
        }
        // The whole remaining range is below the target.
        if self.cell_cmp(jf, last, target, target_row) == Ordering::Less {
            return Ok(false);
        }

        // Binary search: key(lo) < target <= key(hi) throughout.
        let (mut lo, mut hi) = (start, last);
        while lo + 1 < hi {
            let mid = lo + (hi - lo) / 2;
            if self.cell_cmp(jf, mid, target, target_row) == Ordering::Less {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        self.iterators[jf.relation].set_row(jf.field, hi);
        Ok(true)
    }

    /// Narrow `jf`'s range to the full run of rows sharing the key at its
    /// current row: galloping expansion to bound the run, then binary
    /// search for the boundary.
    fn refine_range(&mut self, jf: JoinField) -> Result<()> {
        let start = self.iterators[jf.relation].row(jf.field);
        let max = self.iterators[jf.relation].range(jf.field).max;
        if start >= max {
            return Err(Error::invariant("refine_range on an empty candidate range"));
        }
        let last = max - 1;

        // The run extends to the end of the range.
        if self.cell_cmp(jf, start, jf, last) == Ordering::Equal {
            self.iterators[jf.relation].set_range(jf.field, start, max);
            return Ok(());
        }

        // Gallop: double the step until a row past the run is found.
        let mut lo = start;
        let mut step = 1usize;
        let mut hi = loop {
            let probe = lo + step;
            if probe >= last {
                break last;
            }
            match self.cell_cmp(jf, probe, jf, start) {
                Ordering::Equal => {
                    lo = probe;
                    step *= 2;
                }
                Ordering::Greater => break probe,
                Ordering::Less => {
                    return Err(Error::invariant("rows not sorted on a join field"));
                }
            }
        };

        // Binary search the boundary: key(lo) == key, key(hi) > key.
        while lo + 1 < hi {
            let mid = lo + (hi - lo) / 2;
            if self.cell_cmp(jf, mid, jf, start) == Ordering::Equal {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        self.iterators[jf.relation].set_range(jf.field, start, hi);
        Ok(())
    }

    /// Descend from a match at depth `d` to depth `d + 1`: refine each
    /// participant's range to its duplicate run, then initialize the next
    /// variable inside those runs.
    fn descend(&mut self, d: usize) -> Result<()> {
        let parts = self.participants(d);
        for jf in &parts {
            if self.local_order_of(*jf)? == 0 {
                // A first-ordered field's candidates span the whole buffer.
                let rows = self.buffers[jf.relation].row_count();
                let min = self.iterators[jf.relation].range(jf.field).min;
                self.iterators[jf.relation].set_range(jf.field, min, rows);
            }
            self.refine_range(*jf)?;
        }
        self.cursor.depth = Some(d + 1);
        self.init_at_depth(d + 1)
    }

    /// Backtrack from an exhausted depth `d` to `d - 1`: advance the
    /// parent variable past the key it matched on, so its search resumes
    /// beyond the previously produced key, then widen the parent ranges.
    fn backtrack(&mut self, d: usize) -> Result<()> {
        let parent = d - 1;
        let parts = self.participants(parent);
        for jf in &parts {
            self.iterators[jf.relation].set_current_field(jf.field);
        }
        self.advance_past_key(parent);
        self.restore_ranges(parent)?;
        self.cursor.depth = Some(parent);
        Ok(())
    }

    /// Move the participant at the cyclic pointer of depth `d` past its
    /// matched run, and rotate the pointer so the next search anchors its
    /// maximum key on the freshly advanced iterator.
    fn advance_past_key(&mut self, d: usize) {
        let parts = self.participants(d);
        let k = parts.len();
        let p = self.cursor.pointer[d];
        let jf = parts[self.cursor.order[d][p]];
        self.iterators[jf.relation].set_current_field(jf.field);
        self.iterators[jf.relation].exhaust_current();
        self.cursor.pointer[d] = (p + 1) % k;
    }

    /// Re-widen the ranges of depth `d`'s participants after moving past a
    /// matched key: the whole buffer for first-local-ordered fields, the
    /// locally preceding field's range otherwise.
    fn restore_ranges(&mut self, d: usize) -> Result<()> {
        let parts = self.participants(d);
        for jf in &parts {
            let local = self.local_order_of(*jf)?;
            if local == 0 {
                let rows = self.buffers[jf.relation].row_count();
                let min = self.iterators[jf.relation].range(jf.field).min;
                self.iterators[jf.relation].set_range(jf.field, min, rows);
            } else {
                let prev = self.schedule.ordered_field(jf.relation, local - 1);
                let inherited = self.iterators[jf.relation].range(prev);
                self.iterators[jf.relation].set_range(jf.field, inherited.min, inherited.max);
            }
        }
        Ok(())
    }

    /// A match holds at the deepest variable: refine every participant to
    /// its full duplicate run and emit the Cartesian product of every
    /// relation's innermost matched run, one projected row per
    /// combination. Then move past the matched key.
    ///
    /// The product spans all relations, not just the deepest variable's
    /// participants: a relation whose last join variable is shallower
    /// keeps its run refined from that depth, and every row of it belongs
    /// to the natural-join result for the current key combination.
    fn exhaust_output(&mut self) -> Result<()> {
        let d = self.depth_count() - 1;
        let parts = self.participants(d);
        for jf in &parts {
            self.refine_range(*jf)?;
        }

        // One span per relation: its innermost active field's matched run.
        let mut spans: SmallVec<[(usize, usize, FieldRange); 4]> =
            SmallVec::with_capacity(self.buffers.len());
        for relation in 0..self.buffers.len() {
            let field = self.iterators[relation].current_field().ok_or_else(|| {
                Error::invariant(format!("relation {} has no active join field", relation))
            })?;
            let range = self.iterators[relation].range(field);
            if range.is_empty() {
                return Err(Error::invariant("matched duplicate run is empty"));
            }
            spans.push((relation, field, range));
        }

        // Odometer over the runs, row-major: the last relation varies
        // fastest. Bounded by the participant count, no recursion.
        let mut rows: SmallVec<[usize; 4]> = spans.iter().map(|s| s.2.min).collect();
        'emit: loop {
            for (i, &(relation, field, _)) in spans.iter().enumerate() {
                self.iterators[relation].set_row(field, rows[i]);
            }
            self.emit_current()?;

            let mut i = spans.len();
            loop {
                if i == 0 {
                    break 'emit;
                }
                i -= 1;
                rows[i] += 1;
                if rows[i] < spans[i].2.max {
                    continue 'emit;
                }
                rows[i] = spans[i].2.min;
            }
        }

        self.advance_past_key(d);
        self.restore_ranges(d)
    }

    /// Append one projected output row at the iterators' current rows.
    fn emit_current(&mut self) -> Result<()> {
        let values: Vec<Value> = {
            let projection = self.schedule.projection();
            let mut values = Vec::with_capacity(projection.len());
            for jf in projection {
                let row = self.iterators[jf.relation].current_row().ok_or_else(|| {
                    Error::invariant(format!(
                        "projected relation {} has no current row",
                        jf.relation
                    ))
                })?;
                values.push(self.buffers[jf.relation].value(jf.field, row).clone());
            }
            values
        };
        self.out.push(Row::from_values(values));
        Ok(())
    }

    /// Pull batches from every child until all have reached end-of-stream.
    /// Returns false if some child has no data ready yet - the caller must
    /// answer `Pending` without blocking.
    fn drain_children(&mut self) -> Result<bool> {
        while !self.drained {
            let mut progressed = false;
            for i in 0..self.children.len() {
                if self.child_eos[i] {
                    continue;
                }
                match self.children[i].next_batch()? {
                    BatchPoll::Batch(batch) => {
                        self.buffers[i].append_batch(&batch)?;
                        progressed = true;
                    }
                    BatchPoll::Pending => {}
                    BatchPoll::End => {
                        self.child_eos[i] = true;
                        progressed = true;
                    }
                }
            }
            if self.child_eos.iter().all(|&eos| eos) {
                self.drained = true;
            } else if !progressed {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Drive the state machine until one output batch is full or the join
    /// is exhausted. The cursor is left exactly where the loop stopped.
    fn run(&mut self) -> Result<()> {
        if self.cursor.depth.is_none() && !self.cursor.finished {
            self.cursor.depth = Some(0);
            self.init_at_depth(0)?;
        }
        while !self.out.is_full() && !self.cursor.finished {
            let d = self
                .cursor
                .depth
                .ok_or_else(|| Error::invariant("search without an active depth"))?;
            match self.search(d)? {
                SearchOutcome::AtEnd if d == 0 => {
                    // The first variable is exhausted: the join is done.
                    self.cursor.finished = true;
                }
                SearchOutcome::AtEnd => self.backtrack(d)?,
                SearchOutcome::Match if d + 1 == self.depth_count() => self.exhaust_output()?,
                SearchOutcome::Match => self.descend(d)?,
            }
        }
        Ok(())
    }
}

impl Operator for LeapfrogJoin {
    fn open(&mut self) -> Result<()> {
        for child in &mut self.children {
            child.open()?;
        }
        self.buffers = Self::fresh_buffers(&self.child_schemas);
        self.iterators = Self::fresh_iterators(&self.child_schemas);
        self.out = OutputBuffer::new(Arc::clone(self.schedule.output_schema()));
        self.child_eos = vec![false; self.children.len()];
        self.drained = false;
        self.cursor = Cursor::new(self.depth_count());
        self.opened = true;
        Ok(())
    }

    fn next_batch(&mut self) -> Result<BatchPoll> {
        if !self.opened {
            return Err(Error::NotOpen {
                operator: "LeapfrogJoin",
            });
        }

        // Drain precondition: random-access binary search needs fully
        // materialized buffers, so nothing runs until every source EOSes.
        if !self.drain_children()? {
            return Ok(BatchPoll::Pending);
        }

        if !self.cursor.finished {
            self.run()?;
        }

        if let Some(batch) = self.out.pop_batch() {
            return Ok(BatchPoll::Batch(batch));
        }
        if self.cursor.finished {
            Ok(BatchPoll::End)
        } else {
            Err(Error::invariant(
                "join step produced neither output nor completion",
            ))
        }
    }

    fn close(&mut self) -> Result<()> {
        for child in &mut self.children {
            child.close()?;
        }
        // Release the buffered relations and any undelivered output.
        self.buffers = Self::fresh_buffers(&self.child_schemas);
        self.out = OutputBuffer::new(Arc::clone(self.schedule.output_schema()));
        self.opened = false;
        Ok(())
    }

    fn schema(&self) -> &Arc<Schema> {
        self.schedule.output_schema()
    }

    fn name(&self) -> &str {
        "LeapfrogJoin"
    }
}
