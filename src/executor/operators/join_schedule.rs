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

//! One-time static analysis of the join structure.
//!
//! A join variable is an equality group: every participating
//! (relation, field) pair must carry equal values for a combined tuple to
//! qualify. Variables are evaluated in the order the caller supplies them;
//! that order is the depth sequence of the engine's search.
//!
//! For each relation, its join fields are renumbered into a contiguous
//! *local order*, sorted by the global index of their variables. A
//! relation's rows must arrive pre-sorted lexicographically by that local
//! order - that is the hard precondition of the whole engine, owned by
//! whatever operator feeds it.
//!
//! The schedule is built once at setup and immutable afterwards; the only
//! runtime ordering the engine performs is the per-depth sort of a few
//! iterators by current key.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::core::{Error, Result, Schema, SchemaColumn};

/// One (relation, field) pair.
///
/// The "exactly two components" shape of a mapping entry is enforced by
/// this type rather than a runtime check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinField {
    /// Index of the relation among the join's children
    pub relation: usize,
    /// Index of the field in that relation's schema
    pub field: usize,
}

impl JoinField {
    /// Create a new join field reference.
    pub fn new(relation: usize, field: usize) -> Self {
        Self { relation, field }
    }
}

impl fmt::Display for JoinField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.relation, self.field)
    }
}

/// Immutable join-structure analysis: participant lists per variable,
/// per-relation local field ordering, and the derived output schema.
#[derive(Debug)]
pub struct JoinSchedule {
    /// `variables[d]` - the fields participating in variable `d`
    variables: Vec<Vec<JoinField>>,

    /// `local_order[r][f]` - local order of field `f` in relation `r`,
    /// `None` for fields assigned to no variable
    local_order: Vec<Vec<Option<usize>>>,

    /// `ordered_fields[r][j]` - the field of relation `r` with local
    /// order `j` (inverse of `local_order` over assigned fields)
    ordered_fields: Vec<Vec<usize>>,

    /// Output projection: one (relation, field) per output column
    projection: Vec<JoinField>,

    /// Derived output schema (projected types verbatim, names supplied
    /// or taken from the source schemas)
    output_schema: Arc<Schema>,
}

impl JoinSchedule {
    /// Build the schedule.
    ///
    /// `variables[d]` lists the fields participating in join variable `d`;
    /// `projection` maps each output column to a source field;
    /// `output_names`, if supplied, must match the projection length and
    /// be pairwise distinct.
    ///
    /// All validation here is setup-time: any failure is a configuration
    /// error raised before execution starts.
    pub fn build(
        schemas: &[Arc<Schema>],
        variables: &[Vec<JoinField>],
        projection: &[JoinField],
        output_names: Option<&[String]>,
    ) -> Result<Self> {
        if variables.is_empty() {
            return Err(Error::NoJoinVariables);
        }

        let check_field = |jf: &JoinField| -> Result<()> {
            let schema = schemas
                .get(jf.relation)
                .ok_or(Error::RelationIndexOutOfRange {
                    relation: jf.relation,
                    relation_count: schemas.len(),
                })?;
            if jf.field >= schema.column_count() {
                return Err(Error::FieldIndexOutOfRange {
                    relation: jf.relation,
                    field: jf.field,
                    column_count: schema.column_count(),
                });
            }
            Ok(())
        };

        // Assign each participating field the global index of its variable
        let mut global_order: Vec<Vec<Option<usize>>> = schemas
            .iter()
            .map(|s| vec![None; s.column_count()])
            .collect();
        for (variable, participants) in variables.iter().enumerate() {
            if participants.is_empty() {
                return Err(Error::EmptyJoinVariable { variable });
            }
            for jf in participants {
                check_field(jf)?;
                global_order[jf.relation][jf.field] = Some(variable);
            }
        }

        // Per relation: sort its assigned fields by global variable index
        // (stable, so equal-variable fields keep schema order) and hand out
        // contiguous local indices.
        let mut local_order: Vec<Vec<Option<usize>>> = schemas
            .iter()
            .map(|s| vec![None; s.column_count()])
            .collect();
        let mut ordered_fields: Vec<Vec<usize>> = Vec::with_capacity(schemas.len());
        for (relation, orders) in global_order.iter().enumerate() {
            let mut assigned: Vec<(usize, usize)> = orders
                .iter()
                .enumerate()
                .filter_map(|(field, order)| order.map(|o| (field, o)))
                .collect();
            if assigned.is_empty() {
                return Err(Error::RelationNotJoined { relation });
            }
            assigned.sort_by_key(|&(_, order)| order);
            let fields: Vec<usize> = assigned.iter().map(|&(field, _)| field).collect();
            for (local, &field) in fields.iter().enumerate() {
                local_order[relation][field] = Some(local);
            }
            ordered_fields.push(fields);
        }

        // Validate the projection and derive the output schema
        for jf in projection {
            check_field(jf)?;
        }
        if let Some(names) = output_names {
            if names.len() != projection.len() {
                return Err(Error::OutputNameCountMismatch {
                    expected: projection.len(),
                    got: names.len(),
                });
            }
            let mut seen = FxHashSet::default();
            for name in names {
                if !seen.insert(name.as_str()) {
                    return Err(Error::DuplicateOutputName(name.clone()));
                }
            }
        }
        let columns: Vec<SchemaColumn> = projection
            .iter()
            .enumerate()
            .map(|(i, jf)| {
                let source = &schemas[jf.relation].columns[jf.field];
                let name = match output_names {
                    Some(names) => names[i].clone(),
                    None => source.name.clone(),
                };
                SchemaColumn::new(name, source.data_type)
            })
            .collect();
        let output_schema = Arc::new(Schema::new("join", columns));

        Ok(Self {
            variables: variables.to_vec(),
            local_order,
            ordered_fields,
            projection: projection.to_vec(),
            output_schema,
        })
    }

    /// Number of join variables (the depth count of the search).
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Fields participating in variable `d`.
    pub fn variable(&self, d: usize) -> &[JoinField] {
        &self.variables[d]
    }

    /// Local order of `field` in `relation`, `None` if unassigned.
    pub fn local_order(&self, relation: usize, field: usize) -> Option<usize> {
        self.local_order[relation][field]
    }

    /// The field of `relation` with local order `local`.
    pub fn ordered_field(&self, relation: usize, local: usize) -> usize {
        self.ordered_fields[relation][local]
    }

    /// Number of join fields of `relation`.
    pub fn joined_field_count(&self, relation: usize) -> usize {
        self.ordered_fields[relation].len()
    }

    /// The output projection.
    pub fn projection(&self) -> &[JoinField] {
        &self.projection
    }

    /// The derived output schema.
    pub fn output_schema(&self) -> &Arc<Schema> {
        &self.output_schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;

    fn schemas() -> Vec<Arc<Schema>> {
        vec![
            Arc::new(Schema::from_columns(
                "r",
                [
                    ("a", DataType::Integer),
                    ("x", DataType::Text),
                    ("b", DataType::Integer),
                ],
            )),
            Arc::new(Schema::from_columns(
                "s",
                [("b", DataType::Integer), ("a", DataType::Integer)],
            )),
        ]
    }

    #[test]
    fn test_local_order_follows_variable_order() {
        // Variable 0 joins r.a with s.a (s's *second* column);
        // variable 1 joins r.b with s.b (s's *first* column).
        let schedule = JoinSchedule::build(
            &schemas(),
            &[
                vec![JoinField::new(0, 0), JoinField::new(1, 1)],
                vec![JoinField::new(0, 2), JoinField::new(1, 0)],
            ],
            &[JoinField::new(0, 0), JoinField::new(0, 2)],
            None,
        )
        .unwrap();

        assert_eq!(schedule.variable_count(), 2);

        // r: field 0 first, field 2 second, field 1 unassigned
        assert_eq!(schedule.local_order(0, 0), Some(0));
        assert_eq!(schedule.local_order(0, 2), Some(1));
        assert_eq!(schedule.local_order(0, 1), None);
        assert_eq!(schedule.ordered_field(0, 0), 0);
        assert_eq!(schedule.ordered_field(0, 1), 2);
        assert_eq!(schedule.joined_field_count(0), 2);

        // s: field 1 (variable 0) locally precedes field 0 (variable 1)
        assert_eq!(schedule.local_order(1, 1), Some(0));
        assert_eq!(schedule.local_order(1, 0), Some(1));
        assert_eq!(schedule.ordered_field(1, 0), 1);
        assert_eq!(schedule.ordered_field(1, 1), 0);
    }

    #[test]
    fn test_derived_output_schema() {
        let schedule = JoinSchedule::build(
            &schemas(),
            &[vec![JoinField::new(0, 0), JoinField::new(1, 1)]],
            &[JoinField::new(0, 1), JoinField::new(1, 0)],
            None,
        )
        .unwrap();

        let out = schedule.output_schema();
        assert_eq!(out.column_count(), 2);
        assert_eq!(out.column(0).unwrap().name, "x");
        assert_eq!(out.column(0).unwrap().data_type, DataType::Text);
        assert_eq!(out.column(1).unwrap().name, "b");
        assert_eq!(out.column(1).unwrap().data_type, DataType::Integer);
    }

    #[test]
    fn test_supplied_output_names() {
        let schedule = JoinSchedule::build(
            &schemas(),
            &[vec![JoinField::new(0, 0), JoinField::new(1, 1)]],
            &[JoinField::new(0, 0), JoinField::new(1, 0)],
            Some(&["left_a".to_string(), "right_b".to_string()]),
        )
        .unwrap();

        let out = schedule.output_schema();
        assert_eq!(out.column(0).unwrap().name, "left_a");
        assert_eq!(out.column(1).unwrap().name, "right_b");
    }

    #[test]
    fn test_no_variables_rejected() {
        let err = JoinSchedule::build(&schemas(), &[], &[], None).unwrap_err();
        assert_eq!(err, Error::NoJoinVariables);
        assert!(err.is_configuration());
    }

    #[test]
    fn test_empty_variable_rejected() {
        let err = JoinSchedule::build(
            &schemas(),
            &[vec![JoinField::new(0, 0), JoinField::new(1, 1)], vec![]],
            &[],
            None,
        )
        .unwrap_err();
        assert_eq!(err, Error::EmptyJoinVariable { variable: 1 });
    }

    #[test]
    fn test_out_of_range_indices_rejected() {
        let err = JoinSchedule::build(
            &schemas(),
            &[vec![JoinField::new(5, 0)]],
            &[],
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::RelationIndexOutOfRange {
                relation: 5,
                relation_count: 2
            }
        );

        let err = JoinSchedule::build(
            &schemas(),
            &[vec![JoinField::new(1, 9)]],
            &[],
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::FieldIndexOutOfRange {
                relation: 1,
                field: 9,
                column_count: 2
            }
        );

        // Projection indices are validated too
        let err = JoinSchedule::build(
            &schemas(),
            &[vec![JoinField::new(0, 0), JoinField::new(1, 1)]],
            &[JoinField::new(0, 7)],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::FieldIndexOutOfRange { field: 7, .. }));
    }

    #[test]
    fn test_unjoined_relation_rejected() {
        let err = JoinSchedule::build(
            &schemas(),
            &[vec![JoinField::new(0, 0)]],
            &[],
            None,
        )
        .unwrap_err();
        assert_eq!(err, Error::RelationNotJoined { relation: 1 });
    }

    #[test]
    fn test_output_name_validation() {
        let variables = vec![vec![JoinField::new(0, 0), JoinField::new(1, 1)]];
        let projection = vec![JoinField::new(0, 0), JoinField::new(1, 0)];

        let err = JoinSchedule::build(
            &schemas(),
            &variables,
            &projection,
            Some(&["only_one".to_string()]),
        )
        .unwrap_err();
        assert_eq!(err, Error::OutputNameCountMismatch { expected: 2, got: 1 });

        let err = JoinSchedule::build(
            &schemas(),
            &variables,
            &projection,
            Some(&["same".to_string(), "same".to_string()]),
        )
        .unwrap_err();
        assert_eq!(err, Error::DuplicateOutputName("same".to_string()));
    }
}
