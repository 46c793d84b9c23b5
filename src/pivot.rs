//! Pivot (cross-tabulation) of a table.
//!
//! The behaviour follows the defaults of a conventional dataframe pivot table:
//!
//! * rows with a null in any grouping field are ignored
//! * nulls are skipped by the aggregation
//! * groups whose aggregates are all null are dropped
//! * both axes are sorted, including the value field names
//! * missing combinations are null, and columns that are entirely null are dropped

use crate::aggregation::Aggregation;
use crate::error::PivotError;
use crate::table::Table;
use crate::types::Scalar;

use hashbrown::HashMap;
use ndarray::{Array2, Axis};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// A possibly multi-level axis of a pivot result.
///
/// Each label is a tuple with one element per level.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiIndex {
    names: Vec<Option<String>>,
    labels: Vec<Vec<Scalar>>,
}

impl MultiIndex {
    /// Returns a new MultiIndex.
    ///
    /// # Arguments
    ///
    /// * `names`: Name of each level. The level holding value field names is unnamed.
    /// * `labels`: Labels, each with one element per level
    pub fn new(names: Vec<Option<String>>, labels: Vec<Vec<Scalar>>) -> Self {
        debug_assert!(labels.iter().all(|label| label.len() == names.len()));
        MultiIndex { names, labels }
    }

    /// Level names.
    pub fn names(&self) -> &[Option<String>] {
        &self.names
    }

    /// Labels.
    pub fn labels(&self) -> &[Vec<Scalar>] {
        &self.labels
    }

    /// Number of levels.
    pub fn nlevels(&self) -> usize {
        self.names.len()
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether there are no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Exchange two levels.
    ///
    /// Only the labelling changes: the order of the labels is kept.
    pub fn swap_levels(&mut self, i: usize, j: usize) {
        self.names.swap(i, j);
        for label in self.labels.iter_mut() {
            label.swap(i, j);
        }
    }

    /// Keep only the labels at the given positions.
    pub fn select(&self, positions: &[usize]) -> Self {
        MultiIndex {
            names: self.names.clone(),
            labels: positions.iter().map(|p| self.labels[*p].clone()).collect(),
        }
    }

    /// Labels as JSON.
    ///
    /// Labels of a single-level index are scalars, otherwise they are arrays.
    pub fn to_json(&self) -> Vec<Value> {
        self.labels
            .iter()
            .map(|label| match label.as_slice() {
                [single] if self.nlevels() == 1 => single.to_json(),
                levels => Value::Array(levels.iter().map(Scalar::to_json).collect()),
            })
            .collect()
    }
}

/// Result of a pivot.
#[derive(Clone, Debug, PartialEq)]
pub struct PivotResult {
    /// Row axis
    pub index: MultiIndex,
    /// Column axis
    pub columns: MultiIndex,
    /// Aggregated values, one row per index label and one column per column label
    pub data: Array2<Scalar>,
}

impl PivotResult {
    /// Drop columns that are null in every row.
    fn drop_null_columns(self) -> Self {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|column| {
                self.data
                    .column(*column)
                    .iter()
                    .any(|value| !value.is_null())
            })
            .collect();
        if keep.len() == self.columns.len() {
            return self;
        }
        PivotResult {
            index: self.index,
            columns: self.columns.select(&keep),
            data: self.data.select(Axis(1), &keep),
        }
    }
}

/// What to pivot.
#[derive(Clone, Copy, Debug)]
pub struct PivotSpec<'a> {
    /// Fields to aggregate
    pub values: &'a [String],
    /// Fields forming the row axis
    pub index: &'a [String],
    /// Fields forming the column axis
    pub columns: &'a [String],
    /// Aggregation applied to each group
    pub aggregation: Aggregation,
}

/// Grouping key: the values of the index fields and of the columns fields.
type GroupKey = (Vec<Scalar>, Vec<Scalar>);

/// Look up the positions of named fields.
fn field_indices(table: &Table, fields: &[String]) -> Result<Vec<usize>, PivotError> {
    fields.iter().map(|field| table.field_index(field)).collect()
}

/// Values of the given fields in one row, or None if any of them is null.
fn row_key(table: &Table, fields: &[usize], row: usize) -> Option<Vec<Scalar>> {
    fields
        .iter()
        .map(|field| {
            let value = &table.column(*field)[row];
            (!value.is_null()).then(|| value.clone())
        })
        .collect()
}

/// Pivot a table.
///
/// The column axis has the value field names as its outermost level, followed by one level per
/// columns field. When there are no index fields the result is transposed: there is one row per
/// value field, and the column axis has only the columns field levels.
///
/// # Arguments
///
/// * `table`: Table to pivot
/// * `spec`: Fields and aggregation
#[tracing::instrument(level = "DEBUG", skip(table))]
pub fn pivot(table: &Table, spec: &PivotSpec) -> Result<PivotResult, PivotError> {
    let index_fields = field_indices(table, spec.index)?;
    let column_fields = field_indices(table, spec.columns)?;
    // Value fields are sorted by name.
    let mut value_fields: Vec<(&str, usize)> = spec
        .values
        .iter()
        .map(|field| Ok((field.as_str(), table.field_index(field)?)))
        .collect::<Result<_, PivotError>>()?;
    value_fields.sort();

    let mut groups: HashMap<GroupKey, Vec<usize>> = HashMap::new();
    for row in 0..table.num_rows() {
        let (Some(row_key), Some(column_key)) = (
            row_key(table, &index_fields, row),
            row_key(table, &column_fields, row),
        ) else {
            continue;
        };
        groups.entry((row_key, column_key)).or_default().push(row);
    }

    // One aggregate per value field for each group, sorted by key.
    let mut cells: BTreeMap<GroupKey, Vec<Scalar>> = BTreeMap::new();
    for (key, rows) in groups {
        let aggregates = value_fields
            .iter()
            .map(|(name, field)| {
                let column = table.column(*field);
                let values: Vec<&Scalar> = rows.iter().map(|row| &column[*row]).collect();
                spec.aggregation.apply(name, &values)
            })
            .collect::<Result<Vec<Scalar>, PivotError>>()?;
        if aggregates.iter().any(|value| !value.is_null()) {
            cells.insert(key, aggregates);
        }
    }
    tracing::debug!("pivot produced {} non-empty groups", cells.len());

    let row_keys: BTreeSet<&Vec<Scalar>> = cells.keys().map(|(row, _)| row).collect();
    let column_keys: BTreeSet<&Vec<Scalar>> = cells.keys().map(|(_, column)| column).collect();
    let column_names: Vec<Option<String>> = spec.columns.iter().cloned().map(Some).collect();
    let empty = Vec::new();

    let result = if spec.index.is_empty() {
        // Transposed: one row per value field.
        let index = MultiIndex::new(
            vec![None],
            value_fields
                .iter()
                .map(|(name, _)| vec![Scalar::from(*name)])
                .collect(),
        );
        let column_keys: Vec<&Vec<Scalar>> = column_keys.into_iter().collect();
        let data = Array2::from_shape_fn((value_fields.len(), column_keys.len()), |(v, c)| {
            cells
                .get(&(empty.clone(), column_keys[c].clone()))
                .map_or(Scalar::Null, |aggregates| aggregates[v].clone())
        });
        let columns = MultiIndex::new(
            column_names,
            column_keys.into_iter().cloned().collect(),
        );
        PivotResult {
            index,
            columns,
            data,
        }
    } else {
        let row_keys: Vec<&Vec<Scalar>> = row_keys.into_iter().collect();
        // Column labels are (value field, columns key...), sorted by value field first.
        let column_leaves: Vec<(usize, &Vec<Scalar>)> = (0..value_fields.len())
            .flat_map(|v| column_keys.iter().map(move |key| (v, *key)))
            .collect();
        let data = Array2::from_shape_fn((row_keys.len(), column_leaves.len()), |(r, c)| {
            let (v, column_key) = column_leaves[c];
            cells
                .get(&(row_keys[r].clone(), column_key.clone()))
                .map_or(Scalar::Null, |aggregates| aggregates[v].clone())
        });
        let index = MultiIndex::new(
            spec.index.iter().cloned().map(Some).collect(),
            row_keys.into_iter().cloned().collect(),
        );
        let mut names = vec![None];
        names.extend(column_names);
        let columns = MultiIndex::new(
            names,
            column_leaves
                .into_iter()
                .map(|(v, key)| {
                    let mut label = vec![Scalar::from(value_fields[v].0)];
                    label.extend(key.iter().cloned());
                    label
                })
                .collect(),
        );
        PivotResult {
            index,
            columns,
            data,
        }
    };
    Ok(result.drop_null_columns())
}
