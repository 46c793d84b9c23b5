//! In-memory tables parsed from JSON source data.

use crate::error::PivotError;
use crate::types::Scalar;

use hashbrown::HashMap;
use serde_json::{Map, Value};

/// A two-dimensional table with named fields.
///
/// Data is stored column-major. Every column has [Table::num_rows] entries.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    fields: Vec<String>,
    columns: Vec<Vec<Scalar>>,
    num_rows: usize,
}

/// Builds a table one field at a time, keeping fields in first-appearance order.
#[derive(Default)]
struct TableBuilder {
    fields: Vec<String>,
    positions: HashMap<String, usize>,
    columns: Vec<Vec<Scalar>>,
}

impl TableBuilder {
    /// Returns the column for `field`, adding it if this is the first time it has been seen.
    fn column(&mut self, field: &str) -> &mut Vec<Scalar> {
        let position = match self.positions.get(field) {
            Some(position) => *position,
            None => {
                let position = self.fields.len();
                self.fields.push(field.to_string());
                self.positions.insert(field.to_string(), position);
                self.columns.push(Vec::new());
                position
            }
        };
        &mut self.columns[position]
    }

    /// Pads every column with nulls up to `num_rows` entries.
    fn pad(&mut self, num_rows: usize) {
        for column in self.columns.iter_mut() {
            column.resize(num_rows, Scalar::Null);
        }
    }

    fn build(mut self, num_rows: usize) -> Result<Table, PivotError> {
        self.pad(num_rows);
        Table::new(self.fields, self.columns)
    }
}

fn shape_error(reason: impl Into<String>) -> PivotError {
    PivotError::SourceShape {
        reason: reason.into(),
    }
}

/// Field and row names may be any JSON value but are normally strings.
fn name_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Table {
    /// Returns a new Table.
    ///
    /// # Arguments
    ///
    /// * `fields`: Field names, which must be unique
    /// * `columns`: One column of values per field, all of the same length
    pub fn new(fields: Vec<String>, columns: Vec<Vec<Scalar>>) -> Result<Self, PivotError> {
        if fields.len() != columns.len() {
            return Err(shape_error(format!(
                "{} field names for {} columns",
                fields.len(),
                columns.len()
            )));
        }
        {
            let mut seen = HashMap::new();
            for field in fields.iter() {
                if seen.insert(field.as_str(), ()).is_some() {
                    return Err(shape_error(format!("duplicate field {}", field)));
                }
            }
        }
        let num_rows = columns.first().map_or(0, Vec::len);
        if columns.iter().any(|column| column.len() != num_rows) {
            return Err(shape_error("columns have different lengths"));
        }
        Ok(Table {
            fields,
            columns,
            num_rows,
        })
    }

    /// Parse a Table from JSON.
    ///
    /// Three layouts are accepted:
    ///
    /// * records: `[{"field": value, ...}, ...]`
    /// * split: `{"columns": [...], "data": [[...], ...], "index": [...]}`
    /// * columns: `{"field": {"row": value, ...}, ...}` or `{"field": [value, ...], ...}`
    ///
    /// Fields and rows appear in the order in which they are first seen.
    pub fn from_json(data: &[u8]) -> Result<Self, PivotError> {
        let value: Value = serde_json::from_slice(data)?;
        match value {
            Value::Array(records) => Self::from_records(records),
            Value::Object(map) if is_split(&map) => Self::from_split(map),
            Value::Object(map) => Self::from_columns(map),
            _ => Err(shape_error(
                "expected an array of records or an object of columns",
            )),
        }
    }

    fn from_records(records: Vec<Value>) -> Result<Self, PivotError> {
        let mut builder = TableBuilder::default();
        let num_rows = records.len();
        for (row, record) in records.into_iter().enumerate() {
            let Value::Object(record) = record else {
                return Err(shape_error(format!("record {} is not an object", row)));
            };
            for (field, value) in record {
                let column = builder.column(&field);
                // Fields first seen part way through start with nulls.
                column.resize(row, Scalar::Null);
                column.push(value.into());
            }
            builder.pad(row + 1);
        }
        builder.build(num_rows)
    }

    fn from_split(mut map: Map<String, Value>) -> Result<Self, PivotError> {
        let (Some(Value::Array(fields)), Some(Value::Array(rows))) =
            (map.remove("columns"), map.remove("data"))
        else {
            return Err(shape_error("split columns and data must be arrays"));
        };
        let fields: Vec<String> = fields.iter().map(name_of).collect();
        let mut columns = vec![Vec::with_capacity(rows.len()); fields.len()];
        for (row, values) in rows.into_iter().enumerate() {
            let Value::Array(values) = values else {
                return Err(shape_error(format!("data row {} is not an array", row)));
            };
            if values.len() != fields.len() {
                return Err(shape_error(format!(
                    "data row {} has {} values for {} columns",
                    row,
                    values.len(),
                    fields.len()
                )));
            }
            for (column, value) in columns.iter_mut().zip(values) {
                column.push(value.into());
            }
        }
        Self::new(fields, columns)
    }

    fn from_columns(map: Map<String, Value>) -> Result<Self, PivotError> {
        let mut row_positions: HashMap<String, usize> = HashMap::new();
        let mut cells: Vec<(String, Vec<(usize, Scalar)>)> = Vec::with_capacity(map.len());
        for (field, column) in map {
            let entries: Vec<(String, Value)> = match column {
                Value::Object(rows) => rows.into_iter().collect(),
                Value::Array(values) => values
                    .into_iter()
                    .enumerate()
                    .map(|(row, value)| (row.to_string(), value))
                    .collect(),
                _ => {
                    return Err(shape_error(format!(
                        "column {} is not an object or array",
                        field
                    )))
                }
            };
            let mut column_cells = Vec::with_capacity(entries.len());
            for (row, value) in entries {
                let next = row_positions.len();
                let position = *row_positions.entry(row).or_insert(next);
                column_cells.push((position, value.into()));
            }
            cells.push((field, column_cells));
        }
        let num_rows = row_positions.len();
        let mut builder = TableBuilder::default();
        for (field, column_cells) in cells {
            let column = builder.column(&field);
            column.resize(num_rows, Scalar::Null);
            for (position, value) in column_cells {
                column[position] = value;
            }
        }
        builder.build(num_rows)
    }

    /// Field names in table order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Position of a field.
    ///
    /// Returns [PivotError::FieldNotFound] if the table has no such field.
    pub fn field_index(&self, field: &str) -> Result<usize, PivotError> {
        self.fields
            .iter()
            .position(|name| name == field)
            .ok_or_else(|| PivotError::FieldNotFound {
                field: field.to_string(),
            })
    }

    /// Values of the field at position `field_index`.
    pub fn column(&self, field_index: usize) -> &[Scalar] {
        &self.columns[field_index]
    }

    /// Returns a new table containing only the given rows, in the given order.
    pub fn take(&self, rows: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|column| rows.iter().map(|row| column[*row].clone()).collect())
            .collect();
        Table {
            fields: self.fields.clone(),
            columns,
            num_rows: rows.len(),
        }
    }
}

/// Whether an object looks like a table in split orientation.
fn is_split(map: &Map<String, Value>) -> bool {
    matches!(map.get("columns"), Some(Value::Array(_)))
        && matches!(map.get("data"), Some(Value::Array(_)))
        && map
            .keys()
            .all(|key| matches!(key.as_str(), "columns" | "data" | "index"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    fn column(table: &Table, field: &str) -> Vec<Scalar> {
        table.column(table.field_index(field).unwrap()).to_vec()
    }

    #[test]
    fn test_from_records() {
        let table = test_utils::get_test_table();
        assert_eq!(&["region", "product", "qty", "price"], table.fields());
        assert_eq!(3, table.num_rows());
        assert_eq!(
            vec![Scalar::Int(1), Scalar::Int(2), Scalar::Int(5)],
            column(&table, "qty")
        );
    }

    #[test]
    fn test_from_records_ragged() {
        let table = Table::from_json(br#"[{"a": 1}, {"b": "x"}, {"b": "y", "a": 3}]"#).unwrap();
        assert_eq!(&["a", "b"], table.fields());
        assert_eq!(
            vec![Scalar::Int(1), Scalar::Null, Scalar::Int(3)],
            column(&table, "a")
        );
        assert_eq!(
            vec![Scalar::Null, Scalar::from("x"), Scalar::from("y")],
            column(&table, "b")
        );
    }

    #[test]
    fn test_from_records_empty() {
        let table = Table::from_json(b"[]").unwrap();
        assert!(table.fields().is_empty());
        assert_eq!(0, table.num_rows());
    }

    #[test]
    fn test_from_records_not_object() {
        let err = Table::from_json(b"[1, 2]").unwrap_err();
        assert_eq!(
            "source data is not a table: record 0 is not an object",
            err.to_string()
        );
    }

    #[test]
    fn test_from_split() {
        let table = Table::from_json(
            br#"{"columns": ["a", "b"], "index": [0, 1], "data": [[1, "x"], [2, null]]}"#,
        )
        .unwrap();
        assert_eq!(&["a", "b"], table.fields());
        assert_eq!(vec![Scalar::Int(1), Scalar::Int(2)], column(&table, "a"));
        assert_eq!(vec![Scalar::from("x"), Scalar::Null], column(&table, "b"));
    }

    #[test]
    fn test_from_split_row_length_mismatch() {
        let err = Table::from_json(br#"{"columns": ["a", "b"], "data": [[1]]}"#).unwrap_err();
        assert_eq!(
            "source data is not a table: data row 0 has 1 values for 2 columns",
            err.to_string()
        );
    }

    #[test]
    fn test_from_split_duplicate_field() {
        let err = Table::from_json(br#"{"columns": ["a", "a"], "data": [[1, 2]]}"#).unwrap_err();
        assert_eq!("source data is not a table: duplicate field a", err.to_string());
    }

    #[test]
    fn test_from_columns_objects() {
        let table = Table::from_json(
            br#"{"b": {"r0": 1, "r1": 2}, "a": {"r1": "y", "r2": "z"}}"#,
        )
        .unwrap();
        // Field order is preserved rather than sorted.
        assert_eq!(&["b", "a"], table.fields());
        assert_eq!(3, table.num_rows());
        assert_eq!(
            vec![Scalar::Int(1), Scalar::Int(2), Scalar::Null],
            column(&table, "b")
        );
        assert_eq!(
            vec![Scalar::Null, Scalar::from("y"), Scalar::from("z")],
            column(&table, "a")
        );
    }

    #[test]
    fn test_from_columns_arrays() {
        let table = Table::from_json(br#"{"a": [1, 2], "b": [true]}"#).unwrap();
        assert_eq!(2, table.num_rows());
        assert_eq!(vec![Scalar::Bool(true), Scalar::Null], column(&table, "b"));
    }

    #[test]
    fn test_from_columns_scalar() {
        let err = Table::from_json(br#"{"a": 1}"#).unwrap_err();
        assert_eq!(
            "source data is not a table: column a is not an object or array",
            err.to_string()
        );
    }

    #[test]
    fn test_from_json_scalar() {
        let err = Table::from_json(b"42").unwrap_err();
        assert!(matches!(err, PivotError::SourceShape { .. }));
    }

    #[test]
    fn test_from_json_invalid() {
        let err = Table::from_json(b"[{").unwrap_err();
        assert!(matches!(err, PivotError::SourceParse(_)));
    }

    #[test]
    fn test_field_not_found() {
        let table = test_utils::get_test_table();
        let err = table.field_index("foo").unwrap_err();
        assert_eq!("field foo not found in source data", err.to_string());
    }

    #[test]
    fn test_new_length_mismatch() {
        let err = Table::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![Scalar::Int(1)], vec![]],
        )
        .unwrap_err();
        assert_eq!(
            "source data is not a table: columns have different lengths",
            err.to_string()
        );
    }

    #[test]
    fn test_take() {
        let table = test_utils::get_test_table();
        let taken = table.take(&[2, 0]);
        assert_eq!(2, taken.num_rows());
        assert_eq!(vec![Scalar::Int(5), Scalar::Int(1)], column(&taken, "qty"));
    }
}
