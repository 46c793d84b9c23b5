//! Row filtering.

use crate::error::PivotError;
use crate::models::RowFilter;
use crate::table::Table;
use crate::types::Scalar;

use std::borrow::Cow;

/// Returns the rows of `table` that match every term of `row_filter`.
///
/// A term matches when the row's value is a string equal to the term's value. Values of other
/// kinds never match, so `"1"` does not select a number `1`.
///
/// An empty filter borrows the table unchanged.
///
/// # Arguments
///
/// * `table`: Table to filter
/// * `row_filter`: Filter terms
pub fn filter<'a>(table: &'a Table, row_filter: &[RowFilter]) -> Result<Cow<'a, Table>, PivotError> {
    if row_filter.is_empty() {
        return Ok(Cow::Borrowed(table));
    }
    let terms = row_filter
        .iter()
        .map(|term| {
            let field_index = table.field_index(&term.field)?;
            Ok((table.column(field_index), Scalar::from(term.value.as_str())))
        })
        .collect::<Result<Vec<_>, PivotError>>()?;
    let rows: Vec<usize> = (0..table.num_rows())
        .filter(|row| terms.iter().all(|(column, value)| column[*row] == *value))
        .collect();
    tracing::debug!(
        "row filter retained {} of {} rows",
        rows.len(),
        table.num_rows()
    );
    Ok(Cow::Owned(table.take(&rows)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    #[test]
    fn test_filter_empty_borrows() {
        let table = test_utils::get_test_table();
        let filtered = filter(&table, &[]).unwrap();
        assert!(matches!(filtered, Cow::Borrowed(_)));
        assert_eq!(table, *filtered);
    }

    #[test]
    fn test_filter_single() {
        let table = test_utils::get_test_table();
        let filtered = filter(&table, &[RowFilter::new("region", "E")]).unwrap();
        assert_eq!(2, filtered.num_rows());
        assert_eq!(table.take(&[0, 1]), *filtered);
    }

    #[test]
    fn test_filter_all_terms_must_match() {
        let table = test_utils::get_test_table();
        let filtered = filter(
            &table,
            &[RowFilter::new("region", "E"), RowFilter::new("product", "B")],
        )
        .unwrap();
        assert_eq!(table.take(&[1]), *filtered);
    }

    #[test]
    fn test_filter_no_match() {
        let table = test_utils::get_test_table();
        let filtered = filter(&table, &[RowFilter::new("region", "N")]).unwrap();
        assert_eq!(0, filtered.num_rows());
        assert_eq!(table.fields(), filtered.fields());
    }

    #[test]
    fn test_filter_type_sensitive() {
        let table = test_utils::get_test_table();
        let filtered = filter(&table, &[RowFilter::new("qty", "1")]).unwrap();
        assert_eq!(0, filtered.num_rows());
    }

    #[test]
    fn test_filter_field_not_found() {
        let table = test_utils::get_test_table();
        let err = filter(&table, &[RowFilter::new("foo", "E")]).unwrap_err();
        assert!(matches!(err, PivotError::FieldNotFound { field } if field == "foo"));
    }
}
