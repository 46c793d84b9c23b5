//! The pivot pipeline: filter, pivot, reorder and window a table.

use crate::aggregation::Aggregation;
use crate::error::PivotError;
use crate::models;
use crate::pivot::{self, PivotSpec};
use crate::row_filter;
use crate::shaper;
use crate::table::Table;

/// Run the pipeline for a request against an already loaded table.
///
/// This is a pure function of the request and the table.
///
/// # Arguments
///
/// * `request_data`: Validated request
/// * `table`: Source table
pub fn run(request_data: &models::RequestData, table: &Table) -> Result<models::Response, PivotError> {
    let aggregation = Aggregation::from_name(&request_data.aggfunc)?;
    let filtered = row_filter::filter(table, &request_data.rowfilter)?;
    let mut result = pivot::pivot(
        &filtered,
        &PivotSpec {
            values: &request_data.values,
            index: &request_data.index,
            columns: &request_data.columns,
            aggregation,
        },
    )?;
    shaper::values_innermost(&mut result.columns);
    let result = shaper::window(result, request_data.startrow, request_data.endrow);
    Ok(shaper::to_response(&result))
}
