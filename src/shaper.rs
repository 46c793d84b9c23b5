//! Shaping of a pivot result into the response.

use crate::models;
use crate::pivot::{MultiIndex, PivotResult};
use crate::types::Scalar;

use ndarray::{s, Axis};

/// Reorder the levels of an axis so that the outermost level becomes the innermost.
///
/// Adjacent levels are swapped from the outside in, which moves the value field names to the
/// end of each column label. The order of the labels is not changed.
pub fn values_innermost(index: &mut MultiIndex) {
    for level in 0..index.nlevels().saturating_sub(1) {
        index.swap_levels(level, level + 1);
    }
}

/// Returns a row position in Python slice semantics as a position within `0..=length`.
///
/// # Arguments
///
/// * `position`: Row position. Negative values count from the end.
/// * `length`: Number of rows
fn to_row_position(position: isize, length: usize) -> usize {
    if position < 0 {
        length.saturating_sub(position.unsigned_abs())
    } else {
        std::cmp::min(position.unsigned_abs(), length)
    }
}

/// Keep only the rows in the window `start..end`.
///
/// Bounds follow Python slice semantics: both are optional, negative values count from the
/// end, and out of range values are clamped. A window that ends before it starts is empty.
///
/// # Arguments
///
/// * `result`: Pivot result
/// * `start`: Inclusive first row
/// * `end`: Exclusive last row
pub fn window(result: PivotResult, start: Option<isize>, end: Option<isize>) -> PivotResult {
    let length = result.index.len();
    let start = start.map_or(0, |start| to_row_position(start, length));
    let end = end.map_or(length, |end| to_row_position(end, length));
    let end = std::cmp::max(start, end);
    if start == 0 && end == length {
        return result;
    }
    let rows: Vec<usize> = (start..end).collect();
    PivotResult {
        index: result.index.select(&rows),
        columns: result.columns,
        data: result.data.slice(s![start..end, ..]).to_owned(),
    }
}

/// Convert a pivot result to a response.
pub fn to_response(result: &PivotResult) -> models::Response {
    let data = result
        .data
        .axis_iter(Axis(0))
        .map(|row| row.iter().map(Scalar::to_json).collect())
        .collect();
    models::Response::new(result.columns.to_json(), result.index.to_json(), data)
}
