//! Data types and associated functions and methods

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

/// A single row filter term.
///
/// On the wire this is a two element array: `[field, value]`.
/// A row is retained if its value in `field` is the string `value`.
#[derive(Clone, Debug, Deserialize, PartialEq, Validate)]
#[serde(from = "(String, String)")]
pub struct RowFilter {
    /// Name of the field to match
    #[validate(length(min = 1, message = "rowfilter field must not be empty"))]
    pub field: String,
    /// Value the field must be equal to
    pub value: String,
}

impl RowFilter {
    /// Return a new RowFilter object.
    pub fn new(field: &str, value: &str) -> Self {
        RowFilter {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

impl From<(String, String)> for RowFilter {
    fn from((field, value): (String, String)) -> Self {
        RowFilter { field, value }
    }
}

/// Request data for a pivot
#[derive(Clone, Debug, Deserialize, PartialEq, Validate)]
#[validate(schema(function = "validate_request_data"))]
pub struct RequestData {
    /// Location of the JSON source data: an HTTP(S) URL, a file URL or a local path
    #[validate(length(min = 1, message = "url must not be empty"))]
    pub url: String,
    /// Fields to aggregate
    #[validate(
        length(min = 1, message = "values must not be empty"),
        custom = "validate_field_names"
    )]
    pub values: Vec<String>,
    /// Fields that form the row index
    #[validate(custom = "validate_field_names")]
    pub index: Vec<String>,
    /// Fields that form the column index
    #[validate(custom = "validate_field_names")]
    pub columns: Vec<String>,
    /// Rows are retained only if they match every filter term
    #[validate]
    pub rowfilter: Vec<RowFilter>,
    /// Name of the aggregation function
    #[validate(length(min = 1, message = "aggfunc must not be empty"))]
    pub aggfunc: String,
    /// Inclusive start of the row window. Negative values count from the end.
    pub startrow: Option<isize>,
    /// Exclusive end of the row window. Negative values count from the end.
    pub endrow: Option<isize>,
}

/// Validate a list of field names
fn validate_field_names(names: &[String]) -> Result<(), ValidationError> {
    if names.iter().any(|name| name.is_empty()) {
        return Err(ValidationError::new("field names must not be empty"));
    }
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            let mut error = ValidationError::new("field names must be unique");
            error.add_param("field".into(), name);
            return Err(error);
        }
    }
    Ok(())
}

/// Validate request data
fn validate_request_data(request_data: &RequestData) -> Result<(), ValidationError> {
    // Validation of multiple fields in RequestData.
    if request_data.index.is_empty() && request_data.columns.is_empty() {
        return Err(ValidationError::new(
            "At least one of index and columns must be specified",
        ));
    }
    if let Some(field) = request_data
        .index
        .iter()
        .find(|field| request_data.columns.contains(field))
    {
        let mut error = ValidationError::new("Index and columns must not share fields");
        error.add_param("field".into(), field);
        return Err(error);
    }
    if let Some(field) = request_data
        .values
        .iter()
        .find(|field| request_data.index.contains(field) || request_data.columns.contains(field))
    {
        let mut error = ValidationError::new("Values must not be used in index or columns");
        error.add_param("field".into(), field);
        return Err(error);
    }
    Ok(())
}

/// Response containing a pivot table in split orientation.
///
/// The three arrays are parallel: `data[i][j]` is the value for row label `index[i]` and column
/// label `columns[j]`. Labels of multi-level axes are arrays with one element per level.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Response {
    /// Column labels
    pub columns: Vec<Value>,
    /// Row labels
    pub index: Vec<Value>,
    /// Row-major table data
    pub data: Vec<Vec<Value>>,
}

impl Response {
    /// Return a Response object
    pub fn new(columns: Vec<Value>, index: Vec<Value>, data: Vec<Vec<Value>>) -> Response {
        Response {
            columns,
            index,
            data,
        }
    }
}
