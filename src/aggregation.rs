use crate::aggregations;
use crate::error::PivotError;
use crate::types::Scalar;

use strum_macros::{Display, EnumString};

/// Supported aggregation functions
#[derive(Clone, Copy, Debug, Display, EnumString, Eq, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum Aggregation {
    /// Number of non-null values
    Count,
    /// First non-null value
    First,
    /// Last non-null value
    Last,
    /// Largest non-null value
    Max,
    /// Arithmetic mean
    Mean,
    /// Middle value, or mean of the two middle values
    Median,
    /// Smallest non-null value
    Min,
    /// Number of distinct non-null values
    Nunique,
    /// Product
    Prod,
    /// Number of rows, including nulls
    Size,
    /// Sample standard deviation
    Std,
    /// Sum
    Sum,
    /// Sample variance
    Var,
}

impl Aggregation {
    /// Parse an aggregation function name.
    ///
    /// Returns [PivotError::UnsupportedAggregation] for unrecognised names.
    pub fn from_name(name: &str) -> Result<Self, PivotError> {
        name.parse()
            .map_err(|_| PivotError::UnsupportedAggregation {
                aggfunc: name.to_string(),
            })
    }

    /// Apply the aggregation to the values of one group.
    ///
    /// # Arguments
    ///
    /// * `field`: Name of the field being aggregated, used in error messages
    /// * `values`: Values of the group, in row order. May contain nulls.
    pub fn apply(self, field: &str, values: &[&Scalar]) -> Result<Scalar, PivotError> {
        match self {
            Self::Count => aggregations::Count::aggregate(field, values),
            Self::First => aggregations::First::aggregate(field, values),
            Self::Last => aggregations::Last::aggregate(field, values),
            Self::Max => aggregations::Max::aggregate(field, values),
            Self::Mean => aggregations::Mean::aggregate(field, values),
            Self::Median => aggregations::Median::aggregate(field, values),
            Self::Min => aggregations::Min::aggregate(field, values),
            Self::Nunique => aggregations::Nunique::aggregate(field, values),
            Self::Prod => aggregations::Prod::aggregate(field, values),
            Self::Size => aggregations::Size::aggregate(field, values),
            Self::Std => aggregations::Std::aggregate(field, values),
            Self::Sum => aggregations::Sum::aggregate(field, values),
            Self::Var => aggregations::Var::aggregate(field, values),
        }
    }
}

/// Numeric values of a group, with nulls removed.
#[derive(Debug, Default, PartialEq)]
pub struct Numbers {
    /// All values as floats
    pub floats: Vec<f64>,
    /// All values as integers, if every value is an integer or boolean
    pub integers: Option<Vec<i64>>,
}

/// Trait for aggregation functions.
///
/// This forms the contract between the pivot and the individual aggregations.
pub trait Aggregate {
    /// Aggregate the values of one group.
    ///
    /// Returns the aggregated value, which is [Scalar::Null] when there is nothing to aggregate.
    ///
    /// # Arguments
    ///
    /// * `field`: Name of the field being aggregated
    /// * `values`: Values of the group. May contain nulls.
    fn aggregate(field: &str, values: &[&Scalar]) -> Result<Scalar, PivotError>;
}

/// Trait for aggregation functions that only accept numbers.
///
/// This trait converts the group's values to [Numbers], rejecting anything non-numeric.
pub trait NumAggregate: Aggregate {
    /// Name used in error messages.
    const NAME: &'static str;

    fn aggregate_numbers(numbers: Numbers) -> Scalar;
}

impl<T: NumAggregate> Aggregate for T {
    /// Aggregate the values of one group.
    ///
    /// Nulls are skipped, booleans count as 0 or 1.
    fn aggregate(field: &str, values: &[&Scalar]) -> Result<Scalar, PivotError> {
        let mut numbers = Numbers {
            floats: Vec::with_capacity(values.len()),
            integers: Some(Vec::with_capacity(values.len())),
        };
        for value in values.iter().filter(|value| !value.is_null()) {
            let float = value.as_f64().ok_or_else(|| PivotError::NonNumeric {
                aggregation: T::NAME,
                field: field.to_string(),
                value: value.to_string(),
            })?;
            numbers.floats.push(float);
            numbers.integers = match (numbers.integers, value.as_i64()) {
                (Some(mut integers), Some(integer)) => {
                    integers.push(integer);
                    Some(integers)
                }
                _ => None,
            };
        }
        Ok(T::aggregate_numbers(numbers))
    }
}
