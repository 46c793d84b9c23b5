//! Aggregation functions.
//!
//! Each aggregation is implemented as a struct that implements the
//! [Aggregate](crate::aggregation::Aggregate) trait, either directly or through
//! [NumAggregate](crate::aggregation::NumAggregate) when it only accepts numbers.

use crate::aggregation::{Aggregate, NumAggregate, Numbers};
use crate::error::PivotError;
use crate::types::Scalar;

use hashbrown::HashSet;
use ndarray::Array1;

/// Iterator over the non-null values of a group.
fn non_null<'a>(values: &'a [&'a Scalar]) -> impl DoubleEndedIterator<Item = &'a Scalar> + 'a {
    values.iter().copied().filter(|value| !value.is_null())
}

/// Return the number of non-null values.
pub struct Count {}

impl Aggregate for Count {
    fn aggregate(_field: &str, values: &[&Scalar]) -> Result<Scalar, PivotError> {
        let count = i64::try_from(non_null(values).count())?;
        Ok(Scalar::Int(count))
    }
}

/// Return the number of values, including nulls.
pub struct Size {}

impl Aggregate for Size {
    fn aggregate(_field: &str, values: &[&Scalar]) -> Result<Scalar, PivotError> {
        Ok(Scalar::Int(i64::try_from(values.len())?))
    }
}

/// Return the number of distinct non-null values.
pub struct Nunique {}

impl Aggregate for Nunique {
    fn aggregate(_field: &str, values: &[&Scalar]) -> Result<Scalar, PivotError> {
        let distinct: HashSet<&Scalar> = non_null(values).collect();
        Ok(Scalar::Int(i64::try_from(distinct.len())?))
    }
}

/// Return the first non-null value.
pub struct First {}

impl Aggregate for First {
    fn aggregate(_field: &str, values: &[&Scalar]) -> Result<Scalar, PivotError> {
        Ok(non_null(values).next().cloned().unwrap_or(Scalar::Null))
    }
}

/// Return the last non-null value.
pub struct Last {}

impl Aggregate for Last {
    fn aggregate(_field: &str, values: &[&Scalar]) -> Result<Scalar, PivotError> {
        Ok(non_null(values).next_back().cloned().unwrap_or(Scalar::Null))
    }
}

/// Return the largest non-null value.
///
/// Values of any kind are compared using the [Scalar] ordering.
pub struct Max {}

impl Aggregate for Max {
    fn aggregate(_field: &str, values: &[&Scalar]) -> Result<Scalar, PivotError> {
        Ok(non_null(values).max().cloned().unwrap_or(Scalar::Null))
    }
}

/// Return the smallest non-null value.
///
/// Values of any kind are compared using the [Scalar] ordering.
pub struct Min {}

impl Aggregate for Min {
    fn aggregate(_field: &str, values: &[&Scalar]) -> Result<Scalar, PivotError> {
        Ok(non_null(values).min().cloned().unwrap_or(Scalar::Null))
    }
}

/// Return the sum of the values.
///
/// The sum of integers is an integer unless it overflows. The sum of no values is 0.
pub struct Sum {}

impl NumAggregate for Sum {
    const NAME: &'static str = "sum";

    fn aggregate_numbers(numbers: Numbers) -> Scalar {
        let integer_sum = numbers
            .integers
            .and_then(|integers| integers.into_iter().try_fold(0_i64, i64::checked_add));
        match integer_sum {
            Some(sum) => Scalar::Int(sum),
            None => Scalar::float(numbers.floats.iter().sum()),
        }
    }
}

/// Return the product of the values.
///
/// The product of integers is an integer unless it overflows. The product of no values is 1.
pub struct Prod {}

impl NumAggregate for Prod {
    const NAME: &'static str = "prod";

    fn aggregate_numbers(numbers: Numbers) -> Scalar {
        let integer_product = numbers
            .integers
            .and_then(|integers| integers.into_iter().try_fold(1_i64, i64::checked_mul));
        match integer_product {
            Some(product) => Scalar::Int(product),
            None => Scalar::float(numbers.floats.iter().product()),
        }
    }
}

/// Return the arithmetic mean of the values.
pub struct Mean {}

impl NumAggregate for Mean {
    const NAME: &'static str = "mean";

    fn aggregate_numbers(numbers: Numbers) -> Scalar {
        Array1::from(numbers.floats)
            .mean()
            .map_or(Scalar::Null, Scalar::float)
    }
}

/// Return the median of the values.
///
/// For an even number of values this is the mean of the two middle values.
pub struct Median {}

impl NumAggregate for Median {
    const NAME: &'static str = "median";

    fn aggregate_numbers(numbers: Numbers) -> Scalar {
        let mut floats = numbers.floats;
        if floats.is_empty() {
            return Scalar::Null;
        }
        // Values are finite so the comparison never fails.
        floats.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let middle = floats.len() / 2;
        if floats.len() % 2 == 0 {
            Scalar::float((floats[middle - 1] + floats[middle]) / 2.0)
        } else {
            Scalar::float(floats[middle])
        }
    }
}

/// Return the sample variance of the values.
///
/// Null if there are fewer than two values.
pub struct Var {}

impl NumAggregate for Var {
    const NAME: &'static str = "var";

    fn aggregate_numbers(numbers: Numbers) -> Scalar {
        if numbers.floats.len() < 2 {
            return Scalar::Null;
        }
        Scalar::float(Array1::from(numbers.floats).var(1.0))
    }
}

/// Return the sample standard deviation of the values.
///
/// Null if there are fewer than two values.
pub struct Std {}

impl NumAggregate for Std {
    const NAME: &'static str = "std";

    fn aggregate_numbers(numbers: Numbers) -> Scalar {
        if numbers.floats.len() < 2 {
            return Scalar::Null;
        }
        Scalar::float(Array1::from(numbers.floats).std(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agg<A: Aggregate>(values: &[Scalar]) -> Scalar {
        let values: Vec<&Scalar> = values.iter().collect();
        A::aggregate("f", &values).unwrap()
    }

    fn assert_float(expected: f64, actual: Scalar) {
        match actual {
            Scalar::Float(f) => assert!((expected - f).abs() < 1e-9, "{} != {}", expected, f),
            other => panic!("expected float, got {:?}", other),
        }
    }

    fn ints(values: &[i64]) -> Vec<Scalar> {
        values.iter().map(|i| Scalar::Int(*i)).collect()
    }

    #[test]
    fn count_skips_nulls() {
        let values = [Scalar::Int(1), Scalar::Null, Scalar::from("x")];
        assert_eq!(Scalar::Int(2), agg::<Count>(&values));
    }

    #[test]
    fn size_includes_nulls() {
        let values = [Scalar::Int(1), Scalar::Null, Scalar::from("x")];
        assert_eq!(Scalar::Int(3), agg::<Size>(&values));
    }

    #[test]
    fn nunique() {
        let values = [
            Scalar::Int(1),
            Scalar::Float(1.0),
            Scalar::Null,
            Scalar::from("1"),
        ];
        assert_eq!(Scalar::Int(2), agg::<Nunique>(&values));
    }

    #[test]
    fn first_and_last_skip_nulls() {
        let values = [Scalar::Null, Scalar::Int(1), Scalar::Int(2), Scalar::Null];
        assert_eq!(Scalar::Int(1), agg::<First>(&values));
        assert_eq!(Scalar::Int(2), agg::<Last>(&values));
        assert_eq!(Scalar::Null, agg::<First>(&[Scalar::Null]));
    }

    #[test]
    fn min_max_numbers() {
        let values = [Scalar::Int(3), Scalar::Float(-1.5), Scalar::Null];
        assert_eq!(Scalar::Float(-1.5), agg::<Min>(&values));
        assert_eq!(Scalar::Int(3), agg::<Max>(&values));
    }

    #[test]
    fn min_max_strings() {
        let values = [Scalar::from("b"), Scalar::from("a"), Scalar::from("c")];
        assert_eq!(Scalar::from("a"), agg::<Min>(&values));
        assert_eq!(Scalar::from("c"), agg::<Max>(&values));
        assert_eq!(Scalar::Null, agg::<Max>(&[]));
    }

    #[test]
    fn sum_integers() {
        assert_eq!(Scalar::Int(6), agg::<Sum>(&ints(&[1, 2, 3])));
    }

    #[test]
    fn sum_mixed() {
        let values = [Scalar::Int(1), Scalar::Float(0.5), Scalar::Bool(true)];
        assert_float(2.5, agg::<Sum>(&values));
    }

    #[test]
    fn sum_empty_is_zero() {
        assert_eq!(Scalar::Int(0), agg::<Sum>(&[Scalar::Null]));
    }

    #[test]
    fn sum_overflow_falls_back_to_float() {
        assert_float(2.0 * i64::MAX as f64, agg::<Sum>(&ints(&[i64::MAX, i64::MAX])));
    }

    #[test]
    fn sum_non_numeric() {
        let values = [Scalar::Int(1), Scalar::from("x")];
        let values: Vec<&Scalar> = values.iter().collect();
        let err = Sum::aggregate("name", &values).unwrap_err();
        assert_eq!(
            "cannot compute sum of non-numeric value \"x\" in field name",
            err.to_string()
        );
    }

    #[test]
    fn prod() {
        assert_eq!(Scalar::Int(24), agg::<Prod>(&ints(&[2, 3, 4])));
        assert_eq!(Scalar::Int(1), agg::<Prod>(&[]));
    }

    #[test]
    fn mean() {
        assert_float(2.5, agg::<Mean>(&ints(&[1, 2, 3, 4])));
        assert_eq!(Scalar::Null, agg::<Mean>(&[Scalar::Null]));
    }

    #[test]
    fn median() {
        assert_float(2.0, agg::<Median>(&ints(&[3, 1, 2])));
        assert_float(2.5, agg::<Median>(&ints(&[4, 1, 3, 2])));
        assert_eq!(Scalar::Null, agg::<Median>(&[]));
    }

    #[test]
    fn var_and_std() {
        let values = ints(&[2, 4, 4, 4, 5, 5, 7, 9]);
        assert_float(32.0 / 7.0, agg::<Var>(&values));
        assert_float((32.0_f64 / 7.0).sqrt(), agg::<Std>(&values));
    }

    #[test]
    fn var_single_value_is_null() {
        assert_eq!(Scalar::Null, agg::<Var>(&ints(&[1])));
        assert_eq!(Scalar::Null, agg::<Std>(&ints(&[1])));
    }
}
