//! Threshold bucketing of numeric columns into labelled categories

use polars::prelude::*;

use super::error::{PipelineError, Result};

/// One labelled numeric range.
///
/// Ranges are `[lower, upper)` unless `lower_exclusive` is set, in which case
/// they are `(lower, upper)`. An `upper` of `None` leaves the range unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketRange<'a> {
    pub label: &'a str,
    pub lower: f64,
    pub upper: Option<f64>,
    pub lower_exclusive: bool,
}

impl<'a> BucketRange<'a> {
    pub const fn new(label: &'a str, lower: f64, upper: Option<f64>) -> Self {
        Self {
            label,
            lower,
            upper,
            lower_exclusive: false,
        }
    }

    pub const fn exclusive(label: &'a str, lower: f64, upper: Option<f64>) -> Self {
        Self {
            label,
            lower,
            upper,
            lower_exclusive: true,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        let above_lower = if self.lower_exclusive {
            value > self.lower
        } else {
            value >= self.lower
        };
        let below_upper = self.upper.map_or(true, |upper| value < upper);
        above_lower && below_upper
    }
}

/// Label of the first range containing `value`.
///
/// Ranges are expected not to overlap; that is not checked here.
pub fn assign_bucket<'a>(value: Option<f64>, ranges: &[BucketRange<'a>]) -> Option<&'a str> {
    let value = value.filter(|v| v.is_finite())?;
    ranges.iter().find(|r| r.contains(value)).map(|r| r.label)
}

/// Add `target` holding the bucket label of each value in `source`.
///
/// Non-numeric cells and values outside every range become null.
pub fn bucketize(
    df: &mut DataFrame,
    source: &str,
    target: &str,
    ranges: &[BucketRange<'_>],
) -> Result<()> {
    let column = df
        .column(source)
        .map_err(|_| PipelineError::missing_column(source, "threshold bucketing"))?;
    let float_col = column.cast(&DataType::Float64)?;

    let labels: StringChunked = float_col
        .f64()?
        .into_iter()
        .map(|value| assign_bucket(value, ranges))
        .collect();

    let unmatched = labels.null_count();
    log::debug!(
        "Bucketed '{}' into '{}' ({} row(s) without a bucket)",
        source,
        target,
        unmatched
    );

    df.with_column(labels.with_name(target.into()).into_series())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGES: [BucketRange<'static>; 3] = [
        BucketRange::exclusive("low", 0.0, Some(10.0)),
        BucketRange::new("mid", 10.0, Some(20.0)),
        BucketRange::new("high", 20.0, None),
    ];

    #[test]
    fn test_half_open_boundaries() {
        assert_eq!(assign_bucket(Some(0.0), &RANGES), None);
        assert_eq!(assign_bucket(Some(0.5), &RANGES), Some("low"));
        assert_eq!(assign_bucket(Some(10.0), &RANGES), Some("mid"));
        assert_eq!(assign_bucket(Some(19.999), &RANGES), Some("mid"));
        assert_eq!(assign_bucket(Some(20.0), &RANGES), Some("high"));
        assert_eq!(assign_bucket(Some(1e9), &RANGES), Some("high"));
    }

    #[test]
    fn test_missing_and_non_finite_have_no_bucket() {
        assert_eq!(assign_bucket(None, &RANGES), None);
        assert_eq!(assign_bucket(Some(f64::NAN), &RANGES), None);
        assert_eq!(assign_bucket(Some(-1.0), &RANGES), None);
    }
}
