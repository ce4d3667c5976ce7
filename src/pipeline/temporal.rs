//! Date coercion and time-in-location durations

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;

use super::error::{PipelineError, Result};

/// Text layouts accepted when coercing a column to dates.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];
// `%.f` also matches a missing fraction
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const MS_PER_DAY: i64 = 86_400_000;

fn unix_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Days since 1970-01-01, the physical representation of a polars `Date`.
pub fn days_since_epoch(date: NaiveDate) -> i32 {
    date.signed_duration_since(unix_epoch()).num_days() as i32
}

/// Parse a text cell as a date, accepting a handful of common layouts.
///
/// Timestamps with an offset keep the calendar date written in the text.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| parse_naive_datetime(text).map(|dt| dt.date()))
}

/// Parse a text cell as a point in time. Offsets are normalized to UTC and a
/// bare date is read as midnight.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    parse_naive_datetime(text).or_else(|| {
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
            .map(|date| date.and_time(NaiveTime::MIN))
    })
}

fn parse_naive_datetime(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Force `column` to a temporal dtype in place.
///
/// `Date` and `Datetime` columns are left untouched. Text is parsed: the
/// column becomes `Date` when every value falls on midnight and
/// `Datetime[ms]` otherwise, so time of day survives into [`elapsed_days`].
/// Anything else, including numbers, becomes null. Returns how many non-null
/// cells could not be coerced.
pub fn coerce_date(df: &mut DataFrame, column: &str) -> Result<usize> {
    let col = df
        .column(column)
        .map_err(|_| PipelineError::missing_column(column, "date coercion"))?;

    let non_null_before = col.len() - col.null_count();

    let coerced: Series = match col.dtype() {
        DataType::Date | DataType::Datetime(_, _) => return Ok(0),
        DataType::String => {
            let parsed: Vec<Option<NaiveDateTime>> =
                col.str()?.into_iter().map(|opt| opt.and_then(parse_datetime)).collect();
            let has_time = parsed.iter().flatten().any(|dt| dt.time() != NaiveTime::MIN);

            if has_time {
                let millis: Int64Chunked = parsed
                    .iter()
                    .map(|dt| dt.map(|dt| dt.and_utc().timestamp_millis()))
                    .collect();
                millis
                    .with_name(column.into())
                    .into_series()
                    .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
            } else {
                let days: Int32Chunked = parsed
                    .iter()
                    .map(|dt| dt.map(|dt| days_since_epoch(dt.date())))
                    .collect();
                days.with_name(column.into())
                    .into_series()
                    .cast(&DataType::Date)?
            }
        }
        _ => Series::full_null(column.into(), col.len(), &DataType::Date),
    };

    let failed = non_null_before - (coerced.len() - coerced.null_count());
    if failed > 0 {
        log::info!(
            "Coerced {} unparseable value(s) in '{}' to missing",
            failed,
            column
        );
    }

    df.with_column(coerced)?;
    Ok(failed)
}

/// Whole days elapsed between two instants given in milliseconds since the
/// epoch, or `None` when that count is not positive.
///
/// Partial days are floored, so a span shorter than 24 hours is zero days.
pub fn positive_elapsed_days(start_ms: Option<i64>, end_ms: Option<i64>) -> Option<i64> {
    let days = (end_ms? - start_ms?).div_euclid(MS_PER_DAY);
    (days > 0).then_some(days)
}

/// Add `target` = `end - start` in whole days, with non-positive spans set to
/// null.
///
/// Both inputs must already be `Date` or `Datetime` columns. Returns the
/// number of rows whose span was dropped for being zero or negative.
pub fn elapsed_days(df: &mut DataFrame, start: &str, end: &str, target: &str) -> Result<usize> {
    let start_ms = epoch_millis(df, start)?;
    let end_ms = epoch_millis(df, end)?;

    let mut non_positive = 0usize;
    let elapsed: Int64Chunked = start_ms
        .into_iter()
        .zip(end_ms)
        .map(|(s, e)| {
            let days = positive_elapsed_days(s, e);
            if days.is_none() && s.is_some() && e.is_some() {
                non_positive += 1;
            }
            days
        })
        .collect();

    if non_positive > 0 {
        log::info!(
            "Set {} non-positive duration(s) in '{}' to missing",
            non_positive,
            target
        );
    }

    df.with_column(elapsed.with_name(target.into()).into_series())?;
    Ok(non_positive)
}
/// Add `target` = `days / days_per_month`.
pub fn months_from_days(
    df: &mut DataFrame,
    days: &str,
    target: &str,
    days_per_month: f64,
) -> Result<()> {
    let column = df
        .column(days)
        .map_err(|_| PipelineError::missing_column(days, "months conversion"))?;
    let float_col = column.cast(&DataType::Float64)?;

    let months: Float64Chunked = float_col
        .f64()?
        .into_iter()
        .map(|d| d.map(|d| d / days_per_month))
        .collect();

    df.with_column(months.with_name(target.into()).into_series())?;
    Ok(())
}

/// Milliseconds since the epoch for each cell of a `Date` or `Datetime`
/// column. Other dtypes go through a non-strict `Date` cast.
fn epoch_millis(df: &DataFrame, column: &str) -> Result<Vec<Option<i64>>> {
    let col = df
        .column(column)
        .map_err(|_| PipelineError::missing_column(column, "elapsed duration"))?;

    let days = match col.dtype() {
        DataType::Datetime(TimeUnit::Milliseconds, _) => return physical_i64(col, 1, 1),
        DataType::Datetime(TimeUnit::Microseconds, _) => return physical_i64(col, 1, 1_000),
        DataType::Datetime(TimeUnit::Nanoseconds, _) => return physical_i64(col, 1, 1_000_000),
        DataType::Date => col.cast(&DataType::Int32)?,
        _ => col.cast(&DataType::Date)?.cast(&DataType::Int32)?,
    };
    physical_i64(&days, MS_PER_DAY, 1)
}

fn physical_i64(col: &Column, multiply: i64, divide: i64) -> Result<Vec<Option<i64>>> {
    let ints = col.cast(&DataType::Int64)?;
    Ok(ints
        .i64()?
        .into_iter()
        .map(|v| v.map(|v| (v * multiply).div_euclid(divide)))
        .collect())
}
