//! Grouped summary statistics with small-group suppression
//!
//! Every grouping specification produces one [`SummaryTable`]: one row per
//! group with more than the minimum number of respondents, one column per
//! requested statistic, plus the group size `n`. Rows whose grouping key is
//! missing form their own group instead of being dropped.

use std::collections::BTreeMap;
use std::fmt;
use std::slice;

use polars::prelude::*;
use serde::Serialize;

use super::error::{PipelineError, Result};

/// A per-group statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFunc {
    /// Non-missing cells
    Count,
    Mean,
    Median,
}

impl AggFunc {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggFunc::Count => "count",
            AggFunc::Mean => "mean",
            AggFunc::Median => "median",
        }
    }
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which columns an aggregation entry applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSelector {
    Name(String),
    /// Every column starting with `prefix`, except those in `exclude`
    Prefix { prefix: String, exclude: Vec<String> },
}

/// Ordered mapping from columns to the statistics computed for them.
///
/// When a column is selected more than once, the last entry's statistics win
/// and the column keeps the position of its first selection.
#[derive(Debug, Clone, Default)]
pub struct AggregationSpec {
    entries: Vec<(ColumnSelector, Vec<AggFunc>)>,
}

impl AggregationSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: &str, funcs: &[AggFunc]) -> Self {
        self.entries
            .push((ColumnSelector::Name(name.to_string()), funcs.to_vec()));
        self
    }

    pub fn prefix(mut self, prefix: &str, exclude: &[&str], funcs: &[AggFunc]) -> Self {
        self.entries.push((
            ColumnSelector::Prefix {
                prefix: prefix.to_string(),
                exclude: exclude.iter().map(|s| s.to_string()).collect(),
            },
            funcs.to_vec(),
        ));
        self
    }

    pub fn entries(&self) -> &[(ColumnSelector, Vec<AggFunc>)] {
        &self.entries
    }

    /// Expand selectors against the columns of `df`.
    ///
    /// A named column that `df` lacks is an error; a prefix matching nothing
    /// is not.
    pub fn resolve(&self, df: &DataFrame) -> Result<Vec<(String, Vec<AggFunc>)>> {
        let mut resolved: Vec<(String, Vec<AggFunc>)> = Vec::new();
        let mut upsert = |name: String, funcs: &[AggFunc]| {
            match resolved.iter_mut().find(|(existing, _)| *existing == name) {
                Some((_, existing_funcs)) => *existing_funcs = funcs.to_vec(),
                None => resolved.push((name, funcs.to_vec())),
            }
        };

        for (selector, funcs) in &self.entries {
            match selector {
                ColumnSelector::Name(name) => {
                    if df.get_column_index(name).is_none() {
                        return Err(PipelineError::missing_column(name, "aggregation specification"));
                    }
                    upsert(name.clone(), funcs);
                }
                ColumnSelector::Prefix { prefix, exclude } => {
                    let matches: Vec<String> = df
                        .get_column_names()
                        .iter()
                        .map(|s| s.to_string())
                        .filter(|s| s.starts_with(prefix.as_str()) && !exclude.contains(s))
                        .collect();
                    if matches.is_empty() {
                        log::debug!("No column matches aggregation prefix '{}'", prefix);
                    }
                    for name in matches {
                        upsert(name, funcs);
                    }
                }
            }
        }

        Ok(resolved)
    }
}

/// How rows are partitioned into groups: one column, or several in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupingSpec {
    Single(String),
    Composite(Vec<String>),
}

impl GroupingSpec {
    pub fn single(column: impl Into<String>) -> Self {
        GroupingSpec::Single(column.into())
    }

    pub fn composite<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        GroupingSpec::Composite(columns.into_iter().map(|s| s.as_ref().to_string()).collect())
    }

    pub fn columns(&self) -> &[String] {
        match self {
            GroupingSpec::Single(column) => slice::from_ref(column),
            GroupingSpec::Composite(columns) => columns,
        }
    }

    /// Sheet label: the column itself, or the second column of a composite
    /// key.
    pub fn sheet_name(&self) -> &str {
        let columns = self.columns();
        columns
            .get(1)
            .or_else(|| columns.first())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Header of one statistic column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatColumn {
    pub column: String,
    pub func: AggFunc,
}

/// One retained group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    /// Key values in grouping-column order; `None` for the missing group
    pub key: Vec<Option<String>>,
    pub n: usize,
    /// One value per [`SummaryTable::stats`] entry
    pub values: Vec<Option<f64>>,
}

/// Aggregated output of one grouping specification.
#[derive(Debug, Clone)]
pub struct SummaryTable {
    pub sheet_name: String,
    pub key_columns: Vec<String>,
    pub stats: Vec<StatColumn>,
    pub rows: Vec<GroupRow>,
    pub suppressed_groups: usize,
    pub suppressed_rows: usize,
}

impl SummaryTable {
    pub fn groups_total(&self) -> usize {
        self.rows.len() + self.suppressed_groups
    }

    /// Value of `column`/`func` for the group whose key is `key`.
    pub fn value(&self, key: &[Option<&str>], column: &str, func: AggFunc) -> Option<f64> {
        let idx = self
            .stats
            .iter()
            .position(|s| s.column == column && s.func == func)?;
        self.rows
            .iter()
            .find(|row| {
                row.key.len() == key.len()
                    && row.key.iter().zip(key).all(|(a, b)| a.as_deref() == *b)
            })
            .and_then(|row| row.values[idx])
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Per-row view of one aggregated column.
struct StatSource {
    present: Vec<bool>,
    numeric: Vec<Option<f64>>,
}

impl StatSource {
    fn new(df: &DataFrame, name: &str) -> Result<Self> {
        let column = df
            .column(name)
            .map_err(|_| PipelineError::missing_column(name, "aggregation"))?;
        let numeric: Vec<Option<f64>> = column
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.filter(|v| !v.is_nan()))
            .collect();
        let present = if column.dtype().is_primitive_numeric() {
            numeric.iter().map(Option::is_some).collect()
        } else {
            column
                .as_materialized_series()
                .is_null()
                .into_iter()
                .map(|is_null| !is_null.unwrap_or(true))
                .collect()
        };
        Ok(Self { present, numeric })
    }

    fn compute(&self, rows: &[usize], func: AggFunc) -> Option<f64> {
        match func {
            AggFunc::Count => Some(rows.iter().filter(|&&i| self.present[i]).count() as f64),
            AggFunc::Mean => mean(&self.collect(rows)),
            AggFunc::Median => median(&mut self.collect(rows)),
        }
    }

    fn collect(&self, rows: &[usize]) -> Vec<f64> {
        rows.iter().filter_map(|&i| self.numeric[i]).collect()
    }
}

/// Sort key that puts the missing group after every present one.
type GroupKey = Vec<(bool, String)>;

fn group_rows(df: &DataFrame, columns: &[String]) -> Result<BTreeMap<GroupKey, Vec<usize>>> {
    let mut keys: Vec<Vec<Option<String>>> = Vec::with_capacity(columns.len());
    for name in columns {
        let column = df
            .column(name)
            .map_err(|_| PipelineError::missing_column(name, "grouping specification"))?;
        let text = column.cast(&DataType::String)?;
        keys.push(
            text.str()?
                .into_iter()
                .map(|v| v.map(str::to_string))
                .collect(),
        );
    }

    let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
    for row in 0..df.height() {
        let key: GroupKey = keys
            .iter()
            .map(|values| match &values[row] {
                Some(v) => (false, v.clone()),
                None => (true, String::new()),
            })
            .collect();
        groups.entry(key).or_default().push(row);
    }
    Ok(groups)
}

/// Summarize `df` for one grouping, dropping groups of `min_group_size` rows
/// or fewer.
pub fn summarize(
    df: &DataFrame,
    grouping: &GroupingSpec,
    columns: &[(String, Vec<AggFunc>)],
    min_group_size: usize,
) -> Result<SummaryTable> {
    let groups = group_rows(df, grouping.columns())?;

    let sources = columns
        .iter()
        .map(|(name, _)| StatSource::new(df, name))
        .collect::<Result<Vec<_>>>()?;
    let stats: Vec<StatColumn> = columns
        .iter()
        .flat_map(|(name, funcs)| {
            funcs.iter().map(move |&func| StatColumn {
                column: name.clone(),
                func,
            })
        })
        .collect();

    let mut table = SummaryTable {
        sheet_name: grouping.sheet_name().to_string(),
        key_columns: grouping.columns().to_vec(),
        stats,
        rows: Vec::new(),
        suppressed_groups: 0,
        suppressed_rows: 0,
    };

    for (key, rows) in groups {
        if rows.len() <= min_group_size {
            table.suppressed_groups += 1;
            table.suppressed_rows += rows.len();
            continue;
        }

        let members = rows.as_slice();
        let values = columns
            .iter()
            .zip(&sources)
            .flat_map(|((_, funcs), source)| {
                funcs.iter().map(move |&func| source.compute(members, func))
            })
            .collect();

        table.rows.push(GroupRow {
            key: key
                .into_iter()
                .map(|(is_missing, v)| (!is_missing).then_some(v))
                .collect(),
            n: rows.len(),
            values,
        });
    }

    log::info!(
        "Sheet '{}': kept {} of {} group(s); suppressed {} group(s) covering {} row(s)",
        table.sheet_name,
        table.rows.len(),
        table.groups_total(),
        table.suppressed_groups,
        table.suppressed_rows
    );

    Ok(table)
}

/// Summarize `df` once per grouping specification.
pub fn summarize_all(
    df: &DataFrame,
    groupings: &[GroupingSpec],
    spec: &AggregationSpec,
    min_group_size: usize,
) -> Result<Vec<SummaryTable>> {
    let columns = spec.resolve(df)?;
    log::debug!("Aggregating {} column(s) per group", columns.len());

    groupings
        .iter()
        .map(|grouping| summarize(df, grouping, &columns, min_group_size))
        .collect()
}
