//! Missing value handling

use super::config::{MissingStrategy, MissingValueRule};
use crate::data::{Table, Value};
use crate::error::Result;
use crate::profiling::{find_profile, ColumnKind, ColumnProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Fill value chosen for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputedColumn {
    pub column: String,
    pub strategy: MissingStrategy,
    pub value: Value,
    pub cells_filled: usize,
}

/// Everything a missing-values step did, enough to replay it
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct MissingOutcome {
    pub dropped_on: Vec<String>,
    pub rows_removed: usize,
    pub imputed: Vec<ImputedColumn>,
    pub skipped: Vec<String>,
}

/// Apply a set of missing-value rules to `table` in place.
///
/// Fill statistics are computed on the table as it is before this step
/// removes any row.
pub(crate) fn apply_rules(
    table: &mut Table,
    profiles: &[ColumnProfile],
    rules: &[MissingValueRule],
) -> Result<MissingOutcome> {
    let mut outcome = MissingOutcome::default();
    let mut fills: Vec<(usize, String, MissingStrategy, Value)> = Vec::new();

    for rule in rules {
        let idx = table.require_column(&rule.column)?;
        let kind = find_profile(profiles, &rule.column).map(|p| p.kind);

        let fill = match rule.strategy {
            MissingStrategy::Drop => {
                outcome.dropped_on.push(rule.column.clone());
                continue;
            }
            MissingStrategy::Mean | MissingStrategy::Median
                if kind == Some(ColumnKind::Categorical) =>
            {
                None
            }
            MissingStrategy::Mean => mean(table.column_values(idx)).map(Value::Number),
            MissingStrategy::Median => median(table.column_values(idx)).map(Value::Number),
            MissingStrategy::Mode => mode(table.column_values(idx)),
            MissingStrategy::Constant => rule.constant.clone(),
        };

        match fill {
            Some(value) => fills.push((idx, rule.column.clone(), rule.strategy, value)),
            None => {
                debug!(column = %rule.column, strategy = ?rule.strategy, "Imputation skipped");
                outcome.skipped.push(rule.column.clone());
            }
        }
    }

    outcome.rows_removed = drop_missing_rows(table, &outcome.dropped_on)?;

    for (idx, column, strategy, value) in fills {
        let cells_filled = fill_missing(table, idx, &value);
        outcome.imputed.push(ImputedColumn {
            column,
            strategy,
            value,
            cells_filled,
        });
    }

    Ok(outcome)
}

/// Remove rows with a missing cell in any of `columns`
pub(crate) fn drop_missing_rows(table: &mut Table, columns: &[String]) -> Result<usize> {
    if columns.is_empty() {
        return Ok(0);
    }
    let indices = columns
        .iter()
        .map(|c| table.require_column(c))
        .collect::<Result<Vec<_>>>()?;
    Ok(table.retain_rows(|row| indices.iter().all(|&i| !row[i].is_missing())))
}

/// Replace missing cells of one column; returns the number of cells filled
pub(crate) fn fill_missing(table: &mut Table, col: usize, value: &Value) -> usize {
    let targets: Vec<usize> = table
        .column_values(col)
        .enumerate()
        .filter(|(_, v)| v.is_missing())
        .map(|(i, _)| i)
        .collect();
    for &row in &targets {
        table.set_cell(row, col, value.clone());
    }
    targets.len()
}

fn numeric_values<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<f64> {
    values.filter_map(Value::as_f64).collect()
}

fn mean<'a>(values: impl Iterator<Item = &'a Value>) -> Option<f64> {
    let nums = numeric_values(values);
    if nums.is_empty() {
        return None;
    }
    Some(nums.iter().sum::<f64>() / nums.len() as f64)
}

fn median<'a>(values: impl Iterator<Item = &'a Value>) -> Option<f64> {
    let mut nums = numeric_values(values);
    if nums.is_empty() {
        return None;
    }
    nums.sort_by(|a, b| a.total_cmp(b));
    let mid = nums.len() / 2;
    if nums.len() % 2 == 0 {
        Some((nums[mid - 1] + nums[mid]) / 2.0)
    } else {
        Some(nums[mid])
    }
}

/// Most frequent non-missing value; ties go to the value seen first
fn mode<'a>(values: impl Iterator<Item = &'a Value>) -> Option<Value> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut first: Vec<&Value> = Vec::new();

    for value in values.filter(|v| !v.is_missing()) {
        let order = first.len();
        let entry = counts.entry(value.key()).or_insert_with(|| (0, order));
        if entry.0 == 0 {
            first.push(value);
        }
        entry.0 += 1;
    }

    counts
        .into_values()
        .max_by(|(ca, oa), (cb, ob)| ca.cmp(cb).then(ob.cmp(oa)))
        .map(|(_, order)| first[order].clone())
}
