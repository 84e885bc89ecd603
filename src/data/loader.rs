//! CSV ingestion into a [`Table`]

use super::{Table, Value};
use crate::error::{Result, TabulaError};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Rows used by the CSV reader to infer column dtypes
const INFER_SCHEMA_ROWS: usize = 1000;

/// Load a CSV file with a header row.
///
/// Nulls and blank strings become [`Value::Missing`].
pub fn load_csv(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let start = Instant::now();

    let file = File::open(path)?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .into_reader_with_file_handle(file)
        .finish()?;

    let table = table_from_dataframe(&df)?;
    info!(
        path = %path.display(),
        rows = table.n_rows(),
        columns = table.n_cols(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Loaded CSV"
    );
    Ok(table)
}

/// Convert a polars frame into a row-oriented table
pub fn table_from_dataframe(df: &DataFrame) -> Result<Table> {
    let height = df.height();
    let columns: Vec<String> = df
        .get_columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let mut rows: Vec<Vec<Value>> = (0..height)
        .map(|_| Vec::with_capacity(columns.len()))
        .collect();

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        for (i, row) in rows.iter_mut().enumerate() {
            row.push(cell_from_any(series.get(i)?));
        }
    }

    Table::new(columns, rows)
        .map_err(|e| TabulaError::IngestError(e.to_string()))
}

fn cell_from_any(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Missing,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::from_text(s),
        AnyValue::StringOwned(s) => Value::from_text(s.as_str()),
        other => match other.extract::<f64>() {
            Some(v) => Value::Number(v),
            None => Value::from_text(&other.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_csv_marks_blank_cells_missing() {
        let path = std::env::temp_dir().join(format!("tabula_loader_{}.csv", std::process::id()));
        {
            let mut file = File::create(&path).unwrap();
            writeln!(file, "age,city,active").unwrap();
            writeln!(file, "31,Paris,true").unwrap();
            writeln!(file, ",Lyon,false").unwrap();
            writeln!(file, "45,,true").unwrap();
        }

        let table = load_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.columns(), &["age", "city", "active"]);
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.get(0, "age").and_then(Value::as_f64), Some(31.0));
        assert!(table.get(1, "age").unwrap().is_missing());
        assert!(table.get(2, "city").unwrap().is_missing());
        assert_eq!(table.get(1, "active"), Some(&Value::Bool(false)));
    }
}
