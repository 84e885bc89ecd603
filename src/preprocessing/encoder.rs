//! Categorical label encoding

use crate::data::{Table, Value};
use crate::error::{Result, TabulaError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Suffix of the derived column written by label encoding
pub const ENCODED_SUFFIX: &str = "_encoded";

/// One dictionary entry: source value (canonical text) and its code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub value: String,
    pub code: usize,
}

/// Label encoding of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEncoding {
    pub column: String,
    pub output_column: String,
    /// Entries in first-seen order; codes are 0..n
    pub dictionary: Vec<DictionaryEntry>,
}

impl ColumnEncoding {
    fn lookup(&self) -> HashMap<&str, usize> {
        self.dictionary
            .iter()
            .map(|e| (e.value.as_str(), e.code))
            .collect()
    }
}

pub fn encoded_column_name(column: &str) -> String {
    format!("{}{}", column, ENCODED_SUFFIX)
}

/// Build the dictionary for `column` from its current values
pub(crate) fn fit_label_encoding(table: &Table, column: &str) -> Result<ColumnEncoding> {
    let idx = table.require_column(column)?;
    let mut codes: HashMap<String, usize> = HashMap::new();
    let mut dictionary = Vec::new();

    for value in table.column_values(idx).filter(|v| !v.is_missing()) {
        let key = value.key();
        if !codes.contains_key(&key) {
            let code = dictionary.len();
            codes.insert(key.clone(), code);
            dictionary.push(DictionaryEntry { value: key, code });
        }
    }

    Ok(ColumnEncoding {
        column: column.to_string(),
        output_column: encoded_column_name(column),
        dictionary,
    })
}

/// Write the `<name>_encoded` column; missing cells stay missing
pub(crate) fn apply_label_encoding(table: &mut Table, encoding: &ColumnEncoding) -> Result<()> {
    let idx = table.require_column(&encoding.column)?;
    let lookup = encoding.lookup();

    let encoded = table
        .column_values(idx)
        .map(|v| {
            if v.is_missing() {
                return Ok(Value::Missing);
            }
            let key = v.key();
            lookup
                .get(key.as_str())
                .map(|&code| Value::Number(code as f64))
                .ok_or_else(|| {
                    TabulaError::DataError(format!(
                        "Value '{}' of column '{}' is not in the encoding dictionary",
                        key, encoding.column
                    ))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    table.put_column(&encoding.output_column, encoded);
    Ok(())
}
