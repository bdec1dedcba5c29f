//! Headerless CSV and JSON codecs for datasets.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display};

use super::Record;
use crate::{Error, Result};

/// On-disk format of an input dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InputFormat {
    /// Headerless CSV, one identifier per line.
    Csv,
    /// JSON array of records.
    Json,
}

impl InputFormat {
    /// Returns the expected file extension, including the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => ".csv",
            Self::Json => ".json",
        }
    }

    /// Fails unless `filename` carries this format's extension.
    pub fn check_extension(self, filename: &str) -> Result<()> {
        if filename.ends_with(self.extension()) {
            Ok(())
        } else {
            Err(Error::invalid_dataset(format!(
                "input file '{filename}' should end in {}",
                self.extension()
            )))
        }
    }
}

/// Decodes a headerless single-column CSV into identifier records.
///
/// Blank lines are skipped; only the first column is kept.
pub(crate) fn decode_identifiers(bytes: &[u8]) -> Result<Vec<Record>> {
    Ok(decode_rows(bytes)?
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .filter(|value| !value.is_empty())
        .map(Record::Identifier)
        .collect())
}

/// Decodes a JSON array whose elements are strings or objects.
pub(crate) fn decode_json_records(bytes: &[u8]) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| Error::invalid_dataset_with_source("input is not valid JSON", e))?;

    let Value::Array(items) = value else {
        return Err(Error::invalid_dataset("input JSON must be an array of records"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(s) => Ok(Record::Identifier(s)),
            Value::Object(map) => Ok(Record::Structured(map)),
            other => Err(Error::invalid_dataset(format!(
                "record {index} must be a string or an object, found {other}"
            ))),
        })
        .collect()
}

/// Parses headerless CSV into rows of fields, keeping column positions.
///
/// Rows may have different lengths. Rows of empty fields are kept, so the
/// row count matches the number of encoded records.
pub fn decode_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::invalid_dataset_with_source("malformed CSV", e))?;
        rows.push(record.iter().map(str::to_owned).collect());
    }

    Ok(rows)
}

/// Writes rows as headerless CSV.
pub fn encode_rows<I, R>(rows: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(Vec::new());

    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| Error::invalid_dataset_with_source("failed to encode CSV row", e))?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::invalid_dataset(format!("failed to flush CSV: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_keep_column_positions() {
        let rows = decode_rows(b"a,b,c\nd,,f\ng\n").unwrap();
        assert_eq!(rows[1], ["d", "", "f"]);
        assert_eq!(rows[2], ["g"]);
    }

    #[test]
    fn encode_then_decode_quoted_fields() {
        let rows = vec![vec!["x,y".to_owned(), "z".to_owned()]];
        let bytes = encode_rows(&rows).unwrap();
        assert_eq!(bytes, b"\"x,y\",z\n");
        assert_eq!(decode_rows(&bytes).unwrap(), rows);
    }

    #[test]
    fn empty_field_rows_are_kept() {
        let rows = decode_rows(b"a\n,\n\"\"\nb\n").unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1], ["", ""]);
        assert_eq!(rows[2], [""]);
    }

    #[test]
    fn identifiers_skip_empty_values() {
        let records = decode_identifiers(b"CP-1\n,\n\"\"\nCP-2\n").unwrap();
        assert_eq!(records, vec![Record::from("CP-1"), Record::from("CP-2")]);
    }

    #[test]
    fn json_rejects_non_array() {
        assert!(decode_json_records(br#"{"a": 1}"#).is_err());
        assert!(decode_json_records(b"[1]").is_err());
    }
}
