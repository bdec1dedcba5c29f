//! Input records and datasets.
//!
//! A [`Dataset`] is the ordered list of records one scrape run works on.
//! Records are either bare identifiers (docket or incident numbers read from a
//! single-column CSV) or structured JSON objects (court summary rows).

mod codec;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use codec::{InputFormat, decode_rows, encode_rows};

use crate::{Flavor, Result, TRACING_TARGET_DATASET};

/// A single input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    /// A scalar identifier such as a docket number.
    Identifier(String),
    /// A keyed record.
    Structured(Map<String, Value>),
}

impl Record {
    /// Returns the identifier when this is a scalar record.
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Self::Identifier(id) => Some(id),
            Self::Structured(_) => None,
        }
    }

    /// Returns a field of a structured record.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Identifier(_) => None,
            Self::Structured(map) => map.get(name),
        }
    }

    /// Flattens the record into CSV fields, in key order for structured records.
    ///
    /// Nested values are written as compact JSON.
    pub fn to_csv_fields(&self) -> Vec<String> {
        match self {
            Self::Identifier(id) => vec![id.clone()],
            Self::Structured(map) => map
                .values()
                .map(|value| match value {
                    Value::Null => String::new(),
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        }
    }
}

impl From<&str> for Record {
    fn from(value: &str) -> Self {
        Self::Identifier(value.to_owned())
    }
}

impl From<String> for Record {
    fn from(value: String) -> Self {
        Self::Identifier(value)
    }
}

/// Ordered sequence of input records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Creates a dataset from records, keeping their order.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Decodes a dataset for `flavor` from the raw bytes of `filename`.
    ///
    /// The portal flavor reads a headerless single-column CSV; the court
    /// summary flavor reads a JSON array. The file extension must match.
    pub fn decode(flavor: Flavor, filename: &str, bytes: &[u8]) -> Result<Self> {
        let format = flavor.input_format();
        format.check_extension(filename)?;

        let records = match format {
            InputFormat::Csv => codec::decode_identifiers(bytes)?,
            InputFormat::Json => codec::decode_json_records(bytes)?,
        };

        tracing::debug!(
            target: TRACING_TARGET_DATASET,
            flavor = %flavor,
            filename = %filename,
            count = records.len(),
            "Decoded input dataset"
        );

        Ok(Self { records })
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the dataset has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the records as a slice.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Iterates over the records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Consumes the dataset and returns its records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl FromIterator<Record> for Dataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
