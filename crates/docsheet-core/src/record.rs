use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DocsheetError, Result};

/// One extracted row: field name to value, in the order the model emitted them.
pub type Record = serde_json::Map<String, Value>;

/// Column added to every row in a batch to name the document it came from.
pub const SOURCE_DOCUMENT_FIELD: &str = "source_document";

/// Parsed model output. Anything that is not an object or an array of
/// objects is rejected at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractedRecord {
    Single(Record),
    Many(Vec<Record>),
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl ExtractedRecord {
    /// Parse sanitized model output. Failures carry the raw text so the
    /// caller can show it or retry with a corrected prompt.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).map_err(|e| DocsheetError::Parse {
            message: e.to_string(),
            raw: raw.to_string(),
        })?;

        Self::from_value(value).map_err(|message| DocsheetError::Parse {
            message,
            raw: raw.to_string(),
        })
    }

    pub fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Object(map) => Ok(Self::Single(map)),
            Value::Array(items) => {
                let mut records = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    match item {
                        Value::Object(map) => records.push(map),
                        other => {
                            return Err(format!(
                                "array element {i} is {}, expected an object",
                                json_type_name(&other)
                            ))
                        }
                    }
                }
                Ok(Self::Many(records))
            }
            other => Err(format!(
                "expected an object or an array of objects, got {}",
                json_type_name(&other)
            )),
        }
    }

    /// Set `source_document` on every row, replacing any value the model produced.
    pub fn tag_source(&mut self, document: &str) {
        let tag = Value::String(document.to_string());
        match self {
            Self::Single(map) => {
                map.insert(SOURCE_DOCUMENT_FIELD.to_string(), tag);
            }
            Self::Many(records) => {
                for map in records.iter_mut() {
                    map.insert(SOURCE_DOCUMENT_FIELD.to_string(), tag.clone());
                }
            }
        }
    }

    /// Number of rows this record contributes to a table.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rows(&self) -> &[Record] {
        match self {
            Self::Single(map) => std::slice::from_ref(map),
            Self::Many(records) => records,
        }
    }

    pub fn into_rows(self) -> Vec<Record> {
        match self {
            Self::Single(map) => vec![map],
            Self::Many(records) => records,
        }
    }
}

impl From<Record> for ExtractedRecord {
    fn from(map: Record) -> Self {
        Self::Single(map)
    }
}

impl From<Vec<Record>> for ExtractedRecord {
    fn from(records: Vec<Record>) -> Self {
        Self::Many(records)
    }
}
