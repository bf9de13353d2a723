//! Declared output schema for a split.
//!
//! Typed consumers need column kinds before the first example exists. The
//! schema is derived from the activation decision, the label vocabulary and
//! the metadata index; value dtypes come from the first non-null value seen
//! for each column, with integers widened to floats when both appear.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::{GenerationPlan, LABEL_COLUMN};
use crate::config::MediaKind;

/// Scalar dtype of a metadata column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dtype {
    Null,
    Bool,
    Int64,
    Float64,
    String,
    /// Nested arrays or objects, kept as JSON.
    Json,
}

impl Dtype {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Dtype::Null,
            Value::Bool(_) => Dtype::Bool,
            Value::Number(number) if number.is_i64() || number.is_u64() => Dtype::Int64,
            Value::Number(_) => Dtype::Float64,
            Value::String(_) => Dtype::String,
            Value::Array(_) | Value::Object(_) => Dtype::Json,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dtype::Null => "null",
            Dtype::Bool => "bool",
            Dtype::Int64 => "int64",
            Dtype::Float64 => "float64",
            Dtype::String => "string",
            Dtype::Json => "json",
        }
    }

    fn merge(self, other: Dtype) -> Dtype {
        match (self, other) {
            (Dtype::Null, other) => other,
            (Dtype::Int64, Dtype::Float64) => Dtype::Float64,
            (current, _) => current,
        }
    }
}

/// Kind of one output column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feature {
    /// A file reference decoded lazily by the consumer.
    Media { media: MediaKind },
    /// Categorical label; codes index into `names`.
    ClassLabel { names: Vec<String> },
    /// A metadata scalar.
    Value { dtype: Dtype },
}

/// Column name to feature, in column-name order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Features {
    columns: BTreeMap<String, Feature>,
}

impl Features {
    pub(super) fn for_plan(plan: &GenerationPlan) -> Self {
        let mut features = Features::default();
        let media_kind = plan.media_kind();
        features.columns.insert(
            media_kind.column_name().to_string(),
            Feature::Media { media: media_kind },
        );

        if plan.add_metadata() {
            for record in plan.metadata().records() {
                for (column, value) in record.plain_columns() {
                    features.observe_value(column, value);
                }
                for column in record.extra_file_columns().keys() {
                    features
                        .columns
                        .entry(column.clone())
                        .or_insert(Feature::Media { media: media_kind });
                }
            }
        }

        if plan.add_labels() {
            if let Some(labels) = plan.labels() {
                features.columns.insert(
                    LABEL_COLUMN.to_string(),
                    Feature::ClassLabel {
                        names: labels.vocabulary().names().to_vec(),
                    },
                );
            }
        }

        features
    }

    fn observe_value(&mut self, column: &str, value: &Value) {
        let dtype = Dtype::of(value);
        match self.columns.get_mut(column) {
            Some(Feature::Value { dtype: current }) => *current = current.merge(dtype),
            Some(_) => {}
            None => {
                self.columns
                    .insert(column.to_string(), Feature::Value { dtype });
            }
        }
    }

    pub fn get(&self, column: &str) -> Option<&Feature> {
        self.columns.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Feature)> {
        self.columns.iter().map(|(name, feature)| (name.as_str(), feature))
    }
}
