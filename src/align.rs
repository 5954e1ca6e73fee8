//! Inference-time feature alignment.
//!
//! A request payload is an arbitrary mapping from feature names to scalars:
//! no guarantee of completeness or ordering, and it may carry columns the
//! model never saw. The aligner reconciles it against the frozen
//! [`ModelSchema`] — every expected column present, missing slots filled with
//! a neutral 0, extras dropped, order forced — and must run strictly before
//! the categorical encoder, which only understands columns it was fit on.

use crate::model::ModelSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single scalar cell of a request payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    Null,
}

impl FeatureValue {
    /// Neutral default for columns absent from the input.
    pub fn neutral() -> Self {
        FeatureValue::Number(0.0)
    }
}

pub struct InferenceAligner;

impl InferenceAligner {
    /// Produce one row conforming exactly to `schema`: values in schema
    /// order, absent columns as the neutral default, unknown columns dropped.
    /// A null in the input stays null — only *absent* columns are defaulted.
    pub fn align(schema: &ModelSchema, features: &HashMap<String, FeatureValue>) -> Vec<FeatureValue> {
        schema
            .columns()
            .iter()
            .map(|column| {
                features
                    .get(column)
                    .cloned()
                    .unwrap_or_else(FeatureValue::neutral)
            })
            .collect()
    }
}
