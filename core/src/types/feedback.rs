//! Feedback: scores and comments attached to runs, sessions or traces.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::JsonMap;
use crate::time::LangsmithTime;

/// Who or what produced a score (a human, a model, an evaluator).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackSource {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub metadata: JsonMap,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Continuous,
    Categorical,
    Freeform,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackCategory {
    pub value: f64,
    pub label: String,
}

/// How a feedback key is scored: a numeric range or a set of categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackConfig {
    #[serde(rename = "type")]
    pub feedback_type: FeedbackType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, deserialize_with = "super::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<FeedbackCategory>,
}

/// A named score or comment. Set one of `run_id`, `session_id`, `trace_id`.
///
/// `score`, `value` and `correction` are arbitrary JSON: the service accepts
/// numbers, booleans, strings and objects there.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Feedback {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<LangsmithTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<LangsmithTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparative_experiment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_source: Option<FeedbackSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_config: Option<FeedbackConfig>,
}
