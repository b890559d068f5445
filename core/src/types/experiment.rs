//! Offline experiments and comparisons between them.

use serde::{Deserialize, Serialize};

use super::{FeedbackConfig, FeedbackSource, JsonMap};
use crate::time::LangsmithTime;

/// An evaluation pass over a dataset, uploaded in one request.
///
/// When `dataset_id` is absent the service creates a dataset from
/// `dataset_name` and the result rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Experiment {
    pub experiment_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_description: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub summary_experiment_scores: Vec<ExperimentScore>,
    pub results: Vec<ExperimentResult>,
    pub experiment_start_time: LangsmithTime,
    pub experiment_end_time: LangsmithTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_metadata: Option<JsonMap>,
}

/// A named score, either per row or summarizing a whole experiment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExperimentScore {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparative_experiment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_source: Option<FeedbackSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_config: Option<FeedbackConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<LangsmithTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<LangsmithTime>,
}

/// One evaluated row of an experiment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_id: Option<String>,
    pub inputs: JsonMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_outputs: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_outputs: Option<JsonMap>,
    #[serde(default, deserialize_with = "super::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub evaluation_scores: Vec<ExperimentScore>,
    pub start_time: LangsmithTime,
    pub end_time: LangsmithTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_metadata: Option<JsonMap>,
}

/// Creates a comparison of several experiments on one reference dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparativeExperimentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub experiment_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub reference_dataset_id: String,
    pub created_at: LangsmithTime,
    pub modified_at: LangsmithTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<JsonMap>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparativeExperiment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub reference_dataset_id: String,
    pub created_at: LangsmithTime,
    pub modified_at: LangsmithTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<JsonMap>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub experiments_info: Vec<ExperimentInfo>,
    /// Aggregated feedback per key, computed by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_stats: Option<JsonMap>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExperimentInfo {
    pub id: String,
    pub name: String,
}
