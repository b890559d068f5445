//! Runs: one traced unit of work, plus the payloads that create and close it.
//!
//! A run is usually posted twice: `PostPayload` when the work starts and
//! `PatchPayload` when it ends. `SimplePayload` and `RunPayload` post a run
//! in one shot once its outputs are known.

use serde::{Deserialize, Serialize};

use super::JsonMap;
use crate::time::LangsmithTime;

/// Kind of work a run traces.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    Tool,
    Chain,
    Llm,
    Retriever,
    Embedding,
    Prompt,
    Parser,
}

/// A named point-in-time event recorded on a run (e.g. a streamed token).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub event_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A run with every optional field, postable at any lifecycle stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunPayload {
    pub id: String,
    pub name: String,
    pub run_type: RunType,
    pub start_time: LangsmithTime,
    pub inputs: JsonMap,
    #[serde(rename = "parent_run_id", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<LangsmithTime>,
    #[serde(rename = "extra", default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<JsonMap>,
    #[serde(default, deserialize_with = "super::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_example_id: Option<String>,
}

/// A finished run posted in one request. Session and outputs are mandatory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimplePayload {
    pub id: String,
    pub name: String,
    pub run_type: RunType,
    pub start_time: LangsmithTime,
    pub inputs: JsonMap,
    pub session_id: String,
    pub session_name: String,
    #[serde(default, deserialize_with = "super::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(rename = "parent_run_id", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(rename = "extra", default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<JsonMap>,
    #[serde(default, deserialize_with = "super::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
    pub outputs: JsonMap,
    pub end_time: LangsmithTime,
}

/// Opens a run: what is known before the traced work executes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostPayload {
    pub id: String,
    pub name: String,
    pub run_type: RunType,
    pub start_time: LangsmithTime,
    pub inputs: JsonMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(rename = "parent_run_id", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(rename = "extra", default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<JsonMap>,
    #[serde(default, deserialize_with = "super::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_example_id: Option<String>,
}

/// Closes a run opened with `PostPayload`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatchPayload {
    pub outputs: JsonMap,
    pub end_time: LangsmithTime,
    #[serde(default, deserialize_with = "super::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
    #[serde(rename = "extra", default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// A run as the service reports it (query results, examples with runs).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    pub id: String,
    pub name: String,
    pub run_type: RunType,
    pub trace_id: String,
    pub session_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<LangsmithTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<LangsmithTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialized: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_s3_id: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
    #[serde(default, deserialize_with = "super::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs_s3_urls: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs_s3_urls: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_urls: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dotted_order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_example_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<i64>,
    /// Costs are decimal strings so no precision is lost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_cost: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_cost: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_stats: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_path: Option<String>,
}
