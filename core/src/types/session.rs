//! Tracer sessions (projects): named groups of runs.

use serde::{Deserialize, Serialize};

use super::JsonMap;
use crate::time::LangsmithTime;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TracerSessionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<LangsmithTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<LangsmithTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_dataset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_dataset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_tier: Option<String>,
}

/// Partial update: only the fields present are changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TracerSessionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<LangsmithTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_dataset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_tier: Option<String>,
}
