//! Wire records for the LangSmith API.
//!
//! # Design
//! Every type here is a flat serde record with no behavior beyond
//! (de)serialization. Optional fields are `Option` or an empty collection
//! and are left out of the encoded JSON when absent; fields the service
//! requires (dataset `id`, `tenant_id`, run `trace_id`, ...) are always sent.
//! Timestamps go through `LangsmithTime` so every record agrees on the
//! second-precision wire format.

mod dataset;
mod experiment;
mod feedback;
mod query;
mod run;
mod session;

pub use dataset::{
    DataType, Dataset, DatasetCsv, DatasetTransformation, DatasetTransformationType, Example,
};
pub use experiment::{
    ComparativeExperiment, ComparativeExperimentRequest, Experiment, ExperimentInfo,
    ExperimentResult, ExperimentScore,
};
pub use feedback::{Feedback, FeedbackCategory, FeedbackConfig, FeedbackSource, FeedbackType};
pub use query::{ExamplesWithRunsQuery, QueryParams, RunsQuery, RunsResponse};
pub use run::{Event, PatchPayload, PostPayload, Run, RunPayload, RunType, SimplePayload};
pub use session::{TracerSessionRequest, TracerSessionUpdate};

use serde::{Deserialize, Deserializer, Serialize};

/// Free-form JSON object (inputs, outputs, metadata, extra, ...).
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Reads an explicit `null` as the empty collection.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of a non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub detail: String,
}
