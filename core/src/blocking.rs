//! Blocking client: one `build_*`, one round-trip, one `parse_*` per call.
//!
//! # Design
//! `Client` owns a `LangsmithClient` and a `Transport`. It adds no state of
//! its own, so it is `Send + Sync` whenever the transport is and can be
//! shared across threads. Each method performs exactly one request and
//! returns the first error it meets.

use serde::Serialize;
use tracing::{debug, trace};

use crate::client::{check_status, LangsmithClient};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::{
    ComparativeExperiment, ComparativeExperimentRequest, Dataset, DatasetCsv, Example,
    ExamplesWithRunsQuery, Experiment, Feedback, PatchPayload, RunsQuery, RunsResponse,
    TracerSessionRequest, TracerSessionUpdate,
};

/// LangSmith client that performs its own HTTP round-trips.
#[derive(Debug, Clone)]
pub struct Client<T = UreqTransport> {
    api: LangsmithClient,
    transport: T,
}

impl Client<UreqTransport> {
    /// Client over a default blocking ureq transport.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Self::with_transport(config, UreqTransport::new())
    }

    /// Client configured from `LANGSMITH_API_KEY` / `LANGSMITH_URL`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(ClientConfig::from_env()?)
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ApiError> {
        Ok(Self {
            api: LangsmithClient::new(config)?,
            transport,
        })
    }

    /// The underlying request builder.
    pub fn api(&self) -> &LangsmithClient {
        &self.api
    }

    /// Executes `request` and classifies the response, for requests built
    /// outside the typed operations.
    pub fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let response = self.execute(request)?;
        check_status(&response)?;
        Ok(response)
    }

    /// One round-trip. Classification is left to the `parse_*` step.
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = request.method.as_str();
        let url = request.url.clone();
        debug!(method, url = %url, "sending request");
        if let Some(body) = request.body.as_deref() {
            trace!(bytes = body.len(), body = %String::from_utf8_lossy(body), "request body");
        }

        let response = self.transport.execute(request).map_err(|err| {
            debug!(method, url = %url, error = %err, "transport failed");
            err
        })?;

        if response.is_success() {
            debug!(method, url = %url, status = response.status, "received response");
        } else {
            debug!(
                method,
                url = %url,
                status = response.status,
                body = %String::from_utf8_lossy(&response.body),
                "request rejected"
            );
        }
        Ok(response)
    }

    /// `POST /runs`. Accepts `PostPayload`, `RunPayload` or `SimplePayload`.
    pub fn create_run<P: Serialize + ?Sized>(&self, payload: &P) -> Result<(), ApiError> {
        let request = self.api.build_create_run(payload)?;
        self.api.parse_empty(self.execute(request)?)
    }

    /// `PATCH /runs/{id}`.
    pub fn patch_run(&self, run_id: &str, payload: &PatchPayload) -> Result<(), ApiError> {
        let request = self.api.build_patch_run(run_id, payload)?;
        self.api.parse_empty(self.execute(request)?)
    }

    /// `POST /runs/query`.
    pub fn query_runs(&self, query: &RunsQuery) -> Result<RunsResponse, ApiError> {
        let request = self.api.build_query_runs(query)?;
        self.api.parse_query_runs(self.execute(request)?)
    }

    /// `POST /datasets`.
    pub fn create_dataset(&self, dataset: &Dataset) -> Result<(), ApiError> {
        let request = self.api.build_create_dataset(dataset)?;
        self.api.parse_empty(self.execute(request)?)
    }

    /// `POST /datasets/upload` (multipart).
    pub fn upload_csv(&self, csv: &DatasetCsv) -> Result<(), ApiError> {
        let request = self.api.build_upload_csv(csv);
        self.api.parse_empty(self.execute(request)?)
    }

    /// `POST /datasets/upload-experiment`.
    pub fn upload_experiment(&self, experiment: &Experiment) -> Result<(), ApiError> {
        let request = self.api.build_upload_experiment(experiment)?;
        self.api.parse_empty(self.execute(request)?)
    }

    /// `GET /datasets/{id}`, body returned undecoded.
    pub fn read_dataset(&self, dataset_id: &str) -> Result<Vec<u8>, ApiError> {
        let request = self.api.build_read_dataset(dataset_id);
        self.api.parse_bytes(self.execute(request)?)
    }

    /// `GET /datasets/{id}/csv`.
    pub fn download_dataset_csv(&self, dataset_id: &str) -> Result<Vec<u8>, ApiError> {
        let request = self.api.build_download_dataset_csv(dataset_id);
        self.api.parse_bytes(self.execute(request)?)
    }

    /// `GET /examples?dataset={id}&offset={n}`.
    pub fn get_examples(&self, dataset_id: &str, offset: u64) -> Result<Vec<Example>, ApiError> {
        let request = self.api.build_get_examples(dataset_id, offset);
        self.api.parse_get_examples(self.execute(request)?)
    }

    /// `POST /examples`.
    pub fn create_example(&self, example: &Example) -> Result<(), ApiError> {
        let request = self.api.build_create_example(example)?;
        self.api.parse_empty(self.execute(request)?)
    }

    /// `POST /examples/bulk`.
    pub fn create_examples(&self, examples: &[Example]) -> Result<(), ApiError> {
        let request = self.api.build_create_examples(examples)?;
        self.api.parse_empty(self.execute(request)?)
    }

    /// `POST /datasets/{id}/runs`: examples with their runs in the given sessions.
    pub fn get_examples_with_runs(
        &self,
        dataset_id: &str,
        query: &ExamplesWithRunsQuery,
    ) -> Result<Vec<Example>, ApiError> {
        let request = self.api.build_get_examples_with_runs(dataset_id, query)?;
        self.api.parse_get_examples_with_runs(self.execute(request)?)
    }

    /// `POST /datasets/comparative`.
    pub fn create_comparative_experiment(
        &self,
        request: &ComparativeExperimentRequest,
    ) -> Result<(), ApiError> {
        let request = self.api.build_create_comparative_experiment(request)?;
        self.api.parse_empty(self.execute(request)?)
    }

    /// `GET /datasets/{id}/comparative?id={experiment_id}`.
    pub fn read_comparative_experiment(
        &self,
        dataset_id: &str,
        experiment_id: &str,
    ) -> Result<Vec<ComparativeExperiment>, ApiError> {
        let request = self
            .api
            .build_read_comparative_experiment(dataset_id, experiment_id);
        self.api
            .parse_read_comparative_experiment(self.execute(request)?)
    }

    /// `POST /feedback`.
    pub fn create_feedback(&self, feedback: &Feedback) -> Result<(), ApiError> {
        let request = self.api.build_create_feedback(feedback)?;
        self.api.parse_empty(self.execute(request)?)
    }

    /// `POST /sessions`.
    pub fn create_tracer_session(&self, session: &TracerSessionRequest) -> Result<(), ApiError> {
        let request = self.api.build_create_tracer_session(session)?;
        self.api.parse_empty(self.execute(request)?)
    }

    /// `PATCH /sessions/{id}`.
    pub fn update_tracer_session(
        &self,
        session_id: &str,
        update: &TracerSessionUpdate,
    ) -> Result<(), ApiError> {
        let request = self.api.build_update_tracer_session(session_id, update)?;
        self.api.parse_empty(self.execute(request)?)
    }
}
