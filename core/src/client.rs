//! Stateless HTTP request builder and response parser for the LangSmith API.
//!
//! # Design
//! `LangsmithClient` holds only the base URL and the API key and carries no
//! mutable state between calls. Each operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that
//! consumes the `HttpResponse`. `Client` (see `blocking`) glues the two
//! together over a `Transport`; callers with their own HTTP stack can use
//! this type directly.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{status_line, HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    ComparativeExperiment, ComparativeExperimentRequest, Dataset, DatasetCsv, ErrorDetail,
    Example, ExamplesWithRunsQuery, Experiment, Feedback, PatchPayload, RunsQuery, RunsResponse,
    TracerSessionRequest, TracerSessionUpdate,
};

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "x-api-key";

// RFC 3986 unreserved characters pass through, everything else is escaped.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Request builder and response parser for the LangSmith API.
#[derive(Clone)]
pub struct LangsmithClient {
    base_url: String,
    api_key: String,
}

impl LangsmithClient {
    /// Fails with `ApiError::Configuration` when the API key is empty.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        if config.api_key.trim().is_empty() {
            return Err(ApiError::Configuration(
                "langsmith api key is required".to_string(),
            ));
        }
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request to `base_url + path` with an optional JSON body.
    pub fn request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpRequest, ApiError> {
        let mut headers = vec![(API_KEY_HEADER.to_string(), self.api_key.clone())];
        let body = match body {
            Some(body) => {
                let encoded = serde_json::to_vec(body).map_err(ApiError::Serialization)?;
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(encoded)
            }
            None => None,
        };
        Ok(HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers,
            body,
        })
    }

    /// `POST` of a pre-encoded form body with the given content type.
    pub fn form_request(&self, path: &str, body: Vec<u8>, content_type: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}{path}", self.base_url),
            headers: vec![
                (API_KEY_HEADER.to_string(), self.api_key.clone()),
                ("content-type".to_string(), content_type.to_string()),
            ],
            body: Some(body),
        }
    }

    fn get(&self, path: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}{path}", self.base_url),
            headers: vec![(API_KEY_HEADER.to_string(), self.api_key.clone())],
            body: None,
        }
    }

    // -- runs ---------------------------------------------------------------

    /// Accepts any run shape: `PostPayload`, `RunPayload` or `SimplePayload`.
    pub fn build_create_run<P: Serialize + ?Sized>(
        &self,
        payload: &P,
    ) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Post, "/runs", Some(payload))
    }

    pub fn build_patch_run(
        &self,
        run_id: &str,
        payload: &PatchPayload,
    ) -> Result<HttpRequest, ApiError> {
        let path = format!("/runs/{}", encode(run_id));
        self.request(HttpMethod::Patch, &path, Some(payload))
    }

    pub fn build_query_runs(&self, query: &RunsQuery) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Post, "/runs/query", Some(query))
    }

    pub fn parse_query_runs(&self, response: HttpResponse) -> Result<RunsResponse, ApiError> {
        parse_json(response)
    }

    // -- datasets -----------------------------------------------------------

    pub fn build_create_dataset(&self, dataset: &Dataset) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Post, "/datasets", Some(dataset))
    }

    pub fn build_upload_csv(&self, csv: &DatasetCsv) -> HttpRequest {
        let (body, content_type) = csv.to_multipart();
        self.form_request("/datasets/upload", body, &content_type)
    }

    pub fn build_upload_experiment(&self, experiment: &Experiment) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Post, "/datasets/upload-experiment", Some(experiment))
    }

    pub fn build_read_dataset(&self, dataset_id: &str) -> HttpRequest {
        self.get(&format!("/datasets/{}", encode(dataset_id)))
    }

    pub fn build_download_dataset_csv(&self, dataset_id: &str) -> HttpRequest {
        self.get(&format!("/datasets/{}/csv", encode(dataset_id)))
    }

    pub fn build_create_comparative_experiment(
        &self,
        request: &ComparativeExperimentRequest,
    ) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Post, "/datasets/comparative", Some(request))
    }

    pub fn build_read_comparative_experiment(
        &self,
        dataset_id: &str,
        experiment_id: &str,
    ) -> HttpRequest {
        self.get(&format!(
            "/datasets/{}/comparative?id={}",
            encode(dataset_id),
            encode(experiment_id)
        ))
    }

    pub fn parse_read_comparative_experiment(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<ComparativeExperiment>, ApiError> {
        parse_json(response)
    }

    // -- examples -----------------------------------------------------------

    pub fn build_get_examples(&self, dataset_id: &str, offset: u64) -> HttpRequest {
        self.get(&format!(
            "/examples?dataset={}&offset={offset}",
            encode(dataset_id)
        ))
    }

    pub fn parse_get_examples(&self, response: HttpResponse) -> Result<Vec<Example>, ApiError> {
        parse_json(response)
    }

    pub fn build_create_example(&self, example: &Example) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Post, "/examples", Some(example))
    }

    pub fn build_create_examples(&self, examples: &[Example]) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Post, "/examples/bulk", Some(examples))
    }

    pub fn build_get_examples_with_runs(
        &self,
        dataset_id: &str,
        query: &ExamplesWithRunsQuery,
    ) -> Result<HttpRequest, ApiError> {
        let path = format!("/datasets/{}/runs", encode(dataset_id));
        self.request(HttpMethod::Post, &path, Some(query))
    }

    pub fn parse_get_examples_with_runs(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<Example>, ApiError> {
        parse_json(response)
    }

    // -- feedback and sessions ----------------------------------------------

    pub fn build_create_feedback(&self, feedback: &Feedback) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Post, "/feedback", Some(feedback))
    }

    pub fn build_create_tracer_session(
        &self,
        session: &TracerSessionRequest,
    ) -> Result<HttpRequest, ApiError> {
        self.request(HttpMethod::Post, "/sessions", Some(session))
    }

    pub fn build_update_tracer_session(
        &self,
        session_id: &str,
        update: &TracerSessionUpdate,
    ) -> Result<HttpRequest, ApiError> {
        let path = format!("/sessions/{}", encode(session_id));
        self.request(HttpMethod::Patch, &path, Some(update))
    }

    // -- generic parsers ------------------------------------------------------

    /// Parser for every operation without a response body.
    pub fn parse_empty(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    /// Parser for the raw-bytes reads (dataset, dataset CSV).
    pub fn parse_bytes(&self, response: HttpResponse) -> Result<Vec<u8>, ApiError> {
        check_status(&response)?;
        Ok(response.body)
    }
}

impl std::fmt::Debug for LangsmithClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LangsmithClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn encode(component: &str) -> String {
    utf8_percent_encode(component, COMPONENT).to_string()
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_slice(&response.body).map_err(ApiError::Deserialization)
}

/// Any 2xx is success whatever the body; otherwise the `detail` of the
/// error body, or the status line when there is none.
pub(crate) fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let detail = serde_json::from_slice::<ErrorDetail>(&response.body)
        .map(|body| body.detail)
        .unwrap_or_else(|_| status_line(response.status));
    Err(ApiError::Remote {
        status: response.status,
        detail,
    })
}
