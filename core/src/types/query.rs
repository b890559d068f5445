//! Run queries and the request bodies of the two POST-as-read operations.

use serde::{Deserialize, Serialize};

use super::{JsonMap, Run};

/// Columns selected when a query does not name any.
pub const DEFAULT_SELECT: [&str; 9] = [
    "id",
    "created_at",
    "modified_at",
    "name",
    "dataset_id",
    "source_run_id",
    "metadata",
    "inputs",
    "outputs",
];

/// Filter and selection criteria for querying runs.
///
/// `filter` is the service's filter expression language, e.g.
/// `and(eq(run_type, "llm"), gt(latency, 5))`; it is passed through verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueryParams {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub id: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMap>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub full_text_contains: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub splits: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    pub offset: u64,
    pub limit: u64,
    pub order: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<f64>,
    pub select: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            id: Vec::new(),
            as_of: None,
            metadata: None,
            full_text_contains: Vec::new(),
            splits: Vec::new(),
            dataset: None,
            offset: 0,
            limit: 100,
            order: "recent".to_string(),
            random_seed: None,
            select: DEFAULT_SELECT.iter().map(|c| c.to_string()).collect(),
            filter: None,
        }
    }
}

/// Body of `POST /runs/query`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunsQuery {
    /// Session (experiment) ids whose runs are searched.
    pub session: Vec<String>,
    /// Only root runs when true.
    pub root: bool,
    pub select: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl RunsQuery {
    /// Query over `session_ids` taking the selection and filter from `params`.
    pub fn from_params(session_ids: Vec<String>, root: bool, params: &QueryParams) -> Self {
        Self {
            session: session_ids,
            root,
            select: params.select.clone(),
            filter: params.filter.clone().filter(|f| !f.is_empty()),
        }
    }
}

/// Body of `POST /datasets/{id}/runs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExamplesWithRunsQuery {
    pub session_ids: Vec<String>,
}

/// Result of a run query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunsResponse {
    pub runs: Vec<Run>,
    /// Opaque pagination cursors, passed back to the service unchanged.
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub cursors: JsonMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_query: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_params_defaults() {
        let params = QueryParams::default();
        assert_eq!(params.offset, 0);
        assert_eq!(params.limit, 100);
        assert_eq!(params.order, "recent");
        assert_eq!(params.select.len(), DEFAULT_SELECT.len());
        assert_eq!(params.select[0], "id");
    }

    #[test]
    fn query_params_fill_missing_fields_with_defaults() {
        let params: QueryParams = serde_json::from_value(json!({"limit": 10})).unwrap();
        assert_eq!(params.limit, 10);
        assert_eq!(params.order, "recent");
        assert_eq!(params.select, QueryParams::default().select);
    }

    #[test]
    fn runs_query_takes_select_and_filter_from_params() {
        let params = QueryParams {
            select: vec!["id".to_string(), "outputs".to_string()],
            filter: Some("eq(run_type, \"llm\")".to_string()),
            ..Default::default()
        };
        let query = RunsQuery::from_params(vec!["s-1".to_string()], true, &params);
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "session": ["s-1"],
                "root": true,
                "select": ["id", "outputs"],
                "filter": "eq(run_type, \"llm\")",
            })
        );
    }

    #[test]
    fn runs_query_drops_empty_filter() {
        let params = QueryParams {
            filter: Some(String::new()),
            ..Default::default()
        };
        let query = RunsQuery::from_params(Vec::new(), false, &params);
        assert!(query.filter.is_none());
        assert!(serde_json::to_value(&query).unwrap().get("filter").is_none());
    }

    #[test]
    fn runs_response_tolerates_missing_cursors() {
        let response: RunsResponse = serde_json::from_value(json!({"runs": []})).unwrap();
        assert!(response.runs.is_empty());
        assert!(response.cursors.is_empty());
        assert!(response.parsed_query.is_none());
    }

    #[test]
    fn runs_response_reads_null_collections_as_empty() {
        let response: RunsResponse = serde_json::from_value(json!({
            "runs": [{
                "id": "r-1",
                "name": "agent",
                "run_type": "chain",
                "trace_id": "r-1",
                "session_id": "s-1",
                "status": "success",
                "tags": null,
                "events": null,
            }],
            "cursors": {"next": null},
        }))
        .unwrap();
        assert!(response.runs[0].tags.is_empty());
        assert!(response.runs[0].events.is_empty());
        assert_eq!(response.cursors["next"], serde_json::Value::Null);

        let response: RunsResponse =
            serde_json::from_value(json!({"runs": [], "cursors": null})).unwrap();
        assert!(response.cursors.is_empty());
    }
}
