//! In-memory fake of the LangSmith REST API.
//!
//! Serves the routes `langsmith-core` talks to under `/api/v1`, checks the
//! `x-api-key` header, and answers errors with `{"detail": "..."}` like the
//! real service. Records are kept as JSON objects so the fake stays
//! independent of the client's types.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

/// API key accepted by `app()`.
pub const DEFAULT_API_KEY: &str = "mock-api-key";

pub type Record = Map<String, Value>;

/// Everything the fake has been sent, in arrival order.
#[derive(Debug, Default)]
pub struct Store {
    pub runs: Vec<Record>,
    pub datasets: Vec<Record>,
    pub examples: Vec<Record>,
    pub sessions: Vec<Record>,
    pub feedback: Vec<Record>,
    pub comparative: Vec<Record>,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
struct AppState {
    api_key: Arc<str>,
    db: Db,
}

type Failure = (StatusCode, Json<Value>);
type Reply = Result<(StatusCode, Json<Value>), Failure>;

pub fn app() -> Router {
    app_with_store(DEFAULT_API_KEY, Db::default())
}

/// Router accepting `api_key` and backed by `db`, so tests can inspect state.
pub fn app_with_store(api_key: &str, db: Db) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        db,
    };
    let api = Router::new()
        .route("/runs", post(create_run))
        .route("/runs/query", post(query_runs))
        .route("/runs/{id}", patch(patch_run))
        .route("/datasets", post(create_dataset))
        .route("/datasets/upload", post(upload_csv))
        .route("/datasets/upload-experiment", post(upload_experiment))
        .route("/datasets/comparative", post(create_comparative))
        .route("/datasets/{id}", get(read_dataset))
        .route("/datasets/{id}/csv", get(download_csv))
        .route("/datasets/{id}/runs", post(examples_with_runs))
        .route("/datasets/{id}/comparative", get(read_comparative))
        .route("/examples", get(list_examples).post(create_example))
        .route("/examples/bulk", post(create_examples))
        .route("/feedback", post(create_feedback))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", patch(update_session))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state);
    Router::new().nest("/api/v1", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_store(listener, Db::default()).await
}

/// Serves `app_with_store(DEFAULT_API_KEY, db)` on `listener`.
pub async fn run_with_store(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_store(DEFAULT_API_KEY, db)).await
}

async fn require_api_key(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let presented = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    if presented != Some(&*state.api_key) {
        return fail(StatusCode::UNAUTHORIZED, "Invalid API key").into_response();
    }
    next.run(request).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fail(status: StatusCode, detail: &str) -> Failure {
    (status, Json(json!({ "detail": detail })))
}

fn now() -> Value {
    Value::String(chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string())
}

fn str_field<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn find<'a>(records: &'a [Record], id: &str) -> Option<&'a Record> {
    records.iter().find(|r| str_field(r, "id") == Some(id))
}

fn find_mut<'a>(records: &'a mut [Record], id: &str) -> Option<&'a mut Record> {
    records.iter_mut().find(|r| str_field(r, "id") == Some(id))
}

fn ensure_id(record: &mut Record) -> String {
    match str_field(record, "id") {
        Some(id) => id.to_string(),
        None => {
            let id = Uuid::new_v4().to_string();
            record.insert("id".to_string(), Value::String(id.clone()));
            id
        }
    }
}

fn default_field(record: &mut Record, key: &str, value: Value) {
    if record.get(key).map_or(true, Value::is_null) {
        record.insert(key.to_string(), value);
    }
}

fn object(value: Option<&Value>) -> Record {
    value.and_then(Value::as_object).cloned().unwrap_or_default()
}

fn run_status(run: &Record) -> &'static str {
    if str_field(run, "error").is_some() {
        "error"
    } else if run.contains_key("end_time") {
        "success"
    } else {
        "pending"
    }
}

impl Store {
    /// Id of the session called `name`, creating it on first use.
    fn session_named(&mut self, name: &str) -> String {
        if let Some(session) = self.sessions.iter().find(|s| str_field(s, "name") == Some(name)) {
            return str_field(session, "id").unwrap_or_default().to_string();
        }
        let id = Uuid::new_v4().to_string();
        let mut session = Record::new();
        session.insert("id".to_string(), json!(id));
        session.insert("name".to_string(), json!(name));
        session.insert("start_time".to_string(), now());
        self.sessions.push(session);
        id
    }

    fn dataset_view(&self, dataset: &Record) -> Record {
        let id = str_field(dataset, "id").unwrap_or_default();
        let mut view = dataset.clone();
        let examples = self
            .examples
            .iter()
            .filter(|e| str_field(e, "dataset_id") == Some(id))
            .count();
        let sessions = self
            .sessions
            .iter()
            .filter(|s| str_field(s, "reference_dataset_id") == Some(id))
            .count();
        view.insert("example_count".to_string(), json!(examples));
        view.insert("session_count".to_string(), json!(sessions));
        view
    }

    fn insert_dataset(&mut self, mut dataset: Record) -> Result<Record, Failure> {
        let name = str_field(&dataset, "name")
            .ok_or_else(|| fail(StatusCode::UNPROCESSABLE_ENTITY, "name is required"))?
            .to_string();
        if self.datasets.iter().any(|d| str_field(d, "name") == Some(name.as_str())) {
            return Err(fail(StatusCode::CONFLICT, "Dataset with this name already exists."));
        }
        let id = ensure_id(&mut dataset);
        if find(&self.datasets, &id).is_some() {
            return Err(fail(StatusCode::CONFLICT, "Dataset with this id already exists."));
        }
        default_field(&mut dataset, "tenant_id", json!("mock-tenant"));
        default_field(&mut dataset, "created_at", now());
        default_field(&mut dataset, "modified_at", now());
        default_field(&mut dataset, "data_type", json!("kv"));
        self.datasets.push(dataset.clone());
        Ok(self.dataset_view(&dataset))
    }

    fn insert_example(&mut self, mut example: Record) -> Result<Record, Failure> {
        let dataset_id = str_field(&example, "dataset_id")
            .ok_or_else(|| fail(StatusCode::UNPROCESSABLE_ENTITY, "dataset_id is required"))?;
        if find(&self.datasets, dataset_id).is_none() {
            return Err(fail(StatusCode::NOT_FOUND, "Dataset not found"));
        }
        let id = ensure_id(&mut example);
        if find(&self.examples, &id).is_some() {
            return Err(fail(StatusCode::CONFLICT, "Example with this id already exists."));
        }
        default_field(&mut example, "inputs", json!({}));
        default_field(&mut example, "created_at", now());
        self.examples.push(example.clone());
        Ok(example)
    }
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

async fn create_run(State(state): State<AppState>, Json(mut run): Json<Record>) -> Reply {
    let id = str_field(&run, "id")
        .ok_or_else(|| fail(StatusCode::UNPROCESSABLE_ENTITY, "id is required"))?
        .to_string();
    let mut store = state.db.write().await;
    if find(&store.runs, &id).is_some() {
        return Err(fail(StatusCode::CONFLICT, "Run already exists"));
    }

    if str_field(&run, "session_id").is_none() {
        let name = str_field(&run, "session_name").unwrap_or("default").to_string();
        let session_id = store.session_named(&name);
        run.insert("session_id".to_string(), json!(session_id));
    }
    let trace_id = str_field(&run, "parent_run_id")
        .and_then(|parent| find(&store.runs, parent))
        .and_then(|parent| str_field(parent, "trace_id"))
        .unwrap_or(&id)
        .to_string();
    default_field(&mut run, "trace_id", json!(trace_id));
    let status = run_status(&run);
    run.insert("status".to_string(), json!(status));

    debug!(run_id = %id, "run created");
    store.runs.push(run);
    Ok((StatusCode::ACCEPTED, Json(json!({}))))
}

async fn patch_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<Record>,
) -> Reply {
    let mut store = state.db.write().await;
    let run = find_mut(&mut store.runs, &id).ok_or_else(|| fail(StatusCode::NOT_FOUND, "Run not found"))?;
    for (key, value) in update {
        run.insert(key, value);
    }
    let status = run_status(run);
    run.insert("status".to_string(), json!(status));
    Ok((StatusCode::ACCEPTED, Json(json!({}))))
}

#[derive(Deserialize)]
struct RunsQueryBody {
    #[serde(default)]
    session: Vec<String>,
    #[serde(default)]
    root: bool,
    #[serde(default)]
    filter: Option<String>,
}

/// Supports the single-comparison form `eq(field, "value")`.
fn parse_filter(filter: &str) -> Option<(String, String)> {
    let inner = filter.trim().strip_prefix("eq(")?.strip_suffix(')')?;
    let (field, value) = inner.split_once(',')?;
    let value = value.trim().strip_prefix('"')?.strip_suffix('"')?;
    Some((field.trim().to_string(), value.to_string()))
}

async fn query_runs(State(state): State<AppState>, Json(query): Json<RunsQueryBody>) -> Reply {
    let predicate = match query.filter.as_deref().filter(|f| !f.is_empty()) {
        Some(filter) => Some(
            parse_filter(filter)
                .ok_or_else(|| fail(StatusCode::BAD_REQUEST, "Invalid filter expression"))?,
        ),
        None => None,
    };

    let store = state.db.read().await;
    let runs: Vec<&Record> = store
        .runs
        .iter()
        .filter(|r| {
            query.session.is_empty()
                || str_field(r, "session_id").is_some_and(|s| query.session.iter().any(|q| q == s))
        })
        .filter(|r| !query.root || str_field(r, "parent_run_id").is_none())
        .filter(|r| match &predicate {
            Some((field, value)) => str_field(r, field) == Some(value.as_str()),
            None => true,
        })
        .collect();

    Ok((
        StatusCode::OK,
        Json(json!({
            "runs": runs,
            "cursors": {},
            "parsed_query": query.filter,
        })),
    ))
}

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

async fn create_dataset(State(state): State<AppState>, Json(dataset): Json<Record>) -> Reply {
    let mut store = state.db.write().await;
    let created = store.insert_dataset(dataset)?;
    debug!(dataset = ?created.get("name"), "dataset created");
    Ok((StatusCode::CREATED, Json(Value::Object(created))))
}

async fn read_dataset(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let store = state.db.read().await;
    let dataset = find(&store.datasets, &id).ok_or_else(|| fail(StatusCode::NOT_FOUND, "Dataset not found"))?;
    Ok((StatusCode::OK, Json(Value::Object(store.dataset_view(dataset)))))
}

fn csv_cell(value: Option<&Value>) -> String {
    let raw = match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw
    }
}

/// Inverse of `csv_cell` for one line: quoted cells may hold commas and
/// doubled quotes. Cells spanning lines are not supported.
fn split_csv_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                cell.push('"');
            }
            ('"', true) => quoted = false,
            ('"', false) if cell.trim().is_empty() => {
                cell.clear();
                quoted = true;
            }
            (',', false) => cells.push(std::mem::take(&mut cell).trim().to_string()),
            _ => cell.push(c),
        }
    }
    cells.push(cell.trim().to_string());
    cells
}

async fn download_csv(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, Failure> {
    let store = state.db.read().await;
    if find(&store.datasets, &id).is_none() {
        return Err(fail(StatusCode::NOT_FOUND, "Dataset not found"));
    }
    let examples: Vec<&Record> = store
        .examples
        .iter()
        .filter(|e| str_field(e, "dataset_id") == Some(id.as_str()))
        .collect();

    let keys = |field: &str| -> BTreeSet<String> {
        examples
            .iter()
            .flat_map(|e| object(e.get(field)).into_iter().map(|(k, _)| k))
            .collect()
    };
    let input_keys = keys("inputs");
    let output_keys = keys("outputs");

    let mut csv = input_keys
        .iter()
        .chain(output_keys.iter())
        .map(|k| csv_cell(Some(&Value::String(k.clone()))))
        .collect::<Vec<_>>()
        .join(",");
    csv.push('\n');
    for example in examples {
        let inputs = object(example.get("inputs"));
        let outputs = object(example.get("outputs"));
        let row: Vec<String> = input_keys
            .iter()
            .map(|k| csv_cell(inputs.get(k)))
            .chain(output_keys.iter().map(|k| csv_cell(outputs.get(k))))
            .collect();
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    Ok(([(header::CONTENT_TYPE, "text/csv")], csv).into_response())
}

async fn upload_csv(State(state): State<AppState>, mut multipart: Multipart) -> Reply {
    let mut file = None;
    let mut input_keys = Vec::new();
    let mut output_keys = Vec::new();
    let mut name = None;
    let mut data_type = None;
    let mut description = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| fail(StatusCode::BAD_REQUEST, &e.to_string()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        let text = field
            .text()
            .await
            .map_err(|e| fail(StatusCode::BAD_REQUEST, &e.to_string()))?;
        match field_name.as_str() {
            "file" => file = Some(text),
            "input_keys" => input_keys.push(text),
            "output_keys" => output_keys.push(text),
            "name" => name = Some(text),
            "data_type" => data_type = Some(text),
            "description" => description = Some(text),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| fail(StatusCode::UNPROCESSABLE_ENTITY, "file is required"))?;
    if input_keys.is_empty() {
        return Err(fail(StatusCode::UNPROCESSABLE_ENTITY, "input_keys are required"));
    }

    let mut lines = file.lines().filter(|l| !l.trim().is_empty());
    let header = split_csv_row(lines.next().unwrap_or_default());
    for key in input_keys.iter().chain(output_keys.iter()) {
        if !header.contains(key) {
            return Err(fail(
                StatusCode::UNPROCESSABLE_ENTITY,
                &format!("column {key} not found in csv"),
            ));
        }
    }
    let rows: Vec<Vec<String>> = lines.map(split_csv_row).collect();

    let mut dataset = Record::new();
    dataset.insert("name".to_string(), json!(name.unwrap_or_else(|| "dataset.csv".to_string())));
    dataset.insert("data_type".to_string(), json!(data_type.unwrap_or_else(|| "kv".to_string())));
    if let Some(description) = description {
        dataset.insert("description".to_string(), json!(description));
    }
    dataset.insert("input_keys".to_string(), json!(input_keys));
    dataset.insert("output_keys".to_string(), json!(output_keys));

    let mut store = state.db.write().await;
    let created = store.insert_dataset(dataset)?;
    let dataset_id = str_field(&created, "id").unwrap_or_default().to_string();

    let column = |row: &[String], key: &str| -> Value {
        let index = header.iter().position(|h| h == key);
        json!(index.and_then(|i| row.get(i)).cloned().unwrap_or_default())
    };
    for row in &rows {
        let inputs: Record = input_keys
            .iter()
            .map(|k| (k.clone(), column(row.as_slice(), k.as_str())))
            .collect();
        let outputs: Record = output_keys
            .iter()
            .map(|k| (k.clone(), column(row.as_slice(), k.as_str())))
            .collect();
        let mut example = Record::new();
        example.insert("dataset_id".to_string(), json!(dataset_id));
        example.insert("inputs".to_string(), Value::Object(inputs));
        example.insert("outputs".to_string(), Value::Object(outputs));
        store.insert_example(example)?;
    }

    let view = find(&store.datasets, &dataset_id)
        .map(|d| store.dataset_view(d))
        .unwrap_or(created);
    Ok((StatusCode::CREATED, Json(Value::Object(view))))
}

async fn upload_experiment(State(state): State<AppState>, Json(experiment): Json<Record>) -> Reply {
    let experiment_name = str_field(&experiment, "experiment_name")
        .ok_or_else(|| fail(StatusCode::UNPROCESSABLE_ENTITY, "experiment_name is required"))?
        .to_string();
    let results: Vec<Record> = experiment
        .get("results")
        .and_then(Value::as_array)
        .map(|rs| rs.iter().filter_map(|r| r.as_object().cloned()).collect())
        .ok_or_else(|| fail(StatusCode::UNPROCESSABLE_ENTITY, "results are required"))?;

    let mut store = state.db.write().await;
    let (dataset_id, new_dataset) = match str_field(&experiment, "dataset_id") {
        Some(id) => {
            if find(&store.datasets, id).is_none() {
                return Err(fail(StatusCode::NOT_FOUND, "Dataset not found"));
            }
            (id.to_string(), false)
        }
        None => {
            let name = str_field(&experiment, "dataset_name").ok_or_else(|| {
                fail(StatusCode::UNPROCESSABLE_ENTITY, "dataset_id or dataset_name is required")
            })?;
            let mut dataset = Record::new();
            dataset.insert("name".to_string(), json!(name));
            if let Some(description) = experiment.get("dataset_description") {
                dataset.insert("description".to_string(), description.clone());
            }
            let created = store.insert_dataset(dataset)?;
            (str_field(&created, "id").unwrap_or_default().to_string(), true)
        }
    };

    let session_id = Uuid::new_v4().to_string();
    let mut session = Record::new();
    session.insert("id".to_string(), json!(session_id));
    session.insert("name".to_string(), json!(experiment_name));
    session.insert("reference_dataset_id".to_string(), json!(dataset_id));
    for (from, to) in [
        ("experiment_description", "description"),
        ("experiment_start_time", "start_time"),
        ("experiment_end_time", "end_time"),
        ("experiment_metadata", "extra"),
    ] {
        if let Some(value) = experiment.get(from) {
            session.insert(to.to_string(), value.clone());
        }
    }
    store.sessions.push(session.clone());

    for result in results {
        let mut example_id = str_field(&result, "row_id").map(str::to_string);
        if new_dataset || example_id.is_none() {
            let mut example = Record::new();
            example.insert("dataset_id".to_string(), json!(dataset_id));
            example.insert("inputs".to_string(), json!(object(result.get("inputs"))));
            if let Some(expected) = result.get("expected_outputs") {
                example.insert("outputs".to_string(), expected.clone());
            }
            let created = store.insert_example(example)?;
            example_id = str_field(&created, "id").map(str::to_string);
        }

        let run_id = Uuid::new_v4().to_string();
        let mut run = Record::new();
        run.insert("id".to_string(), json!(run_id));
        run.insert(
            "name".to_string(),
            json!(str_field(&result, "run_name").unwrap_or("Target")),
        );
        run.insert("run_type".to_string(), json!("chain"));
        run.insert("trace_id".to_string(), json!(run_id));
        run.insert("session_id".to_string(), json!(session_id));
        run.insert("reference_example_id".to_string(), json!(example_id));
        run.insert("inputs".to_string(), json!(object(result.get("inputs"))));
        for (from, to) in [
            ("actual_outputs", "outputs"),
            ("start_time", "start_time"),
            ("end_time", "end_time"),
            ("error", "error"),
            ("run_metadata", "extra"),
        ] {
            if let Some(value) = result.get(from) {
                run.insert(to.to_string(), value.clone());
            }
        }
        let status = run_status(&run);
        run.insert("status".to_string(), json!(status));
        store.runs.push(run);

        for score in result
            .get("evaluation_scores")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
        {
            let mut feedback = score.clone();
            ensure_id(&mut feedback);
            feedback.insert("run_id".to_string(), json!(run_id));
            store.feedback.push(feedback);
        }
    }

    let dataset = find(&store.datasets, &dataset_id)
        .map(|d| Value::Object(store.dataset_view(d)))
        .unwrap_or(Value::Null);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "dataset": dataset, "experiment": session })),
    ))
}

#[derive(Deserialize)]
struct SessionIdsBody {
    #[serde(default)]
    session_ids: Vec<String>,
}

async fn examples_with_runs(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SessionIdsBody>,
) -> Reply {
    let store = state.db.read().await;
    if find(&store.datasets, &id).is_none() {
        return Err(fail(StatusCode::NOT_FOUND, "Dataset not found"));
    }
    let examples: Vec<Record> = store
        .examples
        .iter()
        .filter(|e| str_field(e, "dataset_id") == Some(id.as_str()))
        .map(|example| {
            let example_id = str_field(example, "id");
            let runs: Vec<&Record> = store
                .runs
                .iter()
                .filter(|r| str_field(r, "reference_example_id") == example_id)
                .filter(|r| {
                    str_field(r, "session_id").is_some_and(|s| body.session_ids.iter().any(|q| q == s))
                })
                .collect();
            let mut view = example.clone();
            view.insert("runs".to_string(), json!(runs));
            view
        })
        .collect();
    Ok((StatusCode::OK, Json(json!(examples))))
}

async fn create_comparative(State(state): State<AppState>, Json(mut body): Json<Record>) -> Reply {
    let experiment_ids = body
        .get("experiment_ids")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    if experiment_ids < 2 {
        return Err(fail(
            StatusCode::UNPROCESSABLE_ENTITY,
            "at least two experiments are required",
        ));
    }
    let mut store = state.db.write().await;
    let dataset_id = str_field(&body, "reference_dataset_id").unwrap_or_default();
    if find(&store.datasets, dataset_id).is_none() {
        return Err(fail(StatusCode::NOT_FOUND, "Dataset not found"));
    }
    ensure_id(&mut body);
    default_field(&mut body, "created_at", now());
    default_field(&mut body, "modified_at", now());
    store.comparative.push(body.clone());
    Ok((StatusCode::CREATED, Json(Value::Object(body))))
}

#[derive(Deserialize)]
struct ComparativeParams {
    id: Option<String>,
}

async fn read_comparative(
    State(state): State<AppState>,
    Path(dataset_id): Path<String>,
    Query(params): Query<ComparativeParams>,
) -> Reply {
    let store = state.db.read().await;
    if find(&store.datasets, &dataset_id).is_none() {
        return Err(fail(StatusCode::NOT_FOUND, "Dataset not found"));
    }
    let matches: Vec<Record> = store
        .comparative
        .iter()
        .filter(|c| str_field(c, "reference_dataset_id") == Some(dataset_id.as_str()))
        .filter(|c| params.id.as_deref().map_or(true, |id| str_field(c, "id") == Some(id)))
        .map(|c| {
            let id = str_field(c, "id");
            let info: Vec<Value> = c
                .get("experiment_ids")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .map(|experiment_id| {
                    let name = find(&store.sessions, experiment_id)
                        .and_then(|s| str_field(s, "name"))
                        .unwrap_or(experiment_id);
                    json!({ "id": experiment_id, "name": name })
                })
                .collect();
            let mut stats = Record::new();
            for feedback in store
                .feedback
                .iter()
                .filter(|f| str_field(f, "comparative_experiment_id") == id)
            {
                let key = str_field(feedback, "key").unwrap_or_default().to_string();
                let n = stats
                    .get(&key)
                    .and_then(|s| s["n"].as_u64())
                    .unwrap_or(0);
                stats.insert(key, json!({ "n": n + 1 }));
            }
            let mut view = c.clone();
            view.remove("experiment_ids");
            view.insert("experiments_info".to_string(), json!(info));
            view.insert("feedback_stats".to_string(), Value::Object(stats));
            view
        })
        .collect();
    Ok((StatusCode::OK, Json(json!(matches))))
}

// ---------------------------------------------------------------------------
// Examples
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ExamplesParams {
    dataset: String,
    #[serde(default)]
    offset: usize,
    limit: Option<usize>,
}

async fn list_examples(State(state): State<AppState>, Query(params): Query<ExamplesParams>) -> Reply {
    let store = state.db.read().await;
    let examples: Vec<&Record> = store
        .examples
        .iter()
        .filter(|e| str_field(e, "dataset_id") == Some(params.dataset.as_str()))
        .skip(params.offset)
        .take(params.limit.unwrap_or(100))
        .collect();
    Ok((StatusCode::OK, Json(json!(examples))))
}

async fn create_example(State(state): State<AppState>, Json(example): Json<Record>) -> Reply {
    let mut store = state.db.write().await;
    let created = store.insert_example(example)?;
    Ok((StatusCode::CREATED, Json(Value::Object(created))))
}

async fn create_examples(State(state): State<AppState>, Json(examples): Json<Vec<Record>>) -> Reply {
    let mut store = state.db.write().await;
    let before = store.examples.len();
    let mut created = Vec::with_capacity(examples.len());
    for example in examples {
        match store.insert_example(example) {
            Ok(example) => created.push(example),
            Err(failure) => {
                // All or nothing.
                store.examples.truncate(before);
                return Err(failure);
            }
        }
    }
    Ok((StatusCode::CREATED, Json(json!(created))))
}

// ---------------------------------------------------------------------------
// Feedback and sessions
// ---------------------------------------------------------------------------

async fn create_feedback(State(state): State<AppState>, Json(mut feedback): Json<Record>) -> Reply {
    if str_field(&feedback, "key").is_none() {
        return Err(fail(StatusCode::UNPROCESSABLE_ENTITY, "key is required"));
    }
    let mut store = state.db.write().await;
    if let Some(run_id) = str_field(&feedback, "run_id") {
        if find(&store.runs, run_id).is_none() {
            return Err(fail(StatusCode::NOT_FOUND, "Run not found"));
        }
    }
    ensure_id(&mut feedback);
    default_field(&mut feedback, "created_at", now());
    store.feedback.push(feedback.clone());
    Ok((StatusCode::CREATED, Json(Value::Object(feedback))))
}

async fn create_session(State(state): State<AppState>, Json(mut session): Json<Record>) -> Reply {
    let mut store = state.db.write().await;
    let id = ensure_id(&mut session);
    if find(&store.sessions, &id).is_some() {
        return Err(fail(StatusCode::CONFLICT, "Session with this id already exists"));
    }
    match str_field(&session, "name") {
        Some(name) if store.sessions.iter().any(|s| str_field(s, "name") == Some(name)) => {
            return Err(fail(StatusCode::CONFLICT, "Session with this name already exists"));
        }
        Some(_) => {}
        None => {
            session.insert("name".to_string(), json!(id));
        }
    }
    default_field(&mut session, "start_time", now());
    store.sessions.push(session.clone());
    Ok((StatusCode::CREATED, Json(Value::Object(session))))
}

async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<Record>,
) -> Reply {
    let mut store = state.db.write().await;
    let session = find_mut(&mut store.sessions, &id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "Session not found"))?;
    for (key, value) in update {
        session.insert(key, value);
    }
    Ok((StatusCode::OK, Json(Value::Object(session.clone()))))
}
