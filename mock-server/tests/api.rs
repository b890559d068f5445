use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_store, Db, DEFAULT_API_KEY};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-api-key", DEFAULT_API_KEY)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header("x-api-key", DEFAULT_API_KEY)
        .body(String::new())
        .unwrap()
}

fn dataset(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "created_at": "2024-05-01T10:00:00",
        "modified_at": "2024-05-01T10:00:00",
        "tenant_id": "t-1",
        "example_count": 0,
        "session_count": 0,
    })
}

// --- auth ---

#[tokio::test]
async fn missing_api_key_returns_401_with_detail() {
    let resp = app()
        .oneshot(Request::builder().uri("/api/v1/datasets/ds-1").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await, json!({"detail": "Invalid API key"}));
}

#[tokio::test]
async fn wrong_api_key_returns_401() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/datasets/ds-1")
                .header("x-api-key", "nope")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- datasets ---

#[tokio::test]
async fn create_dataset_returns_201() {
    let resp = app()
        .oneshot(json_request("POST", "/api/v1/datasets", dataset("ds-1", "qa")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["id"], "ds-1");
    assert_eq!(body["example_count"], 0);
}

#[tokio::test]
async fn read_unknown_dataset_returns_404_detail() {
    let resp = app().oneshot(get_request("/api/v1/datasets/nope")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await, json!({"detail": "Dataset not found"}));
}

#[tokio::test]
async fn malformed_json_is_rejected_without_detail() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/datasets")
                .header("x-api-key", DEFAULT_API_KEY)
                .header(http::header::CONTENT_TYPE, "application/json")
                .body("{not json".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_bytes(resp).await;
    assert!(serde_json::from_slice::<Value>(&body).is_err());
}

// --- examples ---

#[tokio::test]
async fn example_for_unknown_dataset_returns_404() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/examples",
            json!({"dataset_id": "missing", "inputs": {}}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bulk_examples_are_all_or_nothing() {
    let db = Db::default();
    let app = app_with_store(DEFAULT_API_KEY, db.clone());

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/datasets", dataset("ds-1", "qa")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/v1/examples/bulk",
            json!([
                {"dataset_id": "ds-1", "inputs": {"q": 1}},
                {"dataset_id": "other", "inputs": {"q": 2}},
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(db.read().await.examples.is_empty());
}

#[tokio::test]
async fn list_examples_requires_dataset_parameter() {
    let resp = app().oneshot(get_request("/api/v1/examples")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- runs ---

#[tokio::test]
async fn patch_unknown_run_returns_404() {
    let resp = app()
        .oneshot(json_request(
            "PATCH",
            "/api/v1/runs/missing",
            json!({"outputs": {}, "end_time": "2024-05-01T10:00:00"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["detail"], "Run not found");
}

#[tokio::test]
async fn child_run_inherits_trace_and_session() {
    let db = Db::default();
    let app = app_with_store(DEFAULT_API_KEY, db.clone());

    for run in [
        json!({"id": "root", "name": "agent", "run_type": "chain",
               "start_time": "2024-05-01T10:00:00", "inputs": {}, "session_name": "demo"}),
        json!({"id": "child", "name": "search", "run_type": "tool", "parent_run_id": "root",
               "start_time": "2024-05-01T10:00:01", "inputs": {}, "session_name": "demo"}),
    ] {
        let resp = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/runs", run))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
    }

    let store = db.read().await;
    assert_eq!(store.sessions.len(), 1);
    assert_eq!(store.runs[1]["trace_id"], "root");
    assert_eq!(store.runs[0]["session_id"], store.runs[1]["session_id"]);
    assert_eq!(store.runs[1]["status"], "pending");
}

#[tokio::test]
async fn query_runs_rejects_unsupported_filter() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/runs/query",
            json!({"session": [], "root": true, "select": ["id"], "filter": "gt(latency, 5)"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["detail"], "Invalid filter expression");
}

// --- feedback and sessions ---

#[tokio::test]
async fn feedback_for_unknown_run_returns_404() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/feedback",
            json!({"key": "correctness", "score": 1, "run_id": "missing"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn feedback_without_key_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/api/v1/feedback", json!({"score": 1})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn session_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/api/v1/sessions",
            json!({"id": "sess-1", "name": "nightly"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    assert_eq!(created["name"], "nightly");
    assert!(created["start_time"].is_string());

    // duplicate name
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/api/v1/sessions", json!({"name": "nightly"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // update
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PATCH",
            "/api/v1/sessions/sess-1",
            json!({"description": "runs every night"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await;
    assert_eq!(updated["name"], "nightly"); // unchanged
    assert_eq!(updated["description"], "runs every night");

    // update unknown
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PATCH", "/api/v1/sessions/missing", json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- comparative experiments ---

#[tokio::test]
async fn comparative_experiment_needs_two_experiments() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/datasets/comparative",
            json!({
                "experiment_ids": ["s-1"],
                "reference_dataset_id": "ds-1",
                "created_at": "2024-05-01T10:00:00",
                "modified_at": "2024-05-01T10:00:00",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- csv upload ---

fn multipart_request(parts: &[(&str, &str)]) -> Request<String> {
    let boundary = "test-boundary";
    let mut body = String::new();
    for (name, value) in parts {
        body.push_str(&format!("--{boundary}\r\n"));
        if *name == "file" {
            body.push_str(
                "Content-Disposition: form-data; name=\"file\"; filename=\"dataset.csv\"\r\n\
                 Content-Type: text/csv\r\n\r\n",
            );
        } else {
            body.push_str(&format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"));
        }
        body.push_str(value);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{boundary}--\r\n"));

    Request::builder()
        .method("POST")
        .uri("/api/v1/datasets/upload")
        .header("x-api-key", DEFAULT_API_KEY)
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(body)
        .unwrap()
}

#[tokio::test]
async fn upload_csv_creates_dataset_and_examples() {
    let db = Db::default();
    let resp = app_with_store(DEFAULT_API_KEY, db.clone())
        .oneshot(multipart_request(&[
            ("file", "question,answer\nwho?,me\nwhy?,because\n"),
            ("input_keys", "question"),
            ("name", "faq"),
            ("data_type", "kv"),
            ("output_keys", "answer"),
        ]))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["name"], "faq");
    assert_eq!(body["example_count"], 2);

    let store = db.read().await;
    assert_eq!(store.examples[1]["inputs"], json!({"question": "why?"}));
    assert_eq!(store.examples[1]["outputs"], json!({"answer": "because"}));
}

#[tokio::test]
async fn upload_csv_without_input_keys_returns_422() {
    let resp = app()
        .oneshot(multipart_request(&[("file", "question\nwho?\n"), ("name", "faq")]))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn upload_csv_with_unknown_column_returns_422() {
    let resp = app()
        .oneshot(multipart_request(&[
            ("file", "question\nwho?\n"),
            ("input_keys", "prompt"),
        ]))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(resp).await["detail"], "column prompt not found in csv");
}

#[tokio::test]
async fn upload_csv_keeps_quoted_commas_in_one_cell() {
    let db = Db::default();
    let resp = app_with_store(DEFAULT_API_KEY, db.clone())
        .oneshot(multipart_request(&[
            ("file", "question,answer\n\"Paris, Lyon or Nice?\",Paris\n"),
            ("input_keys", "question"),
            ("output_keys", "answer"),
        ]))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let store = db.read().await;
    assert_eq!(store.examples[0]["inputs"], json!({"question": "Paris, Lyon or Nice?"}));
    assert_eq!(store.examples[0]["outputs"], json!({"answer": "Paris"}));
}
