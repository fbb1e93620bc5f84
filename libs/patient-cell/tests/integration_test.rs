use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use patient_cell::create_patient_router;
use patient_cell::services::{JsonFileStore, MemoryStore, PatientService, RecordStore};
use shared_utils::test_utils::{MockPatientDocuments, TestPatient};

fn create_test_app(document: Value) -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::from_value(document).unwrap());
    let service = Arc::new(PatientService::new(store.clone()));
    (store, create_patient_router(service))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn ids(list: &Value) -> Vec<&str> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_view_all_patients() {
    let (_, app) = create_test_app(MockPatientDocuments::seeded());

    let (status, body) = send(&app, "GET", "/view", None).await;
    assert_eq!(status, StatusCode::OK);

    let patients = body.as_object().unwrap();
    assert_eq!(patients.len(), 4);
    assert_eq!(patients.keys().next().unwrap(), "P001");
    assert_eq!(body["P003"]["verdict"], "Overweight");
    assert!(body["P001"].get("id").is_none());
}

#[tokio::test]
async fn test_view_empty_store() {
    let (_, app) = create_test_app(MockPatientDocuments::empty());

    let (status, body) = send(&app, "GET", "/view", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn test_view_single_patient() {
    let (_, app) = create_test_app(MockPatientDocuments::seeded());

    let (status, body) = send(&app, "GET", "/view/P001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ananya Verma");
    assert_eq!(body["bmi"], 22.86);
    assert_eq!(body["verdict"], "Normal weight");
}

#[tokio::test]
async fn test_view_unknown_patient() {
    let (_, app) = create_test_app(MockPatientDocuments::seeded());

    let (status, body) = send(&app, "GET", "/view/P999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Patient with ID P999 not found");
}

#[tokio::test]
async fn test_create_then_view() {
    let (_, app) = create_test_app(MockPatientDocuments::seeded());
    let patient = TestPatient::new("P999");

    let (status, _) = send(&app, "GET", "/view/P999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "POST", "/create", Some(patient.to_json())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Patient with ID P999 created successfully.");
    assert_eq!(body["patient"]["id"], "P999");
    assert_eq!(body["patient"]["bmi"], 22.86);
    assert_eq!(body["patient"]["verdict"], "Normal weight");

    let (status, body) = send(&app, "GET", "/view/P999", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "name": "Test Patient",
            "city": "Test City",
            "age": 30,
            "gender": "male",
            "height": 1.75,
            "weight": 70.0,
            "bmi": 22.86,
            "verdict": "Normal weight"
        })
    );
}

#[tokio::test]
async fn test_create_duplicate_id() {
    let (store, app) = create_test_app(MockPatientDocuments::seeded());
    let before = store.snapshot().await;

    let (status, body) = send(&app, "POST", "/create", Some(TestPatient::new("P001").to_json())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Patient with ID P001 already exists.");
    assert_eq!(store.snapshot().await, before);
}

#[tokio::test]
async fn test_create_constraint_violations() {
    let (store, app) = create_test_app(MockPatientDocuments::empty());
    let mut patient = TestPatient::new("PX01");
    patient.age = 200;
    patient.gender = "unknown".to_string();

    let (status, body) = send(&app, "POST", "/create", Some(patient.to_json())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let fields: Vec<&str> = body["detail"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["id", "age", "gender"]);
    assert!(store.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_create_malformed_body() {
    let (_, app) = create_test_app(MockPatientDocuments::empty());

    let (status, body) = send(&app, "POST", "/create", Some(json!({ "id": "P001", "age": "thirty" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_create_rounds_bmi_ties_to_even() {
    let (store, app) = create_test_app(MockPatientDocuments::empty());

    // Each pair lands exactly on, or a hair off, a half-cent BMI.
    let cases = [
        ("P201", 2.0, 88.5, 22.12),
        ("P202", 1.76, 48.4, 15.62),
        ("P203", 2.0, 90.5, 22.62),
        ("P204", 2.0, 88.7, 22.18),
    ];
    for (id, height, weight, bmi) in cases {
        let body = TestPatient::measured(id, height, weight).to_json();
        let (status, created) = send(&app, "POST", "/create", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["patient"]["bmi"], bmi, "{id}");

        let (_, stored) = send(&app, "GET", &format!("/view/{id}"), None).await;
        assert_eq!(stored["bmi"], bmi, "{id}");
    }

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.get("P201").unwrap().unwrap().bmi, 22.12);
}

#[tokio::test]
async fn test_edit_rounds_bmi_ties_to_even() {
    let (_, app) = create_test_app(MockPatientDocuments::seeded());

    let update = json!({ "height": 2.0, "weight": 90.7 });
    let (status, _) = send(&app, "PUT", "/edit/P002", Some(update)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/view/P002", None).await;
    assert_eq!(body["bmi"], 22.68);
    assert_eq!(body["verdict"], "Normal weight");
}

#[tokio::test]
async fn test_sort_defaults_to_weight_ascending() {
    let (_, app) = create_test_app(MockPatientDocuments::seeded());

    let (status, body) = send(&app, "GET", "/sort", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), ["P002", "P001", "P004", "P003"]);
    assert_eq!(body[0]["name"], "Ravi Mehta");
}

#[tokio::test]
async fn test_sort_by_bmi_descending() {
    let (_, app) = create_test_app(MockPatientDocuments::seeded());

    let (status, body) = send(&app, "GET", "/sort?sortby=bmi&order=desc", None).await;
    assert_eq!(status, StatusCode::OK);

    let bmis: Vec<f64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["bmi"].as_f64().unwrap())
        .collect();
    assert!(bmis.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_sort_by_height() {
    let (_, app) = create_test_app(MockPatientDocuments::seeded());

    let (status, body) = send(&app, "GET", "/sort?sortby=height", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), ["P002", "P004", "P001", "P003"]);
}

#[tokio::test]
async fn test_sort_invalid_params() {
    let (_, app) = create_test_app(MockPatientDocuments::seeded());

    let (status, body) = send(&app, "GET", "/sort?sortby=age", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid sort field. Choose from weight, height, bmi.");

    let (status, body) = send(&app, "GET", "/sort?order=sideways", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid order value. Choose 'asc' or 'desc'.");
}

#[tokio::test]
async fn test_sort_repeated_param_is_bad_request() {
    let (_, app) = create_test_app(MockPatientDocuments::seeded());

    let (status, body) = send(&app, "GET", "/sort?sortby=bmi&sortby=weight", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("sortby"));
}

#[tokio::test]
async fn test_edit_patient() {
    let (_, app) = create_test_app(MockPatientDocuments::seeded());

    let (status, body) = send(&app, "PUT", "/edit/P002", Some(json!({ "weight": 80.0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "patient updated" }));

    let (_, body) = send(&app, "GET", "/view/P002", None).await;
    assert_eq!(body["name"], "Ravi Mehta");
    assert_eq!(body["height"], 1.6);
    assert_eq!(body["weight"], 80.0);
    assert_eq!(body["bmi"], 31.25);
    assert_eq!(body["verdict"], "Obesity");
}

#[tokio::test]
async fn test_edit_unknown_patient() {
    let (_, app) = create_test_app(MockPatientDocuments::seeded());

    let (status, body) = send(&app, "PUT", "/edit/P999", Some(json!({ "name": "Nobody" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Patient not found");
}

#[tokio::test]
async fn test_edit_rejects_invalid_values() {
    let (store, app) = create_test_app(MockPatientDocuments::seeded());
    let before = store.snapshot().await;

    let (status, _) = send(&app, "PUT", "/edit/P001", Some(json!({ "height": -1.0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Passes the edit checks but not full validation once merged.
    let (status, body) = send(&app, "PUT", "/edit/P001", Some(json!({ "age": 150 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"][0]["field"], "age");

    let (status, _) = send(&app, "PUT", "/edit/P001", Some(json!({ "age": "old" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(store.snapshot().await, before);
}

#[tokio::test]
async fn test_delete_patient() {
    let (_, app) = create_test_app(MockPatientDocuments::seeded());

    let (status, body) = send(&app, "DELETE", "/delete/P003", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "patient deleted" }));

    let (status, _) = send(&app, "GET", "/view/P003", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "DELETE", "/delete/P003", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Patient not found");
}

#[tokio::test]
async fn test_file_backed_lifecycle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("patients.json");
    std::fs::write(&path, MockPatientDocuments::seeded().to_string()).unwrap();

    let store = Arc::new(JsonFileStore::new(&path));
    let app = create_patient_router(Arc::new(PatientService::new(store.clone())));

    let (status, _) = send(&app, "POST", "/create", Some(TestPatient::measured("P005", 1.8, 60.0).to_json())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "PUT", "/edit/P001", Some(json!({ "city": "Shillong" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "DELETE", "/delete/P002", None).await;
    assert_eq!(status, StatusCode::OK);

    let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let keys: Vec<&String> = on_disk.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["P001", "P003", "P004", "P005"]);
    assert_eq!(on_disk["P001"]["city"], "Shillong");
    assert_eq!(on_disk["P005"]["bmi"], 18.52);
    assert_eq!(on_disk["P005"]["verdict"], "Normal weight");

    assert_eq!(store.load().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_corrupt_file_is_server_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("patients.json");
    std::fs::write(&path, "{ this is not json").unwrap();

    let store = Arc::new(JsonFileStore::new(&path));
    let app = create_patient_router(Arc::new(PatientService::new(store)));

    let (status, body) = send(&app, "GET", "/view", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("malformed"));

    let (status, _) = send(&app, "POST", "/create", Some(TestPatient::new("P005").to_json())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ this is not json");
}
