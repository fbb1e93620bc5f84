use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use patient_cell::create_patient_router;
use patient_cell::models::MessageResponse;
use patient_cell::services::PatientService;

use crate::docs::create_docs_router;

#[utoipa::path(get, path = "/", responses((status = 200, description = "Service name", body = MessageResponse)))]
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Patient Management System API" }))
}

#[utoipa::path(get, path = "/about", responses((status = 200, description = "Service summary", body = MessageResponse)))]
pub async fn about() -> Json<Value> {
    Json(json!({ "message": "A fully functional API to manage your patient records" }))
}

pub fn create_router(service: Arc<PatientService>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/about", get(about))
        .merge(create_patient_router(service))
        .merge(create_docs_router())
}
