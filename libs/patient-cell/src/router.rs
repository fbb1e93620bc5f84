use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::*;
use crate::services::PatientService;

pub fn create_patient_router(service: Arc<PatientService>) -> Router {
    Router::new()
        .route("/view", get(view_patients))
        .route("/view/{id}", get(view_patient))
        .route("/create", post(create_patient))
        .route("/sort", get(sort_patients))
        .route("/edit/{id}", put(edit_patient))
        .route("/delete/{id}", delete(delete_patient))
        .with_state(service)
}
