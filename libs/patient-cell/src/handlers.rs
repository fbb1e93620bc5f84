use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Map, Value};
use tracing::instrument;

use shared_models::error::AppError;
use shared_utils::extractor::{ValidatedJson, ValidatedQuery};

use crate::models::{
    CreatePatientRequest, MessageResponse, PatientCreatedResponse, PatientError, PatientRecord,
    PatientView, SortQuery, UpdatePatientRequest,
};
use crate::services::PatientService;

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound(_) => AppError::NotFound(err.to_string()),
            PatientError::AlreadyExists(_) => AppError::Conflict(err.to_string()),
            PatientError::Validation(errors) => AppError::ValidationError(errors),
            PatientError::InvalidSort(msg) => AppError::BadRequest(msg),
            PatientError::Storage(e) => AppError::Internal(e.to_string()),
        }
    }
}

// Edit and delete answer unknown IDs without echoing the ID.
fn terse_not_found(err: PatientError) -> AppError {
    match err {
        PatientError::NotFound(_) => AppError::NotFound("Patient not found".to_string()),
        other => other.into(),
    }
}

/// All stored patients keyed by ID, in insertion order.
#[utoipa::path(
    get,
    path = "/view",
    tag = "patients",
    responses(
        (status = 200, description = "Every patient record keyed by ID", body = HashMap<String, PatientRecord>),
        (status = 500, description = "Patient document could not be read")
    )
)]
#[instrument(skip(service))]
pub async fn view_patients(
    State(service): State<Arc<PatientService>>,
) -> Result<Json<Value>, AppError> {
    let patients = service.list_patients().await?;

    let mut by_id = Map::new();
    for patient in patients {
        by_id.insert(patient.id, json!(patient.record));
    }

    Ok(Json(Value::Object(by_id)))
}

#[utoipa::path(
    get,
    path = "/view/{patient_id}",
    tag = "patients",
    params(("patient_id" = String, Path, description = "Unique identifier", example = "P001")),
    responses(
        (status = 200, description = "The stored record", body = PatientRecord),
        (status = 404, description = "No patient with that ID")
    )
)]
#[instrument(skip(service))]
pub async fn view_patient(
    State(service): State<Arc<PatientService>>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let record = service.get_patient(&patient_id).await?;

    Ok(Json(json!(record)))
}

#[utoipa::path(
    post,
    path = "/create",
    tag = "patients",
    request_body = CreatePatientRequest,
    responses(
        (status = 201, description = "Patient created, with BMI and verdict filled in", body = PatientCreatedResponse),
        (status = 400, description = "Duplicate ID or a field constraint failed"),
        (status = 422, description = "Body is not a well-formed patient")
    )
)]
#[instrument(skip(service))]
pub async fn create_patient(
    State(service): State<Arc<PatientService>>,
    ValidatedJson(request): ValidatedJson<CreatePatientRequest>,
) -> Result<(StatusCode, Json<PatientCreatedResponse>), AppError> {
    let patient = service.create_patient(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(PatientCreatedResponse {
            message: format!("Patient with ID {} created successfully.", patient.id()),
            patient: patient.to_view(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/sort",
    tag = "patients",
    params(SortQuery),
    responses(
        (status = 200, description = "Patients with their IDs, sorted", body = Vec<PatientView>),
        (status = 400, description = "Unknown sort field or order")
    )
)]
#[instrument(skip(service))]
pub async fn sort_patients(
    State(service): State<Arc<PatientService>>,
    ValidatedQuery(query): ValidatedQuery<SortQuery>,
) -> Result<Json<Value>, AppError> {
    let (field, order) = query.parse()?;
    let patients = service.sort_patients(field, order).await?;

    Ok(Json(json!(patients)))
}

#[utoipa::path(
    put,
    path = "/edit/{patient_id}",
    tag = "patients",
    params(("patient_id" = String, Path, description = "ID of patient to update", example = "P001")),
    request_body = UpdatePatientRequest,
    responses(
        (status = 200, description = "Patient updated", body = MessageResponse),
        (status = 400, description = "A field constraint failed"),
        (status = 404, description = "No patient with that ID")
    )
)]
#[instrument(skip(service))]
pub async fn edit_patient(
    State(service): State<Arc<PatientService>>,
    Path(patient_id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdatePatientRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    service
        .update_patient(&patient_id, request)
        .await
        .map_err(terse_not_found)?;

    Ok(Json(MessageResponse::new("patient updated")))
}

#[utoipa::path(
    delete,
    path = "/delete/{patient_id}",
    tag = "patients",
    params(("patient_id" = String, Path, description = "ID of patient to delete", example = "P001")),
    responses(
        (status = 200, description = "Patient deleted", body = MessageResponse),
        (status = 404, description = "No patient with that ID")
    )
)]
#[instrument(skip(service))]
pub async fn delete_patient(
    State(service): State<Arc<PatientService>>,
    Path(patient_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    service
        .delete_patient(&patient_id)
        .await
        .map_err(terse_not_found)?;

    Ok(Json(MessageResponse::new("patient deleted")))
}
