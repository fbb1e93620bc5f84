use axum::{
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use utoipa::OpenApi;

use patient_cell::models::{
    CreatePatientRequest, Gender, MessageResponse, PatientCreatedResponse, PatientRecord,
    PatientView, UpdatePatientRequest, Verdict,
};

pub const OPENAPI_PATH: &str = "/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Patient Management System API",
        description = "A comprehensive API for managing patient records with BMI calculation and health verdicts",
        version = "1.0.0",
        contact(name = "API Support", email = "support@example.com"),
        license(name = "MIT License", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        crate::router::root,
        crate::router::about,
        patient_cell::handlers::view_patients,
        patient_cell::handlers::view_patient,
        patient_cell::handlers::create_patient,
        patient_cell::handlers::sort_patients,
        patient_cell::handlers::edit_patient,
        patient_cell::handlers::delete_patient,
    ),
    components(schemas(
        Gender,
        Verdict,
        PatientRecord,
        PatientView,
        CreatePatientRequest,
        UpdatePatientRequest,
        MessageResponse,
        PatientCreatedResponse,
    )),
    tags((name = "patients", description = "Patient records with derived BMI and verdict"))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub async fn swagger_ui() -> impl IntoResponse {
    Html(r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8">
    <title>Patient Management System API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://cdnjs.cloudflare.com/ajax/libs/swagger-ui/5.11.0/swagger-ui.css" />
  </head>
  <body>
    <div id="swagger-ui"></div>
    <script src="https://cdnjs.cloudflare.com/ajax/libs/swagger-ui/5.11.0/swagger-ui-bundle.js" charset="UTF-8"></script>
    <script src="https://cdnjs.cloudflare.com/ajax/libs/swagger-ui/5.11.0/swagger-ui-standalone-preset.js" charset="UTF-8"></script>
    <script>
    window.onload = function() {
      window.ui = SwaggerUIBundle({
        url: "/openapi.json",
        dom_id: '#swagger-ui',
        deepLinking: true,
        presets: [
          SwaggerUIBundle.presets.apis,
          SwaggerUIStandalonePreset
        ],
        layout: "StandaloneLayout"
      });
    };
    </script>
  </body>
</html>
"#)
}

pub async fn redoc() -> impl IntoResponse {
    Html(r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8">
    <title>Patient Management System API - ReDoc</title>
  </head>
  <body>
    <redoc spec-url="/openapi.json"></redoc>
    <script src="https://cdn.redoc.ly/redoc/latest/bundles/redoc.standalone.js"></script>
  </body>
</html>
"#)
}

pub fn create_docs_router() -> Router {
    Router::new()
        .route(OPENAPI_PATH, get(openapi_json))
        .route("/docs", get(swagger_ui))
        .route("/redoc", get(redoc))
}
