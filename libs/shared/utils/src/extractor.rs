use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use shared_models::error::AppError;

/// JSON body extractor whose rejections render as `AppError`.
///
/// Anything the JSON extractor refuses (bad syntax, wrong field types,
/// missing fields, missing content type) becomes a 422 with a `detail`
/// body instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => {
                debug!("JSON body rejected: {}", rejection.body_text());
                Err(rejection_to_error(rejection))
            }
        }
    }
}

pub fn rejection_to_error(rejection: JsonRejection) -> AppError {
    AppError::UnprocessableEntity(rejection.body_text())
}

/// Query string extractor whose rejections render as a 400 `AppError`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ValidatedQuery(value)),
            Err(rejection) => {
                debug!("Query string rejected: {}", rejection.body_text());
                Err(query_rejection_to_error(rejection))
            }
        }
    }
}

pub fn query_rejection_to_error(rejection: QueryRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}
