// Extractor error handlers
//
// actix answers malformed bodies, queries and paths with plain-text errors.
// These handlers route them through AppError so every 4xx has the same JSON shape.

use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError},
    Error, HttpRequest,
};

use crate::core::AppError;

pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> Error {
    tracing::debug!(path = %req.path(), error = %err, "Rejected JSON body");
    AppError::validation(format!("Invalid request body: {}", err)).into()
}

pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> Error {
    tracing::debug!(path = %req.path(), error = %err, "Rejected query string");
    AppError::validation(format!("Invalid query parameters: {}", err)).into()
}

pub fn path_error_handler(err: PathError, req: &HttpRequest) -> Error {
    tracing::debug!(path = %req.path(), error = %err, "Rejected path parameter");
    AppError::validation(format!("Invalid path parameter: {}", err)).into()
}
