//! Error handling.

use axum::{
    extract::rejection::JsonRejection,
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use tokio::sync::AcquireError;
use tracing::{event, Level};
use zune_inflate::errors::InflateDecodeErrors;

/// Pivot server error type
///
/// This type encapsulates the various errors that may occur.
/// Each variant may result in a different API error response.
#[derive(Debug, Error)]
pub enum PivotError {
    /// Error decompressing source data
    #[error("failed to decompress source data")]
    DecompressionFlate2(#[from] std::io::Error),

    /// Error decompressing source data
    #[error("failed to decompress source data")]
    DecompressionZune(#[from] InflateDecodeErrors),

    /// A field named in the request does not exist in the source data
    #[error("field {field} not found in source data")]
    FieldNotFound { field: String },

    /// Error sending an HTTP request for source data
    #[error("error retrieving source data over HTTP")]
    HttpRequest(#[from] reqwest::Error),

    /// Source data HTTP request returned an unsuccessful status
    #[error("HTTP request for {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    /// Numeric aggregation applied to a non-numeric value
    #[error("cannot compute {aggregation} of non-numeric value {value} in field {field}")]
    NonNumeric {
        aggregation: &'static str,
        field: String,
        value: String,
    },

    /// Error deserialising request data into RequestData
    #[error("request data is not valid")]
    RequestDataJsonRejection(#[from] JsonRejection),

    /// Error validating RequestData (single error)
    #[error("request data is not valid")]
    RequestDataValidationSingle(#[from] validator::ValidationError),

    /// Error validating RequestData (multiple errors)
    #[error("request data is not valid")]
    RequestDataValidation(#[from] validator::ValidationErrors),

    /// Error acquiring a semaphore
    #[error("error acquiring resources")]
    SemaphoreAcquireError(#[from] AcquireError),

    /// Source data is not valid JSON
    #[error("failed to parse source data as JSON")]
    SourceParse(#[from] serde_json::Error),

    /// Error reading source data from the local filesystem
    #[error("error reading source data from {path}")]
    SourceRead {
        path: String,
        #[source]
        error: std::io::Error,
    },

    /// Source data is valid JSON but cannot be interpreted as a table
    #[error("source data is not a table: {reason}")]
    SourceShape { reason: String },

    /// Source data exceeds the configured size limit
    #[error("source data size {size} exceeds limit {limit}")]
    SourceTooLarge { size: u64, limit: u64 },

    /// Error converting between integer types
    #[error(transparent)]
    TryFromInt(#[from] std::num::TryFromIntError),

    /// Unrecognised aggregation function
    #[error("unsupported aggregation function {aggfunc}")]
    UnsupportedAggregation { aggfunc: String },

    /// Source location with an unsupported scheme
    #[error("unsupported source location {location}")]
    UnsupportedSource { location: String },

    /// Error using the source cache
    #[error("source cache error {error}")]
    CacheError { error: String },
}

impl IntoResponse for PivotError {
    /// Convert from a `PivotError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

/// Body of error response
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorBody {
    /// Main error message
    message: String,

    /// Optional list of causes
    #[serde(skip_serializing_if = "Option::is_none")]
    caused_by: Option<Vec<String>>,
}

impl ErrorBody {
    /// Return a new ErrorBody
    ///
    /// # Arguments
    ///
    /// * `error`: The error that occurred
    fn new<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        let message = error.to_string();
        let mut caused_by = None;
        let mut current = error.source();
        while let Some(source) = current {
            let mut causes: Vec<String> = caused_by.unwrap_or_default();
            causes.push(source.to_string());
            caused_by = Some(causes);
            current = source.source();
        }
        // Remove duplicate entries.
        if let Some(caused_by) = caused_by.as_mut() {
            caused_by.dedup()
        }
        ErrorBody { message, caused_by }
    }
}

/// A response to send in error cases
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorResponse {
    /// HTTP status of the response
    #[serde(skip)]
    status: StatusCode,

    /// Response body
    error: ErrorBody,
}

impl ErrorResponse {
    /// Return a new ErrorResponse
    ///
    /// # Arguments
    ///
    /// * `status`: HTTP status of the response
    /// * `error`: The error that occurred. This will be formatted into a suitable `ErrorBody`
    fn new<E>(status: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        ErrorResponse {
            status,
            error: ErrorBody::new(error),
        }
    }

    /// Return a 400 bad request ErrorResponse
    fn bad_request<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Return a 500 internal server error ErrorResponse
    fn internal_server_error<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl From<PivotError> for ErrorResponse {
    /// Convert from a `PivotError` into an `ErrorResponse`.
    ///
    /// Only malformed requests are client errors. Anything that goes wrong once the request has
    /// been accepted, including fields missing from the source data, is a server error.
    fn from(error: PivotError) -> Self {
        let response = match &error {
            // Bad request
            PivotError::RequestDataJsonRejection(_)
            | PivotError::RequestDataValidationSingle(_)
            | PivotError::RequestDataValidation(_) => Self::bad_request(&error),

            // Data load failures
            PivotError::DecompressionFlate2(_)
            | PivotError::DecompressionZune(_)
            | PivotError::HttpRequest(_)
            | PivotError::HttpStatus { .. }
            | PivotError::SourceParse(_)
            | PivotError::SourceRead { .. }
            | PivotError::SourceShape { .. }
            | PivotError::SourceTooLarge { .. }
            | PivotError::UnsupportedSource { .. } => Self::internal_server_error(&error),

            // Pivot failures
            PivotError::FieldNotFound { .. }
            | PivotError::NonNumeric { .. }
            | PivotError::UnsupportedAggregation { .. } => Self::internal_server_error(&error),

            // Internal server error
            PivotError::CacheError { .. }
            | PivotError::SemaphoreAcquireError(_)
            | PivotError::TryFromInt(_) => Self::internal_server_error(&error),
        };

        // Log server errors.
        if response.status.is_server_error() {
            event!(Level::ERROR, "{}", error.to_string());
            let mut current = error.source();
            while let Some(source) = current {
                event!(Level::ERROR, "Caused by: {}", source.to_string());
                current = source.source();
            }
        }

        response
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the response as JSON.
    fn into_response(self) -> Response {
        let json_body = serde_json::to_string_pretty(&self);
        match json_body {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.status,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use hyper::HeaderMap;

    // Jump through the hoops to get the body as a string.
    async fn body_string(response: Response) -> String {
        String::from_utf8(
            hyper::body::to_bytes(response.into_body())
                .await
                .unwrap()
                .to_vec(),
        )
        .unwrap()
    }

    async fn test_pivot_error(
        error: PivotError,
        status: StatusCode,
        message: &str,
        caused_by: Option<Vec<&'static str>>,
    ) {
        let response = error.into_response();
        assert_eq!(status, response.status());
        let mut headers = HeaderMap::new();
        headers.insert(&header::CONTENT_TYPE, "application/json".parse().unwrap());
        assert_eq!(headers, *response.headers());
        let error_response: ErrorResponse =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(message.to_string(), error_response.error.message);
        // Map Vec items from str to String
        let caused_by = caused_by.map(|cb| cb.iter().map(|s| s.to_string()).collect());
        assert_eq!(caused_by, error_response.error.caused_by);
    }

    #[tokio::test]
    async fn decompression_flate2_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::InvalidInput, "decompression error");
        let error = PivotError::DecompressionFlate2(io_error);
        let message = "failed to decompress source data";
        let caused_by = Some(vec!["decompression error"]);
        test_pivot_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, caused_by).await;
    }

    #[tokio::test]
    async fn decompression_zune_error() {
        let zune_error = InflateDecodeErrors::new_with_error(
            zune_inflate::errors::DecodeErrorStatus::InsufficientData,
        );
        let error = PivotError::DecompressionZune(zune_error);
        let message = "failed to decompress source data";
        let caused_by = Some(vec!["Insufficient data\n\n\n"]);
        test_pivot_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, caused_by).await;
    }

    #[tokio::test]
    async fn field_not_found() {
        let error = PivotError::FieldNotFound {
            field: "qty".to_string(),
        };
        let message = "field qty not found in source data";
        test_pivot_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, None).await;
    }

    #[tokio::test]
    async fn http_status() {
        let error = PivotError::HttpStatus {
            url: "http://example.com/data.json".to_string(),
            status: 404,
        };
        let message = "HTTP request for http://example.com/data.json failed with status 404";
        test_pivot_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, None).await;
    }

    #[tokio::test]
    async fn non_numeric() {
        let error = PivotError::NonNumeric {
            aggregation: "sum",
            field: "name".to_string(),
            value: "\"abc\"".to_string(),
        };
        let message = "cannot compute sum of non-numeric value \"abc\" in field name";
        test_pivot_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, None).await;
    }

    #[tokio::test]
    async fn request_data_validation_single() {
        let validation_error = validator::ValidationError::new("foo");
        let error = PivotError::RequestDataValidationSingle(validation_error);
        let message = "request data is not valid";
        let caused_by = Some(vec!["Validation error: foo [{}]"]);
        test_pivot_error(error, StatusCode::BAD_REQUEST, message, caused_by).await;
    }

    #[tokio::test]
    async fn request_data_validation() {
        let mut validation_errors = validator::ValidationErrors::new();
        let validation_error = validator::ValidationError::new("foo");
        validation_errors.add("bar", validation_error);
        let error = PivotError::RequestDataValidation(validation_errors);
        let message = "request data is not valid";
        let caused_by = Some(vec!["bar: Validation error: foo [{}]"]);
        test_pivot_error(error, StatusCode::BAD_REQUEST, message, caused_by).await;
    }

    #[tokio::test]
    async fn semaphore_acquire_error() {
        let sem = tokio::sync::Semaphore::new(1);
        sem.close();
        let error = PivotError::SemaphoreAcquireError(sem.acquire().await.unwrap_err());
        let message = "error acquiring resources";
        let caused_by = Some(vec!["semaphore closed"]);
        test_pivot_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, caused_by).await;
    }

    #[tokio::test]
    async fn source_parse() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = PivotError::SourceParse(json_error);
        let message = "failed to parse source data as JSON";
        let caused_by = Some(vec!["EOF while parsing an object at line 1 column 1"]);
        test_pivot_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, caused_by).await;
    }

    #[tokio::test]
    async fn source_read() {
        let error = PivotError::SourceRead {
            path: "/data.json".to_string(),
            error: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let message = "error reading source data from /data.json";
        let caused_by = Some(vec!["not found"]);
        test_pivot_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, caused_by).await;
    }

    #[tokio::test]
    async fn source_shape() {
        let error = PivotError::SourceShape {
            reason: "expected an array or object".to_string(),
        };
        let message = "source data is not a table: expected an array or object";
        test_pivot_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, None).await;
    }

    #[tokio::test]
    async fn source_too_large() {
        let error = PivotError::SourceTooLarge { size: 2, limit: 1 };
        let message = "source data size 2 exceeds limit 1";
        test_pivot_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, None).await;
    }

    #[tokio::test]
    async fn try_from_int_error() {
        let error = PivotError::TryFromInt(u8::try_from(-1_i8).unwrap_err());
        let message = "out of range integral type conversion attempted";
        test_pivot_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, None).await;
    }

    #[tokio::test]
    async fn unsupported_aggregation() {
        let error = PivotError::UnsupportedAggregation {
            aggfunc: "foo".to_string(),
        };
        let message = "unsupported aggregation function foo";
        test_pivot_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, None).await;
    }

    #[tokio::test]
    async fn unsupported_source() {
        let error = PivotError::UnsupportedSource {
            location: "ftp://example.com/data.json".to_string(),
        };
        let message = "unsupported source location ftp://example.com/data.json";
        test_pivot_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, None).await;
    }

    #[tokio::test]
    async fn cache_error() {
        let error = PivotError::CacheError {
            error: "poisoned".to_string(),
        };
        let message = "source cache error poisoned";
        test_pivot_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, None).await;
    }
}
