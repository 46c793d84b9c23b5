//! Axum extractor that deserialises and validates a JSON request body

use crate::error::PivotError;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Json},
    http::Request,
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// An axum extractor based on the Json extractor that also performs validation using the validator
/// crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S, B> FromRequest<S, B> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, B, Rejection = JsonRejection>,
    B: Send + 'static,
{
    type Rejection = PivotError;

    /// Extract a `ValidatedJson` from a `Request`.
    ///
    /// Rejections are logged at debug level, since they are client errors and are not logged
    /// when converted to a response.
    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!("failed to deserialise request body: {}", rejection);
            rejection
        })?;
        if let Err(errors) = value.validate() {
            tracing::debug!("request body failed validation: {}", errors);
            return Err(errors.into());
        }
        Ok(ValidatedJson(value))
    }
}
