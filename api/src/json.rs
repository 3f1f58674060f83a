use axum::{
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};

use crate::error::AppError;

/// JSON request body whose rejections are rendered like every other
/// [`AppError`].
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(body) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(reject)?;

        Ok(JsonBody(body))
    }
}

fn reject(rejection: JsonRejection) -> AppError {
    tracing::debug!(%rejection, "Rejected request body");

    match rejection {
        JsonRejection::JsonDataError(e) => (
            format!("Invalid request body: {}", e.body_text()),
            StatusCode::UNPROCESSABLE_ENTITY,
        )
            .into(),
        JsonRejection::JsonSyntaxError(_) => {
            ("Request body is not valid JSON", StatusCode::BAD_REQUEST).into()
        }
        JsonRejection::MissingJsonContentType(_) => (
            "Expected a JSON body with `Content-Type: application/json`",
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
        )
            .into(),
        other => (other.body_text(), other.status()).into(),
    }
}
