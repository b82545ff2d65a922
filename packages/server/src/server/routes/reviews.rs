//! Review submission and lookup endpoints.

use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use crate::common::ReviewId;
use crate::domains::reviews::{
    submit_review, NewReview, Review, ReviewError, ReviewRepository, ReviewStatus,
};
use crate::server::app::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewResponse {
    pub success: bool,
    pub review_id: ReviewId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: ReviewId,
    pub product_id: i32,
    pub reviewer_name: String,
    pub email: String,
    pub comment_text: String,
    pub rating: i32,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        let status = review.status();
        Self {
            id: review.id,
            product_id: review.product_id,
            reviewer_name: review.reviewer_name,
            email: review.email,
            comment_text: review.comment_text,
            rating: review.rating,
            status,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    /// Offending field in the submitted payload, for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

/// Error returned from a handler, rendered as `{"success": false, "message": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    field: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            field: None,
        }
    }

    fn with_field(mut self, field: &'static str) -> Self {
        self.field = Some(field);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                success: false,
                message: self.message,
                field: self.field,
            }),
        )
            .into_response()
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::Validation(e) => {
                ApiError::new(StatusCode::BAD_REQUEST, e.to_string()).with_field(e.field())
            }
            ReviewError::NotFound(id) => {
                ApiError::new(StatusCode::NOT_FOUND, format!("review {} not found", id))
            }
            other => {
                error!(error = %other, "request failed");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }
}

/// True when the declared content type is JSON (`application/json`,
/// parameters allowed, or any `+json` structured suffix).
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// `POST /api/reviews`
pub async fn create_review_handler(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CreateReviewResponse>, ApiError> {
    if !is_json_content_type(&headers) {
        return Err(ApiError::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "expected an application/json body",
        ));
    }

    let review: NewReview = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("invalid JSON body: {}", e)))?;

    let review_id = submit_review(review, &state.deps).await?;

    Ok(Json(CreateReviewResponse {
        success: true,
        review_id,
    }))
}

/// `GET /api/reviews/:id`
pub async fn get_review_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let review = state.deps.reviews.get(ReviewId::new(id)).await?;
    Ok(Json(review.into()))
}
