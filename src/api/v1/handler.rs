use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::logger::*;
use chrono::Utc;
use nanoid::nanoid;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub refreshed_for_hours: f64,
}

pub async fn verify_token(
    token: String,
    owner_id: Option<OwnerId>,
    rotation_service: Arc<dyn RotationService>,
    request_timeout: Duration,
) -> Result<impl warp::Reply, warp::Rejection> {
    let request_id = nanoid!(10);
    let owner = owner_id
        .as_ref()
        .map(|o| o.to_string())
        .unwrap_or_else(|| "-".to_string());
    let span = info_span!("verify_token", %request_id, %owner);

    async move {
        let window = rotation_service.policy().window;
        let input = VerifyInput {
            owner_id,
            presented_token: TokenValue(token),
            now: Utc::now(),
            window,
        };

        // A write that lands after the deadline still stands; the caller just
        // never hears about it and has to retry with whichever token is current.
        let outcome =
            match tokio::time::timeout(request_timeout, rotation_service.verify_and_rotate(input))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => VerificationOutcome::StoreFailure(format!(
                    "no answer within {}ms",
                    request_timeout.as_millis()
                )),
            };
        if !outcome.is_rotated() {
            return Err(reject::custom(ApiErrorCode::verification_failed(&outcome)));
        }

        info!("token rotated");
        let response = VerifyResponse {
            refreshed_for_hours: window.hours(),
        };
        Ok(warp::reply::json(&ApiResponse::ok(response)))
    }
    .instrument(span)
    .await
}
