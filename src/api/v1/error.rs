use super::handler::ApiResponse;
use crate::application_port::*;
use crate::logger::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    if let Some(err) = err.find::<ApiErrorCode>() {
        let json = warp::reply::json(&ApiResponse::<()>::err(err.clone(), err.to_string()));
        Ok(warp::reply::with_status(json, StatusCode::OK))
    } else if err.is_not_found() {
        let code = ApiErrorCode::NotFound;
        let json = warp::reply::json(&ApiResponse::<()>::err(code.clone(), code.to_string()));
        Ok(warp::reply::with_status(json, StatusCode::NOT_FOUND))
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        let code = ApiErrorCode::MethodNotAllowed;
        let json = warp::reply::json(&ApiResponse::<()>::err(code.clone(), code.to_string()));
        Ok(warp::reply::with_status(json, StatusCode::METHOD_NOT_ALLOWED))
    } else {
        warn!("unhandled rejection: {:?}", err);
        let code = ApiErrorCode::InternalError;
        let json = warp::reply::json(&ApiResponse::<()>::err(code.clone(), code.to_string()));
        Ok(warp::reply::with_status(
            json,
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Token verification failed")]
    VerificationFailed,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    /// Callers see one code for every failed verification; only the log
    /// line tells a rejection apart from a store failure.
    pub fn verification_failed(outcome: &VerificationOutcome) -> ApiErrorCode {
        match outcome {
            VerificationOutcome::Rejected(reason) => info!(%reason, "token rejected"),
            VerificationOutcome::StoreFailure(e) => warn!("token store failure: {}", e),
            VerificationOutcome::Rotated => {}
        }
        ApiErrorCode::VerificationFailed
    }
}

impl reject::Reject for ApiErrorCode {}
