use super::handler;
use crate::domain_model::OwnerId;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use warp::Filter;

/// Set by the upstream authenticator; the service trusts it as-is.
pub const OWNER_HEADER: &str = "x-owner-id";

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let request_timeout = server.request_timeout;
    warp::post()
        .and(warp::path!("token" / String))
        .and(with_identity())
        .and(with(server.rotation_service.clone()))
        .and(warp::any().map(move || request_timeout))
        .and_then(handler::verify_token)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

// A missing or blank header is an absent identity, not a bad request.
fn with_identity() -> impl Filter<Extract = (Option<OwnerId>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(OWNER_HEADER)
        .map(|raw: Option<String>| raw.and_then(|s| s.parse::<OwnerId>().ok()))
}
