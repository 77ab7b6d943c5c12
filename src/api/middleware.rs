use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, Error, HttpRequest, ResponseError,
};

use super::{error::ApiError, AppState};

/// Rate limiting middleware for API routes.
///
/// Counts the request against the caller's window and answers 429 without
/// reaching the handler once the window is used up.
pub async fn rate_limit<B: MessageBody>(
    request: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let rejected = request
        .app_data::<web::Data<AppState>>()
        .and_then(|state| {
            let client = client_key(request.request());
            let wait = state.limiter.try_acquire(&client).err()?;

            state.metrics.record_rate_limited();
            tracing::warn!(
                client = %client,
                path = request.path(),
                retry_after_ms = wait.as_millis() as u64,
                "Rate limit exceeded"
            );
            Some(wait)
        });

    if let Some(wait) = rejected {
        let response = ApiError::RateLimited {
            retry_after_secs: wait.as_secs().max(1),
        }
        .error_response();
        return Ok(request.into_response(response).map_into_right_body());
    }

    next.call(request)
        .await
        .map(ServiceResponse::map_into_left_body)
}

fn client_key(request: &HttpRequest) -> String {
    request
        .peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
