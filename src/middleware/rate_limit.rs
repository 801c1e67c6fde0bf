use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{state::NotKeyed, state::InMemoryState, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::warn;

/// Process-wide request budget for one group of routes
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, governor::clock::DefaultClock>>,
}

impl RateLimitLayer {
    /// A zero budget is treated as one request per minute
    pub fn per_minute(requests: u32) -> Self {
        let burst = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);

        RateLimitLayer {
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(burst))),
        }
    }

    pub fn check(&self) -> Result<(), Response> {
        match self.limiter.check() {
            Ok(_) => Ok(()),
            Err(_) => {
                warn!("Rate limit exceeded");
                let response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    "Rate limit exceeded. Please try again later.",
                );
                Err(response.into_response())
            }
        }
    }
}

pub async fn rate_limit_middleware(
    State(limit): State<RateLimitLayer>,
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, Response> {
    limit.check()?;
    Ok(next.run(req).await)
}
