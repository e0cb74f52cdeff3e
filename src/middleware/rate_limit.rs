use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use governor::{clock::DefaultClock, state::keyed::DashMapStateStore, Quota, RateLimiter};
use std::future::{ready, Ready};
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::warn;

type IpLimiter = RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock>;

/// Per-IP throttle for the credential endpoints. Clones share the same
/// limiter, so wrapping several resources counts against one quota.
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<IpLimiter>,
}

impl RateLimit {
    pub fn per_minute(requests: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(requests).expect("quota must be nonzero"));
        RateLimit {
            limiter: Arc::new(RateLimiter::dashmap(quota)),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitService {
            service,
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitService<S> {
    service: S,
    limiter: Arc<IpLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // honors X-Forwarded-For / Forwarded when present, peer address
        // otherwise; unresolvable addresses share the loopback quota
        let ip = req
            .connection_info()
            .realip_remote_addr()
            .and_then(|addr| {
                addr.parse::<SocketAddr>()
                    .map(|sock| sock.ip())
                    .or_else(|_| addr.parse::<IpAddr>())
                    .ok()
            })
            .unwrap_or(IpAddr::from([127, 0, 0, 1]));

        if self.limiter.check_key(&ip).is_err() {
            warn!(ip = %ip, path = %req.path(), "rate limit exceeded");
            let (req, _pl) = req.into_parts();
            let res = HttpResponse::TooManyRequests().json(serde_json::json!({
                "error": "Too many requests. Please try again later."
            }));
            return Box::pin(async move { Ok(ServiceResponse::new(req, res).map_into_boxed_body()) });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_boxed_body())
        })
    }
}
