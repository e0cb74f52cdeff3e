use crate::config::AppConfig;
use crate::utils::auth::decode_jwt;
use actix_web::{
    body::{BoxBody, EitherBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};

/// Bearer-token guard for protected routes. On success the decoded
/// [`Claims`](crate::models::user::Claims) land in the request extensions;
/// otherwise the request is answered with a 401 without reaching the
/// handler. Account existence is not re-checked per request.
pub struct JwtAuth;

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthService { service }))
    }
}

pub struct JwtAuthService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for JwtAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_owned);

        let Some(token) = token else {
            let (req, _pl) = req.into_parts();
            let res = HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "Authorization token required"
            }));
            return Box::pin(async move { Ok(ServiceResponse::new(req, res).map_into_right_body()) });
        };

        // signing secret is injected at startup
        let secret = req
            .app_data::<web::Data<AppConfig>>()
            .map(|config| config.jwt_secret.clone());
        let Some(secret) = secret else {
            let (req, _pl) = req.into_parts();
            let res = HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "internal server error"
            }));
            return Box::pin(async move { Ok(ServiceResponse::new(req, res).map_into_right_body()) });
        };

        let claims = match decode_jwt(&token, &secret) {
            Ok(claims) => claims,
            Err(_) => {
                let (req, _pl) = req.into_parts();
                let res = HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "Invalid or expired token"
                }));
                return Box::pin(
                    async move { Ok(ServiceResponse::new(req, res).map_into_right_body()) },
                );
            }
        };

        req.extensions_mut().insert(claims);

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}
