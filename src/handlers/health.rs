use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::config::{AppConfig, DEFAULT_JWT_SECRET};
use crate::db::Database;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize, ToSchema)]
pub struct HealthChecks {
    pub jwt_uses_default: bool,
    pub store_reachable: bool,
}

/// Welcome line at the API root
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Welcome message")),
    tag = "General"
)]
pub async fn welcome() -> impl Responder {
    HttpResponse::Ok().body("Welcome to the myFlix API!")
}

/// Health check with configuration self-diagnostics
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is degraded", body = HealthResponse)
    ),
    tag = "General"
)]
pub async fn health(config: web::Data<AppConfig>, db: web::Data<Database>) -> impl Responder {
    let jwt_uses_default = config.jwt_secret == DEFAULT_JWT_SECRET;
    let store_reachable = db.db.size_on_disk().is_ok();

    if jwt_uses_default {
        warn!("health check: using default JWT secret - NOT SECURE FOR PRODUCTION");
    }

    let status = if !store_reachable {
        "unhealthy"
    } else if jwt_uses_default {
        "degraded"
    } else {
        "healthy"
    };

    let response = HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            jwt_uses_default,
            store_reachable,
        },
    };

    if status == "healthy" {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
