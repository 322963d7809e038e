use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Instant;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

/// Liveness: the process is up and serving
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness: PostgreSQL answers. 503 otherwise.
pub async fn readiness_check(pool: web::Data<PgPool>) -> impl Responder {
    let start = Instant::now();
    match sqlx::query("SELECT 1").fetch_one(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(ReadinessResponse {
            ready: true,
            database: "healthy",
            latency_ms: Some(start.elapsed().as_millis() as u64),
        }),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            HttpResponse::ServiceUnavailable().json(ReadinessResponse {
                ready: false,
                database: "unhealthy",
                latency_ms: None,
            })
        }
    }
}
