//! HTTP routes for the forwarding gateway
//!
//! `POST /proxy` relays one logical request to the upstream, `OPTIONS /proxy`
//! answers the browser's preflight. Every response, including errors, carries
//! the CORS headers added by [`cors_headers`].

use actix_web::http::Method;
use actix_web::middleware::DefaultHeaders;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{error, info_span, Instrument};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::constants::cors;
use crate::error::{AppError, AppResult};
use crate::gateway::Gateway;
use crate::models::{GatewayErrorBody, GatewayRequest, HttpMethod};

/// Application state shared across handlers
pub struct AppState {
    pub gateway: Gateway,
}

/// Liveness response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
}

/// POST /proxy - Relay a logical request to the upstream API
///
/// The request body names the upstream endpoint, the method and optional
/// form fields. The upstream JSON is returned verbatim.
#[utoipa::path(
    post,
    path = "/proxy",
    tag = "gateway",
    request_body = GatewayRequest,
    responses(
        (status = 200, description = "Upstream JSON relayed unchanged", body = serde_json::Value),
        (status = 500, description = "Relay failed", body = GatewayErrorBody)
    )
)]
pub async fn proxy(data: web::Data<AppState>, body: web::Bytes) -> AppResult<HttpResponse> {
    let request = Gateway::parse_request(&body).map_err(|e| {
        error!("Proxy error: {}", e);
        e
    })?;

    let span = info_span!(
        "proxy",
        request_id = %Uuid::new_v4(),
        endpoint = %request.endpoint,
        method = %request.method,
    );

    let value = data
        .gateway
        .forward(&request)
        .instrument(span)
        .await
        .map_err(|e| {
            error!("Proxy error: {}", e);
            e
        })?;

    Ok(HttpResponse::Ok().json(value))
}

/// OPTIONS /proxy - CORS preflight
pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

/// GET /health - Liveness check
#[utoipa::path(
    get,
    path = "/health",
    tag = "gateway",
    responses(
        (status = 200, description = "Gateway is running", body = HealthStatus)
    )
)]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthStatus {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Fallback for unknown routes
pub async fn not_found(req: HttpRequest) -> AppResult<HttpResponse> {
    Err(AppError::not_found(format!("No route for {}", req.path())))
}

/// CORS headers attached to every response
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", cors::ALLOW_ORIGIN))
        .add(("Access-Control-Allow-Headers", cors::ALLOW_HEADERS))
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "shinime gateway",
        version = "0.1.0",
        description = "Forwarding gateway to the upstream anime catalog API",
        license(
            name = "MIT"
        )
    ),
    paths(proxy, health_check),
    components(
        schemas(GatewayRequest, GatewayErrorBody, HttpMethod, HealthStatus)
    ),
    tags(
        (name = "gateway", description = "Upstream relay endpoints")
    )
)]
pub struct ApiDoc;

/// Configure gateway routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/proxy")
            .route(web::post().to(proxy))
            .route(web::method(Method::OPTIONS).to(preflight)),
    )
    .route("/health", web::get().to(health_check));
}
