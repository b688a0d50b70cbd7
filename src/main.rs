//! shinime gateway server
//!
//! Relays catalog requests from the browser to the upstream anime API.

use actix_web::{web, App, HttpServer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use shinime::config::Config;
use shinime::gateway::Gateway;
use shinime::routes::{configure_routes, cors_headers, not_found, ApiDoc, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let bind_address = config.bind_address();

    let gateway = match Gateway::new(config.upstream.clone()) {
        Ok(gateway) => gateway,
        Err(e) => {
            error!("Failed to build upstream client: {}", e);
            std::process::exit(1);
        }
    };

    info!("Forwarding to upstream {}", config.upstream.base_url);

    let app_state = web::Data::new(AppState { gateway });

    info!("Starting shinime gateway on {}", bind_address);

    let openapi = ApiDoc::openapi();

    HttpServer::new(move || {
        App::new()
            .wrap(cors_headers())
            .app_data(app_state.clone())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
            .configure(configure_routes)
            .default_service(web::to(not_found))
    })
    .bind(&bind_address)?
    .run()
    .await
}
