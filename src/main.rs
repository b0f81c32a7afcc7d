use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use instant_search::config::Config;
use instant_search::handlers::not_found;
use instant_search::routes::api;
use instant_search::services::MeiliSearchService;
use instant_search::widget::{WidgetOptions, WidgetRegistry};
use instant_search::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => {
            info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // One search client for the whole process, shared by every widget
    let index = Arc::new(MeiliSearchService::new(&config.search));
    info!(
        "Searching index '{}' at {}",
        index.index(),
        config.search.base_url
    );

    let state = AppState {
        registry: WidgetRegistry::new(index, WidgetOptions::from(&config.search)),
        config: config.clone(),
        start_time: Instant::now(),
    };

    // Clients that close the page never unmount their widget
    let idle = config.server.widget_idle();
    state
        .registry
        .spawn_sweeper(idle, idle.min(Duration::from_secs(60)));

    let allowed_origins = config.security.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);
        if allowed_origins.iter().any(|origin| origin == "*") {
            cors = cors.allow_any_origin();
        } else {
            for origin in &allowed_origins {
                cors = cors.allowed_origin(origin);
            }
        }

        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .service(api::config())
            .default_service(web::route().to(not_found))
    })
    .bind(format!("{}:{}", config.server.host, config.server.port))?;

    info!(
        "Server started successfully at http://{}:{}",
        config.server.host, config.server.port
    );

    server.workers(config.server.workers).run().await
}
