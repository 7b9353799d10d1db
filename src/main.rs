use actix_web::{middleware, web, App, HttpServer};
use image_batch_worker::handlers::{health_check, upload};
use image_batch_worker::limits::DEFAULT_ITEM_TIMEOUT;
use image_batch_worker::BatchLimits;
use log::info;
use std::time::Duration;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_logger();

    let config = Config::from_env();

    info!("Initializing image batch worker");
    info!("Server configuration: {:?}", config);

    let limits = web::Data::new(BatchLimits {
        item_timeout: config.item_timeout,
        ..BatchLimits::default()
    });
    info!("Batch limits: {:?}", limits.get_ref());

    info!("Starting server on {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(limits.clone())
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .wrap(middleware::DefaultHeaders::new().add(("X-Version", env!("CARGO_PKG_VERSION"))))
            .service(
                web::scope("/api/v1")
                    .route("/health", web::get().to(health_check))
                    .route("/upload", web::route().to(upload)),
            )
            .route("/health", web::get().to(health_check))
            .route("/upload", web::route().to(upload))
    })
    .bind((config.host.as_str(), config.port))?
    .workers(config.workers)
    .run()
    .await
}

#[derive(Debug)]
struct Config {
    host: String,
    port: u16,
    workers: usize,
    item_timeout: Option<Duration>,
}

impl Config {
    fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            workers: std::env::var("WORKERS")
                .ok()
                .and_then(|w| w.parse().ok())
                .unwrap_or_else(num_cpus::get),
            item_timeout: parse_item_timeout(std::env::var("ITEM_TIMEOUT_SECS").ok()),
        }
    }
}

/// `0` disables the timeout; unset or unparsable values fall back to the default.
fn parse_item_timeout(raw: Option<String>) -> Option<Duration> {
    match raw.and_then(|s| s.parse::<u64>().ok()) {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => Some(DEFAULT_ITEM_TIMEOUT),
    }
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
}
