mod config;
mod error;
mod predictor;
mod routes;
mod storage;
mod validation;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use config::AppConfig;
use predictor::invoker::Predictor;
use routes::configure_routes;
use std::env;
use std::time::Duration;
use storage::upload_store::UploadStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let config = AppConfig::load().map_err(|e| {
        log::error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, format!("Configuration error: {}", e))
    })?;

    let upload_store = UploadStore::new(config.uploads.dir.clone());
    if let Err(e) = upload_store.ensure_dir().await {
        log::error!(
            "Failed to create upload directory {}: {}",
            upload_store.dir().display(),
            e
        );
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Upload directory unavailable: {}", e),
        ));
    }

    match config.uploads.retention() {
        Some(retention) => {
            spawn_upload_sweeper(upload_store.clone(), retention, config.uploads.sweep_interval())
        }
        None => log::info!("Upload retention disabled, stored images are kept"),
    }

    log::info!(
        "Predictor: {} {} (inline: {}), timeout {}s",
        config.predictor.interpreter,
        config.predictor.file_script.display(),
        config.predictor.inline_script.display(),
        config.predictor.timeout_secs
    );

    let predictor = web::Data::new(Predictor::new(config.predictor.clone()));
    let upload_store = web::Data::new(upload_store);
    let frontend_dir = config.server.frontend_dir.clone();
    let bind_address = config.bind_address();

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(predictor.clone())
            .app_data(upload_store.clone())
            .configure(|cfg| configure_routes(cfg, frontend_dir.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}

/// Periodically deletes uploads older than `retention`.
fn spawn_upload_sweeper(store: UploadStore, retention: Duration, every: Duration) {
    log::info!(
        "Sweeping uploads older than {}s every {}s",
        retention.as_secs(),
        every.as_secs()
    );
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(every);
        loop {
            interval.tick().await;
            if let Err(e) = store.sweep_expired(retention).await {
                log::error!("Upload sweep failed: {}", e);
            }
        }
    });
}
