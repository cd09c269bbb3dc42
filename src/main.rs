use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Compress, web};
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use folio_server::analytics::aggregate::Aggregator;
use folio_server::analytics::{RetentionTask, Tracker};
use folio_server::api::constants::ADMIN_PREFIX;
use folio_server::api::middleware::{AdminAuth, ClientRateLimit, FixedWindowLimiter};
use folio_server::api::services::admin::routes::admin_v1_routes;
use folio_server::api::services::public::public_routes;
use folio_server::config::{AppConfig, LoggingConfig, init_config};
use folio_server::services::{
    ContactService, GeoIpService, Mailer, ProfileService, ProjectService, UploadService,
};
use folio_server::storage::Storage;

/// Stdout logging always; a daily-rotated file appender when a log
/// directory is configured. The guard must outlive the server.
fn init_tracing(config: &LoggingConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    match &config.directory {
        Some(directory) => {
            let file_appender = tracing_appender::rolling::daily(directory, "folio-server.log");
            let (writer, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .init();

            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();

            None
        }
    }
}

fn build_cors(config: &AppConfig) -> Cors {
    let origins = &config.cors.allowed_origins;

    // No origins configured means a same-origin deployment; the browser
    // default policy applies.
    if origins.is_empty() {
        return Cors::default();
    }

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec!["Content-Type", "Authorization", "Accept"])
        .supports_credentials()
        .max_age(3600);

    for origin in origins {
        cors = cors.allowed_origin(origin);
    }

    cors
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = init_config();
    let _log_guard = init_tracing(&config.logging);

    if let Err(missing) = config.validate() {
        for item in &missing {
            error!("Missing required configuration: {}", item);
        }
        if config.is_production() {
            error!(
                "Refusing to start in production with {} missing value(s)",
                missing.len()
            );
            std::process::exit(1);
        }
        warn!("Continuing in development mode with incomplete configuration");
    }

    let storage = Arc::new(Storage::connect(&config.database.url).await?);
    info!("Storage ready ({} backend)", storage.backend_name());

    let geoip = config
        .geoip
        .enabled
        .then(|| Arc::new(GeoIpService::new(&config.geoip.api_url)));
    if geoip.is_some() {
        info!("GeoIP lookups enabled");
    }

    let tracker = Arc::new(Tracker::new(storage.clone(), geoip.clone()));
    let aggregator = Arc::new(Aggregator::new(storage.clone()));
    let retention = Arc::new(RetentionTask::new(
        storage.clone(),
        config.analytics.retention_days as i64,
    ));
    let contact_service = Arc::new(ContactService::new(storage.clone(), Mailer::from_config()));
    let project_service = Arc::new(ProjectService::new(storage.clone()));
    let profile_service = Arc::new(ProfileService::new(storage.clone()));
    let upload_service = Arc::new(UploadService::from_config());

    if config.analytics.cleanup_interval_hours > 0 {
        retention
            .clone()
            .spawn_background_task(config.analytics.cleanup_interval_hours);
    } else {
        warn!("Analytics cleanup background task disabled (interval is 0)");
    }

    let contact_limiter = ClientRateLimit::new(Arc::new(FixedWindowLimiter::contact_default()));

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server at http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(config))
            .wrap(Compress::default())
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(tracker.clone()))
            .app_data(web::Data::new(aggregator.clone()))
            .app_data(web::Data::new(retention.clone()))
            .app_data(web::Data::new(contact_service.clone()))
            .app_data(web::Data::new(project_service.clone()))
            .app_data(web::Data::new(profile_service.clone()))
            .app_data(web::Data::new(upload_service.clone()))
            .app_data(web::PayloadConfig::new(1024 * 1024))
            .service(
                web::scope(ADMIN_PREFIX)
                    .wrap(AdminAuth)
                    .service(admin_v1_routes()),
            )
            .service(public_routes(contact_limiter.clone()))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
