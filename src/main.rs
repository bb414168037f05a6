use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use arrears_ledger::config::{database::run_migrations, Config, CorsConfig, LogFormat};
use arrears_ledger::middleware::RequestId;

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "arrears_ledger={},actix_web=info,sqlx=warn",
            config.app.log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.app.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn cors(config: &CorsConfig) -> Cors {
    let cors = config
        .allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin));

    cors.allowed_methods(vec!["GET", "POST", "PATCH", "DELETE"])
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("x-school-id"),
            header::HeaderName::from_static("x-acting-user"),
            header::HeaderName::from_static("x-request-id"),
        ])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    init_tracing(&config);

    tracing::info!(
        env = %config.app.env,
        bind_address = %config.server.bind_address(),
        "Starting arrears ledger service"
    );

    let db_pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;

    tracing::info!(
        min_connections = config.database.pool_size,
        max_connections = config.database.max_connections,
        "Database pool initialized"
    );

    if config.database.run_migrations {
        run_migrations(&db_pool)
            .await
            .context("Failed to apply migrations")?;
        tracing::info!("Migrations applied");
    }

    let bind_address = config.server.bind_address();
    let workers = config.server.workers;
    let arrears_config = web::Data::new(config.arrears.clone());
    let cors_config = config.cors.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(cors(&cors_config))
            .wrap(RequestId)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(arrears_config.clone())
            .configure(arrears_ledger::configure)
    })
    .workers(workers)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    tracing::info!(workers, "Server started at http://{}", bind_address);

    server.await.context("Server terminated with an error")
}
