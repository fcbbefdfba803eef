use actix_files::Files;
use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;

use attendance_tracker::config::Config;
use attendance_tracker::db;
use attendance_tracker::docs::ApiDoc;
use attendance_tracker::routes;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

fn init_tracing(log_dir: &Path, level: tracing::Level) -> WorkerGuard {
    // Rolling daily log
    let file_appender = rolling::daily(log_dir, "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    guard
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // dropping the guard flushes the log, keep it for the life of main
    let _guard = init_tracing(&config.log_dir, config.log_level);

    info!(addr = %config.server_addr, "Server starting...");

    let pool = db::init_db(&config).await?;
    db::run_migrations(&pool).await?;
    db::bootstrap_admin(&pool, &config).await?;

    std::fs::create_dir_all(&config.upload_dir).with_context(|| {
        format!("Failed to create upload directory {}", config.upload_dir.display())
    })?;

    let limits = Arc::new(routes::build_limits(&config)?);
    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(routes::cors(&config))
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .service(Files::new("/uploads", &config.upload_dir))
            .configure(|cfg| routes::configure(cfg, &config.api_prefix, &limits))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
