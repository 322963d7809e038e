/// Blog Service - HTTP Server
///
/// Serves the EchoDraft post feed, editor writes, reactions, reviews and
/// OTP signup behind cookie sessions.
use actix_cors::Cors;
use actix_web::{http::header, App, HttpServer};
use blog_service::config::Config;
use blog_service::middleware::CookieSettings;
use blog_service::services::{EmailService, S3MediaStore};
use blog_service::{configure, db, metrics, AppState};
use crypto_core::jwt;
use s3_utils::{S3Config, S3Operations};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PENDING_SIGNUP_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    tracing::error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{context}: {err}"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env().map_err(|e| startup_error("Configuration error", e))?;
    tracing::info!(env = %config.app.env, "Starting blog-service");

    jwt::initialize_jwt_keys(&config.jwt.private_key_pem, &config.jwt.public_key_pem)
        .map_err(|e| startup_error("Failed to initialize JWT keys", e))?;
    metrics::init_metrics();

    let pool = db::create_pool(&config.database)
        .await
        .map_err(|e| startup_error("Failed to connect to database", e))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| startup_error("Failed to run migrations", e))?;
    tracing::info!("Database migrations applied");

    let s3_config = S3Config::from_env().map_err(|e| startup_error("Invalid S3 configuration", e))?;
    tracing::info!(bucket = %s3_config.bucket, region = %s3_config.region, "Media storage configured");
    let s3 = S3Operations::connect(s3_config).await;
    if let Err(e) = s3.health_check().await {
        tracing::warn!("S3 health check failed; uploads may fail: {}", e);
    }
    let media_store = Arc::new(S3MediaStore::new(s3, config.media.folder.clone()));

    let email = EmailService::new(&config.email)
        .map_err(|e| startup_error("Invalid email configuration", e))?
        .with_code_logging(!config.app.is_production());
    if !email.is_enabled() && config.app.is_production() {
        tracing::warn!("Email delivery disabled in production; signups cannot be verified");
    }
    let cookies = CookieSettings::from_secret(
        config.session.cookie_secret.as_deref(),
        config.session.cookie_secure,
    )
    .map_err(|e| startup_error("Invalid session configuration", e))?;

    let state = AppState::new(
        pool.clone(),
        media_store,
        email,
        cookies,
        config.media.clone(),
        config.email.otp_ttl_minutes,
    );

    let purge_auth = state.auth.clone();
    let purge_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PENDING_SIGNUP_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            match purge_auth.purge_expired_signups().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "Purged expired pending signups"),
                Err(e) => tracing::warn!("Pending signup purge failed: {}", e),
            }
        }
    });

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Blog service listening on {}", bind_address);

    let cors_origins: Vec<String> = config.cors.origins().into_iter().map(String::from).collect();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in &cors_origins {
            cors = cors.allowed_origin(origin);
        }
        let cors = cors
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(|cfg| configure(cfg, &state))
    })
    .bind(&bind_address)?
    .disable_signals()
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let result = tokio::select! {
        result = server_task => match result {
            Ok(result) => result,
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
        },
        _ = &mut shutdown => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
            Ok(())
        }
    };

    purge_task.abort();
    pool.close().await;
    tracing::info!("Blog-service shutting down");
    result
}
