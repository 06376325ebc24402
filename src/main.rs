use actix_web::middleware::NormalizePath;
use actix_web::{web, App, HttpServer};
use actix_cors::Cors;
use tracing_subscriber::EnvFilter;

use mall_auth::services::sms::SmsGateway;
use mall_auth::state::{AppState, RuntimeEnv};
use mall_auth::{db, routes};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .unwrap_or(8080);
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://mall-auth.db".to_string());
    let env = RuntimeEnv::from_env();

    let sms = match env {
        RuntimeEnv::Production => Some(
            SmsGateway::from_env()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?,
        ),
        RuntimeEnv::Development => {
            tracing::info!("development mode: OTP codes are echoed in responses");
            None
        }
    };

    let pool = db::init_pool(&database_url)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let app_state = web::Data::new(AppState::new(pool, env, sms));

    tracing::info!(port, ?env, "starting directory service");
    HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::trim())
            .wrap(Cors::permissive())
            .app_data(app_state.clone())
            .configure(routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
