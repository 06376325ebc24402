pub mod client;
pub mod db;
pub mod handlers;
pub mod i18n;
pub mod models;
pub mod services;
pub mod state;

#[cfg(test)]
pub(crate) mod test_util;

use actix_web::web;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_check))
        .route("/api/auth/send-otp", web::post().to(handlers::auth::send_otp))
        .route("/api/auth/verify-otp", web::post().to(handlers::auth::verify_otp))
        .route("/api/auth/create-user", web::post().to(handlers::auth::create_user_after_otp))
        .route("/api/auth/authenticate", web::post().to(handlers::auth::authenticate_user))
        .route("/api/auth/sign-in", web::post().to(handlers::session::sign_in))
        .route("/api/auth/session", web::get().to(handlers::session::get_session))
        .route("/api/auth/session", web::delete().to(handlers::session::sign_out));
}
