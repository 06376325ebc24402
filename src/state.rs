use sqlx::SqlitePool;

use crate::services::sms::SmsGateway;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuntimeEnv {
    Development,
    Production,
}

impl RuntimeEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => RuntimeEnv::Production,
            _ => RuntimeEnv::Development,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub env: RuntimeEnv,
    pub sms: Option<SmsGateway>,
}

impl AppState {
    pub fn new(pool: SqlitePool, env: RuntimeEnv, sms: Option<SmsGateway>) -> Self {
        Self { pool, env, sms }
    }
}
