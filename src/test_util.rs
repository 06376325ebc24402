//! Shared fixtures for handler tests: a throwaway SQLite file per test and
//! an app wired with the full route table in development mode.

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, Error};
use sqlx::SqlitePool;
use std::path::PathBuf;
use uuid::Uuid;

use crate::db;
use crate::routes;
use crate::state::{AppState, RuntimeEnv};

pub struct TestDb {
    pub pool: SqlitePool,
    path: PathBuf,
}

impl TestDb {
    pub async fn new() -> Self {
        let path = std::env::temp_dir().join(format!("mall-auth-test-{}.db", Uuid::new_v4()));
        let pool = db::init_pool(&format!("sqlite://{}", path.display()))
            .await
            .expect("test pool");
        TestDb { pool, path }
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

pub async fn test_app(
    db: &TestDb,
) -> impl Service<Request, Response = ServiceResponse, Error = Error> {
    let state = web::Data::new(AppState::new(db.pool.clone(), RuntimeEnv::Development, None));
    test::init_service(App::new().app_data(state).configure(routes)).await
}
