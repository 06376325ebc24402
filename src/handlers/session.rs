use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use sqlx::Row;
use uuid::Uuid;

use crate::i18n::{detect_locale, text, Msg};
use crate::models::{SessionInfo, SignInRequest, SignInResponse};
use crate::state::AppState;

const SESSION_TTL_DAYS: i64 = 30;

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

pub async fn sign_in(
    req: HttpRequest,
    data: web::Json<SignInRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let locale = detect_locale(&req);
    let body = data.into_inner();
    let pool = &state.pool;

    let row = sqlx::query("SELECT id, phone, password, role FROM users WHERE email = ? LIMIT 1")
        .bind(&body.email)
        .fetch_optional(pool)
        .await;

    let row = match row {
        Ok(Some(r)) => r,
        _ => {
            return HttpResponse::Ok().json(SignInResponse {
                success: false,
                message: Some(text(locale, Msg::InvalidCredentials).to_string()),
                token: None,
                user_id: None,
                phone: None,
                role: None,
            })
        }
    };

    let hashed = row.get::<String, _>("password");
    if !bcrypt::verify(&body.password, &hashed).unwrap_or(false) {
        return HttpResponse::Ok().json(SignInResponse {
            success: false,
            message: Some(text(locale, Msg::InvalidCredentials).to_string()),
            token: None,
            user_id: None,
            phone: None,
            role: None,
        });
    }

    let user_id = row.get::<String, _>("id");
    let token = Uuid::new_v4().to_string();
    let now = Utc::now();

    if sqlx::query(
        "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&token)
    .bind(&user_id)
    .bind(now.to_rfc3339())
    .bind((now + Duration::days(SESSION_TTL_DAYS)).to_rfc3339())
    .execute(pool)
    .await
    .is_err()
    {
        return HttpResponse::InternalServerError().json(json!({"error": "Database error"}));
    }

    tracing::info!(user_id = %user_id, "session issued");
    HttpResponse::Ok().json(SignInResponse {
        success: true,
        message: Some(text(locale, Msg::SignedIn).to_string()),
        token: Some(token),
        user_id: Some(user_id),
        phone: Some(row.get::<String, _>("phone")),
        role: Some(row.get::<String, _>("role")),
    })
}

pub async fn get_session(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let unauthenticated = SessionInfo {
        authenticated: false,
        user_id: None,
        phone: None,
        role: None,
    };
    let Some(token) = bearer_token(&req) else {
        return HttpResponse::Ok().json(unauthenticated);
    };
    let pool = &state.pool;

    let row = sqlx::query(
        "SELECT s.expires_at, u.id, u.phone, u.role FROM sessions s \
         JOIN users u ON u.id = s.user_id WHERE s.token = ? LIMIT 1",
    )
    .bind(&token)
    .fetch_optional(pool)
    .await;

    let row = match row {
        Ok(Some(r)) => r,
        Ok(None) => return HttpResponse::Ok().json(unauthenticated),
        Err(_) => return HttpResponse::InternalServerError().json(json!({"error": "Database error"})),
    };

    let expired = row
        .get::<Option<String>, _>("expires_at")
        .and_then(|t| DateTime::parse_from_rfc3339(&t).ok())
        .map(|t| t.with_timezone(&Utc) < Utc::now())
        .unwrap_or(false);
    if expired {
        // Expired tokens are reaped on sight.
        let _ = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(&token)
            .execute(pool)
            .await;
        return HttpResponse::Ok().json(unauthenticated);
    }

    HttpResponse::Ok().json(SessionInfo {
        authenticated: true,
        user_id: Some(row.get::<String, _>("id")),
        phone: Some(row.get::<String, _>("phone")),
        role: Some(row.get::<String, _>("role")),
    })
}

pub async fn sign_out(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let locale = detect_locale(&req);
    if let Some(token) = bearer_token(&req) {
        let _ = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(&token)
            .execute(&state.pool)
            .await;
    }
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": text(locale, Msg::SignedOut)
    }))
}
