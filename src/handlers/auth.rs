use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde_json::json;
use sqlx::Row;
use uuid::Uuid;

use crate::i18n::{detect_locale, text, Locale, Msg};
use crate::models::{
    AckResponse, AuthenticateRequest, AuthenticateResponse, CreateUserRequest, OtpPurpose,
    Profile, SendOtpRequest, SendOtpResponse, User, VerifyOtpRequest,
};
use crate::state::{AppState, RuntimeEnv};

const OTP_TTL_MINUTES: i64 = 5;
const MAX_VERIFY_ATTEMPTS: i64 = 5;
// A consumed registration code stays usable for account creation this long,
// so a failed create-user can be retried without a fresh send_otp.
const CREATE_WINDOW_MINUTES: i64 = 10;

fn fail(locale: Locale, msg: Msg) -> HttpResponse {
    HttpResponse::Ok().json(AckResponse {
        success: false,
        message: Some(text(locale, msg).to_string()),
    })
}

fn ok(locale: Locale, msg: Msg) -> HttpResponse {
    HttpResponse::Ok().json(AckResponse {
        success: true,
        message: Some(text(locale, msg).to_string()),
    })
}

fn digits_only(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub async fn send_otp(
    req: HttpRequest,
    data: web::Json<SendOtpRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let locale = detect_locale(&req);
    let body = data.into_inner();
    let pool = &state.pool;

    if digits_only(&body.phone_number).len() < 10 {
        return fail(locale, Msg::InvalidPhone);
    }

    let code = format!("{:06}", rand::rng().random_range(0..1_000_000u32));
    let now = Utc::now();

    // A fresh code supersedes any pending one for the same phone and purpose.
    if sqlx::query("UPDATE otp_codes SET consumed = 1 WHERE phone = ? AND purpose = ? AND consumed = 0")
        .bind(&body.phone_number)
        .bind(body.purpose.as_str())
        .execute(pool)
        .await
        .is_err()
    {
        return HttpResponse::InternalServerError().json(json!({"error": "Database error"}));
    }

    if sqlx::query(
        "INSERT INTO otp_codes (id, phone, code, purpose, created_at, expires_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&body.phone_number)
    .bind(&code)
    .bind(body.purpose.as_str())
    .bind(now.to_rfc3339())
    .bind((now + Duration::minutes(OTP_TTL_MINUTES)).to_rfc3339())
    .execute(pool)
    .await
    .is_err()
    {
        return HttpResponse::InternalServerError().json(json!({"error": "Database error"}));
    }

    let echoed = match state.env {
        RuntimeEnv::Development => Some(code),
        RuntimeEnv::Production => {
            let Some(sms) = state.sms.as_ref() else {
                tracing::error!("SMS gateway not configured in production");
                return fail(locale, Msg::OtpSendFailed);
            };
            if let Err(e) = sms.send_otp(&body.phone_number, &code).await {
                tracing::error!(phone = %body.phone_number, error = %e, "OTP dispatch failed");
                return fail(locale, Msg::OtpSendFailed);
            }
            None
        }
    };

    tracing::info!(phone = %body.phone_number, purpose = body.purpose.as_str(), "OTP issued");
    HttpResponse::Ok().json(SendOtpResponse {
        success: true,
        message: Some(text(locale, Msg::OtpSent).to_string()),
        otp_code: echoed,
    })
}

pub async fn verify_otp(
    req: HttpRequest,
    data: web::Json<VerifyOtpRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let locale = detect_locale(&req);
    let body = data.into_inner();
    let pool = &state.pool;

    let row = sqlx::query(
        "SELECT id, code, attempts, expires_at FROM otp_codes \
         WHERE phone = ? AND purpose = ? AND consumed = 0 \
         ORDER BY datetime(created_at) DESC LIMIT 1",
    )
    .bind(&body.phone_number)
    .bind(body.purpose.as_str())
    .fetch_optional(pool)
    .await;

    let row = match row {
        Ok(Some(r)) => r,
        Ok(None) => return fail(locale, Msg::InvalidOtp),
        Err(_) => return HttpResponse::InternalServerError().json(json!({"error": "Database error"})),
    };

    let id = row.get::<String, _>("id");
    let code = row.get::<String, _>("code");
    let attempts = row.get::<i64, _>("attempts");
    let expires_at = row.get::<String, _>("expires_at");

    let expired = DateTime::parse_from_rfc3339(&expires_at)
        .map(|t| t.with_timezone(&Utc) < Utc::now())
        .unwrap_or(true);
    if expired {
        let _ = sqlx::query("UPDATE otp_codes SET consumed = 1 WHERE id = ?")
            .bind(&id)
            .execute(pool)
            .await;
        return fail(locale, Msg::OtpExpired);
    }

    if code != body.otp_code {
        let exhausted = attempts + 1 >= MAX_VERIFY_ATTEMPTS;
        let _ = sqlx::query(
            "UPDATE otp_codes SET attempts = attempts + 1, consumed = ? WHERE id = ? AND consumed = 0",
        )
        .bind(exhausted as i64)
        .bind(&id)
        .execute(pool)
        .await;
        return if exhausted {
            fail(locale, Msg::TooManyAttempts)
        } else {
            fail(locale, Msg::InvalidOtp)
        };
    }

    // Single use: the consume is conditional on `consumed = 0` so that of
    // two racing verifies, exactly one wins; the loser sees zero rows.
    let consumed = sqlx::query(
        "UPDATE otp_codes SET consumed = 1, consumed_at = ? WHERE id = ? AND consumed = 0",
    )
    .bind(Utc::now().to_rfc3339())
    .bind(&id)
    .execute(pool)
    .await;
    match consumed {
        Ok(result) if result.rows_affected() == 1 => {}
        Ok(_) => return fail(locale, Msg::InvalidOtp),
        Err(_) => return HttpResponse::InternalServerError().json(json!({"error": "Database error"})),
    }

    tracing::info!(phone = %body.phone_number, purpose = body.purpose.as_str(), "OTP verified");
    ok(locale, Msg::OtpVerified)
}

pub async fn create_user_after_otp(
    req: HttpRequest,
    data: web::Json<CreateUserRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let locale = detect_locale(&req);
    let body = data.into_inner();
    let pool = &state.pool;

    let cutoff = (Utc::now() - Duration::minutes(CREATE_WINDOW_MINUTES)).to_rfc3339();
    let verified = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(1) FROM otp_codes \
         WHERE phone = ? AND purpose = 'registration' AND consumed = 1 \
         AND consumed_at IS NOT NULL AND consumed_at >= ?",
    )
    .bind(&body.phone_number)
    .bind(&cutoff)
    .fetch_one(pool)
    .await;

    match verified {
        Ok(n) if n > 0 => {}
        Ok(_) => return fail(locale, Msg::VerificationRequired),
        Err(_) => return HttpResponse::InternalServerError().json(json!({"error": "Database error"})),
    }

    if let Ok(existing) = sqlx::query_scalar::<_, i64>("SELECT COUNT(1) FROM users WHERE phone = ?")
        .bind(&body.phone_number)
        .fetch_one(pool)
        .await
    {
        if existing > 0 {
            return fail(locale, Msg::AccountExists);
        }
    }

    let hashed_password = match bcrypt::hash(&body.password, bcrypt::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(_) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": "Password hashing failed"}))
        }
    };

    let user = User {
        id: Uuid::new_v4().to_string(),
        phone: body.phone_number.clone(),
        email: format!("{}@phone.mall.local", digits_only(&body.phone_number)),
        password: hashed_password,
        role: "user".to_string(),
        balance: 0.0,
        invitation_code: body.invitation_code.clone(),
        created_at: Utc::now().to_rfc3339(),
    };
    let profile = Profile {
        id: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        nickname: None,
        contact_email: None,
        wechat: None,
        created_at: user.created_at.clone(),
    };

    let mut tx = match pool.begin().await {
        Ok(tx) => tx,
        Err(_) => return HttpResponse::InternalServerError().json(json!({"error": "Database error"})),
    };

    let user_insert = sqlx::query(
        "INSERT INTO users (id, phone, email, password, role, balance, invitation_code, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.phone)
    .bind(&user.email)
    .bind(&user.password)
    .bind(&user.role)
    .bind(user.balance)
    .bind(&user.invitation_code)
    .bind(&user.created_at)
    .execute(&mut tx)
    .await;

    let profile_insert = sqlx::query(
        "INSERT INTO profiles (id, user_id, nickname, contact_email, wechat, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&profile.id)
    .bind(&profile.user_id)
    .bind(&profile.nickname)
    .bind(&profile.contact_email)
    .bind(&profile.wechat)
    .bind(&profile.created_at)
    .execute(&mut tx)
    .await;

    if user_insert.is_err() || profile_insert.is_err() || tx.commit().await.is_err() {
        return fail(locale, Msg::AccountCreateFailed);
    }

    tracing::info!(user_id = %user.id, "user created after OTP");
    ok(locale, Msg::AccountCreated)
}

pub async fn authenticate_user(
    req: HttpRequest,
    data: web::Json<AuthenticateRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let locale = detect_locale(&req);
    let body = data.into_inner();
    let pool = &state.pool;

    let row = sqlx::query("SELECT id, email, password FROM users WHERE phone = ? LIMIT 1")
        .bind(&body.phone_number)
        .fetch_optional(pool)
        .await;

    let row = match row {
        Ok(Some(r)) => r,
        _ => {
            return HttpResponse::Ok().json(AuthenticateResponse {
                success: false,
                message: Some(text(locale, Msg::InvalidCredentials).to_string()),
                email: None,
                user_id: None,
            })
        }
    };

    let hashed = row.get::<String, _>("password");
    let is_valid = bcrypt::verify(&body.password, &hashed).unwrap_or(false);
    if !is_valid {
        return HttpResponse::Ok().json(AuthenticateResponse {
            success: false,
            message: Some(text(locale, Msg::InvalidCredentials).to_string()),
            email: None,
            user_id: None,
        });
    }

    HttpResponse::Ok().json(AuthenticateResponse {
        success: true,
        message: None,
        email: Some(row.get::<String, _>("email")),
        user_id: Some(row.get::<String, _>("id")),
    })
}
