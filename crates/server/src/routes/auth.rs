//! Auth route handlers: OTP login and session management.
//!
//! Login responses are identical whether or not the phone number is
//! registered; account creation happens lazily on first successful OTP
//! verification.

use axum::{Json, extract::State};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use medbasket_core::PhoneNumber;

use crate::db::UserRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, TOKEN_COOKIE};
use crate::services::auth::{self, AuthError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SendOtpRequest {
    pub phone: String,
}

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub phone: String,
    pub code: String,
    /// Display name, used only when the account is created on first login.
    pub name: Option<String>,
}

fn parse_phone(raw: &str) -> Result<PhoneNumber> {
    PhoneNumber::parse(raw).map_err(|e| AppError::Validation(format!("invalid phone number: {e}")))
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

/// POST /auth/otp/send
#[instrument(skip(state, body))]
pub async fn send_otp(
    State(state): State<AppState>,
    Json(body): Json<SendOtpRequest>,
) -> Result<Json<Value>> {
    let phone = parse_phone(&body.phone)?;

    let code = auth::generate_otp();
    let code_hash = auth::hash_otp(&phone.to_string(), &code);
    let expires_at = Utc::now() + auth::otp_ttl();

    UserRepository::new(state.pool())
        .create_otp(&phone, &code_hash, expires_at)
        .await?;

    state.sms().send_otp(&phone, &code).await?;

    Ok(Json(json!({ "success": true, "message": "OTP sent" })))
}

/// POST /auth/otp/verify
#[instrument(skip(state, body))]
pub async fn verify_otp(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<(CookieJar, Json<Value>)> {
    let phone = parse_phone(&body.phone)?;
    let users = UserRepository::new(state.pool());

    let otp = users
        .latest_otp(&phone)
        .await?
        .ok_or(AppError::Auth(AuthError::OtpNotFound))?;

    // Count the attempt before comparing, so parallel guesses all count
    let attempts = users.record_otp_attempt(otp.id).await?;
    auth::check_otp(&otp, &body.code, attempts, Utc::now())?;
    users.consume_otp(otp.id).await?;

    let user = match users.get_by_phone(&phone).await? {
        Some(user) => user,
        None => users.create(&phone, body.name.as_deref()).await?,
    };

    let token = state.auth().issue(&user)?;
    set_sentry_user(&user.id, Some(&user.phone.to_string()));
    tracing::info!(user_id = %user.id, "login verified");

    Ok((
        jar.add(session_cookie(token)),
        Json(json!({ "success": true, "user": user })),
    ))
}

/// POST /auth/logout
#[instrument(skip_all)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    clear_sentry_user();
    (
        jar.remove(Cookie::build(TOKEN_COOKIE).path("/").build()),
        Json(json!({ "success": true })),
    )
}

/// GET /auth/me
#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<Value>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_string()))?;

    Ok(Json(json!({ "success": true, "user": user })))
}
