//! Authentication extractors.
//!
//! The session JWT travels in an HttpOnly cookie named [`TOKEN_COOKIE`].
//! Handlers declare what they need in their signature:
//!
//! ```rust,ignore
//! async fn my_orders(RequireAuth(user): RequireAuth, ...) -> Result<...> {
//!     // user.id is a verified UserId
//! }
//!
//! async fn delete_coupon(RequireAdmin(admin): RequireAdmin, ...) -> Result<...> {
//!     // admin.role is guaranteed to be Role::Admin
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use medbasket_core::{Role, UserId};

use crate::error::AppError;
use crate::services::auth::{AuthError, Claims};
use crate::state::AppState;

/// Name of the session cookie.
pub const TOKEN_COOKIE: &str = "token";

/// The authenticated caller, as carried in verified token claims.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub role: Role,
    pub phone: String,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: UserId::new(claims.sub),
            role: claims.role,
            phone: claims.phone,
        }
    }
}

impl CurrentUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

fn verify_from_parts(parts: &Parts, state: &AppState) -> Result<CurrentUser, AuthError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let token = jar.get(TOKEN_COOKIE).ok_or(AuthError::MissingToken)?;
    let claims = state.auth().verify(token.value())?;
    Ok(claims.into())
}

/// Extractor that requires a valid session.
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = verify_from_parts(parts, state)?;
        Ok(Self(user))
    }
}

/// Extractor that requires a valid session with the admin role.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = verify_from_parts(parts, state)?;
        if !user.is_admin() {
            return Err(AppError::Forbidden("admin access required".to_string()));
        }
        Ok(Self(user))
    }
}

/// Extractor that reads the session if present but never rejects.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(verify_from_parts(parts, state).ok()))
    }
}
