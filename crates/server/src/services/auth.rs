//! OTP login and session tokens.
//!
//! Login is passwordless: a 6-digit OTP is texted to the phone number, its
//! SHA-256 hash is stored, and a correct verification mints a signed JWT
//! that travels in an HttpOnly `token` cookie.
//!
//! OTP hashes bind the phone number, so a code issued for one number can
//! never verify against another.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use medbasket_core::Role;

use crate::db::users::OtpCode;
use crate::models::User;

/// How long an OTP stays valid, in minutes.
pub const OTP_TTL_MINUTES: i64 = 5;

/// How long an OTP stays valid.
#[must_use]
pub fn otp_ttl() -> Duration {
    Duration::minutes(OTP_TTL_MINUTES)
}

/// Wrong guesses allowed before the OTP is burned.
pub const MAX_OTP_ATTEMPTS: i32 = 5;

/// Errors from OTP verification or token handling.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The submitted code doesn't match.
    #[error("invalid OTP")]
    OtpInvalid,

    /// The OTP's validity window has passed.
    #[error("OTP expired")]
    OtpExpired,

    /// No pending OTP for this phone number.
    #[error("no OTP pending")]
    OtpNotFound,

    /// The attempt counter ran out.
    #[error("too many OTP attempts")]
    OtpTooManyAttempts,

    /// No `token` cookie on the request.
    #[error("missing token")]
    MissingToken,

    /// The token failed signature or claims validation.
    #[error("invalid token")]
    InvalidToken,

    /// The token's `exp` has passed.
    #[error("expired token")]
    ExpiredToken,

    /// Signing a new token failed.
    #[error("token encoding failed: {0}")]
    TokenEncoding(#[from] jsonwebtoken::errors::Error),
}

/// Claims carried in the session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i32,
    pub role: Role,
    pub phone: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies session tokens.
pub struct AuthService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl AuthService {
    #[must_use]
    pub fn new(secret: &SecretString, ttl_minutes: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Sign a session token for the user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEncoding` if signing fails.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.as_i32(),
            role: user.role,
            phone: user.phone.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ExpiredToken` or `AuthError::InvalidToken`.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })
    }

}

/// Generate a random 6-digit OTP.
#[must_use]
pub fn generate_otp() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}

/// Hash an OTP for storage, bound to the phone number it was issued for.
#[must_use]
pub fn hash_otp(phone: &str, code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(phone.as_bytes());
    hasher.update(b":");
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a submitted code against a stored OTP row.
///
/// `attempts` is the counter value after recording this attempt; the caller
/// increments it in the database first so parallel guesses all count.
///
/// # Errors
///
/// Returns the [`AuthError`] describing why verification failed.
pub fn check_otp(
    otp: &OtpCode,
    submitted: &str,
    attempts: i32,
    now: DateTime<Utc>,
) -> Result<(), AuthError> {
    if otp.consumed {
        return Err(AuthError::OtpNotFound);
    }
    if now >= otp.expires_at {
        return Err(AuthError::OtpExpired);
    }
    if attempts > MAX_OTP_ATTEMPTS {
        return Err(AuthError::OtpTooManyAttempts);
    }
    if otp.code_hash != hash_otp(&otp.phone, submitted) {
        return Err(AuthError::OtpInvalid);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use medbasket_core::{PhoneNumber, UserId};

    fn otp_row(code: &str) -> OtpCode {
        let phone = "+919876543210";
        OtpCode {
            id: 1,
            phone: phone.to_string(),
            code_hash: hash_otp(phone, code),
            attempts: 0,
            consumed: false,
            expires_at: Utc::now() + otp_ttl(),
            created_at: Utc::now(),
        }
    }

    fn user() -> User {
        User {
            id: UserId::new(42),
            phone: PhoneNumber::parse("+919876543210").unwrap(),
            name: Some("Asha".to_string()),
            role: Role::Customer,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_generate_otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_correct_code_verifies() {
        let otp = otp_row("123456");
        assert!(check_otp(&otp, "123456", 1, Utc::now()).is_ok());
    }

    #[test]
    fn test_wrong_code_rejected() {
        let otp = otp_row("123456");
        let err = check_otp(&otp, "654321", 1, Utc::now()).unwrap_err();
        assert!(matches!(err, AuthError::OtpInvalid));
    }

    #[test]
    fn test_expired_code_rejected() {
        let mut otp = otp_row("123456");
        otp.expires_at = Utc::now() - Duration::minutes(1);
        let err = check_otp(&otp, "123456", 1, Utc::now()).unwrap_err();
        assert!(matches!(err, AuthError::OtpExpired));
    }

    #[test]
    fn test_attempts_exhausted() {
        let otp = otp_row("123456");
        let err = check_otp(&otp, "123456", MAX_OTP_ATTEMPTS + 1, Utc::now()).unwrap_err();
        assert!(matches!(err, AuthError::OtpTooManyAttempts));
    }

    #[test]
    fn test_consumed_code_rejected() {
        let mut otp = otp_row("123456");
        otp.consumed = true;
        let err = check_otp(&otp, "123456", 1, Utc::now()).unwrap_err();
        assert!(matches!(err, AuthError::OtpNotFound));
    }

    #[test]
    fn test_hash_binds_phone_number() {
        assert_ne!(hash_otp("911234567890", "123456"), hash_otp("911234567891", "123456"));
    }

    #[test]
    fn test_token_round_trip() {
        let secret = SecretString::from("a-sufficiently-long-signing-secret-for-tests");
        let service = AuthService::new(&secret, 60);
        let token = service.issue(&user()).unwrap();
        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Customer);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let secret = SecretString::from("a-sufficiently-long-signing-secret-for-tests");
        let service = AuthService::new(&secret, 60);
        let mut token = service.issue(&user()).unwrap();
        token.push('x');
        assert!(matches!(service.verify(&token), Err(AuthError::InvalidToken)));
    }
}
