//! Admin role management commands.
//!
//! # Usage
//!
//! ```bash
//! medbasket-cli admin promote -p +919876543210
//! medbasket-cli admin demote -p +919876543210
//! ```
//!
//! The first admin has to be promoted here; after that, further promotions
//! can also happen through the dashboard.

use medbasket_core::{PhoneNumber, Role};

use super::CommandError;

/// Set a user's role, looked up by phone number.
///
/// # Errors
///
/// Returns `CommandError::Invalid` if the phone number doesn't parse or no
/// user has it.
pub async fn set_role(phone: &str, role: Role) -> Result<(), CommandError> {
    let phone = PhoneNumber::parse(phone)
        .map_err(|e| CommandError::Invalid(format!("invalid phone number: {e}")))?;

    let pool = super::connect().await?;

    let result = sqlx::query("UPDATE users SET role = $2, updated_at = now() WHERE phone = $1")
        .bind(&phone)
        .bind(role.to_string())
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CommandError::Invalid(format!(
            "no user with phone number {phone}"
        )));
    }

    tracing::info!("{phone} is now {role}");
    Ok(())
}
