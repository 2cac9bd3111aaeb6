use crate::db::{UserRepository, VerificationRepository, WalletStorage};
use crate::error::WalletError;
use crate::service::validation::is_valid_uuid;
use chrono::Utc;
use subtle::ConstantTimeEq;
use tracing::info;

/// Consume the verification token of `user_id` and mark the account confirmed.
pub async fn confirm_email(
    storage: &WalletStorage,
    user_id: &str,
    token: Option<&str>,
) -> Result<(), WalletError> {
    if !is_valid_uuid(user_id) {
        return Err(WalletError::InvalidUserId);
    }
    // `?token=` carries no value at all, same as an absent parameter
    let token = token
        .filter(|t| !t.is_empty())
        .ok_or(WalletError::InvalidInput("Token is required"))?;
    if token.trim().is_empty() {
        return Err(WalletError::InvalidToken("Token cannot be empty"));
    }

    let mut tx = storage.begin_write().await?;
    if tx.find_user_by_id(user_id).await?.is_none() {
        return Err(WalletError::UserNotFound);
    }
    let verification = tx
        .find_pending_verification(user_id)
        .await?
        .ok_or(WalletError::TokenNotFound)?;
    if verification.is_expired_at(Utc::now()) {
        return Err(WalletError::TokenExpired);
    }
    let matches: bool = verification
        .token
        .as_bytes()
        .ct_eq(token.as_bytes())
        .into();
    if !matches {
        return Err(WalletError::InvalidToken("Invalid verification token"));
    }

    tx.set_user_confirmed(user_id).await?;
    tx.delete_verifications_for_user(user_id).await?;
    tx.commit().await?;
    info!(user_id, "email confirmed");
    Ok(())
}
