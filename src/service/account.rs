use crate::auth::{hash_password, verify_password};
use crate::db::{UserRepository, WalletStorage};
use crate::error::WalletError;
use crate::service::validation::{is_valid_uuid, required};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct DeleteAccountRequest {
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(rename = "oldPassword")]
    pub old_password: Option<String>,
    #[serde(rename = "newPassword")]
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PasswordChanged {
    pub code: &'static str,
    pub message: &'static str,
}

fn ensure_subject(subject: &str, user_id: &str) -> Result<(), WalletError> {
    if subject != user_id {
        return Err(WalletError::Unauthorized("Token does not match the requested user"));
    }
    Ok(())
}

/// Delete the account of `user_id` after re-checking its password.
/// Verification rows and cards go with it through the cascade.
pub async fn delete_account(
    storage: &WalletStorage,
    subject: &str,
    user_id: &str,
    req: DeleteAccountRequest,
) -> Result<(), WalletError> {
    if !is_valid_uuid(user_id) {
        return Err(WalletError::InvalidUuidFormat("Invalid userId format"));
    }
    ensure_subject(subject, user_id)?;
    let password = required(req.password.as_deref())
        .ok_or(WalletError::InvalidInput("Password is required"))?;

    let mut tx = storage.begin_write().await?;
    let user = tx
        .find_user_by_id(user_id)
        .await?
        .ok_or(WalletError::UserNotFound)?;
    if !verify_password(password, &user.password_hash).await? {
        return Err(WalletError::InvalidCredentials("Invalid password"));
    }
    tx.delete_user(user_id).await?;
    tx.commit().await?;
    info!(user_id, "user deleted");
    Ok(())
}

pub async fn change_password(
    storage: &WalletStorage,
    subject: &str,
    user_id: &str,
    req: ChangePasswordRequest,
) -> Result<PasswordChanged, WalletError> {
    if !is_valid_uuid(user_id) {
        return Err(WalletError::InvalidUserId);
    }
    ensure_subject(subject, user_id)?;
    let (Some(old_password), Some(new_password)) = (
        required(req.old_password.as_deref()),
        required(req.new_password.as_deref()),
    ) else {
        return Err(WalletError::InvalidInput(
            "oldPassword and newPassword are required",
        ));
    };

    let mut tx = storage.begin_write().await?;
    let user = tx
        .find_user_by_id(user_id)
        .await?
        .ok_or(WalletError::UserNotFound)?;
    if !verify_password(old_password, &user.password_hash).await? {
        return Err(WalletError::InvalidOldPassword);
    }
    let hash = hash_password(new_password).await?;
    tx.update_password_hash(user_id, &hash).await?;
    tx.commit().await?;
    info!(user_id, "password changed");
    Ok(PasswordChanged {
        code: "PASSWORD_CHANGED",
        message: "Password changed successfully",
    })
}
