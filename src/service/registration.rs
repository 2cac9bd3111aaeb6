use crate::auth::hash_password;
use crate::config::Config;
use crate::db::{
    DbUser, DbVerification, PublicUser, UserRepository, VerificationRepository, WalletStorage,
};
use crate::error::WalletError;
use crate::mail::{MailSender, OutgoingMail};
use crate::service::validation::{
    is_valid_email, normalize, required, validate_email_len, validate_username,
};
use serde::Deserialize;
use tokio::time::timeout;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub mail: Option<String>,
    pub password: Option<String>,
}

/// Create or re-create an unconfirmed account and mail it a fresh confirmation link.
///
/// Runs in one transaction: the user row, the verification row and the mail
/// dispatch succeed together or nothing is persisted. Password hashing and the
/// mail quota wait happen before the write lock is taken; the delivery itself
/// is bounded by `mail.send_timeout_secs`.
pub async fn register(
    storage: &WalletStorage,
    cfg: &Config,
    mailer: &dyn MailSender,
    req: RegisterRequest,
) -> Result<PublicUser, WalletError> {
    let (Some(username), Some(mail), Some(password)) = (
        required(req.username.as_deref()),
        required(req.mail.as_deref()),
        required(req.password.as_deref()),
    ) else {
        return Err(WalletError::InvalidInput(
            "Username, mail and password are required",
        ));
    };
    let username = normalize(username);
    let email = normalize(mail);
    if !is_valid_email(&email) {
        return Err(WalletError::InvalidEmail);
    }
    validate_username(&username)?;
    validate_email_len(&email)?;

    let password_hash = hash_password(password).await?;
    mailer.ready().await;

    let mut tx = storage.begin_write().await?;

    let by_username = tx.find_user_by_username(&username).await?;
    let by_email = tx.find_user_by_email(&email).await?;
    if let (Some(a), Some(b)) = (&by_username, &by_email)
        && a.user_id != b.user_id
    {
        return Err(WalletError::CredentialsConflict);
    }
    let existing = by_username.or(by_email);
    if existing.as_ref().is_some_and(|u| u.confirmed) {
        return Err(WalletError::UserAlreadyConfirmed);
    }

    let user = match existing {
        Some(mut user) => {
            user.username = username;
            user.email = email;
            user.password_hash = password_hash;
            user.created_at = chrono::Utc::now();
            tx.update_user_credentials(&user).await?;
            let stale = tx.delete_verifications_for_user(&user.user_id).await?;
            info!(user_id = %user.user_id, stale, "re-registering unconfirmed user");
            user
        }
        None => {
            let user = DbUser::new(username, email, password_hash);
            tx.insert_user(&user).await?;
            info!(user_id = %user.user_id, "registered new user");
            user
        }
    };

    let verification = DbVerification::issue(&user.user_id, cfg.verification_ttl());
    tx.insert_verification(&verification).await?;

    let link = cfg.confirmation_link(&user.user_id, &verification.token);
    let mail = OutgoingMail::confirmation(&user.email, &user.username, &link);
    timeout(cfg.mail_send_timeout(), mailer.send(&mail))
        .await
        .map_err(|_| WalletError::MailDelivery("mail delivery timed out".to_string()))??;

    tx.commit().await?;
    Ok(user.into())
}
