use crate::auth::{TokenIssuer, TokenPair, verify_password};
use crate::db::{CardRepository, CardView, UserRepository, WalletStorage};
use crate::error::WalletError;
use crate::service::validation::{normalize, required};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    pub user_id: String,
    pub username: String,
    pub mail: String,
    pub cards: Vec<CardView>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub tokens: TokenPair,
    pub data: LoginData,
}

pub async fn login(
    storage: &WalletStorage,
    tokens: &TokenIssuer,
    req: LoginRequest,
) -> Result<LoginResponse, WalletError> {
    let (Some(login), Some(password)) = (
        required(req.username.as_deref()),
        required(req.password.as_deref()),
    ) else {
        return Err(WalletError::InvalidInput(
            "Username and password are required",
        ));
    };
    let login = normalize(login);

    let mut conn = storage.acquire().await?;
    let user = conn
        .find_user_by_login(&login)
        .await?
        .ok_or(WalletError::InvalidCredentials("Invalid credentials"))?;
    if !user.confirmed {
        return Err(WalletError::EmailNotConfirmed);
    }
    if !verify_password(password, &user.password_hash).await? {
        return Err(WalletError::InvalidCredentials("Invalid credentials"));
    }

    let cards = conn.list_cards(&user.user_id).await?;
    let pair = tokens.issue_pair(&user.user_id)?;
    info!(user_id = %user.user_id, "user logged in");
    Ok(LoginResponse {
        tokens: pair,
        data: LoginData {
            user_id: user.user_id,
            username: user.username,
            mail: user.email,
            cards: cards.into_iter().map(CardView::from).collect(),
        },
    })
}

/// Mint a new pair from a raw `Authorization` header value.
pub fn refresh(tokens: &TokenIssuer, authorization: Option<&str>) -> Result<TokenPair, WalletError> {
    let token = authorization
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(WalletError::Unauthorized("Token not found in headers"))?;
    let token = token.trim();
    if token.is_empty() {
        return Err(WalletError::RefreshTokenRequired);
    }
    let claims = tokens
        .verify_refresh(token)
        .ok_or(WalletError::InvalidRefreshToken("Invalid or expired refresh token"))?;
    Ok(tokens.issue_pair(&claims.sub)?)
}
