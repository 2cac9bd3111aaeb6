use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};

use crate::error::WalletError;
use crate::router::AppState;

/// Acting user resolved from `Authorization: Bearer <accessToken>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = WalletError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| WalletError::Unauthorized("Token not found in headers"))?;
        let claims = state
            .tokens
            .verify_access(bearer.token())
            .ok_or(WalletError::Unauthorized("Invalid or expired token"))?;
        Ok(Self {
            user_id: claims.sub,
        })
    }
}
