use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::json;

use crate::auth::TokenPair;
use crate::error::WalletError;
use crate::handlers::accept::{ConfirmFormat, negotiate};
use crate::mail::templates::CONFIRMED_PAGE_HTML;
use crate::middleware::AuthUser;
use crate::router::AppState;
use crate::service::account::{
    self, ChangePasswordRequest, DeleteAccountRequest, PasswordChanged,
};
use crate::service::authentication::{self, LoginRequest, LoginResponse};
use crate::service::confirmation;
use crate::service::registration::{self, RegisterRequest};

type JsonBody<T> = WithRejection<Json<T>, WalletError>;

pub async fn register_handler(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<RegisterRequest>,
) -> Result<Response, WalletError> {
    let user =
        registration::register(&state.storage, &state.config, state.mailer.as_ref(), req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "user": user }))).into_response())
}

pub async fn login_handler(
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, WalletError> {
    let resp = authentication::login(&state.storage, &state.tokens, req).await?;
    Ok(Json(resp))
}

pub async fn refresh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenPair>, WalletError> {
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let pair = authentication::refresh(&state.tokens, authorization)?;
    Ok(Json(pair))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    pub token: Option<String>,
}

pub async fn confirm_email_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ConfirmQuery>,
    headers: HeaderMap,
) -> Result<Response, WalletError> {
    // Negotiate before consuming the token so a 406 leaves it usable.
    let format = negotiate(&headers)?;
    confirmation::confirm_email(&state.storage, &user_id, query.token.as_deref()).await?;
    Ok(match format {
        ConfirmFormat::Json => {
            Json(json!({ "message": "Email successfully confirmed" })).into_response()
        }
        ConfirmFormat::Html => Html(CONFIRMED_PAGE_HTML).into_response(),
    })
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
    WithRejection(Json(req), _): JsonBody<DeleteAccountRequest>,
) -> Result<Json<serde_json::Value>, WalletError> {
    account::delete_account(&state.storage, &auth.user_id, &user_id, req).await?;
    Ok(Json(json!({ "message": "User successfully deleted" })))
}

pub async fn change_password_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
    WithRejection(Json(req), _): JsonBody<ChangePasswordRequest>,
) -> Result<Json<PasswordChanged>, WalletError> {
    let changed = account::change_password(&state.storage, &auth.user_id, &user_id, req).await?;
    Ok(Json(changed))
}
