use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use serde_json::{Value, json};

use crate::error::WalletError;
use crate::middleware::AuthUser;
use crate::router::AppState;
use crate::service::cards::{self, CardInput};

pub async fn list_cards_handler(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, WalletError> {
    let cards = cards::list_cards(&state.storage, &auth.user_id).await?;
    Ok(Json(json!({ "user_id": auth.user_id, "cards": cards })))
}

pub async fn create_card_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Json(input), _): WithRejection<Json<CardInput>, WalletError>,
) -> Result<Response, WalletError> {
    let card = cards::create_card(&state.storage, &auth.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "card": card }))).into_response())
}

pub async fn update_card_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(card_id): Path<String>,
    WithRejection(Json(input), _): WithRejection<Json<CardInput>, WalletError>,
) -> Result<Json<Value>, WalletError> {
    let card = cards::update_card(&state.storage, &auth.user_id, &card_id, input).await?;
    Ok(Json(
        json!({ "message": "Card updated successfully", "data": card }),
    ))
}

pub async fn delete_card_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(card_id): Path<String>,
) -> Result<Json<Value>, WalletError> {
    cards::delete_card(&state.storage, &auth.user_id, &card_id).await?;
    Ok(Json(json!({ "message": "Card successfully deleted" })))
}
