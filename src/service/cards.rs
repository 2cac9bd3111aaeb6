use crate::db::{CardRepository, CardView, DbCard, UserRepository, WalletStorage};
use crate::error::WalletError;
use crate::service::validation::{
    is_valid_uuid, parse_barcode_type, validate_barcode, validate_card_name, validate_card_number,
    validate_color, validate_description, validate_qr_data,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct CardInput {
    pub card_number: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub barcode: Option<String>,
    pub barcode_type: Option<String>,
    pub qr_data: Option<String>,
}

impl CardInput {
    fn has_any_field(&self) -> bool {
        self.card_number.is_some()
            || self.name.is_some()
            || self.description.is_some()
            || self.color.is_some()
            || self.barcode.is_some()
            || self.barcode_type.is_some()
            || self.qr_data.is_some()
    }
}

/// Apply every field rule to a card about to be written.
fn validate_card(card: &DbCard) -> Result<(), WalletError> {
    validate_card_number(&card.card_number)?;
    validate_card_name(&card.name)?;
    if let Some(description) = &card.description {
        validate_description(description)?;
    }
    if let Some(color) = &card.color {
        validate_color(color)?;
    }
    validate_barcode(&card.barcode)?;
    parse_barcode_type(&card.barcode_type)?;
    validate_qr_data(&card.qr_data)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub async fn list_cards(storage: &WalletStorage, user_id: &str) -> Result<Vec<CardView>, WalletError> {
    let mut conn = storage.acquire().await?;
    if conn.find_user_by_id(user_id).await?.is_none() {
        return Err(WalletError::UserNotFound);
    }
    let cards = conn.list_cards(user_id).await?;
    if cards.is_empty() {
        return Err(WalletError::CardNotFound("No cards found for this user"));
    }
    Ok(cards.into_iter().map(CardView::from).collect())
}

pub async fn create_card(
    storage: &WalletStorage,
    user_id: &str,
    input: CardInput,
) -> Result<CardView, WalletError> {
    let (Some(card_number), Some(name), Some(barcode), Some(barcode_type), Some(qr_data)) = (
        non_empty(input.card_number),
        non_empty(input.name),
        non_empty(input.barcode),
        non_empty(input.barcode_type),
        non_empty(input.qr_data),
    ) else {
        return Err(WalletError::InvalidInput(
            "card_number, name, barcode, barcode_type, and qr_data are required",
        ));
    };

    let mut conn = storage.acquire().await?;
    if conn.find_user_by_id(user_id).await?.is_none() {
        return Err(WalletError::UserNotFound);
    }
    if let Some(existing) = conn
        .find_conflicting_card(user_id, &card_number, &barcode, &qr_data)
        .await?
    {
        let field = if existing.card_number == card_number {
            "card_number"
        } else if existing.barcode == barcode {
            "barcode"
        } else {
            "qr_data"
        };
        return Err(WalletError::DuplicateEntry(field));
    }

    let card = DbCard {
        card_id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        card_number,
        name,
        description: input.description,
        color: input.color,
        barcode,
        barcode_type,
        qr_data,
        added_at: Utc::now(),
    };
    validate_card(&card)?;
    conn.insert_card(&card).await?;
    info!(user_id, card_id = %card.card_id, "card created");
    Ok(card.into())
}

/// Partial update; barcode, barcode_type and qr_data move together.
pub async fn update_card(
    storage: &WalletStorage,
    user_id: &str,
    card_id: &str,
    input: CardInput,
) -> Result<CardView, WalletError> {
    if !is_valid_uuid(card_id) {
        return Err(WalletError::InvalidCardId);
    }
    if !input.has_any_field() {
        return Err(WalletError::NoUpdateFields);
    }
    let barcode_fields = [&input.barcode, &input.barcode_type, &input.qr_data]
        .iter()
        .filter(|f| f.is_some())
        .count();
    if barcode_fields != 0 && barcode_fields != 3 {
        return Err(WalletError::InvalidBarcodeUpdate);
    }

    let mut tx = storage.begin_write().await?;
    let mut card = tx
        .find_card(user_id, card_id)
        .await?
        .ok_or(WalletError::CardNotFound(
            "Card not found or does not belong to user",
        ))?;

    if let Some(v) = input.card_number {
        card.card_number = v;
    }
    if let Some(v) = input.name {
        card.name = v;
    }
    if let Some(v) = input.description {
        card.description = Some(v);
    }
    if let Some(v) = input.color {
        card.color = Some(v);
    }
    if let (Some(barcode), Some(barcode_type), Some(qr_data)) =
        (input.barcode, input.barcode_type, input.qr_data)
    {
        card.barcode = barcode;
        card.barcode_type = barcode_type;
        card.qr_data = qr_data;
    }

    validate_card(&card)?;
    tx.update_card(&card).await?;
    tx.commit().await?;
    info!(user_id, card_id, "card updated");
    Ok(card.into())
}

pub async fn delete_card(
    storage: &WalletStorage,
    user_id: &str,
    card_id: &str,
) -> Result<(), WalletError> {
    if !is_valid_uuid(card_id) {
        return Err(WalletError::InvalidUuidFormat("Invalid UUID format"));
    }
    let mut tx = storage.begin_write().await?;
    if tx.find_user_by_id(user_id).await?.is_none() {
        return Err(WalletError::UserNotFound);
    }
    if tx.find_card(user_id, card_id).await?.is_none() {
        return Err(WalletError::CardNotFound(
            "Card not found or does not belong to user",
        ));
    }
    tx.delete_card(card_id).await?;
    tx.commit().await?;
    info!(user_id, card_id, "card deleted");
    Ok(())
}
