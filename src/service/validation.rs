//! Field normalisation and the per-field rules enforced before writes.

use crate::db::BarcodeType;
use crate::error::WalletError;

/// Trim and lower-case an identifier (username or email).
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Treat absent and whitespace-only values alike.
pub fn required(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Structural check: one `@`, non-empty local part, dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|l| {
            !l.is_empty()
                && !l.starts_with('-')
                && !l.ends_with('-')
                && l.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

/// Hyphenated UUID of any version.
pub fn is_valid_uuid(value: &str) -> bool {
    value.len() == 36 && uuid::Uuid::try_parse(value).is_ok()
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn check_len(
    value: &str,
    min: usize,
    max: usize,
    msg: &'static str,
) -> Result<(), WalletError> {
    let len = char_len(value);
    if len < min || len > max {
        return Err(WalletError::Validation(msg.to_string()));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), WalletError> {
    check_len(username, 3, 50, "Username must be between 3 and 50 characters")
}

pub fn validate_email_len(email: &str) -> Result<(), WalletError> {
    check_len(email, 5, 255, "Email must be between 5 and 255 characters")
}

pub fn validate_card_number(value: &str) -> Result<(), WalletError> {
    check_len(
        value,
        4,
        100,
        "card_number length must be between 4 and 100 characters",
    )
}

pub fn validate_card_name(value: &str) -> Result<(), WalletError> {
    check_len(value, 1, 30, "name length must be between 1 and 30 characters")
}

pub fn validate_description(value: &str) -> Result<(), WalletError> {
    check_len(value, 0, 400, "description cannot exceed 400 characters")
}

pub fn validate_color(value: &str) -> Result<(), WalletError> {
    let ok = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !ok {
        return Err(WalletError::Validation(
            "color must be a valid hex code like #FFAA00".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_barcode(value: &str) -> Result<(), WalletError> {
    check_len(
        value,
        3,
        255,
        "barcode length must be between 3 and 255 characters",
    )
}

pub fn parse_barcode_type(value: &str) -> Result<BarcodeType, WalletError> {
    value.parse().map_err(|()| {
        WalletError::Validation(format!(
            "barcode_type must be one of: {}",
            BarcodeType::ALLOWED
        ))
    })
}

pub fn validate_qr_data(value: &str) -> Result<(), WalletError> {
    check_len(
        value,
        1,
        2000,
        "qr_data cannot be empty and must not exceed 2000 characters",
    )
}

pub fn validate_picture_name(value: &str) -> Result<(), WalletError> {
    check_len(value, 1, 100, "Name must be between 1 and 100 characters")
}
