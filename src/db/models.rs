use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbUser {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}

impl DbUser {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            user_id: Uuid::new_v4().to_string(),
            username,
            email,
            password_hash,
            confirmed: false,
            created_at: Utc::now(),
        }
    }
}

/// User projection safe to return to clients.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub user_id: String,
    pub username: String,
    pub mail: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbUser> for PublicUser {
    fn from(u: DbUser) -> Self {
        Self {
            user_id: u.user_id,
            username: u.username,
            mail: u.email,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbVerification {
    pub verification_id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// Legacy duplicate of `users.confirmed`; rows are deleted on confirmation.
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}

impl DbVerification {
    /// Fresh single-use token for `user_id`, valid for `ttl`.
    pub fn issue(user_id: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            verification_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            token: Uuid::new_v4().to_string(),
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            confirmed: false,
            created_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarcodeType {
    Ean13,
    Code128,
    Qr,
}

impl BarcodeType {
    pub const ALLOWED: &'static str = "EAN_13, CODE_128, QR";

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ean13 => "EAN_13",
            Self::Code128 => "CODE_128",
            Self::Qr => "QR",
        }
    }
}

impl FromStr for BarcodeType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EAN_13" => Ok(Self::Ean13),
            "CODE_128" => Ok(Self::Code128),
            "QR" => Ok(Self::Qr),
            _ => Err(()),
        }
    }
}

impl fmt::Display for BarcodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbCard {
    pub card_id: String,
    pub user_id: String,
    pub card_number: String,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub barcode: String,
    pub barcode_type: String,
    pub qr_data: String,
    pub added_at: DateTime<Utc>,
}

/// Card as returned to its owner (no `user_id`).
#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    pub card_id: String,
    pub card_number: String,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub barcode: String,
    pub barcode_type: String,
    pub qr_data: String,
    pub added_at: DateTime<Utc>,
}

impl From<DbCard> for CardView {
    fn from(c: DbCard) -> Self {
        Self {
            card_id: c.card_id,
            card_number: c.card_number,
            name: c.name,
            description: c.description,
            color: c.color,
            barcode: c.barcode,
            barcode_type: c.barcode_type,
            qr_data: c.qr_data,
            added_at: c.added_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbPicture {
    pub picture_id: String,
    pub name: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PictureView {
    pub picture_id: String,
    pub name: String,
    pub path: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<DbPicture> for PictureView {
    fn from(p: DbPicture) -> Self {
        Self {
            picture_id: p.picture_id,
            name: p.name,
            path: p.path,
            created_at: p.created_at,
        }
    }
}
