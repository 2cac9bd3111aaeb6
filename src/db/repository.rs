//! Typed CRUD capabilities over the wallet tables.
//!
//! Every trait is implemented for [`SqliteConnection`], so the same calls run on a
//! pooled connection (`storage.acquire()`) or inside a transaction (`storage.begin_write()`),
//! both of which dereference to a connection.

use crate::db::models::{DbCard, DbPicture, DbUser, DbVerification};
use crate::error::WalletError;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use std::future::Future;

const USER_COLUMNS: &str = "user_id, username, email, password_hash, confirmed, created_at";
const VERIFICATION_COLUMNS: &str =
    "verification_id, user_id, token, expires_at, confirmed, created_at";
const CARD_COLUMNS: &str = "card_id, user_id, card_number, name, description, color, barcode, barcode_type, qr_data, added_at";
const PICTURE_COLUMNS: &str = "picture_id, name, path, created_at";

/// Translate constraint violations raised by a write into `VALIDATION_ERROR`.
pub fn map_write_error(err: sqlx::Error) -> WalletError {
    match &err {
        sqlx::Error::Database(db)
            if db.is_unique_violation()
                || db.is_check_violation()
                || db.is_foreign_key_violation() =>
        {
            WalletError::Validation(db.message().to_string())
        }
        _ => WalletError::Database(err),
    }
}

pub trait UserRepository {
    fn find_user_by_id(
        &mut self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<DbUser>, WalletError>> + Send;

    fn find_user_by_username(
        &mut self,
        username: &str,
    ) -> impl Future<Output = Result<Option<DbUser>, WalletError>> + Send;

    fn find_user_by_email(
        &mut self,
        email: &str,
    ) -> impl Future<Output = Result<Option<DbUser>, WalletError>> + Send;

    /// Single lookup matching either the username or the email.
    fn find_user_by_login(
        &mut self,
        login: &str,
    ) -> impl Future<Output = Result<Option<DbUser>, WalletError>> + Send;

    fn insert_user(&mut self, user: &DbUser)
    -> impl Future<Output = Result<(), WalletError>> + Send;

    /// Overwrite username, email, password hash and creation time in place.
    fn update_user_credentials(
        &mut self,
        user: &DbUser,
    ) -> impl Future<Output = Result<(), WalletError>> + Send;

    fn set_user_confirmed(
        &mut self,
        user_id: &str,
    ) -> impl Future<Output = Result<(), WalletError>> + Send;

    fn update_password_hash(
        &mut self,
        user_id: &str,
        password_hash: &str,
    ) -> impl Future<Output = Result<(), WalletError>> + Send;

    /// Delete the user; verification rows and cards cascade. Returns affected rows.
    fn delete_user(
        &mut self,
        user_id: &str,
    ) -> impl Future<Output = Result<u64, WalletError>> + Send;
}

pub trait VerificationRepository {
    fn insert_verification(
        &mut self,
        verification: &DbVerification,
    ) -> impl Future<Output = Result<(), WalletError>> + Send;

    /// Most recent unconfirmed verification row for `user_id`.
    fn find_pending_verification(
        &mut self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<DbVerification>, WalletError>> + Send;

    fn delete_verifications_for_user(
        &mut self,
        user_id: &str,
    ) -> impl Future<Output = Result<u64, WalletError>> + Send;

    fn delete_expired_verifications(
        &mut self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, WalletError>> + Send;
}

pub trait CardRepository {
    /// Cards of `user_id`, most recently added first.
    fn list_cards(
        &mut self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<DbCard>, WalletError>> + Send;

    fn find_card(
        &mut self,
        user_id: &str,
        card_id: &str,
    ) -> impl Future<Output = Result<Option<DbCard>, WalletError>> + Send;

    /// A card of `user_id` sharing any of the unique identifiers.
    fn find_conflicting_card(
        &mut self,
        user_id: &str,
        card_number: &str,
        barcode: &str,
        qr_data: &str,
    ) -> impl Future<Output = Result<Option<DbCard>, WalletError>> + Send;

    fn insert_card(&mut self, card: &DbCard)
    -> impl Future<Output = Result<(), WalletError>> + Send;

    fn update_card(&mut self, card: &DbCard)
    -> impl Future<Output = Result<(), WalletError>> + Send;

    fn delete_card(
        &mut self,
        card_id: &str,
    ) -> impl Future<Output = Result<u64, WalletError>> + Send;
}

pub trait PictureRepository {
    fn find_picture_by_name(
        &mut self,
        name: &str,
    ) -> impl Future<Output = Result<Option<DbPicture>, WalletError>> + Send;

    fn find_picture_by_path(
        &mut self,
        path: &str,
    ) -> impl Future<Output = Result<Option<DbPicture>, WalletError>> + Send;

    fn list_pictures(&mut self) -> impl Future<Output = Result<Vec<DbPicture>, WalletError>> + Send;

    fn insert_picture(
        &mut self,
        picture: &DbPicture,
    ) -> impl Future<Output = Result<(), WalletError>> + Send;

    fn delete_picture(
        &mut self,
        picture_id: &str,
    ) -> impl Future<Output = Result<u64, WalletError>> + Send;
}

impl UserRepository for SqliteConnection {
    async fn find_user_by_id(&mut self, user_id: &str) -> Result<Option<DbUser>, WalletError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?");
        Ok(sqlx::query_as::<_, DbUser>(&sql)
            .bind(user_id)
            .fetch_optional(&mut *self)
            .await?)
    }

    async fn find_user_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<DbUser>, WalletError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
        Ok(sqlx::query_as::<_, DbUser>(&sql)
            .bind(username)
            .fetch_optional(&mut *self)
            .await?)
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<DbUser>, WalletError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        Ok(sqlx::query_as::<_, DbUser>(&sql)
            .bind(email)
            .fetch_optional(&mut *self)
            .await?)
    }

    async fn find_user_by_login(&mut self, login: &str) -> Result<Option<DbUser>, WalletError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ? OR email = ? LIMIT 1");
        Ok(sqlx::query_as::<_, DbUser>(&sql)
            .bind(login)
            .bind(login)
            .fetch_optional(&mut *self)
            .await?)
    }

    async fn insert_user(&mut self, user: &DbUser) -> Result<(), WalletError> {
        sqlx::query(
            r#"INSERT INTO users (user_id, username, email, password_hash, confirmed, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&user.user_id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.confirmed)
        .bind(user.created_at)
        .execute(&mut *self)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn update_user_credentials(&mut self, user: &DbUser) -> Result<(), WalletError> {
        sqlx::query(
            r#"UPDATE users SET
                username = ?,
                email = ?,
                password_hash = ?,
                created_at = ?
              WHERE user_id = ?"#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(&user.user_id)
        .execute(&mut *self)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn set_user_confirmed(&mut self, user_id: &str) -> Result<(), WalletError> {
        sqlx::query("UPDATE users SET confirmed = 1 WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *self)
            .await?;
        Ok(())
    }

    async fn update_password_hash(
        &mut self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<(), WalletError> {
        sqlx::query("UPDATE users SET password_hash = ? WHERE user_id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&mut *self)
            .await?;
        Ok(())
    }

    async fn delete_user(&mut self, user_id: &str) -> Result<u64, WalletError> {
        let res = sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *self)
            .await?;
        Ok(res.rows_affected())
    }
}

impl VerificationRepository for SqliteConnection {
    async fn insert_verification(
        &mut self,
        verification: &DbVerification,
    ) -> Result<(), WalletError> {
        sqlx::query(
            r#"INSERT INTO email_verifications
                (verification_id, user_id, token, expires_at, confirmed, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&verification.verification_id)
        .bind(&verification.user_id)
        .bind(&verification.token)
        .bind(verification.expires_at)
        .bind(verification.confirmed)
        .bind(verification.created_at)
        .execute(&mut *self)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn find_pending_verification(
        &mut self,
        user_id: &str,
    ) -> Result<Option<DbVerification>, WalletError> {
        let sql = format!(
            "SELECT {VERIFICATION_COLUMNS} FROM email_verifications
             WHERE user_id = ? AND confirmed = 0
             ORDER BY created_at DESC LIMIT 1"
        );
        Ok(sqlx::query_as::<_, DbVerification>(&sql)
            .bind(user_id)
            .fetch_optional(&mut *self)
            .await?)
    }

    async fn delete_verifications_for_user(&mut self, user_id: &str) -> Result<u64, WalletError> {
        let res = sqlx::query("DELETE FROM email_verifications WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *self)
            .await?;
        Ok(res.rows_affected())
    }

    async fn delete_expired_verifications(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<u64, WalletError> {
        let res = sqlx::query("DELETE FROM email_verifications WHERE expires_at < ?")
            .bind(now)
            .execute(&mut *self)
            .await?;
        Ok(res.rows_affected())
    }
}

impl CardRepository for SqliteConnection {
    async fn list_cards(&mut self, user_id: &str) -> Result<Vec<DbCard>, WalletError> {
        let sql = format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE user_id = ? ORDER BY added_at DESC, rowid DESC"
        );
        Ok(sqlx::query_as::<_, DbCard>(&sql)
            .bind(user_id)
            .fetch_all(&mut *self)
            .await?)
    }

    async fn find_card(
        &mut self,
        user_id: &str,
        card_id: &str,
    ) -> Result<Option<DbCard>, WalletError> {
        let sql = format!("SELECT {CARD_COLUMNS} FROM cards WHERE card_id = ? AND user_id = ?");
        Ok(sqlx::query_as::<_, DbCard>(&sql)
            .bind(card_id)
            .bind(user_id)
            .fetch_optional(&mut *self)
            .await?)
    }

    async fn find_conflicting_card(
        &mut self,
        user_id: &str,
        card_number: &str,
        barcode: &str,
        qr_data: &str,
    ) -> Result<Option<DbCard>, WalletError> {
        let sql = format!(
            "SELECT {CARD_COLUMNS} FROM cards
             WHERE user_id = ? AND (card_number = ? OR barcode = ? OR qr_data = ?)
             LIMIT 1"
        );
        Ok(sqlx::query_as::<_, DbCard>(&sql)
            .bind(user_id)
            .bind(card_number)
            .bind(barcode)
            .bind(qr_data)
            .fetch_optional(&mut *self)
            .await?)
    }

    async fn insert_card(&mut self, card: &DbCard) -> Result<(), WalletError> {
        sqlx::query(
            r#"INSERT INTO cards (
                card_id, user_id, card_number, name, description, color,
                barcode, barcode_type, qr_data, added_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&card.card_id)
        .bind(&card.user_id)
        .bind(&card.card_number)
        .bind(&card.name)
        .bind(&card.description)
        .bind(&card.color)
        .bind(&card.barcode)
        .bind(&card.barcode_type)
        .bind(&card.qr_data)
        .bind(card.added_at)
        .execute(&mut *self)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn update_card(&mut self, card: &DbCard) -> Result<(), WalletError> {
        sqlx::query(
            r#"UPDATE cards SET
                card_number = ?,
                name = ?,
                description = ?,
                color = ?,
                barcode = ?,
                barcode_type = ?,
                qr_data = ?
              WHERE card_id = ? AND user_id = ?"#,
        )
        .bind(&card.card_number)
        .bind(&card.name)
        .bind(&card.description)
        .bind(&card.color)
        .bind(&card.barcode)
        .bind(&card.barcode_type)
        .bind(&card.qr_data)
        .bind(&card.card_id)
        .bind(&card.user_id)
        .execute(&mut *self)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn delete_card(&mut self, card_id: &str) -> Result<u64, WalletError> {
        let res = sqlx::query("DELETE FROM cards WHERE card_id = ?")
            .bind(card_id)
            .execute(&mut *self)
            .await?;
        Ok(res.rows_affected())
    }
}

impl PictureRepository for SqliteConnection {
    async fn find_picture_by_name(&mut self, name: &str) -> Result<Option<DbPicture>, WalletError> {
        let sql = format!("SELECT {PICTURE_COLUMNS} FROM pictures WHERE name = ? LIMIT 1");
        Ok(sqlx::query_as::<_, DbPicture>(&sql)
            .bind(name)
            .fetch_optional(&mut *self)
            .await?)
    }

    async fn find_picture_by_path(&mut self, path: &str) -> Result<Option<DbPicture>, WalletError> {
        let sql = format!("SELECT {PICTURE_COLUMNS} FROM pictures WHERE path = ? LIMIT 1");
        Ok(sqlx::query_as::<_, DbPicture>(&sql)
            .bind(path)
            .fetch_optional(&mut *self)
            .await?)
    }

    async fn list_pictures(&mut self) -> Result<Vec<DbPicture>, WalletError> {
        let sql = format!("SELECT {PICTURE_COLUMNS} FROM pictures ORDER BY created_at");
        Ok(sqlx::query_as::<_, DbPicture>(&sql)
            .fetch_all(&mut *self)
            .await?)
    }

    async fn insert_picture(&mut self, picture: &DbPicture) -> Result<(), WalletError> {
        sqlx::query(
            "INSERT INTO pictures (picture_id, name, path, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&picture.picture_id)
        .bind(&picture.name)
        .bind(&picture.path)
        .bind(picture.created_at)
        .execute(&mut *self)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn delete_picture(&mut self, picture_id: &str) -> Result<u64, WalletError> {
        let res = sqlx::query("DELETE FROM pictures WHERE picture_id = ?")
            .bind(picture_id)
            .execute(&mut *self)
            .await?;
        Ok(res.rows_affected())
    }
}
