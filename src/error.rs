use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error as ThisError;
use tracing::{error, warn};

const INTERNAL_MESSAGE: &str = "An internal server error occurred";

#[derive(Debug, ThisError)]
pub enum WalletError {
    // Malformed or missing client input.
    #[error("{0}")]
    InvalidInput(&'static str),

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Invalid or missing userId (UUID expected)")]
    InvalidUserId,

    #[error("{0}")]
    InvalidUuidFormat(&'static str),

    #[error("Invalid cardId (UUID expected)")]
    InvalidCardId,

    #[error("{0}")]
    InvalidToken(&'static str),

    #[error("name query parameter is required")]
    InvalidNameInput,

    #[error("Valid path is required")]
    NoPathProvided,

    #[error("File is required")]
    NoFileProvided,

    #[error("Only PNG and JPEG allowed")]
    InvalidFileType,

    #[error("File must be <= {0}MB")]
    FileTooLarge(usize),

    #[error("At least one field must be provided for update")]
    NoUpdateFields,

    #[error("barcode, barcode_type and qr_data must be provided together")]
    InvalidBarcodeUpdate,

    #[error("Invalid request body: {0}")]
    MalformedJson(#[from] JsonRejection),

    #[error("Invalid multipart body: {0}")]
    MalformedMultipart(#[from] MultipartRejection),

    #[error("Invalid multipart field: {0}")]
    MultipartField(#[from] MultipartError),

    // Business rule conflicts.
    #[error("Username and mail belong to different users")]
    CredentialsConflict,

    #[error("User already exists and is confirmed")]
    UserAlreadyConfirmed,

    #[error("{0} already exists")]
    DuplicateEntry(&'static str),

    #[error("A picture with this name already exists")]
    DuplicatePictureName,

    /// Field rule or store constraint violation; carries the constraint message.
    #[error("{0}")]
    Validation(String),

    // Lookups.
    #[error("User not found")]
    UserNotFound,

    #[error("Verification token not found")]
    TokenNotFound,

    #[error("Verification token expired")]
    TokenExpired,

    #[error("{0}")]
    CardNotFound(&'static str),

    #[error("No images were found for the given query")]
    PicturesNotFound,

    #[error("Neither file nor database record exists")]
    NothingToDelete,

    // Authentication.
    #[error("{0}")]
    InvalidCredentials(&'static str),

    #[error("Old password is incorrect")]
    InvalidOldPassword,

    #[error("Email not confirmed")]
    EmailNotConfirmed,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Refresh token is required")]
    RefreshTokenRequired,

    #[error("{0}")]
    InvalidRefreshToken(&'static str),

    #[error("Not Acceptable")]
    NotAcceptable,

    // Infrastructure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Token signing error: {0}")]
    TokenSigning(#[from] jsonwebtoken::errors::Error),

    #[error("Mail delivery failed: {0}")]
    MailDelivery(String),

    #[error("Blocking task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Failed to delete file from storage")]
    FileDeletionFailed(#[source] std::io::Error),
}

impl WalletError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_)
            | Self::InvalidEmail
            | Self::InvalidUserId
            | Self::InvalidUuidFormat(_)
            | Self::InvalidCardId
            | Self::InvalidToken(_)
            | Self::InvalidNameInput
            | Self::NoPathProvided
            | Self::NoFileProvided
            | Self::InvalidFileType
            | Self::FileTooLarge(_)
            | Self::NoUpdateFields
            | Self::InvalidBarcodeUpdate
            | Self::MalformedJson(_)
            | Self::MalformedMultipart(_)
            | Self::CredentialsConflict
            | Self::UserAlreadyConfirmed
            | Self::DuplicateEntry(_)
            | Self::Validation(_)
            | Self::TokenExpired
            | Self::RefreshTokenRequired => StatusCode::BAD_REQUEST,
            Self::MultipartField(e) => e.status(),
            Self::DuplicatePictureName => StatusCode::CONFLICT,
            Self::UserNotFound
            | Self::TokenNotFound
            | Self::CardNotFound(_)
            | Self::PicturesNotFound
            | Self::NothingToDelete => StatusCode::NOT_FOUND,
            Self::InvalidCredentials(_)
            | Self::InvalidOldPassword
            | Self::Unauthorized(_)
            | Self::InvalidRefreshToken(_) => StatusCode::UNAUTHORIZED,
            Self::EmailNotConfirmed => StatusCode::FORBIDDEN,
            Self::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            Self::Database(_)
            | Self::Io(_)
            | Self::PasswordHash(_)
            | Self::TokenSigning(_)
            | Self::MailDelivery(_)
            | Self::TaskJoin(_)
            | Self::FileDeletionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) | Self::MalformedJson(_) | Self::MalformedMultipart(_) => {
                "INVALID_INPUT"
            }
            Self::MultipartField(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                "FILE_TOO_LARGE"
            }
            Self::MultipartField(_) => "INVALID_INPUT",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InvalidUserId => "INVALID_USER_ID",
            Self::InvalidUuidFormat(_) => "INVALID_UUID_FORMAT",
            Self::InvalidCardId => "INVALID_CARD_ID",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::InvalidNameInput => "INVALID_NAME_INPUT",
            Self::NoPathProvided => "NO_PATH_PROVIDED",
            Self::NoFileProvided => "NO_FILE_PROVIDED",
            Self::InvalidFileType => "INVALID_FILE_TYPE",
            Self::FileTooLarge(_) => "FILE_TOO_LARGE",
            Self::NoUpdateFields => "NO_UPDATE_FIELDS",
            Self::InvalidBarcodeUpdate => "INVALID_BARCODE_UPDATE",
            Self::CredentialsConflict => "CREDENTIALS_CONFLICT",
            Self::UserAlreadyConfirmed => "USER_ALREADY_CONFIRMED",
            Self::DuplicateEntry(_) => "DUPLICATE_ENTRY",
            Self::DuplicatePictureName => "DUPLICATE_NAME",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::TokenNotFound => "TOKEN_NOT_FOUND",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::CardNotFound(_) => "CARD_NOT_FOUND",
            Self::PicturesNotFound => "PICTURES_NOT_FOUND",
            Self::NothingToDelete => "NOTHING_TO_DELETE",
            Self::InvalidCredentials(_) => "INVALID_CREDENTIALS",
            Self::InvalidOldPassword => "INVALID_OLD_PASSWORD",
            Self::EmailNotConfirmed => "EMAIL_NOT_CONFIRMED",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::RefreshTokenRequired => "REFRESH_TOKEN_REQUIRED",
            Self::InvalidRefreshToken(_) => "INVALID_REFRESH_TOKEN",
            Self::NotAcceptable => "NOT_ACCEPTABLE",
            Self::FileDeletionFailed(_) => "FILE_DELETION_FAILED",
            Self::MailDelivery(_) => "MAIL_DELIVERY_FAILED",
            Self::Database(_)
            | Self::Io(_)
            | Self::PasswordHash(_)
            | Self::TokenSigning(_)
            | Self::TaskJoin(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Message safe to show to clients; infrastructure details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_)
            | Self::Io(_)
            | Self::PasswordHash(_)
            | Self::TokenSigning(_)
            | Self::TaskJoin(_) => INTERNAL_MESSAGE.to_string(),
            Self::MailDelivery(_) => "Failed to send confirmation email".to_string(),
            Self::MalformedJson(e) => e.body_text(),
            Self::MalformedMultipart(e) => e.body_text(),
            Self::MultipartField(e) => e.body_text(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for WalletError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let code = self.code();
        if status.is_server_error() {
            error!(code, status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(code, status = status.as_u16(), error = %self, "request rejected");
        }
        let body = ApiErrorBody {
            code: code.to_string(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Error payload returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}
