use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header},
    routing::{delete, get, patch, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::db::WalletStorage;
use crate::handlers::{card, picture, user};
use crate::mail::MailSender;
use crate::service::pictures::PictureStore;

/// Multipart framing allowance on top of the picture size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: WalletStorage,
    pub config: Arc<Config>,
    pub tokens: Arc<TokenIssuer>,
    pub mailer: Arc<dyn MailSender>,
    pub pictures: PictureStore,
}

impl AppState {
    pub fn new(storage: WalletStorage, config: Config, mailer: Arc<dyn MailSender>) -> Self {
        let tokens = Arc::new(TokenIssuer::new(&config.auth));
        let pictures = PictureStore::new(
            config.server.upload_dir.clone(),
            config.server.max_picture_bytes,
        );
        Self {
            storage,
            config: Arc::new(config),
            tokens,
            mailer,
            pictures,
        }
    }
}

fn api_router(state: &AppState) -> Router<AppState> {
    // Oversized files must reach the handler so they surface as FILE_TOO_LARGE.
    let upload_limit = state
        .pictures
        .max_bytes()
        .saturating_mul(2)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/user/register", post(user::register_handler))
        .route("/user/login", post(user::login_handler))
        .route("/user/refresh", post(user::refresh_handler))
        .route(
            "/user/{userId}/confirm-email",
            get(user::confirm_email_handler),
        )
        .route("/user/{userId}", delete(user::delete_user_handler))
        .route(
            "/user/{userId}/change-password",
            patch(user::change_password_handler),
        )
        .route(
            "/card",
            get(card::list_cards_handler).post(card::create_card_handler),
        )
        .route(
            "/card/{cardId}",
            patch(card::update_card_handler).delete(card::delete_card_handler),
        )
        .route(
            "/picture/upload",
            post(picture::upload_picture_handler).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/picture/search", get(picture::search_pictures_handler))
        .route("/picture/delete", delete(picture::delete_picture_handler))
}

pub fn wallet_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/", get(|| async { "Server is running" }))
        .nest("/api/v1", api_router(&state))
        .nest_service(
            "/public",
            ServeDir::new(state.pictures.upload_dir().to_path_buf()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
