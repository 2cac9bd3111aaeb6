pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod middleware;
pub mod router;
pub mod service;

pub use config::Config;
pub use error::WalletError;
pub use router::{AppState, wallet_router};
