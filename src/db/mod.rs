//! Database module: row models, schema and repositories for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and their public projections
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: pool construction and schema bootstrap
//! - `repository.rs`: typed CRUD capabilities implemented on a SQLite connection

pub mod models;
pub mod repository;
pub mod schema;
pub mod sqlite;

pub use models::{
    BarcodeType, CardView, DbCard, DbPicture, DbUser, DbVerification, PictureView, PublicUser,
};
pub use repository::{CardRepository, PictureRepository, UserRepository, VerificationRepository};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, WalletStorage};
