pub mod accept;
pub mod card;
pub mod picture;
pub mod user;
