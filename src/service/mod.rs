pub mod account;
pub mod authentication;
pub mod cards;
pub mod confirmation;
pub mod pictures;
pub mod registration;
pub mod similarity;
pub mod sweeper;
pub mod validation;
