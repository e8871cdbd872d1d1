pub mod article;
pub mod auth;
pub mod category;
pub mod comment;
pub mod course;
pub mod donation;
pub mod user;

pub use auth::*;
