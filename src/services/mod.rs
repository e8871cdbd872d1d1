pub mod article;
pub mod auth;
pub mod category;
pub mod comment;
pub mod course;
pub mod donation;
pub mod enrollment;
pub mod like;
pub mod user;
