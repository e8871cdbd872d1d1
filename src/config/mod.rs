pub mod database;
pub mod jwt;
pub mod rate_limit;
