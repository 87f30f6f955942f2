pub mod auth;
pub mod reports;
pub mod uploads;
