pub mod activity;
pub mod alerts;
pub mod auth;
pub mod scan;
pub mod sessions;
pub mod tokens;
