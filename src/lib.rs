pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod rest;
pub mod services;
pub mod store;

use sqlx::sqlite::SqlitePool;

use crate::auth::token::TokenKeys;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub keys: TokenKeys,
}
