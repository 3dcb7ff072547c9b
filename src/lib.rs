pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod i18n;
pub mod middleware;
pub mod services;
pub mod sync;
pub mod types;
pub mod validation;
