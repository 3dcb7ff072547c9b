pub mod auth;
pub mod exercise;
pub mod hub;
pub mod meditation;
pub mod server;
pub mod sleep;
pub mod sync;
