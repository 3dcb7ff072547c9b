// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition plus the read-only catalogs the landing pages render
// before sign-in. Locale comes from `?lang=` or `Accept-Language`.

pub mod auth; // /auth/*
pub mod catalog; // /categories, /resources
pub mod exercise; // /exercise/contents
pub mod meditation; // /meditation/types, /meditation/contents
pub mod programs; // /programs
