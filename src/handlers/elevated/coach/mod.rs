// handlers/elevated/coach/mod.rs - Content authoring handlers

pub mod catalog; // categories, translations, resources
pub mod exercise; // exercise catalog
pub mod meditation; // meditation contents
pub mod programs; // multi-day programs
