// handlers/elevated/root/mod.rs - Root administrative handlers

pub mod users; // /api/root/users/:id/role

pub use users::user_role_put;
