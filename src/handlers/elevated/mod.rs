// handlers/elevated/mod.rs - Elevated handlers (role-gated)
//
// Security Level: access token plus a role claim
// Route Prefixes:
//   /api/coach/* - authoring (coach or admin), require_coach_middleware
//   /api/root/*  - administration (admin only), require_admin_middleware
// Both gates run after jwt_auth_middleware and read the role from the token.

pub mod coach; // Content authoring
pub mod root; // Account administration
