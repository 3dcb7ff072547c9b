// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no auth) → Protected (access token) → Elevated (coach / admin role)

pub mod elevated; // Tier 3: role-gated (/api/coach/*, /api/root/*)
pub mod protected; // Tier 2: access token required (/api/*)
pub mod public; // Tier 1: no authentication (/auth/*, catalogs)
