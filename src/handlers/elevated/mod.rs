// handlers/elevated/mod.rs - Elevated handlers (admin session required)
//
// Every handler starts with `require_role(&auth, Role::Admin)`.

pub mod appointments;
pub mod doctors;
pub mod reports;
