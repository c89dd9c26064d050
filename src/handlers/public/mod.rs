// handlers/public/mod.rs - Public handlers (no session required)
//
// Account creation, login/logout and the doctor directory.

pub mod auth;
pub mod doctors;
