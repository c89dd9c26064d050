// handlers/protected/mod.rs - Protected handlers (any authenticated session)
//
// Handlers take an `AuthUser`, which answers 401 when the request carries no
// valid session. Patients only ever see their own records here.

pub mod appointments;
pub mod reports;
pub mod user;
