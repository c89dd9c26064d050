//! Entity shapes shared by the gateway, the route layer and the client.
//!
//! Every entity has a persisted record type (with server-assigned fields) and
//! an insertable `New*` type that only carries what a caller may supply.

pub mod appointment;
pub mod doctor;
pub mod report;
pub mod session;
pub mod user;

pub use appointment::{
    Appointment, AppointmentListing, AppointmentStatus, AppointmentWithDoctor,
    AppointmentWithParties, NewAppointment,
};
pub use doctor::{Doctor, NewDoctor};
pub use report::{NewReport, Report, ReportType};
pub use session::Session;
pub use user::{NewUser, Role, User};

/// Error returned when a text value is not a member of an enumerated field
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not one of: {allowed}")]
pub struct UnknownVariant {
    pub value: String,
    pub allowed: &'static str,
}
