use clap::Subcommand;

use crate::cli::config::load_session_config;
use crate::cli::utils::{output_collection, output_item};
use crate::cli::OutputFormat;
use crate::database::models::{Appointment, AppointmentListing, AppointmentStatus};
use crate::validation::AppointmentRequest;

#[derive(Subcommand)]
pub enum AppointmentCommands {
    #[command(about = "List appointments (all for admins, own for patients)")]
    List,

    #[command(about = "Book an appointment")]
    Book {
        #[arg(help = "Doctor id")]
        doctor_id: i32,
        #[arg(long, help = "RFC 3339 timestamp, e.g. 2030-05-01T10:30:00Z")]
        date: chrono::DateTime<chrono::Utc>,
        #[arg(long)]
        reason: String,
        #[arg(long, help = "Book on behalf of a patient (admin only)")]
        patient_id: Option<i32>,
    },

    #[command(about = "Change an appointment's status (admin)")]
    Status {
        #[arg(help = "Appointment id")]
        id: i32,
        #[arg(help = "pending, confirmed, completed or cancelled")]
        status: AppointmentStatus,
    },
}

fn describe_appointment(appointment: &Appointment) -> String {
    format!(
        "#{} {} patient {} with doctor {} [{}] {}",
        appointment.id,
        appointment.date.format("%Y-%m-%d %H:%M"),
        appointment.patient_id,
        appointment.doctor_id,
        appointment.status,
        appointment.reason
    )
}

pub async fn handle(cmd: AppointmentCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = load_session_config()?.client()?;

    match cmd {
        AppointmentCommands::List => match client.appointments().await? {
            AppointmentListing::All(rows) => {
                output_collection(&output_format, &rows, "No appointments", |row| {
                    format!(
                        "{} ({} / {})",
                        describe_appointment(&row.appointment),
                        row.patient.name,
                        row.doctor.name
                    )
                })
            }
            AppointmentListing::Own(rows) => {
                output_collection(&output_format, &rows, "No appointments", |row| {
                    format!("{} ({})", describe_appointment(&row.appointment), row.doctor.name)
                })
            }
        },
        AppointmentCommands::Book {
            doctor_id,
            date,
            reason,
            patient_id,
        } => {
            let appointment = client
                .book_appointment(&AppointmentRequest {
                    patient_id,
                    doctor_id,
                    date,
                    reason,
                })
                .await?;
            output_item(&output_format, &appointment, |a| {
                format!("Booked {}", describe_appointment(a))
            })
        }
        AppointmentCommands::Status { id, status } => {
            let appointment = client.update_appointment_status(id, status).await?;
            output_item(&output_format, &appointment, |a| {
                format!("Updated {}", describe_appointment(a))
            })
        }
    }
}
