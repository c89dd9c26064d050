use clap::Subcommand;

use crate::cli::config::load_session_config;
use crate::cli::utils::{output_collection, output_item};
use crate::cli::OutputFormat;
use crate::database::models::doctor::DEFAULT_RATING;
use crate::database::models::{Doctor, NewDoctor};

#[derive(Subcommand)]
pub enum DoctorCommands {
    #[command(about = "List all doctors")]
    List,

    #[command(about = "Show one doctor")]
    Show {
        #[arg(help = "Doctor id")]
        id: i32,
    },

    #[command(about = "Create a doctor profile (admin)")]
    Create {
        #[arg(help = "Doctor name")]
        name: String,
        #[arg(long)]
        specialization: String,
        #[arg(long)]
        bio: String,
        #[arg(long)]
        image_url: String,
        #[arg(long, help = "Free text, e.g. \"Mon-Fri 09:00-17:00\"")]
        availability: String,
        #[arg(long, default_value_t = 0)]
        experience: i32,
        #[arg(long, default_value = DEFAULT_RATING)]
        rating: String,
    },
}

fn describe_doctor(doctor: &Doctor) -> String {
    format!(
        "#{} {} - {}, {} yrs, rated {} ({})",
        doctor.id,
        doctor.name,
        doctor.specialization,
        doctor.experience,
        doctor.rating,
        doctor.availability
    )
}

pub async fn handle(cmd: DoctorCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = load_session_config()?.client()?;

    match cmd {
        DoctorCommands::List => {
            let doctors = client.doctors().await?;
            output_collection(&output_format, &doctors, "No doctors found", describe_doctor)
        }
        DoctorCommands::Show { id } => match client.doctor(id).await? {
            Some(doctor) => output_item(&output_format, &doctor, |d| {
                format!("{}\n{}", describe_doctor(d), d.bio)
            }),
            None => anyhow::bail!("Doctor {} not found", id),
        },
        DoctorCommands::Create {
            name,
            specialization,
            bio,
            image_url,
            availability,
            experience,
            rating,
        } => {
            let doctor = client
                .create_doctor(&NewDoctor {
                    name,
                    specialization,
                    bio,
                    image_url,
                    availability,
                    experience,
                    rating,
                })
                .await?;
            output_item(&output_format, &doctor, |d| format!("Created {}", describe_doctor(d)))
        }
    }
}
