use clap::Subcommand;

use crate::cli::config::load_session_config;
use crate::cli::utils::{output_collection, output_item};
use crate::cli::OutputFormat;
use crate::database::models::{NewReport, Report, ReportType};

#[derive(Subcommand)]
pub enum ReportCommands {
    #[command(about = "List your reports")]
    List,

    #[command(about = "Attach a report to a patient (admin)")]
    Create {
        #[arg(help = "Patient user id")]
        patient_id: i32,
        #[arg(long)]
        title: String,
        #[arg(long, help = "URL of the uploaded file")]
        file_url: String,
        #[arg(long = "type", help = "report, xray or prescription")]
        report_type: ReportType,
    },
}

fn describe_report(report: &Report) -> String {
    format!(
        "#{} {} [{}] {} {}",
        report.id,
        report.date.format("%Y-%m-%d"),
        report.report_type,
        report.title,
        report.file_url
    )
}

pub async fn handle(cmd: ReportCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = load_session_config()?.client()?;

    match cmd {
        ReportCommands::List => {
            let reports = client.reports().await?;
            output_collection(&output_format, &reports, "No reports", describe_report)
        }
        ReportCommands::Create {
            patient_id,
            title,
            file_url,
            report_type,
        } => {
            let report = client
                .create_report(&NewReport {
                    patient_id,
                    title,
                    file_url,
                    report_type,
                })
                .await?;
            output_item(&output_format, &report, |r| format!("Created {}", describe_report(r)))
        }
    }
}
