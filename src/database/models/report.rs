use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Report,
    Xray,
    Prescription,
}

impl ReportType {
    pub const ALLOWED: &'static str = "report, xray, prescription";

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Report => "report",
            ReportType::Xray => "xray",
            ReportType::Prescription => "prescription",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "report" => Ok(ReportType::Report),
            "xray" => Ok(ReportType::Xray),
            "prescription" => Ok(ReportType::Prescription),
            other => Err(UnknownVariant {
                value: other.to_string(),
                allowed: Self::ALLOWED,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i32,
    pub patient_id: i32,
    pub title: String,
    /// URL handed out by the external file store
    pub file_url: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub report_type: ReportType,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    pub patient_id: i32,
    pub title: String,
    pub file_url: String,
    #[serde(rename = "type")]
    pub report_type: ReportType,
}
