use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{IdealRanges, PatientIdentity, RiskAxis, RiskLabel, VitalReading};

/// How the readings of a report were collected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    Manual,
    Batch,
}

/// One reading with its three decoded labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportRow {
    pub reading: VitalReading,
    pub stress: RiskLabel,
    pub cardio_respiratory: RiskLabel,
    pub fever: RiskLabel,
}

impl ReportRow {
    pub fn label(&self, axis: RiskAxis) -> &RiskLabel {
        match axis {
            RiskAxis::Stress => &self.stress,
            RiskAxis::CardioRespiratory => &self.cardio_respiratory,
            RiskAxis::Fever => &self.fever,
        }
    }
}

/// Finished report; built once after prediction and never changed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientReport {
    pub generated_at: DateTime<Utc>,
    pub patient: PatientIdentity,
    pub mode: ReportMode,
    pub rows: Vec<ReportRow>,
    /// Resolved once from the page-level age and shared by every row.
    pub ideal_ranges: Option<IdealRanges>,
}

impl PatientReport {
    pub fn new(
        patient: PatientIdentity,
        mode: ReportMode,
        rows: Vec<ReportRow>,
        ideal_ranges: Option<IdealRanges>,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            patient,
            mode,
            rows,
            ideal_ranges,
        }
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Heading shown above the report.
    pub fn greeting(&self) -> String {
        format!(
            "{}, this is your health report. Stay Healthy! 🎯",
            self.patient.name
        )
    }

    /// Download name, `{name}_report.csv` or `{name}_live_report.csv`.
    pub fn suggested_file_name(&self) -> String {
        match self.mode {
            ReportMode::Manual => format!("{}_report.csv", self.patient.name),
            ReportMode::Batch => format!("{}_live_report.csv", self.patient.name),
        }
    }
}
