//! Turns vital readings into a `PatientReport` by running the three risk
//! pipelines, with CSV upload parsing and report export.

use tracing::{debug, info, warn};
use vitals_core::{
    resolve_ideal_ranges, PatientIdentity, PatientReport, ReportConfig, ReportMode, VitalReading,
    VitalsError,
};

mod csv_io;
mod model;

pub use csv_io::{read_readings, report_from_csv, report_to_csv};
pub use model::{
    DecisionTree, LabelEncoder, ModelArtifact, ModelBundle, ModelSet, PipelineArtifact,
    RiskModel, TreeNode,
};

/// Shown when batch mode is used without an upload.
pub const MISSING_UPLOAD_WARNING: &str =
    "Arduino is not connected or CSV not uploaded. Please check and try again!";

/// Hint describing the upload format.
pub const UPLOAD_COLUMNS_HINT: &str =
    "CSV must have columns: Heart_Rate, HRV, SpO2, Respiration_Rate, Temperature";

/// Report for a single reading typed into the form.
pub fn predict_manual(
    models: &ModelSet,
    patient: &PatientIdentity,
    reading: VitalReading,
    config: &ReportConfig,
) -> Result<PatientReport, VitalsError> {
    reading.validate_bounds()?;
    let row = models.predict_row(&reading)?;
    let ideal_ranges = config
        .include_ideal_ranges
        .then(|| resolve_ideal_ranges(patient.age));

    info!(
        patient = %patient.name,
        stress = %row.stress,
        cardio = %row.cardio_respiratory,
        fever = %row.fever,
        "manual report ready"
    );
    Ok(PatientReport::new(
        patient.clone(),
        ReportMode::Manual,
        vec![row],
        ideal_ranges,
    ))
}

/// Report for a batch of readings sharing one patient identity.
///
/// Ideal ranges come from the page-level age and are shared by every row.
pub fn predict_batch(
    models: &ModelSet,
    patient: &PatientIdentity,
    readings: &[VitalReading],
    config: &ReportConfig,
) -> Result<PatientReport, VitalsError> {
    if config.validate_batch_bounds {
        for (index, reading) in readings.iter().enumerate() {
            reading
                .validate_bounds()
                .map_err(|err| VitalsError::InvalidRow {
                    row: index + 1,
                    message: err.to_string(),
                })?;
        }
    }

    let rows = readings
        .iter()
        .enumerate()
        .map(|(index, reading)| {
            debug!(row = index + 1, "predicting batch row");
            models.predict_row(reading)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let ideal_ranges = config
        .include_ideal_ranges
        .then(|| resolve_ideal_ranges(patient.age));

    info!(patient = %patient.name, rows = rows.len(), "batch report ready");
    Ok(PatientReport::new(
        patient.clone(),
        ReportMode::Batch,
        rows,
        ideal_ranges,
    ))
}

/// Parse an uploaded CSV and build the batch report.
///
/// Column validation runs before any model is invoked.
pub fn predict_csv_str(
    models: &ModelSet,
    patient: &PatientIdentity,
    csv_text: &str,
    config: &ReportConfig,
) -> Result<PatientReport, VitalsError> {
    let readings = read_readings(csv_text)?;
    predict_batch(models, patient, &readings, config)
}

/// Batch mode entry point; `Ok(None)` means nothing was uploaded.
pub fn predict_upload(
    models: &ModelSet,
    patient: &PatientIdentity,
    upload: Option<&str>,
    config: &ReportConfig,
) -> Result<Option<PatientReport>, VitalsError> {
    let Some(csv_text) = upload else {
        warn!("{MISSING_UPLOAD_WARNING}");
        return Ok(None);
    };
    predict_csv_str(models, patient, csv_text, config).map(Some)
}
