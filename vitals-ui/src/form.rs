//! State behind the manual vitals form.

use vitals_core::{
    PatientIdentity, PatientReport, ReportConfig, VitalField, VitalReading, VitalsError,
};

/// Raw text of the five number inputs, kept as typed until submit.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualForm {
    values: [String; 5],
}

impl Default for ManualForm {
    fn default() -> Self {
        let reading = VitalReading::default();
        Self {
            values: [
                reading.heart_rate.to_string(),
                reading.hrv.to_string(),
                reading.spo2.to_string(),
                reading.respiration_rate.to_string(),
                format!("{:.1}", reading.temperature),
            ],
        }
    }
}

impl ManualForm {
    pub fn value(&self, field: VitalField) -> &str {
        &self.values[field.index()]
    }

    pub fn set(&mut self, field: VitalField, text: impl Into<String>) {
        self.values[field.index()] = text.into();
    }

    /// Parse every input and apply the form bounds.
    pub fn reading(&self) -> Result<VitalReading, VitalsError> {
        let reading = VitalReading {
            heart_rate: self.parse_whole(VitalField::HeartRate)?,
            hrv: self.parse_whole(VitalField::Hrv)?,
            spo2: self.parse_whole(VitalField::Spo2)?,
            respiration_rate: self.parse_whole(VitalField::RespirationRate)?,
            temperature: self.parse_decimal(VitalField::Temperature)?,
        };
        reading.validate_bounds()?;
        Ok(reading)
    }

    fn parse_whole(&self, field: VitalField) -> Result<u32, VitalsError> {
        let text = self.value(field).trim();
        text.parse()
            .map_err(|_| VitalsError::Parse(format!("{}: '{text}' is not a whole number", field.label())))
    }

    fn parse_decimal(&self, field: VitalField) -> Result<f64, VitalsError> {
        let text = self.value(field).trim();
        text.parse()
            .map_err(|_| VitalsError::Parse(format!("{}: '{text}' is not a number", field.label())))
    }

    /// `step` attribute for the number input.
    pub fn step(field: VitalField) -> &'static str {
        match field {
            VitalField::Temperature => "0.1",
            _ => "1",
        }
    }
}

/// Last manual prediction, remembered with the sidebar inputs it was made for.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualResult {
    patient: PatientIdentity,
    config: ReportConfig,
    outcome: Result<PatientReport, String>,
}

impl ManualResult {
    pub fn new(
        patient: PatientIdentity,
        config: ReportConfig,
        outcome: Result<PatientReport, String>,
    ) -> Self {
        Self {
            patient,
            config,
            outcome,
        }
    }

    /// `None` once the patient or report settings differ from the prediction's.
    pub fn current(
        &self,
        patient: &PatientIdentity,
        config: &ReportConfig,
    ) -> Option<&Result<PatientReport, String>> {
        (self.patient == *patient && self.config == *config).then_some(&self.outcome)
    }
}
