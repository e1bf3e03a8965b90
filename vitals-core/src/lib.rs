//! Core data model for the vitals risk report: readings, patient identity,
//! ideal ranges by age band and risk severity tiers.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

mod ranges;
mod report;
mod risk;

pub use ranges::{resolve_ideal_ranges, AgeBand, IdealRange, IdealRanges};
pub use report::{PatientReport, ReportMode, ReportRow};
pub use risk::{RiskAxis, RiskLabel, RiskTier};

/// Column names of the five model features, in feature-vector order.
pub const FEATURE_COLUMNS: [&str; 5] = [
    "Heart_Rate",
    "HRV",
    "SpO2",
    "Respiration_Rate",
    "Temperature",
];

/// Highest age the patient form accepts.
pub const MAX_FORM_AGE: u32 = 120;

/// Settings that shape how a report is assembled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportConfig {
    /// Append the age-band ideal ranges to every row.
    #[serde(default)]
    pub include_ideal_ranges: bool,
    /// Apply the form bounds to uploaded rows as well.
    #[serde(default)]
    pub validate_batch_bounds: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_ideal_ranges: false,
            validate_batch_bounds: false,
        }
    }
}

/// One set of measured vital signs.
///
/// Field names on the wire match the upload/report CSV headers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VitalReading {
    #[serde(rename = "Heart_Rate", deserialize_with = "deserialize_whole_number")]
    pub heart_rate: u32,
    #[serde(rename = "HRV", deserialize_with = "deserialize_whole_number")]
    pub hrv: u32,
    #[serde(rename = "SpO2", deserialize_with = "deserialize_whole_number")]
    pub spo2: u32,
    #[serde(rename = "Respiration_Rate", deserialize_with = "deserialize_whole_number")]
    pub respiration_rate: u32,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
}

/// Reads a count such as a heart rate, accepting `72` and `72.0` but not `72.5`.
pub fn deserialize_whole_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&value) {
        Ok(value as u32)
    } else {
        Err(de::Error::custom(format!(
            "expected a whole non-negative number, found {value}"
        )))
    }
}

impl Default for VitalReading {
    fn default() -> Self {
        Self {
            heart_rate: 75,
            hrv: 50,
            spo2: 98,
            respiration_rate: 16,
            temperature: 37.0,
        }
    }
}

impl VitalReading {
    /// Feature vector in [`FEATURE_COLUMNS`] order.
    pub fn features(&self) -> [f64; 5] {
        [
            f64::from(self.heart_rate),
            f64::from(self.hrv),
            f64::from(self.spo2),
            f64::from(self.respiration_rate),
            self.temperature,
        ]
    }

    pub fn value(&self, field: VitalField) -> f64 {
        self.features()[field.index()]
    }

    /// Cell text used by the report CSV and the on-screen table.
    pub fn column_text(&self, field: VitalField) -> String {
        match field {
            VitalField::HeartRate => self.heart_rate.to_string(),
            VitalField::Hrv => self.hrv.to_string(),
            VitalField::Spo2 => self.spo2.to_string(),
            VitalField::RespirationRate => self.respiration_rate.to_string(),
            VitalField::Temperature => format!("{:?}", self.temperature),
        }
    }

    /// Check every field against the form bounds, reporting the first violation.
    pub fn validate_bounds(&self) -> Result<(), VitalsError> {
        for field in VitalField::ALL {
            let value = self.value(field);
            let bounds = field.bounds();
            if !bounds.contains(value) {
                return Err(VitalsError::OutOfRange {
                    field: field.column(),
                    value,
                    min: bounds.min,
                    max: bounds.max,
                });
            }
        }
        Ok(())
    }
}

/// The five measured features.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VitalField {
    HeartRate,
    Hrv,
    Spo2,
    RespirationRate,
    Temperature,
}

impl VitalField {
    pub const ALL: [VitalField; 5] = [
        VitalField::HeartRate,
        VitalField::Hrv,
        VitalField::Spo2,
        VitalField::RespirationRate,
        VitalField::Temperature,
    ];

    pub fn index(self) -> usize {
        match self {
            VitalField::HeartRate => 0,
            VitalField::Hrv => 1,
            VitalField::Spo2 => 2,
            VitalField::RespirationRate => 3,
            VitalField::Temperature => 4,
        }
    }

    /// CSV column name.
    pub fn column(self) -> &'static str {
        FEATURE_COLUMNS[self.index()]
    }

    /// Column name of the matching ideal-range annotation.
    pub fn ideal_column(self) -> &'static str {
        match self {
            VitalField::HeartRate => "Ideal_Heart_Rate",
            VitalField::Hrv => "Ideal_HRV",
            VitalField::Spo2 => "Ideal_SpO2",
            VitalField::RespirationRate => "Ideal_Respiration_Rate",
            VitalField::Temperature => "Ideal_Temperature",
        }
    }

    /// Form label with unit.
    pub fn label(self) -> &'static str {
        match self {
            VitalField::HeartRate => "Heart Rate (BPM)",
            VitalField::Hrv => "HRV (ms)",
            VitalField::Spo2 => "SpO₂ (%)",
            VitalField::RespirationRate => "Respiration Rate (breaths/min)",
            VitalField::Temperature => "Body Temperature (°C)",
        }
    }

    /// Accepted input range on the manual form.
    pub fn bounds(self) -> FieldBounds {
        match self {
            VitalField::HeartRate => FieldBounds::new(40.0, 180.0),
            VitalField::Hrv => FieldBounds::new(10.0, 150.0),
            VitalField::Spo2 => FieldBounds::new(80.0, 100.0),
            VitalField::RespirationRate => FieldBounds::new(10.0, 40.0),
            VitalField::Temperature => FieldBounds::new(35.0, 42.0),
        }
    }
}

/// Inclusive min/max accepted for a form field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FieldBounds {
    pub min: f64,
    pub max: f64,
}

impl FieldBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = VitalsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(VitalsError::Parse(format!("unknown gender '{other}'"))),
        }
    }
}

/// Page-level patient information broadcast onto every report row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientIdentity {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
}

impl Default for PatientIdentity {
    fn default() -> Self {
        Self {
            name: String::new(),
            age: 30,
            gender: Gender::Male,
        }
    }
}

impl PatientIdentity {
    pub fn new(name: impl Into<String>, age: u32, gender: Gender) -> Self {
        Self {
            name: name.into(),
            age,
            gender,
        }
    }

    /// Form-level check; the range resolver itself accepts any age.
    pub fn validate(&self) -> Result<(), VitalsError> {
        if self.age > MAX_FORM_AGE {
            return Err(VitalsError::OutOfRange {
                field: "Age",
                value: f64::from(self.age),
                min: 0.0,
                max: f64::from(MAX_FORM_AGE),
            });
        }
        Ok(())
    }
}

/// Errors shared by the report pipeline.
#[derive(Debug, thiserror::Error)]
pub enum VitalsError {
    #[error("{field} = {value} is outside the accepted range {min}-{max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("CSV is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("invalid data on row {row}: {message}")]
    InvalidRow { row: usize, message: String },
    #[error("{axis} model failed: {message}")]
    Model { axis: RiskAxis, message: String },
    #[error("label code {code} is not one of the {classes} known classes")]
    UnknownLabel { code: usize, classes: usize },
    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("could not parse input: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_follow_column_order() {
        let reading = VitalReading {
            heart_rate: 88,
            hrv: 42,
            spo2: 96,
            respiration_rate: 18,
            temperature: 37.4,
        };
        assert_eq!(reading.features(), [88.0, 42.0, 96.0, 18.0, 37.4]);
        for field in VitalField::ALL {
            assert_eq!(FEATURE_COLUMNS[field.index()], field.column());
        }
    }

    #[test]
    fn default_reading_is_within_bounds() {
        assert!(VitalReading::default().validate_bounds().is_ok());
    }

    #[test]
    fn bounds_are_inclusive_and_reject_outliers() {
        let edge = VitalReading {
            heart_rate: 40,
            hrv: 150,
            spo2: 80,
            respiration_rate: 40,
            temperature: 42.0,
        };
        assert!(edge.validate_bounds().is_ok());

        let hot = VitalReading {
            temperature: 42.5,
            ..VitalReading::default()
        };
        match hot.validate_bounds() {
            Err(VitalsError::OutOfRange { field, max, .. }) => {
                assert_eq!(field, "Temperature");
                assert_eq!(max, 42.0);
            }
            other => panic!("expected out of range, got {other:?}"),
        }

        let slow = VitalReading {
            heart_rate: 39,
            ..VitalReading::default()
        };
        assert!(matches!(
            slow.validate_bounds(),
            Err(VitalsError::OutOfRange {
                field: "Heart_Rate",
                ..
            })
        ));
    }

    #[test]
    fn gender_parses_case_insensitively() {
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(" OTHER ".parse::<Gender>().unwrap(), Gender::Other);
        assert!("robot".parse::<Gender>().is_err());
    }

    #[test]
    fn identity_rejects_ages_past_form_limit() {
        assert!(PatientIdentity::new("Ana", 120, Gender::Female)
            .validate()
            .is_ok());
        assert!(PatientIdentity::new("Ana", 121, Gender::Female)
            .validate()
            .is_err());
    }

    #[test]
    fn config_fills_missing_fields_with_defaults() {
        let cfg: ReportConfig = serde_json::from_str(r#"{"include_ideal_ranges": true}"#).unwrap();
        assert!(cfg.include_ideal_ranges);
        assert!(!cfg.validate_batch_bounds);
        assert_eq!(
            serde_json::from_str::<ReportConfig>("{}").unwrap(),
            ReportConfig::default()
        );
    }

    #[test]
    fn column_text_keeps_temperature_precision() {
        let reading = VitalReading {
            temperature: 36.85,
            ..VitalReading::default()
        };
        assert_eq!(reading.column_text(VitalField::Temperature), "36.85");
        assert_eq!(
            VitalReading::default().column_text(VitalField::Temperature),
            "37.0"
        );
        assert_eq!(reading.column_text(VitalField::HeartRate), "75");
    }

    #[test]
    fn counts_accept_whole_valued_decimals() {
        let reading: VitalReading = serde_json::from_str(
            r#"{"Heart_Rate": 72.0, "HRV": 50, "SpO2": 97, "Respiration_Rate": 16.0, "Temperature": 36.8}"#,
        )
        .unwrap();
        assert_eq!(reading.heart_rate, 72);
        assert_eq!(reading.respiration_rate, 16);

        let fractional = r#"{"Heart_Rate": 72.5, "HRV": 50, "SpO2": 97, "Respiration_Rate": 16, "Temperature": 36.8}"#;
        assert!(serde_json::from_str::<VitalReading>(fractional).is_err());
        let negative = r#"{"Heart_Rate": -1, "HRV": 50, "SpO2": 97, "Respiration_Rate": 16, "Temperature": 36.8}"#;
        assert!(serde_json::from_str::<VitalReading>(negative).is_err());
    }

    #[test]
    fn reading_uses_csv_headers_on_the_wire() {
        let json = serde_json::to_value(VitalReading::default()).unwrap();
        for column in FEATURE_COLUMNS {
            assert!(json.get(column).is_some(), "missing {column}");
        }
    }
}
