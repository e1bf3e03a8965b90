//! Upload parsing and report CSV serialization.

use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::Deserialize;
use vitals_core::{
    deserialize_whole_number, AgeBand, Gender, IdealRange, IdealRanges, PatientIdentity,
    PatientReport, ReportMode, ReportRow, RiskAxis, VitalField, VitalReading, VitalsError,
    FEATURE_COLUMNS,
};

const IDENTITY_COLUMNS: [&str; 3] = ["Patient_Name", "Age", "Gender"];

/// Parse uploaded sensor rows.
///
/// All five feature columns must be present in the header before any row is
/// read; other columns are ignored.
pub fn read_readings(csv_text: &str) -> Result<Vec<VitalReading>, VitalsError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(csv_text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|err| VitalsError::Csv(err.to_string()))?
        .clone();
    let missing: Vec<String> = FEATURE_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|header| header == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(VitalsError::MissingColumns(missing));
    }

    reader
        .deserialize::<VitalReading>()
        .enumerate()
        .map(|(index, record)| {
            record.map_err(|err| VitalsError::InvalidRow {
                row: index + 1,
                message: err.to_string(),
            })
        })
        .collect()
}

/// Serialize a report with the fixed column order, ideal ranges last.
pub fn report_to_csv(report: &PatientReport) -> Result<String, VitalsError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    let mut header: Vec<&str> = IDENTITY_COLUMNS.to_vec();
    header.extend(FEATURE_COLUMNS);
    header.extend(RiskAxis::ALL.map(RiskAxis::column));
    if report.ideal_ranges.is_some() {
        header.extend(VitalField::ALL.map(VitalField::ideal_column));
    }
    writer.write_record(&header).map_err(csv_error)?;

    let ideal: Option<Vec<String>> = report.ideal_ranges.as_ref().map(|ranges| {
        ranges
            .entries()
            .iter()
            .map(|(_, range)| range.to_string())
            .collect()
    });

    for row in report.rows() {
        let mut record = vec![
            report.patient.name.clone(),
            report.patient.age.to_string(),
            report.patient.gender.to_string(),
        ];
        record.extend(VitalField::ALL.map(|field| row.reading.column_text(field)));
        record.extend(
            RiskAxis::ALL.map(|axis| row.label(axis).as_str().to_string()),
        );
        if let Some(ideal) = &ideal {
            record.extend(ideal.iter().cloned());
        }
        writer.write_record(&record).map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| VitalsError::Csv(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| VitalsError::Csv(err.to_string()))
}

#[derive(Deserialize)]
struct ReportRecord {
    #[serde(rename = "Patient_Name")]
    patient_name: String,
    #[serde(rename = "Age")]
    age: u32,
    #[serde(rename = "Gender")]
    gender: String,
    #[serde(rename = "Heart_Rate", deserialize_with = "deserialize_whole_number")]
    heart_rate: u32,
    #[serde(rename = "HRV", deserialize_with = "deserialize_whole_number")]
    hrv: u32,
    #[serde(rename = "SpO2", deserialize_with = "deserialize_whole_number")]
    spo2: u32,
    #[serde(rename = "Respiration_Rate", deserialize_with = "deserialize_whole_number")]
    respiration_rate: u32,
    #[serde(rename = "Temperature")]
    temperature: f64,
    #[serde(rename = "Stress_Level")]
    stress_level: String,
    #[serde(rename = "Cardio_Resp_Risk")]
    cardio_resp_risk: String,
    #[serde(rename = "Fever_Risk")]
    fever_risk: String,
    #[serde(rename = "Ideal_Heart_Rate", default)]
    ideal_heart_rate: Option<String>,
    #[serde(rename = "Ideal_HRV", default)]
    ideal_hrv: Option<String>,
    #[serde(rename = "Ideal_SpO2", default)]
    ideal_spo2: Option<String>,
    #[serde(rename = "Ideal_Respiration_Rate", default)]
    ideal_respiration_rate: Option<String>,
    #[serde(rename = "Ideal_Temperature", default)]
    ideal_temperature: Option<String>,
}

impl ReportRecord {
    fn ideal_ranges(&self) -> Result<Option<IdealRanges>, VitalsError> {
        let columns = [
            &self.ideal_heart_rate,
            &self.ideal_hrv,
            &self.ideal_spo2,
            &self.ideal_respiration_rate,
            &self.ideal_temperature,
        ];
        if columns.iter().all(|value| value.is_none()) {
            return Ok(None);
        }
        let parse = |value: &Option<String>| -> Result<IdealRange, VitalsError> {
            value
                .as_deref()
                .ok_or_else(|| VitalsError::Parse("incomplete ideal range columns".into()))?
                .parse()
        };
        Ok(Some(IdealRanges {
            band: AgeBand::for_age(self.age),
            heart_rate: parse(columns[0])?,
            hrv: parse(columns[1])?,
            spo2: parse(columns[2])?,
            respiration_rate: parse(columns[3])?,
            temperature: parse(columns[4])?,
        }))
    }

    fn row(&self) -> ReportRow {
        ReportRow {
            reading: VitalReading {
                heart_rate: self.heart_rate,
                hrv: self.hrv,
                spo2: self.spo2,
                respiration_rate: self.respiration_rate,
                temperature: self.temperature,
            },
            stress: self.stress_level.as_str().into(),
            cardio_respiratory: self.cardio_resp_risk.as_str().into(),
            fever: self.fever_risk.as_str().into(),
        }
    }
}

/// Parse a report written by [`report_to_csv`].
///
/// Identity and ideal ranges are broadcast values, so they are taken from the
/// first row.
pub fn report_from_csv(csv_text: &str, mode: ReportMode) -> Result<PatientReport, VitalsError> {
    let mut reader = ReaderBuilder::new().from_reader(csv_text.as_bytes());
    let records = reader
        .deserialize::<ReportRecord>()
        .enumerate()
        .map(|(index, record)| {
            record.map_err(|err| VitalsError::InvalidRow {
                row: index + 1,
                message: err.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let first = records
        .first()
        .ok_or_else(|| VitalsError::Parse("report has no rows".into()))?;
    let gender: Gender = first.gender.parse()?;
    let patient = PatientIdentity::new(first.patient_name.clone(), first.age, gender);
    let ideal_ranges = first.ideal_ranges()?;
    let rows = records.iter().map(ReportRecord::row).collect();

    Ok(PatientReport::new(patient, mode, rows, ideal_ranges))
}

fn csv_error(err: csv::Error) -> VitalsError {
    VitalsError::Csv(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_every_missing_column() {
        let err = read_readings("Heart_Rate,HRV,Temperature\n70,40,37.0\n").unwrap_err();
        match err {
            VitalsError::MissingColumns(columns) => {
                assert_eq!(columns, vec!["SpO2".to_string(), "Respiration_Rate".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn extra_columns_are_ignored() {
        let csv = "Patient_Name,Heart_Rate,HRV,SpO2,Respiration_Rate,Temperature,Device\n\
                   Someone,72,55,97,15,36.8,arduino-1\n";
        let readings = read_readings(csv).unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].heart_rate, 72);
        assert_eq!(readings[0].temperature, 36.8);
    }

    #[test]
    fn column_order_does_not_matter() {
        let csv = "Temperature,SpO2,HRV,Respiration_Rate,Heart_Rate\n38.2,93,30,24,110\n";
        let reading = read_readings(csv).unwrap()[0];
        assert_eq!(reading.features(), [110.0, 30.0, 93.0, 24.0, 38.2]);
    }

    #[test]
    fn header_only_upload_has_no_rows() {
        let readings = read_readings("Heart_Rate,HRV,SpO2,Respiration_Rate,Temperature\n").unwrap();
        assert!(readings.is_empty());
    }

    #[test]
    fn bad_values_name_the_row() {
        let csv = "Heart_Rate,HRV,SpO2,Respiration_Rate,Temperature\n\
                   72,55,97,15,36.8\n\
                   fast,55,97,15,36.8\n";
        assert!(matches!(
            read_readings(csv),
            Err(VitalsError::InvalidRow { row: 2, .. })
        ));
    }

    #[test]
    fn whole_valued_decimals_are_read_as_counts() {
        let csv = "Heart_Rate,HRV,SpO2,Respiration_Rate,Temperature\n72.0,50,97,16.0,36.8\n";
        let reading = read_readings(csv).unwrap()[0];
        assert_eq!(reading.heart_rate, 72);
        assert_eq!(reading.respiration_rate, 16);
        assert_eq!(reading.temperature, 36.8);

        let fractional = "Heart_Rate,HRV,SpO2,Respiration_Rate,Temperature\n\
                          72,50,97,16,36.8\n\
                          72.5,50,97,16,36.8\n";
        match read_readings(fractional) {
            Err(VitalsError::InvalidRow { row, message }) => {
                assert_eq!(row, 2);
                assert!(message.contains("whole"), "{message}");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn empty_upload_misses_all_columns() {
        match read_readings("") {
            Err(VitalsError::MissingColumns(columns)) => assert_eq!(columns.len(), 5),
            other => panic!("unexpected result {other:?}"),
        }
    }
}
