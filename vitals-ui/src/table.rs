//! Flattens a report into display rows with risk levels attached.

use vitals_core::{PatientReport, RiskAxis, VitalField, FEATURE_COLUMNS};

#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub text: String,
    /// Severity level token for risk columns, used as `data-level`.
    pub level: Option<&'static str>,
}

impl TableCell {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<TableCell>>,
}

/// Same columns as the exported CSV.
pub fn report_table(report: &PatientReport) -> ReportTable {
    let mut headers = vec!["Patient_Name", "Age", "Gender"];
    headers.extend(FEATURE_COLUMNS);
    headers.extend(RiskAxis::ALL.map(RiskAxis::column));
    if report.ideal_ranges.is_some() {
        headers.extend(VitalField::ALL.map(VitalField::ideal_column));
    }

    let rows = report
        .rows()
        .iter()
        .map(|row| {
            let mut cells = vec![
                TableCell::plain(report.patient.name.clone()),
                TableCell::plain(report.patient.age.to_string()),
                TableCell::plain(report.patient.gender.as_str()),
            ];
            cells.extend(
                VitalField::ALL.map(|field| TableCell::plain(row.reading.column_text(field))),
            );
            cells.extend(RiskAxis::ALL.map(|axis| {
                let label = row.label(axis);
                TableCell {
                    text: label.to_string(),
                    level: Some(label.tier().level()),
                }
            }));
            if let Some(ranges) = &report.ideal_ranges {
                cells.extend(
                    ranges
                        .entries()
                        .map(|(_, range)| TableCell::plain(range.to_string())),
                );
            }
            cells
        })
        .collect();

    ReportTable { headers, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitals_core::{
        resolve_ideal_ranges, Gender, PatientIdentity, ReportMode, ReportRow, VitalReading,
    };

    fn row(stress: &str, cardio: &str, fever: &str) -> ReportRow {
        ReportRow {
            reading: VitalReading::default(),
            stress: stress.into(),
            cardio_respiratory: cardio.into(),
            fever: fever.into(),
        }
    }

    #[test]
    fn risk_cells_carry_levels() {
        let report = PatientReport::new(
            PatientIdentity::new("Hoa", 8, Gender::Other),
            ReportMode::Batch,
            vec![row("High", "medium", "Normal"), row("Low", "Low", "HIGH")],
            None,
        );
        let table = report_table(&report);

        assert_eq!(table.headers.len(), 11);
        assert_eq!(table.rows.len(), 2);
        let levels: Vec<_> = table.rows[0][8..11].iter().map(|cell| cell.level).collect();
        assert_eq!(levels, [Some("high"), Some("medium"), Some("low")]);
        assert_eq!(table.rows[1][10].level, Some("high"));
        assert_eq!(table.rows[0][7].text, "37.0");
        assert!(table.rows[0][..8].iter().all(|cell| cell.level.is_none()));
    }

    #[test]
    fn cells_match_the_downloaded_csv() {
        let mut precise = row("Low", "Medium", "High");
        precise.reading.temperature = 36.85;
        let report = PatientReport::new(
            PatientIdentity::new("Hoa", 8, Gender::Other),
            ReportMode::Batch,
            vec![precise],
            Some(resolve_ideal_ranges(8)),
        );
        let table = report_table(&report);
        assert_eq!(table.rows[0][7].text, "36.85");

        let csv = vitals_predict::report_to_csv(&report).unwrap();
        let data_line = csv.lines().nth(1).unwrap();
        let texts: Vec<&str> = table.rows[0].iter().map(|cell| cell.text.as_str()).collect();
        assert_eq!(data_line, texts.join(","));
    }

    #[test]
    fn ideal_columns_follow_the_labels() {
        let report = PatientReport::new(
            PatientIdentity::new("Hoa", 8, Gender::Other),
            ReportMode::Manual,
            vec![row("Low", "Low", "Low")],
            Some(resolve_ideal_ranges(8)),
        );
        let table = report_table(&report);

        assert_eq!(table.headers.len(), 16);
        assert_eq!(table.headers[11], "Ideal_Heart_Rate");
        assert_eq!(table.rows[0][11].text, "70-110");
        assert_eq!(table.rows[0][14].text, "18-30");
    }
}
