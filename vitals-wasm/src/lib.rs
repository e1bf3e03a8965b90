//! Framework-neutral WASM <-> JavaScript bridge for the vitals report.

use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use vitals_core::{
    resolve_ideal_ranges, PatientIdentity, PatientReport, ReportConfig, RiskTier, VitalReading,
    VitalsError,
};
use vitals_predict::{ModelBundle, ModelSet};
use wasm_bindgen::prelude::*;

#[derive(Deserialize, Default)]
struct JsReportConfig {
    #[serde(default)]
    include_ideal_ranges: Option<bool>,
    #[serde(default)]
    validate_batch_bounds: Option<bool>,
}

impl From<JsReportConfig> for ReportConfig {
    fn from(cfg: JsReportConfig) -> Self {
        let mut base = ReportConfig::default();
        if let Some(include) = cfg.include_ideal_ranges {
            base.include_ideal_ranges = include;
        }
        if let Some(validate) = cfg.validate_batch_bounds {
            base.validate_batch_bounds = validate;
        }
        base
    }
}

/// Loaded models kept alive on the JavaScript side between predictions.
#[wasm_bindgen]
pub struct VitalsSession {
    models: ModelSet,
}

#[wasm_bindgen]
impl VitalsSession {
    /// Accepts a model bundle object (`{ stress, cardio, fever }`).
    #[wasm_bindgen(constructor)]
    pub fn new(models: JsValue) -> Result<VitalsSession, JsValue> {
        #[cfg(target_arch = "wasm32")]
        console_error_panic_hook::set_once();

        let bundle: ModelBundle = from_value(models)
            .map_err(|err| JsValue::from_str(&format!("Could not read model bundle: {err}")))?;
        bundle
            .validate()
            .map_err(|err| JsValue::from_str(&format_vitals_error(err)))?;
        Ok(VitalsSession {
            models: ModelSet::from(bundle),
        })
    }

    #[wasm_bindgen(js_name = predictManual)]
    pub fn predict_manual(
        &self,
        patient: JsValue,
        reading: JsValue,
        config: Option<JsValue>,
    ) -> Result<JsValue, JsValue> {
        let patient = read_patient(patient)?;
        let reading: VitalReading = from_value(reading)
            .map_err(|err| JsValue::from_str(&format!("Could not read vitals: {err}")))?;
        let cfg = read_config(config)?;

        let report = vitals_predict::predict_manual(&self.models, &patient, reading, &cfg)
            .map_err(|err| JsValue::from_str(&format_vitals_error(err)))?;
        report_to_js(&report)
    }

    /// Returns `null` when no CSV text was supplied.
    #[wasm_bindgen(js_name = predictCsv)]
    pub fn predict_csv(
        &self,
        patient: JsValue,
        csv_text: Option<String>,
        config: Option<JsValue>,
    ) -> Result<JsValue, JsValue> {
        let patient = read_patient(patient)?;
        let cfg = read_config(config)?;

        match vitals_predict::predict_upload(&self.models, &patient, csv_text.as_deref(), &cfg)
            .map_err(|err| JsValue::from_str(&format_vitals_error(err)))?
        {
            Some(report) => report_to_js(&report),
            None => Ok(JsValue::NULL),
        }
    }
}

#[wasm_bindgen(js_name = idealRanges)]
pub fn ideal_ranges(age: u32) -> Result<JsValue, JsValue> {
    to_value(&resolve_ideal_ranges(age))
        .map_err(|err| JsValue::from_str(&format!("Could not serialize ranges: {err}")))
}

/// Severity level token (`high`, `medium`, `low`) for a decoded label.
#[wasm_bindgen(js_name = classifyRisk)]
pub fn classify_risk(label: &str) -> String {
    RiskTier::classify(label).level().to_string()
}

#[wasm_bindgen(js_name = reportToCsv)]
pub fn report_to_csv(report: JsValue) -> Result<String, JsValue> {
    let report: PatientReport = from_value(report)
        .map_err(|err| JsValue::from_str(&format!("Could not read report: {err}")))?;
    vitals_predict::report_to_csv(&report).map_err(|err| JsValue::from_str(&format_vitals_error(err)))
}

fn read_patient(patient: JsValue) -> Result<PatientIdentity, JsValue> {
    from_value(patient).map_err(|err| JsValue::from_str(&format!("Could not read patient: {err}")))
}

fn read_config(config: Option<JsValue>) -> Result<ReportConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsReportConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Could not read config: {err}")))?;
            Ok(ReportConfig::from(cfg))
        }
        _ => Ok(ReportConfig::default()),
    }
}

fn report_to_js(report: &PatientReport) -> Result<JsValue, JsValue> {
    to_value(report).map_err(|err| JsValue::from_str(&format!("Could not serialize report: {err}")))
}

fn format_vitals_error(err: VitalsError) -> String {
    format!("Vitals error: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: JsReportConfig =
            serde_json::from_str(r#"{"include_ideal_ranges": true}"#).unwrap();
        let cfg = ReportConfig::from(cfg);
        assert!(cfg.include_ideal_ranges);
        assert!(!cfg.validate_batch_bounds);

        assert_eq!(
            ReportConfig::from(JsReportConfig::default()),
            ReportConfig::default()
        );
    }

    #[test]
    fn classify_returns_level_tokens() {
        assert_eq!(classify_risk("HIGH"), "high");
        assert_eq!(classify_risk("Medium"), "medium");
        assert_eq!(classify_risk("normal"), "low");
    }

    #[test]
    fn errors_are_prefixed_for_javascript() {
        let message = format_vitals_error(VitalsError::MissingColumns(vec!["SpO2".into()]));
        assert_eq!(
            message,
            "Vitals error: CSV is missing required columns: SpO2"
        );
    }
}
