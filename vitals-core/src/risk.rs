use std::fmt;

use serde::{Deserialize, Serialize};

/// Display severity of a decoded risk label.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    High,
    Medium,
    Low,
}

impl RiskTier {
    /// Case-insensitive; anything other than "high" or "medium" is `Low`.
    pub fn classify(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "high" => RiskTier::High,
            "medium" => RiskTier::Medium,
            _ => RiskTier::Low,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            RiskTier::High => "red",
            RiskTier::Medium => "orange",
            RiskTier::Low => "green",
        }
    }

    pub fn level(self) -> &'static str {
        match self {
            RiskTier::High => "high",
            RiskTier::Medium => "medium",
            RiskTier::Low => "low",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskTier::High => "High",
            RiskTier::Medium => "Medium",
            RiskTier::Low => "Low",
        })
    }
}

/// Label text exactly as the decoder produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct RiskLabel(String);

impl RiskLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn tier(&self) -> RiskTier {
        RiskTier::classify(&self.0)
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RiskLabel {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RiskLabel {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The three prediction axes of a report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskAxis {
    Stress,
    CardioRespiratory,
    Fever,
}

impl RiskAxis {
    pub const ALL: [RiskAxis; 3] = [
        RiskAxis::Stress,
        RiskAxis::CardioRespiratory,
        RiskAxis::Fever,
    ];

    pub fn column(self) -> &'static str {
        match self {
            RiskAxis::Stress => "Stress_Level",
            RiskAxis::CardioRespiratory => "Cardio_Resp_Risk",
            RiskAxis::Fever => "Fever_Risk",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RiskAxis::Stress => "Stress Level",
            RiskAxis::CardioRespiratory => "Cardio-Respiratory Risk",
            RiskAxis::Fever => "Fever Risk",
        }
    }

    /// Short name used in model artifact file names.
    pub fn stem(self) -> &'static str {
        match self {
            RiskAxis::Stress => "stress",
            RiskAxis::CardioRespiratory => "cardio",
            RiskAxis::Fever => "fever",
        }
    }
}

impl fmt::Display for RiskAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stem())
    }
}
