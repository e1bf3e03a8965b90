//! Ideal vital-sign ranges by age band.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{VitalField, VitalsError};

/// Fixed age intervals used to pick heart-rate and respiration ranges.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AgeBand {
    Infant,
    Toddler,
    Child,
    Adolescent,
    Adult,
    Senior,
}

impl AgeBand {
    pub fn for_age(age: u32) -> Self {
        band_entry(age).band
    }

    /// Inclusive lower bound and optional inclusive upper bound.
    pub fn bounds(self) -> (u32, Option<u32>) {
        match self {
            AgeBand::Infant => (0, Some(1)),
            AgeBand::Toddler => (2, Some(5)),
            AgeBand::Child => (6, Some(12)),
            AgeBand::Adolescent => (13, Some(18)),
            AgeBand::Adult => (19, Some(60)),
            AgeBand::Senior => (61, None),
        }
    }
}

/// Written as `"13-18"`, or `"61+"` for the open-ended band.
impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds() {
            (low, Some(high)) => write!(f, "{low}-{high}"),
            (low, None) => write!(f, "{low}+"),
        }
    }
}

/// Inclusive `low..=high` range, written as `"{low}-{high}"`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IdealRange {
    pub low: f64,
    pub high: f64,
}

impl IdealRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

impl fmt::Display for IdealRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", format_bound(self.low), format_bound(self.high))
    }
}

impl FromStr for IdealRange {
    type Err = VitalsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (low, high) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| VitalsError::Parse(format!("range '{s}' is not low-high")))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<f64>()
                .map_err(|err| VitalsError::Parse(format!("range '{s}': {err}")))
        };
        Ok(Self::new(parse(low)?, parse(high)?))
    }
}

/// Ideal range for each feature, resolved for one age.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IdealRanges {
    pub band: AgeBand,
    pub heart_rate: IdealRange,
    pub hrv: IdealRange,
    pub spo2: IdealRange,
    pub respiration_rate: IdealRange,
    pub temperature: IdealRange,
}

impl IdealRanges {
    pub fn get(&self, field: VitalField) -> IdealRange {
        match field {
            VitalField::HeartRate => self.heart_rate,
            VitalField::Hrv => self.hrv,
            VitalField::Spo2 => self.spo2,
            VitalField::RespirationRate => self.respiration_rate,
            VitalField::Temperature => self.temperature,
        }
    }

    /// Field/range pairs in feature order.
    pub fn entries(&self) -> [(VitalField, IdealRange); 5] {
        VitalField::ALL.map(|field| (field, self.get(field)))
    }
}

struct BandEntry {
    upper: Option<u32>,
    band: AgeBand,
    heart_rate: IdealRange,
    respiration_rate: IdealRange,
}

// Ordered by upper bound; the first entry containing the age wins.
static BAND_TABLE: [BandEntry; 6] = [
    BandEntry {
        upper: Some(1),
        band: AgeBand::Infant,
        heart_rate: IdealRange::new(100.0, 160.0),
        respiration_rate: IdealRange::new(30.0, 60.0),
    },
    BandEntry {
        upper: Some(5),
        band: AgeBand::Toddler,
        heart_rate: IdealRange::new(80.0, 130.0),
        respiration_rate: IdealRange::new(24.0, 40.0),
    },
    BandEntry {
        upper: Some(12),
        band: AgeBand::Child,
        heart_rate: IdealRange::new(70.0, 110.0),
        respiration_rate: IdealRange::new(18.0, 30.0),
    },
    BandEntry {
        upper: Some(18),
        band: AgeBand::Adolescent,
        heart_rate: IdealRange::new(60.0, 100.0),
        respiration_rate: IdealRange::new(12.0, 20.0),
    },
    BandEntry {
        upper: Some(60),
        band: AgeBand::Adult,
        heart_rate: IdealRange::new(60.0, 100.0),
        respiration_rate: IdealRange::new(12.0, 20.0),
    },
    BandEntry {
        upper: None,
        band: AgeBand::Senior,
        heart_rate: IdealRange::new(60.0, 100.0),
        respiration_rate: IdealRange::new(12.0, 20.0),
    },
];

const SPO2_RANGE: IdealRange = IdealRange::new(95.0, 100.0);
const HRV_RANGE: IdealRange = IdealRange::new(20.0, 100.0);
const TEMPERATURE_RANGE: IdealRange = IdealRange::new(36.1, 37.2);

fn band_entry(age: u32) -> &'static BandEntry {
    BAND_TABLE
        .iter()
        .find(|entry| entry.upper.map_or(true, |upper| age <= upper))
        .unwrap_or(&BAND_TABLE[BAND_TABLE.len() - 1])
}

/// Ideal ranges for a patient of `age` years. Any age is accepted.
pub fn resolve_ideal_ranges(age: u32) -> IdealRanges {
    let entry = band_entry(age);
    IdealRanges {
        band: entry.band,
        heart_rate: entry.heart_rate,
        hrv: HRV_RANGE,
        spo2: SPO2_RANGE,
        respiration_rate: entry.respiration_rate,
        temperature: TEMPERATURE_RANGE,
    }
}

fn format_bound(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heart_rate_by_age() {
        assert_eq!(
            resolve_ideal_ranges(0).heart_rate,
            IdealRange::new(100.0, 160.0)
        );
        assert_eq!(
            resolve_ideal_ranges(30).heart_rate,
            IdealRange::new(60.0, 100.0)
        );
        assert_eq!(
            resolve_ideal_ranges(70).heart_rate,
            IdealRange::new(60.0, 100.0)
        );
        assert_eq!(
            resolve_ideal_ranges(70).respiration_rate,
            resolve_ideal_ranges(30).respiration_rate
        );
    }

    #[test]
    fn band_boundaries_have_no_gaps() {
        let edges = [
            (1, AgeBand::Infant, AgeBand::Toddler),
            (5, AgeBand::Toddler, AgeBand::Child),
            (12, AgeBand::Child, AgeBand::Adolescent),
            (18, AgeBand::Adolescent, AgeBand::Adult),
            (60, AgeBand::Adult, AgeBand::Senior),
        ];
        for (last, below, above) in edges {
            assert_eq!(AgeBand::for_age(last), below, "age {last}");
            assert_eq!(AgeBand::for_age(last + 1), above, "age {}", last + 1);
        }
    }

    #[test]
    fn every_age_lands_in_its_declared_band() {
        for age in 0..=150 {
            let band = AgeBand::for_age(age);
            let (low, high) = band.bounds();
            assert!(age >= low, "age {age} below {band}");
            assert!(high.map_or(true, |high| age <= high), "age {age} above {band}");
            assert_eq!(resolve_ideal_ranges(age).band, band);
        }
        assert_eq!(AgeBand::for_age(u32::MAX), AgeBand::Senior);
    }

    #[test]
    fn band_names_follow_their_bounds() {
        assert_eq!(AgeBand::Infant.to_string(), "0-1");
        assert_eq!(AgeBand::Adolescent.to_string(), "13-18");
        assert_eq!(AgeBand::Senior.to_string(), "61+");
        assert_eq!(resolve_ideal_ranges(40).band.to_string(), "19-60");
    }

    #[test]
    fn fixed_ranges_do_not_depend_on_age() {
        let infant = resolve_ideal_ranges(0);
        let senior = resolve_ideal_ranges(95);
        assert_eq!(infant.spo2, senior.spo2);
        assert_eq!(infant.hrv, senior.hrv);
        assert_eq!(infant.temperature, senior.temperature);
        assert!(senior.temperature.contains(37.0));
        assert!(!senior.spo2.contains(94.0));
    }

    #[test]
    fn range_text_form() {
        assert_eq!(IdealRange::new(60.0, 100.0).to_string(), "60-100");
        assert_eq!(IdealRange::new(36.1, 37.2).to_string(), "36.1-37.2");
        assert_eq!(
            "36.1-37.2".parse::<IdealRange>().unwrap(),
            IdealRange::new(36.1, 37.2)
        );
        assert!("sixty".parse::<IdealRange>().is_err());
        assert!("60-".parse::<IdealRange>().is_err());
    }
}
