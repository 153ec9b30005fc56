//! Disaster label table

use serde::Serialize;
use std::fmt;

/// Length of the feature vector the classifier is trained on.
pub const FEATURE_COUNT: usize = 5;

/// Classifier output index maps positionally into `DisasterType::ALL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisasterType {
    Earthquake,
    Flood,
    Hurricane,
    Tornado,
    Wildfire,
}

impl DisasterType {
    pub const ALL: [DisasterType; 5] = [
        DisasterType::Earthquake,
        DisasterType::Flood,
        DisasterType::Hurricane,
        DisasterType::Tornado,
        DisasterType::Wildfire,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DisasterType::Earthquake => "Earthquake",
            DisasterType::Flood => "Flood",
            DisasterType::Hurricane => "Hurricane",
            DisasterType::Tornado => "Tornado",
            DisasterType::Wildfire => "Wildfire",
        }
    }

    /// True if `classes` lists exactly the label table, in order.
    pub fn matches_labels(classes: &[String]) -> bool {
        classes.len() == Self::ALL.len()
            && classes.iter().zip(Self::ALL).all(|(c, d)| c == d.as_str())
    }
}

impl fmt::Display for DisasterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity 1-5 derived from prediction confidence.
pub fn severity_from_confidence(confidence: f64) -> u8 {
    let c = confidence.clamp(0.0, 1.0);
    ((c * 5.0).floor() as u8 + 1).min(5)
}
