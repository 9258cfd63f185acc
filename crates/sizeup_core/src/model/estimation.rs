//! Estimation mode catalog.
//!
//! # Responsibility
//! - Define the fixed option sets participants can pick from.
//! - Map option values to the numeric weights used for averaging.
//!
//! # Invariants
//! - Option order is display order and also the tie-break order for
//!   nearest-option lookup.
//! - Option values are case-sensitive (`XS` is valid, `xs` is not).
//! - Unknown or missing mode identifiers resolve to `tshirt`.

use serde::{Deserialize, Serialize};

/// Identifier of one estimation scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimationModeId {
    /// XS..XXL T-shirt sizes.
    Tshirt,
    /// Planning poker Fibonacci story points.
    Fibonacci,
}

impl EstimationModeId {
    /// Stable identifier stored in session documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tshirt => "tshirt",
            Self::Fibonacci => "fibonacci",
        }
    }

    /// Parses a stored identifier. Returns `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "tshirt" => Some(Self::Tshirt),
            "fibonacci" => Some(Self::Fibonacci),
            _ => None,
        }
    }
}

/// One selectable estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimateOption {
    /// Value stored in `Participant::estimate`.
    pub value: &'static str,
    /// Text shown on buttons and in result summaries.
    pub label: &'static str,
    /// Averaging weight. Not required to be evenly spaced.
    pub weight: f64,
}

/// Static description of one estimation scale plus its display copy.
#[derive(Debug, PartialEq)]
pub struct EstimationMode {
    pub id: EstimationModeId,
    pub label: &'static str,
    pub short_label: &'static str,
    pub title: &'static str,
    pub prompt: &'static str,
    pub welcome_message: &'static str,
    pub options: &'static [EstimateOption],
}

impl EstimationMode {
    /// Finds the option carrying `value`, if any.
    pub fn option(&self, value: &str) -> Option<&'static EstimateOption> {
        self.options.iter().find(|option| option.value == value)
    }

    /// Returns the averaging weight for `value`, or `None` for foreign values.
    pub fn weight_of(&self, value: &str) -> Option<f64> {
        self.option(value).map(|option| option.weight)
    }

    /// Returns whether `value` is one of this mode's option values.
    pub fn accepts(&self, value: &str) -> bool {
        self.option(value).is_some()
    }

    /// Option values in display order.
    pub fn values(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.options.iter().map(|option| option.value)
    }
}

const fn option(value: &'static str, weight: f64) -> EstimateOption {
    EstimateOption {
        value,
        label: value,
        weight,
    }
}

const TSHIRT_OPTIONS: &[EstimateOption] = &[
    option("XS", 1.0),
    option("S", 2.0),
    option("M", 3.0),
    option("L", 4.0),
    option("XL", 5.0),
    option("XXL", 6.0),
];

const FIBONACCI_OPTIONS: &[EstimateOption] = &[
    option("1", 1.0),
    option("2", 2.0),
    option("3", 3.0),
    option("5", 5.0),
    option("8", 8.0),
    option("13", 13.0),
    option("21", 21.0),
    option("34", 34.0),
    option("55", 55.0),
    option("89", 89.0),
];

pub static TSHIRT: EstimationMode = EstimationMode {
    id: EstimationModeId::Tshirt,
    label: "T-shirt Sizes",
    short_label: "T-shirt",
    title: "👕 T-shirt Estimator",
    prompt: "Select your T-shirt size estimate:",
    welcome_message: "Ready to estimate? Select your T-shirt size below.",
    options: TSHIRT_OPTIONS,
};

pub static FIBONACCI: EstimationMode = EstimationMode {
    id: EstimationModeId::Fibonacci,
    label: "Planning Poker (Fibonacci)",
    short_label: "Planning Poker",
    title: "🎯 Story Point Estimator",
    prompt: "Select your Fibonacci estimate:",
    welcome_message: "Ready to estimate? Choose your Fibonacci number below.",
    options: FIBONACCI_OPTIONS,
};

/// All registered modes in menu order.
pub static ALL_MODES: [&EstimationMode; 2] = [&TSHIRT, &FIBONACCI];

/// Resolves a stored mode identifier.
///
/// Absent or unrecognized identifiers fall back to the T-shirt scale, so old
/// documents without a mode keep rendering.
pub fn get_mode(id: Option<&str>) -> &'static EstimationMode {
    match id.and_then(EstimationModeId::parse) {
        Some(mode_id) => mode_by_id(mode_id),
        None => &TSHIRT,
    }
}

/// Resolves a typed mode identifier.
pub fn mode_by_id(id: EstimationModeId) -> &'static EstimationMode {
    match id {
        EstimationModeId::Tshirt => &TSHIRT,
        EstimationModeId::Fibonacci => &FIBONACCI,
    }
}

#[cfg(test)]
mod tests {
    use super::{get_mode, EstimationModeId, ALL_MODES};

    #[test]
    fn unknown_or_missing_mode_falls_back_to_tshirt() {
        assert_eq!(get_mode(None).id, EstimationModeId::Tshirt);
        assert_eq!(get_mode(Some("planning")).id, EstimationModeId::Tshirt);
        assert_eq!(get_mode(Some("FIBONACCI")).id, EstimationModeId::Tshirt);
        assert_eq!(
            get_mode(Some("fibonacci")).id,
            EstimationModeId::Fibonacci
        );
    }

    #[test]
    fn fibonacci_weights_are_not_evenly_spaced() {
        let mode = get_mode(Some("fibonacci"));
        let weights: Vec<f64> = mode.options.iter().map(|option| option.weight).collect();
        assert_eq!(
            weights,
            vec![1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0, 55.0, 89.0]
        );
    }

    #[test]
    fn option_values_are_case_sensitive() {
        let mode = get_mode(Some("tshirt"));
        assert!(mode.accepts("XS"));
        assert!(!mode.accepts("xs"));
        assert_eq!(mode.weight_of("XXL"), Some(6.0));
        assert_eq!(mode.weight_of("xxl"), None);
    }

    #[test]
    fn mode_ids_roundtrip_through_strings() {
        for mode in ALL_MODES {
            assert_eq!(EstimationModeId::parse(mode.id.as_str()), Some(mode.id));
        }
    }
}
