//! Tolerant lookup of material specification attributes.
//!
//! Catalog documents have drifted over time: the same attribute appears under
//! several identifiers, numbers are stored as numbers or as decimal-comma text,
//! and many materials simply lack an attribute. Every lookup here therefore
//! tries an ordered list of identifiers and degrades silently to `0`, an empty
//! string or `None`.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Material, SpecValue};

/// Specification identifiers, most current first.
pub mod spec_ids {
    /// Maximum AC output/input current of a device in amperes.
    pub const MAX_CURRENT: &[&str] = &[
        "max_ac_current_a",
        "max_current_a",
        "ac_max_current",
        "imax_ac",
        "Max. AC-Strom",
    ];

    pub const MODULE_LENGTH: &[&str] = &["module_length_mm", "length_mm", "Länge"];

    pub const MODULE_WIDTH: &[&str] = &["module_width_mm", "width_mm", "Breite"];

    pub const PROFILE_LENGTH: &[&str] = &["profile_length_mm", "length_mm", "Länge"];

    pub const CLAMP_WIDTH: &[&str] = &["clamp_width_mm", "width_mm", "Breite"];

    /// Whether an inverter already contains the communication dongle.
    pub const DONGLE_INTEGRATED: &[&str] = &["dongle_integrated", "Dongle integriert"];

    /// Whether an energy manager takes over the dongle's function.
    pub const REPLACES_DONGLE: &[&str] = &["replaces_dongle", "Ersetzt Dongle"];
}

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").expect("Invalid number regex")
});

/// Integer with dot-grouped thousands and no decimal part, e.g. `6.000` or `1.250.000 mm`.
static GROUPED_THOUSANDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?\d{1,3}(?:\.\d{3})+(?:[^\d.,]|$)").expect("Invalid thousands regex")
});

/// Parse a locale-formatted number, reading the leading numeric prefix.
///
/// `"1,5"` → 1.5, `"1.234,5"` → 1234.5, `"6.000"` → 6000, `"16 A"` → 16.
/// A dot followed by exactly three digits and no decimal comma is read as a
/// thousands separator. Returns `None` when the text does not start with a
/// number.
pub fn parse_locale_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let normalised = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else if GROUPED_THOUSANDS.is_match(trimmed) {
        trimmed.replace('.', "")
    } else {
        trimmed.to_string()
    };

    LEADING_NUMBER
        .find(&normalised)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

/// First non-empty value among `spec_ids`.
pub fn spec_value<'a>(material: Option<&'a Material>, spec_ids: &[&str]) -> Option<&'a SpecValue> {
    let material = material?;
    spec_ids
        .iter()
        .filter_map(|id| material.specs.get(*id))
        .find(|value| !value.is_empty())
}

/// Numeric attribute, `0.0` when missing or not a number.
pub fn spec_number(material: Option<&Material>, spec_ids: &[&str]) -> f64 {
    match spec_value(material, spec_ids) {
        Some(SpecValue::Number(n)) if n.is_finite() => *n,
        Some(SpecValue::Text(text)) => parse_locale_number(text).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Text attribute, empty when missing. Numbers are rendered as written.
pub fn spec_text(material: Option<&Material>, spec_ids: &[&str]) -> String {
    match spec_value(material, spec_ids) {
        Some(SpecValue::Text(text)) => text.trim().to_string(),
        Some(SpecValue::Number(n)) => n.to_string(),
        Some(SpecValue::Bool(flag)) => flag.to_string(),
        None => String::new(),
    }
}

/// Yes/no attribute. `None` when absent or not recognisable.
pub fn spec_flag(material: Option<&Material>, spec_ids: &[&str]) -> Option<bool> {
    match spec_value(material, spec_ids)? {
        SpecValue::Bool(flag) => Some(*flag),
        SpecValue::Number(n) => Some(*n != 0.0),
        SpecValue::Text(text) => match text.trim().to_lowercase().as_str() {
            "ja" | "yes" | "true" | "1" | "x" | "y" | "j" => Some(true),
            "nein" | "no" | "false" | "0" | "n" | "-" => Some(false),
            _ => None,
        },
    }
}
