//! Jurisdiction inference
//!
//! Maps ISO 3166-1 alpha-2 country codes to the privacy regime a data
//! subject falls under. The table is fixed; unknown codes map to `Other`.

use serde::{Deserialize, Serialize};

/// Privacy regime governing a data subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Jurisdiction {
    /// EU and EEA member states
    Eu,
    /// United States
    Us,
    /// United Kingdom
    Uk,
    /// Canada
    Canada,
    /// Brazil
    Brazil,
    Other,
}

/// EU member states plus the EEA three
const EU_EEA: &[&str] = &[
    "AT", "BE", "BG", "HR", "CY", "CZ", "DK", "EE", "FI", "FR", "DE", "GR", "HU", "IE", "IT",
    "LV", "LT", "LU", "MT", "NL", "PL", "PT", "RO", "SK", "SI", "ES", "SE", "IS", "LI", "NO",
];

impl Jurisdiction {
    /// Infer the jurisdiction from a country code
    pub fn from_country_code(code: &str) -> Self {
        let code = code.trim().to_ascii_uppercase();
        if EU_EEA.contains(&code.as_str()) {
            Jurisdiction::Eu
        } else {
            match code.as_str() {
                "US" => Jurisdiction::Us,
                "GB" | "UK" => Jurisdiction::Uk,
                "CA" => Jurisdiction::Canada,
                "BR" => Jurisdiction::Brazil,
                _ => Jurisdiction::Other,
            }
        }
    }

    /// The primary regulation for this jurisdiction
    pub fn regulation(&self) -> &'static str {
        match self {
            Jurisdiction::Eu => "GDPR",
            Jurisdiction::Us => "CCPA/HIPAA",
            Jurisdiction::Uk => "UK-GDPR",
            Jurisdiction::Canada => "PIPEDA",
            Jurisdiction::Brazil => "LGPD",
            Jurisdiction::Other => "general",
        }
    }
}
