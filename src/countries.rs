//! Static country registry
//!
//! The registry is the known-country set used for entity extraction,
//! document projection, and the tier-1 list injected into safety rules.
//! Codes are ISO 3166-1 alpha-3.

use std::collections::HashMap;

use lazy_static::lazy_static;

// Country table embedded at compile time (CODE, name, tier-1 flag)
const COUNTRY_TABLE: &str = include_str!("../data/countries.tsv");

/// One registry entry
#[derive(Debug, Clone)]
pub struct CountryEntry {
    pub code: String,
    pub name: String,
    pub tier1: bool,
}

lazy_static! {
    /// All known countries, in code order
    static ref COUNTRIES: Vec<CountryEntry> = {
        let mut entries = Vec::new();
        for line in COUNTRY_TABLE.lines() {
            let mut parts = line.split('\t');
            let (Some(code), Some(name)) = (parts.next(), parts.next()) else {
                continue;
            };
            let tier1 = parts.next().map(str::trim) == Some("1");
            entries.push(CountryEntry {
                code: code.trim().to_string(),
                name: name.trim().to_string(),
                tier1,
            });
        }
        entries
    };

    /// Index by alpha-3 code
    static ref BY_CODE: HashMap<&'static str, &'static CountryEntry> = COUNTRIES
        .iter()
        .map(|entry| (entry.code.as_str(), entry))
        .collect();
}

/// All known countries
pub fn all() -> &'static [CountryEntry] {
    &COUNTRIES
}

/// Whether `code` is a known alpha-3 country code
pub fn is_known_code(code: &str) -> bool {
    BY_CODE.contains_key(code)
}

/// Look up the display name for a country code
pub fn name_for_code(code: &str) -> Option<&'static str> {
    BY_CODE.get(code).map(|entry| entry.name.as_str())
}

/// Names of tier-1 countries (strongest verified data), in registry order
pub fn tier1_names() -> Vec<&'static str> {
    COUNTRIES
        .iter()
        .filter(|entry| entry.tier1)
        .map(|entry| entry.name.as_str())
        .collect()
}
