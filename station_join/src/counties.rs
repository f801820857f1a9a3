use log::debug;

use crate::config::{MergeErrors, MergeRules};

/// Brings county names from both tables to one spelling.
///
/// The name is uppercased, a known prefix ("Județul ", ...) is removed and the
/// result is replaced by the canonical form of the first mapping variant it
/// contains. Longer variants are tried first, so that `MARAMURES` is not
/// captured by `MURES`. Names that contain no variant pass through uppercased.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CountyNormalizer {
    prefixes: Vec<String>,
    mapping: Vec<(String, String)>,
}

impl CountyNormalizer {
    pub fn new(rules: &MergeRules) -> Result<CountyNormalizer, MergeErrors> {
        if rules.county_prefixes.iter().any(|p| p.trim().is_empty()) {
            return Err(MergeErrors::EmptyCountyPrefix);
        }
        if rules.county_mapping.iter().any(|(v, _)| v.trim().is_empty()) {
            return Err(MergeErrors::EmptyCountyVariant);
        }
        let prefixes: Vec<String> = rules
            .county_prefixes
            .iter()
            .map(|p| p.to_uppercase())
            .collect();
        let mut mapping: Vec<(String, String)> = rules
            .county_mapping
            .iter()
            .map(|(v, c)| (v.trim().to_uppercase(), c.trim().to_uppercase()))
            .collect();
        // Stable: entries of equal length keep their configured order.
        mapping.sort_by_key(|(v, _)| std::cmp::Reverse(v.chars().count()));
        debug!("CountyNormalizer: prefixes {:?} mapping {:?}", prefixes, mapping);
        Ok(CountyNormalizer { prefixes, mapping })
    }

    pub fn normalize(&self, raw: &str) -> String {
        let upper = raw.trim().to_uppercase();
        let stripped = self
            .prefixes
            .iter()
            .find_map(|p| upper.strip_prefix(p.as_str()))
            .unwrap_or(upper.as_str())
            .trim();
        match self
            .mapping
            .iter()
            .find(|(variant, _)| stripped.contains(variant.as_str()))
        {
            Some((_, canonical)) => canonical.clone(),
            None => stripped.to_string(),
        }
    }
}
