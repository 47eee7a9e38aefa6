// Best-guess jurisdiction for a raw municipality string and postal code

use crate::tables::{JurisdictionTable, PostalIndex};
use tracing::warn;

const VARIATION_SUFFIXES: [&str; 4] = [" township", " borough", " city", " town"];

/// Which rule produced a [`Resolution`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedVia {
    /// Direct postal code hit.
    PostalCode,
    /// Postal code gave a city that maps to one jurisdiction.
    PostalCity,
    /// The municipality maps to exactly one jurisdiction.
    Municipality,
    /// Ambiguous municipality settled by the postal index city matching it.
    PostalDisambiguated,
    /// A stripped variation of the name matched.
    Variation(String),
    /// Several candidates and nothing to choose between them; the first won.
    Ambiguous(Vec<String>),
    /// Nothing matched; the input itself is used.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub jurisdiction: String,
    pub via: ResolvedVia,
}

impl Resolution {
    fn new(jurisdiction: &str, via: ResolvedVia) -> Self {
        Self {
            jurisdiction: jurisdiction.to_string(),
            via,
        }
    }

    /// True when the answer came from a heuristic fallback rather than a match.
    pub fn is_guess(&self) -> bool {
        matches!(self.via, ResolvedVia::Ambiguous(_) | ResolvedVia::Unresolved)
    }
}

/// Resolves jurisdictions against borrowed, read-only tables.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    table: &'a JurisdictionTable,
    postal: &'a PostalIndex,
}

impl<'a> Resolver<'a> {
    pub fn new(table: &'a JurisdictionTable, postal: &'a PostalIndex) -> Self {
        Self { table, postal }
    }

    pub fn resolve(&self, municipality: &str, postal_code: Option<&str>) -> Resolution {
        let key = municipality.trim().to_lowercase();
        let postal_code = postal_code.map(str::trim).filter(|code| !code.is_empty());

        if let Some(code) = postal_code {
            if let Some(jurisdiction) = self.postal.jurisdiction(code) {
                return Resolution::new(jurisdiction, ResolvedVia::PostalCode);
            }
            if let Some(city) = self.postal.city(code)
                && let Some(jurisdiction) = self.table.unique(city)
            {
                return Resolution::new(jurisdiction, ResolvedVia::PostalCity);
            }
        }

        let candidates = self.table.candidates(&key);
        if let Some(candidates) = candidates {
            if let [only] = candidates {
                return Resolution::new(only, ResolvedVia::Municipality);
            }
            // Every code with a jurisdiction is answered by the direct postal
            // hit above, so this never matches against a `PostalIndex`.
            if let Some(code) = postal_code
                && let Some(city) = self.postal.city(code)
                && city.eq_ignore_ascii_case(&key)
                && let Some(jurisdiction) = self.postal.jurisdiction(code)
            {
                return Resolution::new(jurisdiction, ResolvedVia::PostalDisambiguated);
            }
        }

        for variation in variations(&key) {
            if let Some(jurisdiction) = self.table.unique(&variation) {
                return Resolution::new(jurisdiction, ResolvedVia::Variation(variation));
            }
        }

        if let Some(candidates) = candidates
            && let Some(first) = candidates.first()
        {
            warn!(
                "Municipality '{}' exists in multiple counties: {}",
                municipality,
                candidates.join(", ")
            );
            if let Some(code) = postal_code {
                warn!("Using first county for postal code {} (no exact match found)", code);
            }
            return Resolution::new(first, ResolvedVia::Ambiguous(candidates.to_vec()));
        }

        warn!(
            "Municipality '{}' not found in mapping, using it as the county name",
            municipality
        );
        let trimmed = municipality.trim();
        let literal = if trimmed.is_empty() { municipality } else { trimmed };
        Resolution::new(&literal.to_uppercase(), ResolvedVia::Unresolved)
    }

    pub fn jurisdiction_for(&self, municipality: &str, postal_code: Option<&str>) -> String {
        self.resolve(municipality, postal_code).jurisdiction
    }
}

/// Colloquial spellings tried after the exact name, in order.
fn variations(key: &str) -> Vec<String> {
    let mut out: Vec<String> = VARIATION_SUFFIXES
        .iter()
        .filter_map(|suffix| key.strip_suffix(suffix))
        .map(|s| s.trim().to_string())
        .collect();

    if let Some((before, _)) = key.split_once('(') {
        out.push(before.trim().to_string());
    }

    out.retain(|v| !v.is_empty() && v != key);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variations_strip_suffix_and_parenthesis() {
        assert_eq!(variations("hanover township"), vec!["hanover"]);
        assert_eq!(variations("york city"), vec!["york"]);
        assert_eq!(variations("mount joy (lancaster)"), vec!["mount joy"]);
        assert!(variations("gettysburg").is_empty());
    }

    #[test]
    fn test_variations_town_is_a_separate_suffix() {
        assert_eq!(variations("bloomsburg town"), vec!["bloomsburg"]);
        assert!(variations("newtown").is_empty());
    }
}
