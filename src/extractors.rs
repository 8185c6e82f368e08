//! The built-in feature extractor catalogue (§4.1) and the registry a caller
//! assembles them into.
//!
//! Each extractor is a pure function from `(field_value, field_label)` to a
//! [`FeatureBag`]. The registry (`FeatureFactory`) is the idiomatic
//! realization of the source's dynamic, string-keyed feature factory (§9):
//! an interface with one method, plus a `HashMap` from caller-chosen type
//! names to boxed extractor instances.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{LinkageError, Result};
use crate::metaphone::double_metaphone;
use crate::shingle::{FeatureBag, Shingle};

/// A single extractor: normalizes one field value into labeled shingles.
/// Implementors never fail on empty input; they return `InvalidFieldValue`
/// only when the caller hands them something that cannot be coerced to text
/// at all, which in this crate's `Table` model (str cells) never happens, so
/// the error path exists for callers that adapt a non-textual `Table`.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, value: &str, label: &str) -> Result<FeatureBag>;
}

/// Character n-grams of a normalized string, labeled uniformly.
fn char_ngrams(normalized: &str, n: usize, label: &str) -> FeatureBag {
    let chars: Vec<char> = normalized.chars().collect();
    if chars.len() < n || n == 0 {
        return FeatureBag::new();
    }
    chars
        .windows(n)
        .map(|w| Shingle::from_str(label, &w.iter().collect::<String>()))
        .collect()
}

fn strip_non_letters_lowercase(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Label used by the name extractor regardless of which column (first name,
/// last name, full name, ...) it was invoked on, so records that split a
/// name differently still compare (§4.1).
pub const NAME_LABEL: &str = "name";

/// Lowercases, strips non-letter characters, emits character 2-grams and
/// 3-grams plus a Double-Metaphone-style phonetic code, all labeled `"name"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameExtractor;

impl FeatureExtractor for NameExtractor {
    fn extract(&self, value: &str, _label: &str) -> Result<FeatureBag> {
        let normalized = strip_non_letters_lowercase(value);
        if normalized.is_empty() {
            return Ok(FeatureBag::new());
        }
        let mut bag = char_ngrams(&normalized, 2, NAME_LABEL);
        bag.extend(char_ngrams(&normalized, 3, NAME_LABEL));
        let (primary, secondary) = double_metaphone(&normalized);
        if !primary.is_empty() {
            bag.push(Shingle::from_str(NAME_LABEL, &primary));
        }
        if let Some(secondary) = secondary {
            bag.push(Shingle::from_str(NAME_LABEL, &secondary));
        }
        Ok(bag)
    }
}

/// Which component order a date-of-birth string follows when components are
/// numeric and the separator gives no further hint (e.g. `"03/04/1990"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatePreference {
    DayFirst,
    YearFirst,
}

/// Parses a date-of-birth field under a caller-chosen component-order
/// preference and emits only the components it could recover (§4.1): a
/// record missing its day still contributes year and month shingles.
#[derive(Debug, Clone, Copy)]
pub struct DobExtractor {
    pub preference: DatePreference,
}

struct DobComponents {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
}

fn parse_dob(value: &str, preference: DatePreference) -> DobComponents {
    let parts: Vec<&str> = value
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .collect();

    let mut year = None;
    let mut month = None;
    let mut day = None;

    // A 4-digit part is unambiguously the year wherever it falls.
    let year_idx = parts.iter().position(|p| p.len() == 4);
    let remaining: Vec<(usize, &&str)> = parts
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != year_idx)
        .collect();

    if let Some(idx) = year_idx {
        year = parts[idx].parse().ok();
    }

    let mut numeric_remaining: Vec<u32> = remaining
        .iter()
        .filter_map(|(_, p)| p.parse().ok())
        .collect();

    if year.is_none() && numeric_remaining.len() == 3 {
        // No 4-digit part found; fall back to the full ordered component set
        // under the caller's stated preference, treating a 2-digit year as
        // the component whose value exceeds 31 if any, else by position.
        match preference {
            DatePreference::YearFirst => {
                let y = numeric_remaining.remove(0);
                year = Some(2000 + y as i32);
                month = numeric_remaining.first().copied();
                day = numeric_remaining.get(1).copied();
            }
            DatePreference::DayFirst => {
                day = numeric_remaining.first().copied();
                month = numeric_remaining.get(1).copied();
                year = numeric_remaining.get(2).map(|y| 2000 + *y as i32);
            }
        }
    } else {
        // The 4-digit year has been extracted; the remaining 1-2 numeric
        // parts are day/month, ordered per preference among themselves.
        match preference {
            DatePreference::DayFirst => {
                day = numeric_remaining.first().copied();
                month = numeric_remaining.get(1).copied();
            }
            DatePreference::YearFirst => {
                month = numeric_remaining.first().copied();
                day = numeric_remaining.get(1).copied();
            }
        }
    }

    if month.is_some_and(|m| !(1..=12).contains(&m)) {
        month = None;
    }
    if day.is_some_and(|d| !(1..=31).contains(&d)) {
        day = None;
    }

    DobComponents { year, month, day }
}

impl FeatureExtractor for DobExtractor {
    fn extract(&self, value: &str, _label: &str) -> Result<FeatureBag> {
        if value.trim().is_empty() {
            return Ok(FeatureBag::new());
        }
        let components = parse_dob(value, self.preference);
        let mut bag = FeatureBag::new();
        if let Some(y) = components.year {
            bag.push(Shingle::from_str("dob-y", &y.to_string()));
        }
        if let Some(m) = components.month {
            bag.push(Shingle::from_str("dob-m", &format!("{m:02}")));
        }
        if let Some(d) = components.day {
            bag.push(Shingle::from_str("dob-d", &format!("{d:02}")));
        }
        Ok(bag)
    }
}

/// Normalizes to a single lowercase initial (`f`/`m`/`x`); ambiguous or empty
/// input emits nothing rather than guessing (§4.1).
#[derive(Debug, Clone, Copy, Default)]
pub struct SexExtractor;

impl FeatureExtractor for SexExtractor {
    fn extract(&self, value: &str, label: &str) -> Result<FeatureBag> {
        let normalized = value.trim().to_lowercase();
        let initial = match normalized.as_str() {
            "f" | "female" | "woman" => Some('f'),
            "m" | "male" | "man" => Some('m'),
            "x" | "nonbinary" | "non-binary" | "other" => Some('x'),
            _ => None,
        };
        Ok(match initial {
            Some(c) => vec![Shingle::from_str(label, &c.to_string())],
            None => FeatureBag::new(),
        })
    }
}

/// Lowercases, tokenizes on whitespace, emits each token under the given
/// label (default: the column name).
#[derive(Debug, Clone, Default)]
pub struct TokenExtractor {
    pub label_override: Option<String>,
}

impl FeatureExtractor for TokenExtractor {
    fn extract(&self, value: &str, label: &str) -> Result<FeatureBag> {
        let effective_label = self.label_override.as_deref().unwrap_or(label);
        Ok(value
            .split_whitespace()
            .map(|tok| Shingle::from_str(effective_label, &tok.to_lowercase()))
            .collect())
    }
}

/// Same normalization as [`TokenExtractor`] but emits character n-grams of
/// one or more caller-specified lengths rather than whole tokens. The label
/// override is what lets two differently-named columns (`instrument` vs.
/// `main_instrument`) contribute to the same comparable label space (§4.1).
#[derive(Debug, Clone)]
pub struct ShingledExtractor {
    pub lengths: Vec<usize>,
    pub label_override: Option<String>,
}

impl FeatureExtractor for ShingledExtractor {
    fn extract(&self, value: &str, label: &str) -> Result<FeatureBag> {
        let effective_label = self.label_override.as_deref().unwrap_or(label);
        let normalized: String = value.chars().flat_map(char::to_lowercase).collect();
        if normalized.is_empty() {
            return Ok(FeatureBag::new());
        }
        let mut bag = FeatureBag::new();
        for &n in &self.lengths {
            bag.extend(char_ngrams(&normalized, n, effective_label));
        }
        Ok(bag)
    }
}

/// A registry from caller-chosen type name to the extractor it runs. This is
/// the "dynamic feature factory" of §9, re-expressed as a string-keyed map
/// over a single-method trait object rather than a dispatch-by-name function
/// table. Construction parameters of each registered extractor (n-gram
/// lengths, date preference, label overrides) are retained separately as
/// [`crate::blob::ExtractorSpec`] so the whole factory round-trips through
/// the embedder blob (§6).
#[derive(Clone, Default)]
pub struct FeatureFactory {
    extractors: HashMap<String, Arc<dyn FeatureExtractor>>,
}

impl FeatureFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_name: impl Into<String>, extractor: Arc<dyn FeatureExtractor>) {
        self.extractors.insert(type_name.into(), extractor);
    }

    /// Builds a factory with the catalogue's default construction
    /// parameters registered under their conventional type names.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut factory = Self::new();
        factory.register("name", Arc::new(NameExtractor));
        factory.register(
            "dob",
            Arc::new(DobExtractor {
                preference: DatePreference::DayFirst,
            }),
        );
        factory.register("sex", Arc::new(SexExtractor));
        factory.register("token", Arc::new(TokenExtractor::default()));
        factory.register(
            "shingle",
            Arc::new(ShingledExtractor {
                lengths: vec![2, 3],
                label_override: None,
            }),
        );
        factory
    }

    pub(crate) fn get(&self, type_name: &str) -> Result<&Arc<dyn FeatureExtractor>> {
        self.extractors
            .get(type_name)
            .ok_or_else(|| LinkageError::UnknownFeatureType(type_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_extractor_emits_empty_bag_for_empty_input() {
        let bag = NameExtractor.extract("", "name").unwrap();
        assert!(bag.is_empty());
    }

    #[test]
    fn name_extractor_strips_punctuation_and_case() {
        let bag = NameExtractor.extract("O'Brien-Smith", "name").unwrap();
        assert!(!bag.is_empty());
        assert!(bag.iter().all(|s| s.label() == NAME_LABEL));
    }

    #[test]
    fn dob_extractor_emits_partial_components() {
        let bag = DobExtractor {
            preference: DatePreference::YearFirst,
        }
        .extract("1990-03", "dob")
        .unwrap();
        let labels: Vec<&str> = bag.iter().map(Shingle::label).collect();
        assert!(labels.contains(&"dob-y"));
        assert!(labels.contains(&"dob-m"));
        assert!(!labels.contains(&"dob-d"));
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn dob_extractor_empty_on_blank_input() {
        let bag = DobExtractor {
            preference: DatePreference::DayFirst,
        }
        .extract("", "dob")
        .unwrap();
        assert!(bag.is_empty());
    }

    #[test]
    fn sex_extractor_normalizes_known_variants() {
        let bag = SexExtractor.extract("Female", "sex").unwrap();
        assert_eq!(bag.len(), 1);
        assert_eq!(bag[0].token(), b"f");
    }

    #[test]
    fn sex_extractor_emits_nothing_for_ambiguous_input() {
        let bag = SexExtractor.extract("unknown", "sex").unwrap();
        assert!(bag.is_empty());
    }

    #[test]
    fn token_extractor_splits_on_whitespace() {
        let bag = TokenExtractor::default()
            .extract("Bass Guitar", "instrument")
            .unwrap();
        assert_eq!(bag.len(), 2);
        assert_eq!(bag[0].token(), b"bass");
    }

    #[test]
    fn shingled_extractor_unifies_labels_across_columns() {
        let extractor = ShingledExtractor {
            lengths: vec![3],
            label_override: Some("instrument".to_string()),
        };
        let from_col_a = extractor.extract("bass", "instrument").unwrap();
        let from_col_b = extractor.extract("bass", "main_instrument").unwrap();
        assert_eq!(from_col_a, from_col_b);
    }

    #[test]
    fn factory_rejects_unknown_type() {
        let factory = FeatureFactory::with_defaults();
        let err = factory.get("not-a-type").unwrap_err();
        assert!(matches!(err, LinkageError::UnknownFeatureType(_)));
    }
}
