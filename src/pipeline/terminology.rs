//! Clinical abbreviation dictionary.
//!
//! Maps prescription shorthand (frequencies, routes, dosage forms, units) to
//! the plain-language phrase a patient reads. The dictionary is built once at
//! startup and shared read-only between requests; lookups are case-insensitive
//! and only ever match whole words.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use regex::Regex;
use thiserror::Error;

/// Built-in abbreviations, grouped the way they appear in a "Sig" line.
const BUILTIN_TERMS: &[(&str, &str)] = &[
    // Frequency / timing
    ("TDS", "three times a day"),
    ("OD", "once daily"),
    ("BD", "twice a day"),
    ("QID", "four times a day"),
    ("PRN", "as needed"),
    ("SOS", "if necessary"),
    ("q12h", "every 12 hours"),
    ("q8h", "every 8 hours"),
    ("q6h", "every 6 hours"),
    ("HS", "at bedtime"),
    ("AC", "before meals"),
    ("PC", "after meals"),
    // Routes
    ("po", "by mouth"),
    ("p.o", "by mouth"),
    ("IV", "intravenously"),
    ("IM", "intramuscularly"),
    ("SC", "subcutaneously"),
    ("SL", "under the tongue"),
    ("PR", "rectally"),
    ("PV", "vaginally"),
    // Dosage forms
    ("Tab", "Tablet"),
    ("Cap", "Capsule"),
    ("Syrup", "Liquid medicine"),
    ("Inj", "Injection"),
    ("Oint", "Ointment"),
    ("Cream", "Topical cream"),
    // Units and common terms
    ("mg", "milligrams"),
    ("ml", "milliliters"),
    ("mcg", "micrograms"),
    ("IU", "international units"),
    ("max", "maximum"),
    ("min", "minimum"),
];

#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("Cannot read terminology file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Terminology file must be a JSON object of strings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Terminology entry has an empty abbreviation")]
    EmptyAbbreviation,

    #[error("Abbreviation '{0}' has an empty expansion")]
    EmptyExpansion(String),

    #[error("Cannot compile terminology matcher: {0}")]
    Pattern(#[from] regex::Error),
}

/// One abbreviation and the phrase that replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub abbreviation: String,
    pub expansion: String,
}

/// Immutable abbreviation → plain-language mapping.
#[derive(Debug, Clone)]
pub struct TerminologyDictionary {
    terms: Vec<Term>,
    /// Lower-cased abbreviation → position in `terms`.
    index: HashMap<String, usize>,
    /// Whole-word matcher over every abbreviation and every expansion.
    /// `None` only for an empty dictionary.
    matcher: Option<Regex>,
}

impl TerminologyDictionary {
    /// The dictionary shipped with the service.
    pub fn builtin() -> Self {
        Self::from_entries(BUILTIN_TERMS.iter().copied())
            .expect("built-in terminology entries are non-empty literals")
    }

    /// Build a dictionary from `(abbreviation, expansion)` pairs.
    ///
    /// Later entries replace earlier ones with the same case-insensitive
    /// abbreviation but keep the earlier position.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, DictionaryError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut terms: Vec<Term> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (abbreviation, expansion) in entries {
            let abbreviation: String = abbreviation.into();
            let expansion: String = expansion.into();
            let abbreviation = abbreviation.trim().to_string();
            let expansion = expansion.trim().to_string();

            if abbreviation.is_empty() {
                return Err(DictionaryError::EmptyAbbreviation);
            }
            if expansion.is_empty() {
                return Err(DictionaryError::EmptyExpansion(abbreviation));
            }

            let key = abbreviation.to_lowercase();
            let term = Term {
                abbreviation,
                expansion,
            };
            match index.get(&key) {
                Some(&position) => terms[position] = term,
                None => {
                    index.insert(key, terms.len());
                    terms.push(term);
                }
            }
        }

        let matcher = build_matcher(&terms)?;
        Ok(Self {
            terms,
            index,
            matcher,
        })
    }

    /// Built-in terms extended (and overridden) by a JSON object file of
    /// `{"abbreviation": "expansion"}` pairs.
    pub fn builtin_with_file(path: &Path) -> Result<Self, DictionaryError> {
        let raw = std::fs::read_to_string(path).map_err(|source| DictionaryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let extra: BTreeMap<String, String> = serde_json::from_str(&raw)?;

        let builtin = BUILTIN_TERMS
            .iter()
            .map(|(abbr, expansion)| (abbr.to_string(), expansion.to_string()));
        Self::from_entries(builtin.chain(extra))
    }

    /// Plain-language phrase for a single whole-word abbreviation.
    pub fn expand(&self, token: &str) -> Option<&str> {
        self.index
            .get(&token.to_lowercase())
            .map(|&position| self.terms[position].expansion.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub(crate) fn matcher(&self) -> Option<&Regex> {
        self.matcher.as_ref()
    }
}

impl Default for TerminologyDictionary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// One case-insensitive alternation of all abbreviations and expansions,
/// longest first so "p.o" wins over "po" and "Topical cream" over "Cream".
fn build_matcher(terms: &[Term]) -> Result<Option<Regex>, DictionaryError> {
    if terms.is_empty() {
        return Ok(None);
    }

    let mut phrases: Vec<&str> = terms
        .iter()
        .flat_map(|t| [t.abbreviation.as_str(), t.expansion.as_str()])
        .collect();
    phrases.sort_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
    });
    phrases.dedup_by(|a, b| a.eq_ignore_ascii_case(*b));

    let alternation = phrases
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");

    Ok(Some(Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))?))
}
