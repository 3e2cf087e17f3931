//! Pattern-based entity extraction for prescription text.
//!
//! Four independent matchers pull drug names, doses, frequencies and routes
//! out of raw text. Each returns its values in first-seen order with
//! case/format-insensitive duplicates dropped. Pure functions over `&str`;
//! the compiled patterns are process-wide and immutable.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Dosage form keywords that introduce a drug name.
const FORM_KEYWORDS: [&str; 6] = ["Tab", "Cap", "Syrup", "Inj", "Oint", "Cream"];

/// Dosage form keyword followed by a capitalized name.
static FORM_DRUG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Tab|Cap|Syrup|Inj|Oint|Cream)\s+([A-Z][a-z]{3,})").unwrap()
});

/// Optional second word of a form-prefixed name, on the same line.
static SECOND_NAME_WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]+([A-Z][a-z]+)").unwrap());

/// Capitalized word with at least five letters before a common drug-class suffix.
static SUFFIX_DRUG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z]{4,}(?:cillin|mycin|prazole|formin|caine|pine|zole)\b").unwrap()
});

static DOSE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d+(?:\.\d+)?\s?(?:mg|mcg|g|ml|units?|IU)\b").unwrap()
});

static FREQUENCY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:TDS|OD|BD|QID|PRN|SOS|q\d+h|every\s+\d+\s+hours?)\b").unwrap()
});

static ROUTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:p\.?o\.?|IV|IM|SC|SL|PR|PV|topical|inhaled)\b").unwrap()
});

/// Medical entities found in one prescription, keyed by kind.
///
/// Every list is duplicate-free (ignoring case, whitespace and periods) and
/// keeps the first spelling seen. The invariant also holds for sets
/// deserialized from a provider reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EntityLists")]
pub struct EntitySet {
    drug: Vec<String>,
    dose: Vec<String>,
    freq: Vec<String>,
    route: Vec<String>,
}

/// Wire shape of an [`EntitySet`] before deduplication.
#[derive(Debug, Default, Deserialize)]
struct EntityLists {
    #[serde(default)]
    drug: Vec<String>,
    #[serde(default)]
    dose: Vec<String>,
    #[serde(default)]
    freq: Vec<String>,
    #[serde(default)]
    route: Vec<String>,
}

impl From<EntityLists> for EntitySet {
    fn from(lists: EntityLists) -> Self {
        Self::new(lists.drug, lists.dose, lists.freq, lists.route)
    }
}

impl EntitySet {
    pub fn new<D, S, F, R>(drug: D, dose: S, freq: F, route: R) -> Self
    where
        D: IntoIterator<Item = String>,
        S: IntoIterator<Item = String>,
        F: IntoIterator<Item = String>,
        R: IntoIterator<Item = String>,
    {
        Self {
            drug: dedup_preserving_order(drug),
            dose: dedup_preserving_order(dose),
            freq: dedup_preserving_order(freq),
            route: dedup_preserving_order(route),
        }
    }

    pub fn drugs(&self) -> &[String] {
        &self.drug
    }

    pub fn doses(&self) -> &[String] {
        &self.dose
    }

    pub fn frequencies(&self) -> &[String] {
        &self.freq
    }

    pub fn routes(&self) -> &[String] {
        &self.route
    }

    pub fn is_empty(&self) -> bool {
        self.drug.is_empty() && self.dose.is_empty() && self.freq.is_empty() && self.route.is_empty()
    }

    pub fn len(&self) -> usize {
        self.drug.len() + self.dose.len() + self.freq.len() + self.route.len()
    }
}

/// Run all four matchers over `text`.
pub fn extract_entities(text: &str) -> EntitySet {
    EntitySet {
        drug: extract_drugs(text),
        dose: extract_doses(text),
        freq: extract_frequencies(text),
        route: extract_routes(text),
    }
}

/// Drug names: form-prefixed names first (form keyword stripped), then
/// suffix-matched names.
pub fn extract_drugs(text: &str) -> Vec<String> {
    let form_prefixed = FORM_DRUG_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|first| form_prefixed_name(text, first.start(), first.end()));

    let suffixed = SUFFIX_DRUG_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string());

    dedup_preserving_order(form_prefixed.chain(suffixed))
}

/// Extend a form-prefixed name with a second capitalized word on the same
/// line, unless that word is itself a form keyword starting the next drug.
fn form_prefixed_name(text: &str, start: usize, end: usize) -> String {
    let end = SECOND_NAME_WORD_PATTERN
        .captures(&text[end..])
        .and_then(|caps| caps.get(1))
        .filter(|word| !FORM_KEYWORDS.contains(&word.as_str()))
        .map_or(end, |word| end + word.end());
    text[start..end].to_string()
}

/// Amounts such as `500mg`, `2.5 ml`, `10 units`.
pub fn extract_doses(text: &str) -> Vec<String> {
    find_all(&DOSE_PATTERN, text)
}

/// Frequency shorthand (`TDS`, `q8h`) and phrases (`every 6 hours`).
pub fn extract_frequencies(text: &str) -> Vec<String> {
    find_all(&FREQUENCY_PATTERN, text)
}

/// Administration routes (`p.o`, `IV`, `topical`, ...).
pub fn extract_routes(text: &str) -> Vec<String> {
    find_all(&ROUTE_PATTERN, text)
}

fn find_all(pattern: &Regex, text: &str) -> Vec<String> {
    dedup_preserving_order(pattern.find_iter(text).map(|m| m.as_str().to_string()))
}

/// Comparison key for deduplication: case, whitespace and periods ignored.
fn canonical_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .flat_map(char::to_lowercase)
        .collect()
}

fn dedup_preserving_order<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(canonical_key(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_reference_prescription() {
        let entities = extract_entities("Tab Amoxicillin 500mg TDS p.o after meals");
        assert_eq!(entities.drugs(), ["Amoxicillin"]);
        assert_eq!(entities.doses(), ["500mg"]);
        assert_eq!(entities.frequencies(), ["TDS"]);
        assert_eq!(entities.routes(), ["p.o"]);
    }

    #[test]
    fn form_keyword_is_stripped() {
        assert_eq!(extract_drugs("Cap Omeprazole 20mg OD"), ["Omeprazole"]);
        assert_eq!(extract_drugs("Syrup Paracetamol 5ml"), ["Paracetamol"]);
    }

    #[test]
    fn form_prefix_captures_two_word_names() {
        assert_eq!(
            extract_drugs("Tab Metformin Hydrochloride 500mg BD"),
            ["Metformin Hydrochloride"]
        );
    }

    #[test]
    fn form_prefixed_name_stops_at_line_end() {
        assert_eq!(
            extract_drugs("Tab Amoxicillin\nTab Paracetamol"),
            ["Amoxicillin", "Paracetamol"]
        );
    }

    #[test]
    fn form_keyword_is_not_a_second_name_word() {
        assert_eq!(
            extract_drugs("Tab Amoxicillin Tab Paracetamol 500mg"),
            ["Amoxicillin", "Paracetamol"]
        );
        assert_eq!(extract_drugs("Cap Omeprazole Cream Betamethasone"), ["Omeprazole", "Betamethasone"]);
    }

    #[test]
    fn form_prefix_requires_capitalized_name() {
        assert!(extract_drugs("Tab paracetamol").is_empty());
        assert!(extract_drugs("Tab Abc").is_empty());
    }

    #[test]
    fn suffix_rule_finds_unprefixed_drugs() {
        assert_eq!(
            extract_drugs("Continue Azithromycin and Amlodipine, stop Omeprazole"),
            ["Azithromycin", "Amlodipine", "Omeprazole"]
        );
    }

    #[test]
    fn suffix_rule_needs_five_letters_before_suffix() {
        assert_eq!(
            extract_drugs("Lie Supine after Inj Heparin 5000 units SC. Spine pain: Lidocaine"),
            ["Heparin"]
        );
        assert!(extract_drugs("Continue Metformin").is_empty());
        assert_eq!(extract_drugs("Tab Metformin 500mg"), ["Metformin"]);
    }

    #[test]
    fn suffix_rule_ignores_lowercase_and_short_words() {
        assert!(extract_drugs("amoxicillin twice").is_empty());
        assert!(extract_drugs("Pine trees").is_empty());
    }

    #[test]
    fn form_matches_come_before_suffix_matches() {
        let drugs = extract_drugs("Omeprazole 20mg OD. Tab Aspirin 75mg OD");
        assert_eq!(drugs, ["Aspirin", "Omeprazole"]);
    }

    #[test]
    fn drug_found_by_both_rules_is_listed_once() {
        let drugs = extract_drugs("Tab Amoxicillin 500mg; Amoxicillin course 7 days");
        assert_eq!(drugs, ["Amoxicillin"]);
    }

    #[test]
    fn doses_with_decimals_and_spaces() {
        let doses = extract_doses("Take 2.5 ml now then 500mg, 10 units and 1000 IU");
        assert_eq!(doses, ["2.5 ml", "500mg", "10 units", "1000 IU"]);
    }

    #[test]
    fn doses_are_case_insensitive() {
        assert_eq!(extract_doses("250MG and 5 Mcg"), ["250MG", "5 Mcg"]);
    }

    #[test]
    fn dose_requires_word_boundary_after_unit() {
        assert!(extract_doses("500mgs").is_empty());
        assert!(extract_doses("5 grams").is_empty());
    }

    #[test]
    fn duplicate_doses_collapse_across_format() {
        assert_eq!(extract_doses("500mg in the morning, 500 MG at night"), ["500mg"]);
    }

    #[test]
    fn frequencies_literals_and_patterns() {
        let freq = extract_frequencies("BD for 5 days, then q8h, PRN for pain, every 6 hours if fever");
        assert_eq!(freq, ["BD", "q8h", "PRN", "every 6 hours"]);
    }

    #[test]
    fn frequencies_deduplicate_case_variants() {
        assert_eq!(extract_frequencies("TDS ... tds ... Tds"), ["TDS"]);
    }

    #[test]
    fn every_hour_singular() {
        assert_eq!(extract_frequencies("every 1 hour"), ["every 1 hour"]);
    }

    #[test]
    fn routes_variants() {
        let routes = extract_routes("Inj Ceftriaxone 1g IV, then inhaled salbutamol; cream topical");
        assert_eq!(routes, ["IV", "inhaled", "topical"]);
    }

    #[test]
    fn route_po_spellings_collapse() {
        assert_eq!(extract_routes("po morning, p.o. evening, PO night"), ["po"]);
    }

    #[test]
    fn route_trailing_period_at_end_of_sentence() {
        assert_eq!(extract_routes("Take one tablet p.o."), ["p.o"]);
    }

    #[test]
    fn routes_need_whole_words() {
        assert!(extract_routes("improve scivy pvc").is_empty());
    }

    #[test]
    fn no_entities_in_plain_prose() {
        let entities = extract_entities("please see the doctor next week");
        assert!(entities.is_empty());
        assert_eq!(entities.len(), 0);
    }

    #[test]
    fn multi_line_sig() {
        let text = "Rx:\nTab Amlodipine 5mg OD\nCap Omeprazole 20mg BD AC\nSig: po";
        let entities = extract_entities(text);
        assert_eq!(entities.drugs(), ["Amlodipine", "Omeprazole"]);
        assert_eq!(entities.doses(), ["5mg", "20mg"]);
        assert_eq!(entities.frequencies(), ["OD", "BD"]);
        assert_eq!(entities.routes(), ["po"]);
    }

    #[test]
    fn new_enforces_dedup_invariant() {
        let set = EntitySet::new(
            vec!["Aspirin".into(), "aspirin".into(), " ".into()],
            vec!["5 mg".into(), "5mg".into()],
            Vec::<String>::new(),
            vec!["PO".into(), "p.o".into(), "IV".into()],
        );
        assert_eq!(set.drugs(), ["Aspirin"]);
        assert_eq!(set.doses(), ["5 mg"]);
        assert!(set.frequencies().is_empty());
        assert_eq!(set.routes(), ["PO", "IV"]);
    }

    #[test]
    fn deserialize_dedups_and_defaults_missing_kinds() {
        let set: EntitySet =
            serde_json::from_str(r#"{"drug": ["Warfarin", "WARFARIN"], "freq": ["OD"]}"#).unwrap();
        assert_eq!(set.drugs(), ["Warfarin"]);
        assert_eq!(set.frequencies(), ["OD"]);
        assert!(set.doses().is_empty());
        assert!(set.routes().is_empty());
    }

    #[test]
    fn serializes_with_short_kind_keys() {
        let json = serde_json::to_value(extract_entities("Tab Aspirin 75mg OD po")).unwrap();
        assert_eq!(json["drug"][0], "Aspirin");
        assert_eq!(json["dose"][0], "75mg");
        assert_eq!(json["freq"][0], "OD");
        assert_eq!(json["route"][0], "po");
    }
}
