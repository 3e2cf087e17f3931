//! Dictionary-based rewriting of prescription shorthand into plain language.

use regex::Captures;

use super::terminology::TerminologyDictionary;

/// Replace every whole-word abbreviation in `text` with its expansion.
///
/// Single left-to-right pass: substituted phrases are never re-scanned, and
/// expansions already present in the input are left as they are, so the
/// output is a fixed point (`normalize(normalize(x)) == normalize(x)`).
pub fn normalize(text: &str, dictionary: &TerminologyDictionary) -> String {
    let Some(matcher) = dictionary.matcher() else {
        return text.to_string();
    };

    matcher
        .replace_all(text, |caps: &Captures| {
            let found = &caps[0];
            dictionary.expand(found).unwrap_or(found).to_string()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> TerminologyDictionary {
        TerminologyDictionary::builtin()
    }

    /// `haystack` contains `word` as a standalone word (case-insensitive).
    fn has_word(haystack: &str, word: &str) -> bool {
        let pattern = format!(r"(?i)\b{}\b", regex::escape(word));
        regex::Regex::new(&pattern).unwrap().is_match(haystack)
    }

    #[test]
    fn expands_reference_prescription() {
        let out = normalize("Tab Amoxicillin 500mg TDS p.o after meals", &dict());
        assert_eq!(
            out,
            "Tablet Amoxicillin 500mg three times a day by mouth after meals"
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(normalize("take one bd", &dict()), "take one twice a day");
        assert_eq!(normalize("Take PRN", &dict()), "Take as needed");
    }

    #[test]
    fn only_whole_words_are_replaced() {
        let text = "Tablets and odd pods improve maximal minutes";
        assert_eq!(normalize(text, &dict()), text);
    }

    #[test]
    fn units_after_numbers_are_not_split() {
        // "500mg" is one word; the unit alone is expanded only when separated.
        assert_eq!(normalize("500mg", &dict()), "500mg");
        assert_eq!(normalize("500 mg", &dict()), "500 milligrams");
    }

    #[test]
    fn dotted_route_is_expanded_whole() {
        assert_eq!(normalize("1 tab p.o. daily", &dict()), "1 Tablet by mouth. daily");
    }

    #[test]
    fn text_without_abbreviations_is_unchanged() {
        let text = "Please drink plenty of water.\nSee you in two weeks.";
        assert_eq!(normalize(text, &dict()), text);
    }

    #[test]
    fn empty_text_stays_empty() {
        assert_eq!(normalize("", &dict()), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "Tab Amoxicillin 500mg TDS p.o after meals",
            "Cream Hydrocortisone apply BD topical",
            "Inj Insulin 10 IU SC AC, max 40 IU",
            "Syrup Cough 5 ml HS PRN",
        ];
        for input in inputs {
            let once = normalize(input, &dict());
            let twice = normalize(&once, &dict());
            assert_eq!(once, twice, "normalize is not a fixed point for {input:?}");
        }
    }

    #[test]
    fn every_key_is_replaced_by_its_expansion() {
        let dict = dict();
        for term in dict.iter() {
            let out = normalize(&format!("take {} now", term.abbreviation), &dict);
            assert!(
                out.contains(&term.expansion),
                "{} was not expanded: {out:?}",
                term.abbreviation
            );
            let residue = out.replacen(&term.expansion, "", 1);
            assert!(
                !has_word(&residue, &term.abbreviation),
                "{} left behind: {out:?}",
                term.abbreviation
            );
        }
    }

    #[test]
    fn custom_dictionary_is_honoured() {
        let dict = TerminologyDictionary::from_entries([("stat", "immediately")]).unwrap();
        assert_eq!(normalize("Give STAT, then OD", &dict), "Give immediately, then OD");
    }

    #[test]
    fn empty_dictionary_leaves_text_alone() {
        let dict = TerminologyDictionary::from_entries(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(normalize("TDS po", &dict), "TDS po");
    }
}
