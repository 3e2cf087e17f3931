//! Templated patient instructions built from extracted entities.
//!
//! Step order is fixed (medication → dosage → timing → route → reminders) so
//! the same entities always produce the same explanation.

use super::extraction::EntitySet;
use super::terminology::TerminologyDictionary;
use super::types::InstructionStep;

pub const MEDICATION_TITLE: &str = "Medication";
pub const DOSAGE_TITLE: &str = "Dosage";
pub const TIMING_TITLE: &str = "When to Take";
pub const ROUTE_TITLE: &str = "How to Take";
pub const REMINDERS_TITLE: &str = "Important Reminders";

const REMINDERS_BODY: &str = "Complete the full course even if you feel better. Contact your doctor if you experience any unusual side effects or if your condition doesn't improve.";

pub const BLEEDING_RISK_WARNING: &str = "Blood thinning medication - monitor for unusual bleeding";
pub const TAKE_WITH_FOOD_TIP: &str = "Take with food to reduce stomach upset";
pub const COMPLETE_COURSE_WARNING: &str = "Complete the full antibiotic course even if you feel better";

/// A drug-name warning rule: fires once if any drug contains any keyword.
struct WarningRule {
    keywords: &'static [&'static str],
    message: &'static str,
}

const WARNING_RULES: &[WarningRule] = &[
    WarningRule {
        keywords: &["warfarin", "aspirin"],
        message: BLEEDING_RISK_WARNING,
    },
    WarningRule {
        keywords: &["metformin"],
        message: TAKE_WITH_FOOD_TIP,
    },
    WarningRule {
        keywords: &["antibiotic", "cillin"],
        message: COMPLETE_COURSE_WARNING,
    },
];

/// Ordered steps plus free-text warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub steps: Vec<InstructionStep>,
    pub warnings: Vec<String>,
}

/// Turn entities into patient instructions.
///
/// The templates are entity-driven; the normalized text is not read yet.
pub fn compose(
    entities: &EntitySet,
    _normalized_text: &str,
    dictionary: &TerminologyDictionary,
) -> Explanation {
    Explanation {
        steps: compose_steps(entities, dictionary),
        warnings: compose_warnings(entities),
    }
}

pub fn compose_steps(entities: &EntitySet, dictionary: &TerminologyDictionary) -> Vec<InstructionStep> {
    let mut steps = Vec::with_capacity(5);

    if !entities.drugs().is_empty() {
        steps.push(InstructionStep::new(
            MEDICATION_TITLE,
            format!(
                "You have been prescribed {}. This medication will help treat your condition as determined by your doctor.",
                entities.drugs().join(", ")
            ),
        ));
    }

    if !entities.doses().is_empty() {
        steps.push(InstructionStep::new(
            DOSAGE_TITLE,
            format!(
                "Take {} as prescribed. Do not exceed this amount unless instructed by your healthcare provider.",
                entities.doses().join(", ")
            ),
        ));
    }

    if !entities.frequencies().is_empty() {
        let timing = entities
            .frequencies()
            .iter()
            .map(|f| dictionary.expand(f).unwrap_or(f))
            .collect::<Vec<_>>()
            .join(", ");
        steps.push(InstructionStep::new(
            TIMING_TITLE,
            format!(
                "Take this medication {timing}. Try to take it at the same times each day to maintain consistent levels in your body."
            ),
        ));
    }

    if !entities.routes().is_empty() {
        let routes = entities
            .routes()
            .iter()
            .map(|r| expand_route(r, dictionary))
            .collect::<Vec<_>>()
            .join(", ");
        steps.push(InstructionStep::new(
            ROUTE_TITLE,
            format!(
                "Take this medication {routes}. Follow any specific instructions about food, water, or timing."
            ),
        ));
    }

    steps.push(reminders_step());
    steps
}

/// The closing step every explanation carries.
pub fn reminders_step() -> InstructionStep {
    InstructionStep::new(REMINDERS_TITLE, REMINDERS_BODY)
}

pub fn compose_warnings(entities: &EntitySet) -> Vec<String> {
    let drugs: Vec<String> = entities.drugs().iter().map(|d| d.to_lowercase()).collect();

    WARNING_RULES
        .iter()
        .filter(|rule| {
            drugs
                .iter()
                .any(|drug| rule.keywords.iter().any(|k| drug.contains(k)))
        })
        .map(|rule| rule.message.to_string())
        .collect()
}

/// Route tokens are looked up without trailing periods ("p.o." → "p.o"),
/// then without any periods ("p.o" → "po").
fn expand_route<'a>(route: &'a str, dictionary: &'a TerminologyDictionary) -> &'a str {
    let trimmed = route.trim_end_matches('.');
    if let Some(expansion) = dictionary.expand(trimmed) {
        return expansion;
    }
    dictionary.expand(&route.replace('.', "")).unwrap_or(route)
}
