use serde::{Deserialize, Serialize};

use super::extraction::EntitySet;

/// One titled instruction shown to the patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionStep {
    pub title: String,
    pub body: String,
}

impl InstructionStep {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Complete plain-language explanation of one prescription.
///
/// This is the unit handed to the HTTP layer, history storage and the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplificationResult {
    pub plain_text: String,
    pub steps: Vec<InstructionStep>,
    pub entities: EntitySet,
    pub confidence: f32,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::extract_entities;

    #[test]
    fn serializes_with_camel_case_keys() {
        let result = SimplificationResult {
            plain_text: "Tablet Aspirin".into(),
            steps: vec![InstructionStep::new("Medication", "You have been prescribed Aspirin.")],
            entities: extract_entities("Tab Aspirin"),
            confidence: 0.75,
            warnings: vec![],
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["plainText"], "Tablet Aspirin");
        assert_eq!(json["steps"][0]["title"], "Medication");
        assert_eq!(json["entities"]["drug"][0], "Aspirin");
        assert_eq!(json["confidence"], 0.75);
        assert!(json["warnings"].as_array().unwrap().is_empty());
        assert!(json.get("plain_text").is_none());
    }
}
