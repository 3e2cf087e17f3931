/// System prompt shared by all providers.
pub const SIMPLIFY_SYSTEM_PROMPT: &str =
    "You are a medical AI assistant that translates prescriptions into plain language.";

/// Build the user prompt asking for a plain-language translation of
/// `raw_text` in the JSON shape of a simplification result.
pub fn build_simplify_prompt(raw_text: &str) -> String {
    format!(
        r#"You are a medical AI assistant specializing in prescription translation.

Convert this medical prescription into clear, plain language that a patient can easily understand:

<prescription>
{raw_text}
</prescription>

Please provide:
1. A simplified, conversational explanation
2. Step-by-step instructions
3. Extract medical entities (drugs, doses, frequencies, routes)
4. Identify any potential warnings or side effects
5. Rate your confidence (0-1) in the translation

Respond in JSON format:
{{
  "plainText": "simplified explanation",
  "steps": [{{"title": "step name", "body": "step description"}}],
  "entities": {{"drug": [], "dose": [], "freq": [], "route": []}},
  "confidence": 0.95,
  "warnings": ["warning messages"]
}}"#,
        raw_text = raw_text.trim()
    )
}
