/// Confidence assigned to results of the local rule-based pipeline.
pub const LOCAL_PIPELINE_CONFIDENCE: f32 = 0.75;

/// Confidence assigned when a provider answered in free text instead of the
/// requested JSON, or reported no usable confidence of its own.
pub const UNSTRUCTURED_PROVIDER_CONFIDENCE: f32 = 0.80;

/// Bring a provider-reported confidence into (0, 1].
///
/// Values above 1 are clamped; missing, non-finite and non-positive values
/// are replaced by [`UNSTRUCTURED_PROVIDER_CONFIDENCE`].
pub fn provider_confidence(reported: Option<f64>) -> f32 {
    match reported {
        Some(value) if value.is_finite() && value > 0.0 => value.min(1.0) as f32,
        _ => UNSTRUCTURED_PROVIDER_CONFIDENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_below_unstructured_provider() {
        assert!(LOCAL_PIPELINE_CONFIDENCE < UNSTRUCTURED_PROVIDER_CONFIDENCE);
    }

    #[test]
    fn reported_confidence_is_kept() {
        let conf = provider_confidence(Some(0.95));
        assert!((conf - 0.95).abs() < f32::EPSILON);
    }

    #[test]
    fn above_one_is_clamped() {
        assert_eq!(provider_confidence(Some(7.0)), 1.0);
    }

    #[test]
    fn missing_uses_unstructured_default() {
        assert_eq!(provider_confidence(None), UNSTRUCTURED_PROVIDER_CONFIDENCE);
    }

    #[test]
    fn zero_negative_and_nan_use_default() {
        for bad in [0.0, -0.4, f64::NAN, f64::INFINITY] {
            assert_eq!(
                provider_confidence(Some(bad)),
                UNSTRUCTURED_PROVIDER_CONFIDENCE,
                "{bad} should fall back"
            );
        }
    }
}
