// piiscrub-context/src/scoring/mod.rs

/// Weights for context-based score enhancement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextWeights {
    /// Added to the raw score when a context word is present.
    pub boost: f64,
    /// Floor applied to any score that had context.
    pub min_score_with_context: f64,
}

impl Default for ContextWeights {
    fn default() -> Self {
        Self {
            boost: 0.35,
            min_score_with_context: 0.4,
        }
    }
}

/// Raises `score` when context was found. The result never exceeds 1.0.
pub fn enhance_score(score: f64, has_context: bool, weights: &ContextWeights) -> f64 {
    if !has_context {
        return score;
    }
    (score + weights.boost)
        .max(weights.min_score_with_context)
        .min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_context_is_identity() {
        assert_eq!(enhance_score(0.3, false, &ContextWeights::default()), 0.3);
    }

    #[test]
    fn context_boosts_and_floors() {
        let w = ContextWeights::default();
        assert!((enhance_score(0.5, true, &w) - 0.85).abs() < 1e-9);
        assert!((enhance_score(0.01, true, &w) - 0.4).abs() < 1e-9);
        assert_eq!(enhance_score(0.9, true, &w), 1.0);
    }
}
