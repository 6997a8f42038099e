use super::personality::Personality;

// 100 / (4 axes * 200 range) scaled so fully opposed axes reach 0
const MBTI_DIFF_WEIGHT: f64 = 12.5;
// 100 / (5 traits * 100 range) scaled the same way
const BIG_FIVE_DIFF_WEIGHT: f64 = 10.0;

/// MBTI-distance component: 100 minus the weighted sum of axis differences
pub fn mbti_compatibility(a: &Personality, b: &Personality) -> f64 {
    let total_difference = (a.extroversion_introversion - b.extroversion_introversion).abs()
        + (a.sensing_intuition - b.sensing_intuition).abs()
        + (a.thinking_feeling - b.thinking_feeling).abs()
        + (a.judging_perceiving - b.judging_perceiving).abs();

    (100.0 - total_difference * MBTI_DIFF_WEIGHT).max(0.0)
}

/// Big-Five-distance component: 100 minus the weighted sum of trait differences
pub fn big_five_compatibility(a: &Personality, b: &Personality) -> f64 {
    let total_difference = (a.openness - b.openness).abs()
        + (a.conscientiousness - b.conscientiousness).abs()
        + (a.extraversion - b.extraversion).abs()
        + (a.agreeableness - b.agreeableness).abs()
        + (a.neuroticism - b.neuroticism).abs();

    (100.0 - total_difference * BIG_FIVE_DIFF_WEIGHT).max(0.0)
}

/// Symmetric 0-100 similarity of two profiles, averaging both components
pub fn compatibility(a: &Personality, b: &Personality) -> f64 {
    (mbti_compatibility(a, b) + big_five_compatibility(a, b)) / 2.0
}
