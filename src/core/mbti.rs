use super::personality::Personality;

// Each axis is split at zero; strictly positive picks the first pole.
pub const EI_THRESHOLD: f64 = 0.0;
pub const SN_THRESHOLD: f64 = 0.0;
pub const TF_THRESHOLD: f64 = 0.0;
pub const JP_THRESHOLD: f64 = 0.0;

/// Reduce the four MBTI axes to a 4-letter type code.
///
/// Deterministic and total over valid trait values.
pub fn classify(personality: &Personality) -> String {
    let ei = if personality.extroversion_introversion > EI_THRESHOLD {
        'E'
    } else {
        'I'
    };
    let sn = if personality.sensing_intuition > SN_THRESHOLD {
        'S'
    } else {
        'N'
    };
    let tf = if personality.thinking_feeling > TF_THRESHOLD {
        'T'
    } else {
        'F'
    };
    let jp = if personality.judging_perceiving > JP_THRESHOLD {
        'J'
    } else {
        'P'
    };

    format!("{}{}{}{}", ei, sn, tf, jp)
}
