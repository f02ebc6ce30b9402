//! Risk level labels for zone scores.

/// Label for a 0–100 risk score. Out-of-range scores are clamped.
pub fn classify_risk(score: f64) -> Option<&'static str> {
    if score.is_nan() {
        return None;
    }
    let score = score.clamp(0.0, 100.0);
    let label = if score >= 75.0 {
        "MUITO ALTO"
    } else if score >= 50.0 {
        "ALTO"
    } else if score >= 30.0 {
        "MODERADO"
    } else if score >= 15.0 {
        "BAIXO"
    } else {
        "MUITO BAIXO"
    };
    Some(label)
}

/// Normalize stored level codes such as `MUITO_ALTO` for prose.
pub fn humanize_level(level: &str) -> String {
    level.trim().replace('_', " ").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(classify_risk(75.0), Some("MUITO ALTO"));
        assert_eq!(classify_risk(74.9), Some("ALTO"));
        assert_eq!(classify_risk(50.0), Some("ALTO"));
        assert_eq!(classify_risk(30.0), Some("MODERADO"));
        assert_eq!(classify_risk(15.0), Some("BAIXO"));
        assert_eq!(classify_risk(2.0), Some("MUITO BAIXO"));
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(classify_risk(250.0), Some("MUITO ALTO"));
        assert_eq!(classify_risk(-5.0), Some("MUITO BAIXO"));
        assert_eq!(classify_risk(f64::NAN), None);
    }

    #[test]
    fn test_humanize_level() {
        assert_eq!(humanize_level("muito_alto"), "MUITO ALTO");
        assert_eq!(humanize_level(" ALTO "), "ALTO");
    }
}
