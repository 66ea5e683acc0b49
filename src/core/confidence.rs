/// Attachments scoring below this are reported for manual review.
pub const LOW_CONFIDENCE: f32 = 0.25;

/// How sure the scan is that a page belongs to the segment it was put in.
pub fn score_confidence(
    has_id: bool,
    has_trigger: bool,
    fits_context: bool,
    language_expected: bool,
) -> f32 {
    let mut score: f32 = 0.0;
    if has_id {
        score += 0.4;
    }
    if has_trigger {
        score += 0.3;
    }

    if fits_context {
        score += 0.3;
    } else {
        score -= 0.2;
    }

    if language_expected {
        score += 0.1;
    } else {
        score -= 0.1;
    }

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_page_is_certain() {
        assert_eq!(score_confidence(true, true, true, true), 1.0);
    }

    #[test]
    fn ambiguous_attachment_is_low() {
        assert!(score_confidence(false, true, false, true) < LOW_CONFIDENCE);
        assert!(score_confidence(false, false, false, false) < LOW_CONFIDENCE);
        assert!(score_confidence(false, false, true, true) >= LOW_CONFIDENCE);
    }

    #[test]
    fn score_stays_in_unit_range() {
        assert_eq!(score_confidence(false, false, false, false), 0.0);
        let all = [true, false];
        for has_id in all {
            for has_trigger in all {
                for fits in all {
                    for language in all {
                        let score = score_confidence(has_id, has_trigger, fits, language);
                        assert!((0.0..=1.0).contains(&score));
                    }
                }
            }
        }
    }
}
