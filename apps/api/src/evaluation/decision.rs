use crate::models::evaluation::Tag;

/// Score cut-offs for tagging. `moderate <= high` is enforced by config validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionThresholds {
    pub high: u8,
    pub moderate: u8,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            high: 70,
            moderate: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub tag: Tag,
    pub notify_hr: bool,
    pub message: String,
}

pub fn decide(score: u8, thresholds: &DecisionThresholds) -> Decision {
    if score >= thresholds.high {
        Decision {
            tag: Tag::HighPotential,
            notify_hr: true,
            message: format!("High potential candidate with score {score}/100"),
        }
    } else if score >= thresholds.moderate {
        Decision {
            tag: Tag::Moderate,
            notify_hr: true,
            message: format!("Moderate candidate with score {score}/100"),
        }
    } else {
        Decision {
            tag: Tag::LowPotential,
            notify_hr: false,
            message: format!("Low score candidate ({score}/100)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundaries() {
        let thresholds = DecisionThresholds::default();

        let high = decide(70, &thresholds);
        assert_eq!(high.tag, Tag::HighPotential);
        assert!(high.notify_hr);

        let moderate = decide(69, &thresholds);
        assert_eq!(moderate.tag, Tag::Moderate);
        assert!(moderate.notify_hr);

        let low = decide(49, &thresholds);
        assert_eq!(low.tag, Tag::LowPotential);
        assert!(!low.notify_hr);

        assert_eq!(decide(50, &thresholds).tag, Tag::Moderate);
    }

    #[test]
    fn test_messages_carry_score() {
        let thresholds = DecisionThresholds::default();
        assert_eq!(
            decide(88, &thresholds).message,
            "High potential candidate with score 88/100"
        );
        assert_eq!(decide(12, &thresholds).message, "Low score candidate (12/100)");
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = DecisionThresholds {
            high: 90,
            moderate: 80,
        };
        assert_eq!(decide(85, &thresholds).tag, Tag::Moderate);
        assert_eq!(decide(75, &thresholds).tag, Tag::LowPotential);
    }
}
