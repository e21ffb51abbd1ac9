//! Score classification: pure derivation of presentation values from raw
//! 0-100 scores. Total over any finite input; out-of-range scores clamp.

use serde::Serialize;
use std::fmt;

/// Letter grade for the overall score and each platform row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "F")]
    F,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative label shown next to the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreLabel {
    Excellent,
    #[serde(rename = "Very Good")]
    VeryGood,
    Good,
    Okay,
    Weak,
    Poor,
}

impl ScoreLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreLabel::Excellent => "Excellent",
            ScoreLabel::VeryGood => "Very Good",
            ScoreLabel::Good => "Good",
            ScoreLabel::Okay => "Okay",
            ScoreLabel::Weak => "Weak",
            ScoreLabel::Poor => "Poor",
        }
    }
}

impl fmt::Display for ScoreLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signal strength bucket for a platform score, used for display emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalLevel {
    Bad,
    Weak,
    Medium,
    Strong,
}

impl SignalLevel {
    /// Active segment count for the 4-segment signal indicator.
    pub fn bars(self) -> u8 {
        match self {
            SignalLevel::Strong => 4,
            SignalLevel::Medium => 3,
            SignalLevel::Weak => 2,
            SignalLevel::Bad => 1,
        }
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 100.0)
}

/// Map a score to its letter grade.
pub fn grade_from_score(score: f64) -> Grade {
    let s = clamp_score(score);
    if s >= 90.0 {
        Grade::A
    } else if s >= 85.0 {
        Grade::BPlus
    } else if s >= 80.0 {
        Grade::B
    } else if s >= 75.0 {
        Grade::CPlus
    } else if s >= 70.0 {
        Grade::C
    } else if s >= 60.0 {
        Grade::D
    } else {
        Grade::F
    }
}

/// Map a score to its qualitative label. The ladder is independent of the
/// grade thresholds (no 75 step, single bucket for 60-69).
pub fn label_from_score(score: f64) -> ScoreLabel {
    let s = clamp_score(score);
    if s >= 90.0 {
        ScoreLabel::Excellent
    } else if s >= 85.0 {
        ScoreLabel::VeryGood
    } else if s >= 80.0 {
        ScoreLabel::Good
    } else if s >= 70.0 {
        ScoreLabel::Okay
    } else if s >= 60.0 {
        ScoreLabel::Weak
    } else {
        ScoreLabel::Poor
    }
}

/// Map a platform score to its signal bucket.
pub fn signal_from_score(score: f64) -> SignalLevel {
    let s = clamp_score(score);
    if s >= 85.0 {
        SignalLevel::Strong
    } else if s >= 70.0 {
        SignalLevel::Medium
    } else if s >= 50.0 {
        SignalLevel::Weak
    } else {
        SignalLevel::Bad
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_boundaries_at_and_below_each_threshold() {
        let cases = [
            (90.0, Grade::A, Grade::BPlus),
            (85.0, Grade::BPlus, Grade::B),
            (80.0, Grade::B, Grade::CPlus),
            (75.0, Grade::CPlus, Grade::C),
            (70.0, Grade::C, Grade::D),
            (60.0, Grade::D, Grade::F),
        ];
        for (threshold, at, below) in cases {
            assert_eq!(grade_from_score(threshold), at, "at {threshold}");
            assert_eq!(grade_from_score(threshold - 1.0), below, "below {threshold}");
        }
    }

    #[test]
    fn grade_a_band_and_f_band() {
        for s in 90..=100 {
            assert_eq!(grade_from_score(s as f64), Grade::A);
        }
        for s in 0..60 {
            assert_eq!(grade_from_score(s as f64), Grade::F);
        }
    }

    #[test]
    fn grade_clamps_out_of_range_scores() {
        assert_eq!(grade_from_score(140.0), Grade::A);
        assert_eq!(grade_from_score(-5.0), Grade::F);
        assert_eq!(grade_from_score(f64::NAN), Grade::F);
    }

    #[test]
    fn label_ladder() {
        assert_eq!(label_from_score(95.0), ScoreLabel::Excellent);
        assert_eq!(label_from_score(87.0), ScoreLabel::VeryGood);
        assert_eq!(label_from_score(82.0), ScoreLabel::Good);
        assert_eq!(label_from_score(75.0), ScoreLabel::Okay);
        assert_eq!(label_from_score(64.0), ScoreLabel::Weak);
        assert_eq!(label_from_score(10.0), ScoreLabel::Poor);
    }

    #[test]
    fn signal_covers_domain_and_is_monotone() {
        let mut prev = signal_from_score(0.0);
        for s in 0..=100 {
            let level = signal_from_score(s as f64);
            assert!(level >= prev, "signal regressed at score {s}");
            prev = level;
        }
        assert_eq!(signal_from_score(85.0), SignalLevel::Strong);
        assert_eq!(signal_from_score(84.0), SignalLevel::Medium);
        assert_eq!(signal_from_score(70.0), SignalLevel::Medium);
        assert_eq!(signal_from_score(69.0), SignalLevel::Weak);
        assert_eq!(signal_from_score(50.0), SignalLevel::Weak);
        assert_eq!(signal_from_score(49.0), SignalLevel::Bad);
    }

    #[test]
    fn signal_bars_step_down_with_level() {
        assert_eq!(SignalLevel::Strong.bars(), 4);
        assert_eq!(SignalLevel::Medium.bars(), 3);
        assert_eq!(SignalLevel::Weak.bars(), 2);
        assert_eq!(SignalLevel::Bad.bars(), 1);
    }

    #[test]
    fn grade_and_display_strings() {
        assert_eq!(grade_from_score(92.0).to_string(), "A");
        assert_eq!(grade_from_score(86.0).to_string(), "B+");
        assert_eq!(serde_json::to_string(&Grade::BPlus).unwrap(), "\"B+\"");
        assert_eq!(label_from_score(87.0).to_string(), "Very Good");
    }
}
