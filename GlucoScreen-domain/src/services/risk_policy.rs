//! Combination of the classifier output with the symptom override and the
//! fasting-glucose threshold.

use std::sync::Arc;

use tracing::debug;

use crate::classifier::RiskClassifier;
use crate::entities::screening::{
    NormalizedInput, Recommendation, RecommendationKind, ResultLabel, RiskAssessment, RiskStatus,
};
use crate::errors::ScreeningError;

/// Fasting plasma glucose (mg/dL) at or above which a risk is high
pub const HIGH_RISK_GLUCOSE: i32 = 126;

/// Symptom count that flips a negative classifier result
pub const BEHAVIOR_OVERRIDE_SCORE: u8 = 2;

/// BMI at or above which weight guidance is given
pub const OVERWEIGHT_BMI: f64 = 25.0;

pub fn is_risk(label: u8, behavior_score: u8) -> bool {
    label == 1 || behavior_score >= BEHAVIOR_OVERRIDE_SCORE
}

pub fn final_status(is_risk: bool, glucose: i32) -> RiskStatus {
    match (is_risk, glucose >= HIGH_RISK_GLUCOSE) {
        (true, true) => RiskStatus::HighRisk,
        (true, false) => RiskStatus::Watch,
        (false, _) => RiskStatus::Normal,
    }
}

/// Status of a persisted record from its coarse label and glucose
pub fn status_for_record(label: ResultLabel, glucose: i32) -> RiskStatus {
    final_status(label == ResultLabel::Risk, glucose)
}

/// Advice lines. Symptom, weight and diet tips are only given on a risk
/// result; a closing follow-up line is always present.
pub fn recommendations(behavior_score: u8, bmi: f64, sugar_flag: bool, is_risk: bool) -> Vec<Recommendation> {
    let mut tips = Vec::new();

    if is_risk {
        if behavior_score >= BEHAVIOR_OVERRIDE_SCORE {
            tips.push(Recommendation {
                kind: RecommendationKind::SymptomWarning,
                message: "Warning signs: reported symptoms are consistent with diabetes".to_string(),
            });
        }
        if bmi >= OVERWEIGHT_BMI {
            tips.push(Recommendation {
                kind: RecommendationKind::WeightGuidance,
                message: "Weight: BMI is above the healthy range, reduce starch and sugar intake".to_string(),
            });
        }
        if sugar_flag {
            tips.push(Recommendation {
                kind: RecommendationKind::DietaryNote,
                message: "Diet: cut down on sweetened drinks".to_string(),
            });
        }
    }

    let follow_up = if is_risk {
        "See a physician for a detailed blood test (HbA1c)"
    } else {
        "Keep up healthy habits and have an annual check-up"
    };
    tips.push(Recommendation {
        kind: RecommendationKind::FollowUp,
        message: follow_up.to_string(),
    });

    tips
}

/// Applies the screening rules on top of a loaded classifier
#[derive(Clone)]
pub struct RiskPolicy {
    classifier: Arc<dyn RiskClassifier>,
}

impl std::fmt::Debug for RiskPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskPolicy")
            .field("model", &self.classifier.model_info())
            .finish()
    }
}

impl RiskPolicy {
    pub fn new(classifier: Arc<dyn RiskClassifier>) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &Arc<dyn RiskClassifier> {
        &self.classifier
    }

    /// Score one normalized input
    pub fn classify(&self, input: &NormalizedInput) -> Result<RiskAssessment, ScreeningError> {
        let [p0, p1] = self.classifier.predict_proba(&input.features)?;
        let label = if p1 > p0 { 1 } else { 0 };

        let is_risk = is_risk(label, input.behavior_score);
        let status = final_status(is_risk, input.glucose);
        let result_label = if is_risk { ResultLabel::Risk } else { ResultLabel::NoRisk };

        debug!(
            "Risk policy: label={}, p1={:.3}, behavior_score={}, status={}",
            label, p1, input.behavior_score, status
        );

        Ok(RiskAssessment {
            label,
            probability: p1,
            is_risk,
            status,
            result_label,
            recommendations: recommendations(
                input.behavior_score,
                input.bmi,
                input.symptoms.frequent_sugary_drinks,
                is_risk,
            ),
        })
    }
}
