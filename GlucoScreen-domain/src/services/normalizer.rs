use tracing::{debug, warn};

use crate::entities::screening::{
    BmiCategory, FeatureVector, NormalizedInput, ScreeningInput, SKIN_THICKNESS_PROXY,
};
use crate::errors::ScreeningError;

/// Body mass index, defined only for strictly positive weight and height
pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if !(weight_kg.is_finite() && height_cm.is_finite()) || weight_kg <= 0.0 || height_cm <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some(weight_kg / (height_m * height_m))
}

/// Asian BMI bands
pub fn bmi_category(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 23.0 {
        BmiCategory::Normal
    } else if bmi < 25.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

/// Reject inputs that cannot be scored. Every offending field is named.
pub fn validate_input(input: &ScreeningInput) -> Result<(), ScreeningError> {
    let mut problems = Vec::new();

    if !input.weight_kg.is_finite() || input.weight_kg <= 0.0 {
        problems.push("weight_kg must be greater than 0");
    }
    if !input.height_cm.is_finite() || input.height_cm <= 0.0 {
        problems.push("height_cm must be greater than 0");
    }
    if input.age <= 0 {
        problems.push("age must be greater than 0");
    }
    if input.glucose <= 0 {
        problems.push("glucose must be greater than 0");
    }
    if input.blood_pressure <= 0 {
        problems.push("blood_pressure must be greater than 0");
    }
    if input.pregnancies < 0 {
        problems.push("pregnancies must not be negative");
    }
    if input.insulin < 0 {
        problems.push("insulin must not be negative");
    }

    if problems.is_empty() {
        return Ok(());
    }

    let mut message = problems.join("; ");
    if input.glucose <= 0 || input.blood_pressure <= 0 {
        message.push_str(
            ". If glucose or blood pressure is unknown, use healthy averages (Glucose: 95, Blood Pressure: 80)",
        );
    }

    warn!("Rejected screening input: {}", message);
    Err(ScreeningError::ValidationError(message))
}

/// Validate the questionnaire and assemble the classifier's feature vector
pub fn normalize(input: &ScreeningInput) -> Result<NormalizedInput, ScreeningError> {
    validate_input(input)?;

    let bmi = compute_bmi(input.weight_kg, input.height_cm).ok_or_else(|| {
        ScreeningError::ValidationError("Weight and height are required to compute BMI".to_string())
    })?;
    let pedigree_score = input.family_history.pedigree_score();

    let features = FeatureVector([
        input.pregnancies as f64,
        input.glucose as f64,
        input.blood_pressure as f64,
        SKIN_THICKNESS_PROXY,
        input.insulin as f64,
        bmi,
        pedigree_score,
        input.age as f64,
    ]);

    debug!("Normalized screening input: bmi={:.2}, pedigree={}", bmi, pedigree_score);

    Ok(NormalizedInput {
        features,
        bmi,
        pedigree_score,
        glucose: input.glucose,
        behavior_score: input.symptoms.behavior_score(),
        symptoms: input.symptoms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::screening::{FamilyHistory, SymptomFlags};

    fn input() -> ScreeningInput {
        ScreeningInput {
            pregnancies: 0,
            glucose: 95,
            blood_pressure: 80,
            insulin: 0,
            weight_kg: 70.0,
            height_cm: 175.0,
            age: 30,
            family_history: FamilyHistory::None,
            symptoms: SymptomFlags::default(),
        }
    }

    #[test]
    fn test_compute_bmi() {
        let bmi = compute_bmi(70.0, 175.0).unwrap();
        assert!((bmi - 70.0 / (1.75 * 1.75)).abs() < 1e-6);
        assert!((bmi - 22.857).abs() < 1e-3);
        assert_eq!(compute_bmi(0.0, 175.0), None);
        assert_eq!(compute_bmi(70.0, -1.0), None);
        assert_eq!(compute_bmi(f64::NAN, 175.0), None);
    }

    #[test]
    fn test_bmi_category_bands() {
        assert_eq!(bmi_category(18.4), BmiCategory::Underweight);
        assert_eq!(bmi_category(18.5), BmiCategory::Normal);
        assert_eq!(bmi_category(22.9), BmiCategory::Normal);
        assert_eq!(bmi_category(23.0), BmiCategory::Overweight);
        assert_eq!(bmi_category(25.0), BmiCategory::Obese);
    }

    #[test]
    fn test_normalize_feature_order() {
        let mut raw = input();
        raw.pregnancies = 2;
        raw.insulin = 85;
        raw.family_history = FamilyHistory::OneRelative;
        raw.symptoms.nocturia = true;

        let normalized = normalize(&raw).unwrap();
        let f = normalized.features.0;
        assert_eq!(f[0], 2.0);
        assert_eq!(f[1], 95.0);
        assert_eq!(f[2], 80.0);
        assert_eq!(f[3], 20.0);
        assert_eq!(f[4], 85.0);
        assert!((f[5] - 22.857).abs() < 1e-3);
        assert_eq!(f[6], 0.5);
        assert_eq!(f[7], 30.0);
        assert_eq!(normalized.features.get("diabetes_pedigree"), Some(0.5));
        assert_eq!(normalized.behavior_score, 1);
    }

    #[test]
    fn test_each_required_field_is_checked() {
        let cases: Vec<(&str, Box<dyn Fn(&mut ScreeningInput)>)> = vec![
            ("weight_kg", Box::new(|i| i.weight_kg = 0.0)),
            ("height_cm", Box::new(|i| i.height_cm = 0.0)),
            ("age", Box::new(|i| i.age = 0)),
            ("glucose", Box::new(|i| i.glucose = 0)),
            ("blood_pressure", Box::new(|i| i.blood_pressure = -5)),
            ("pregnancies", Box::new(|i| i.pregnancies = -1)),
        ];

        for (field, mutate) in cases {
            let mut raw = input();
            mutate(&mut raw);
            match normalize(&raw) {
                Err(ScreeningError::ValidationError(msg)) => assert!(msg.contains(field), "{}", msg),
                other => panic!("expected validation error for {}, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn test_missing_vitals_suggest_healthy_defaults() {
        let mut raw = input();
        raw.glucose = 0;
        raw.blood_pressure = 0;
        let err = validate_input(&raw).unwrap_err();
        let msg = err.message();
        assert!(msg.contains("glucose") && msg.contains("blood_pressure"));
        assert!(msg.contains("Glucose: 95, Blood Pressure: 80"));

        let mut raw = input();
        raw.age = 0;
        assert!(!validate_input(&raw).unwrap_err().message().contains("Glucose: 95"));
    }
}
