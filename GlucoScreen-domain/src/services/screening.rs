use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument};

use gluco_screen_data::repository::{RecordStore, RepositoryError};

use crate::classifier::RiskClassifier;
use crate::entities::conversions::{self, ScreeningRecordDraft};
use crate::entities::screening::{
    DateRange, HistorySummary, ResultLabel, ScreeningInput, ScreeningOutcome, ScreeningRecord,
    ScreeningReport, Submitter, TrendPoint, SKIN_THICKNESS_PROXY,
};
use crate::errors::ScreeningError;
use crate::services::normalizer::{bmi_category, normalize};
use crate::services::risk_policy::RiskPolicy;

/// Trait for screening operations
#[async_trait]
pub trait ScreeningServiceTrait: Send + Sync {
    /// Score an input without saving it
    async fn assess(&self, input: &ScreeningInput) -> Result<ScreeningOutcome, ScreeningError>;

    /// Score an input and append it to the submitter's history.
    /// A failed append does not discard the outcome.
    async fn submit(&self, submitter: Submitter, input: ScreeningInput) -> Result<ScreeningReport, ScreeningError>;

    /// A user's records inside the range, oldest first
    async fn history(&self, email: &str, range: DateRange) -> Result<Vec<ScreeningRecord>, ScreeningError>;

    async fn history_summary(&self, email: &str, range: DateRange) -> Result<HistorySummary, ScreeningError>;
}

/// Screening service over a record store
pub struct ScreeningService<S: RecordStore> {
    store: S,
    policy: RiskPolicy,
}

impl<S: RecordStore> ScreeningService<S> {
    pub fn new(store: S, classifier: Arc<dyn RiskClassifier>) -> Self {
        Self {
            store,
            policy: RiskPolicy::new(classifier),
        }
    }

    fn map_repo_error(&self, err: RepositoryError) -> ScreeningError {
        error!("Result store error: {}", err);
        ScreeningError::from(err)
    }
}

#[async_trait]
impl<S: RecordStore> ScreeningServiceTrait for ScreeningService<S> {
    async fn assess(&self, input: &ScreeningInput) -> Result<ScreeningOutcome, ScreeningError> {
        let normalized = normalize(input)?;
        let assessment = self.policy.classify(&normalized)?;

        Ok(ScreeningOutcome {
            assessment,
            bmi: normalized.bmi,
            bmi_category: bmi_category(normalized.bmi),
            pedigree_score: normalized.pedigree_score,
            behavior_score: normalized.behavior_score,
        })
    }

    #[instrument(skip(self, input), fields(user = %submitter.email))]
    async fn submit(&self, submitter: Submitter, input: ScreeningInput) -> Result<ScreeningReport, ScreeningError> {
        let outcome = self.assess(&input).await?;

        let draft = ScreeningRecordDraft {
            user_email: submitter.email,
            user_name: submitter.name,
            user_role: submitter.role,
            result: outcome.assessment.result_label,
            pregnancies: input.pregnancies,
            glucose: input.glucose,
            blood_pressure: input.blood_pressure,
            skin_thickness: SKIN_THICKNESS_PROXY,
            insulin: input.insulin,
            weight_kg: input.weight_kg,
            height_cm: input.height_cm,
            bmi: outcome.bmi,
            diabetes_pedigree: outcome.pedigree_score,
            age: input.age,
            probability: outcome.assessment.probability,
        };

        match self.store.append(conversions::convert_to_data_new_record(&draft)).await {
            Ok(stored) => {
                info!("Saved screening {} with result {}", stored.id, stored.result);
                Ok(ScreeningReport {
                    outcome,
                    saved: true,
                    record: conversions::convert_to_domain_record(stored),
                    persistence_error: None,
                })
            }
            Err(e) => {
                error!("Screening assessed but not saved: {}", e);
                Ok(ScreeningReport {
                    outcome,
                    saved: false,
                    record: None,
                    persistence_error: Some(ScreeningError::from(e).message().to_string()),
                })
            }
        }
    }

    async fn history(&self, email: &str, range: DateRange) -> Result<Vec<ScreeningRecord>, ScreeningError> {
        let (start, end) = range.storage_bounds();
        let stored = self
            .store
            .query_by_user(email, start, end)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        Ok(conversions::convert_to_domain_records(stored)
            .into_iter()
            .filter(|r| range.contains(&r.recorded_at))
            .collect())
    }

    async fn history_summary(&self, email: &str, range: DateRange) -> Result<HistorySummary, ScreeningError> {
        let records = self.history(email, range).await?;
        Ok(summarize(&records))
    }
}

/// Aggregate an ascending history
pub fn summarize(records: &[ScreeningRecord]) -> HistorySummary {
    let risk_count = records.iter().filter(|r| r.result == ResultLabel::Risk).count();

    HistorySummary {
        count: records.len(),
        risk_count,
        no_risk_count: records.len() - risk_count,
        glucose_trend: records
            .iter()
            .map(|r| TrendPoint { recorded_at: r.recorded_at, value: r.glucose as f64 })
            .collect(),
        bmi_trend: records
            .iter()
            .map(|r| TrendPoint { recorded_at: r.recorded_at, value: r.bmi })
            .collect(),
        latest_bmi_category: records.last().map(|r| bmi_category(r.bmi)),
    }
}
