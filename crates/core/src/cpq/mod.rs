pub mod catalog;
pub mod pricing;
pub mod recommend;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use self::{
    pricing::{
        DeterministicPricingEngine, PriceBreakdown, PricingEngine, PricingRequest,
        RentalSchedule, ZoneTier,
    },
    recommend::{
        DeterministicRecommendationEngine, Recommendation, RecommendationEngine,
        RecommendationInput,
    },
};

#[derive(Clone, Debug)]
pub struct CpqEvaluationInput<'a> {
    pub request: &'a RecommendationInput,
    pub zone: ZoneTier,
    pub schedule: Option<RentalSchedule>,
    pub now: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpqEvaluation {
    pub recommendation: Recommendation,
    pub pricing: PriceBreakdown,
}

pub trait CpqRuntime: Send + Sync {
    fn evaluate(&self, input: CpqEvaluationInput<'_>) -> CpqEvaluation;
}

pub struct DeterministicCpqRuntime<R, P> {
    recommendation_engine: R,
    pricing_engine: P,
}

impl<R, P> DeterministicCpqRuntime<R, P> {
    pub fn new(recommendation_engine: R, pricing_engine: P) -> Self {
        Self { recommendation_engine, pricing_engine }
    }

    pub fn recommendation_engine(&self) -> &R {
        &self.recommendation_engine
    }

    pub fn pricing_engine(&self) -> &P {
        &self.pricing_engine
    }
}

impl Default for DeterministicCpqRuntime<DeterministicRecommendationEngine, DeterministicPricingEngine> {
    fn default() -> Self {
        Self::new(DeterministicRecommendationEngine::default(), DeterministicPricingEngine::default())
    }
}

impl<R, P> CpqRuntime for DeterministicCpqRuntime<R, P>
where
    R: RecommendationEngine,
    P: PricingEngine,
{
    fn evaluate(&self, input: CpqEvaluationInput<'_>) -> CpqEvaluation {
        let recommendation = self.recommendation_engine.recommend(input.request);
        let pricing = self.pricing_engine.price(&PricingRequest {
            recommendation: &recommendation,
            zone: input.zone,
            schedule: input.schedule,
            now: input.now,
        });

        CpqEvaluation { recommendation, pricing }
    }
}
