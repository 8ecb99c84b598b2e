pub mod config;
pub mod cpq;
pub mod domain;
pub mod errors;
pub mod text;

pub use cpq::catalog::{Inventory, PackTable};
pub use cpq::pricing::{
    DeterministicPricingEngine, PriceBreakdown, PricingConfig, PricingEngine, PricingRequest,
    RentalSchedule, ZoneTier,
};
pub use cpq::recommend::{
    DeterministicRecommendationEngine, Recommendation, RecommendationEngine, RecommendationInput,
    Selection,
};
pub use cpq::{CpqEvaluation, CpqEvaluationInput, CpqRuntime, DeterministicCpqRuntime};
pub use domain::event::{
    Ambiance, DeliveryChoice, Environment, EventKind, GuestBucket, GuestCount, Need,
};
pub use domain::order::{DraftEvent, DraftOrder, DraftSelection};
pub use domain::product::{InventoryItem, Pack, PackKind, ProductId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use text::{fold, normalize, Utterance};
