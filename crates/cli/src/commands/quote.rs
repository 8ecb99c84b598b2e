use chrono::NaiveDateTime;
use clap::Args;
use serde::Serialize;
use soundrent_core::config::AppConfig;
use soundrent_core::{
    CpqEvaluation, CpqEvaluationInput, CpqRuntime, DeterministicCpqRuntime,
    DeterministicPricingEngine, DeterministicRecommendationEngine, Environment, EventKind,
    GuestCount, Inventory, Need, RecommendationInput, RentalSchedule, ZoneTier,
};

use crate::commands::{CommandResult, EXIT_INPUT};

#[derive(Debug, Clone, Args)]
pub struct QuoteArgs {
    #[arg(long, help = "Guest count, exact (`120`) or a form bucket (`50-100`)")]
    pub guests: GuestCount,
    #[arg(long, help = "Event type (mariage, anniversaire, soiree, entreprise, conference, ceremonie)")]
    pub event: Option<EventKind>,
    #[arg(long, help = "interieur or exterieur")]
    pub environment: Option<Environment>,
    #[arg(long = "need", help = "Requested need, repeatable (dj, micro, micro_sans_fil, lumieres, ...)")]
    pub needs: Vec<Need>,
    #[arg(long, help = "Add on-site installation")]
    pub installation: bool,
    #[arg(long, conflicts_with = "pickup", help = "Delivery department (`75`, `2A`) or postal code")]
    pub department: Option<String>,
    #[arg(long, help = "Customer picks the equipment up in store")]
    pub pickup: bool,
    #[arg(long, help = "Event start, e.g. 2026-06-12T19:00:00")]
    pub start: Option<NaiveDateTime>,
    #[arg(long, requires = "start", help = "Event end, e.g. 2026-06-13T02:00:00")]
    pub end: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
struct QuoteBody {
    zone: ZoneTier,
    #[serde(flatten)]
    evaluation: CpqEvaluation,
}

pub fn run(config: &AppConfig, args: &QuoteArgs, now: NaiveDateTime) -> CommandResult {
    let schedule = match (args.start, args.end) {
        (Some(start), Some(end)) if end <= start => {
            return CommandResult::failure(
                "quote",
                "invalid_input",
                "event end must come after its start",
                EXIT_INPUT,
            );
        }
        (Some(start), end) => Some(RentalSchedule::new(start, end.unwrap_or(start))),
        (None, _) => None,
    };

    let mut request = RecommendationInput::new(args.guests);
    request.needs = args.needs.iter().copied().collect();
    request.environment = args.environment;
    request.event_type = args.event;
    request.with_installation = args.installation;

    let zone = zone(args);
    let runtime = DeterministicCpqRuntime::new(
        DeterministicRecommendationEngine::new(config.catalog.packs.clone(), Inventory::default()),
        DeterministicPricingEngine::new(config.pricing.clone()),
    );
    let evaluation = runtime.evaluate(CpqEvaluationInput { request: &request, zone, schedule, now });

    CommandResult::report("quote", QuoteBody { zone, evaluation })
}

fn zone(args: &QuoteArgs) -> ZoneTier {
    if args.pickup {
        return ZoneTier::Pickup;
    }
    match args.department.as_deref() {
        Some(value) => ZoneTier::for_postal_code(value).unwrap_or_else(|| ZoneTier::for_department(value)),
        None => ZoneTier::Far,
    }
}
