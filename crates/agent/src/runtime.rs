use std::sync::Arc;

use chrono::{Days, Local, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use soundrent_core::config::AppConfig;
use soundrent_core::cpq::recommend::Selection;
use soundrent_core::{
    ApplicationError, CpqEvaluation, CpqEvaluationInput, CpqRuntime, DeliveryChoice,
    DeterministicCpqRuntime, DeterministicPricingEngine, DeterministicRecommendationEngine,
    DomainError, DraftEvent, DraftOrder, DraftSelection, Environment, GuestCount, Inventory,
    ProductId, RecommendationInput, RentalSchedule, ZoneTier,
};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::CatalogClient;
use crate::conversation::{ConversationState, KnownSlots, Message, Role, SideChannel, StateBuilder};
use crate::draft::{extract_draft, validate_draft};
use crate::guardrails::{GuardrailDecision, GuardrailPolicy};
use crate::intent::{Intent, IntentClassifier};
use crate::llm::LlmClient;
use crate::preamble::PreambleBuilder;
use crate::templates::TemplateBook;

/// One chat turn as posted by the widget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub active_scenario_id: Option<String>,
    #[serde(default)]
    pub active_product_context: Option<String>,
    #[serde(default)]
    pub active_pack_mode_key: Option<String>,
}

impl TurnRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            active_scenario_id: None,
            active_product_context: None,
            active_pack_mode_key: None,
        }
    }

    pub fn side_channel(&self) -> SideChannel {
        SideChannel {
            scenario_id: self.active_scenario_id.clone(),
            product_context: self.active_product_context.clone(),
            pack_mode_key: self.active_pack_mode_key.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReply {
    pub reply_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_order: Option<DraftOrder>,
}

impl TurnReply {
    fn text(reply_text: impl Into<String>, intent: Option<Intent>) -> Self {
        Self {
            reply_text: reply_text.into(),
            intent_tag: intent.map(|intent| intent.tag().to_string()),
            draft_order: None,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("invalid transcript: {0}")]
    InvalidTranscript(String),
    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),
    #[error("reply generator returned no text")]
    EmptyGeneratorOutput,
}

impl From<TurnError> for ApplicationError {
    fn from(value: TurnError) -> Self {
        match value {
            TurnError::InvalidTranscript(reason) => DomainError::InvalidTranscript(reason).into(),
            TurnError::CollaboratorUnavailable(reason) => Self::Integration(reason),
            TurnError::EmptyGeneratorOutput => {
                Self::Integration("reply generator returned no text".to_string())
            }
        }
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

pub struct AgentRuntime {
    classifier: IntentClassifier,
    states: StateBuilder,
    guardrails: GuardrailPolicy,
    templates: TemplateBook,
    preamble: PreambleBuilder,
    cpq: Arc<dyn CpqRuntime>,
    llm: Arc<dyn LlmClient>,
    catalog: Arc<dyn CatalogClient>,
    clock: Arc<dyn Clock>,
    catalog_ids: Vec<ProductId>,
    max_message_chars: usize,
}

impl AgentRuntime {
    pub fn from_config(
        config: &AppConfig,
        llm: Arc<dyn LlmClient>,
        catalog: Arc<dyn CatalogClient>,
    ) -> Self {
        let inventory = Inventory::default();
        let catalog_ids = config
            .catalog
            .packs
            .packs()
            .iter()
            .map(|pack| pack.id.clone())
            .chain(inventory.items().iter().map(|item| item.id.clone()))
            .collect();
        let cpq = DeterministicCpqRuntime::new(
            DeterministicRecommendationEngine::new(config.catalog.packs.clone(), inventory),
            DeterministicPricingEngine::new(config.pricing.clone()),
        );

        Self {
            classifier: IntentClassifier::new(),
            states: StateBuilder::new(config.catalog.packs.clone()),
            guardrails: GuardrailPolicy::default(),
            templates: TemplateBook::new(config.assistant.contact_phone.clone()),
            preamble: PreambleBuilder::new(config.assistant.contact_phone.clone()),
            cpq: Arc::new(cpq),
            llm,
            catalog,
            clock: Arc::new(SystemClock),
            catalog_ids,
            max_message_chars: config.assistant.max_message_chars,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_guardrails(mut self, guardrails: GuardrailPolicy) -> Self {
        self.guardrails = guardrails;
        self
    }

    pub fn with_cpq(mut self, cpq: Arc<dyn CpqRuntime>) -> Self {
        self.cpq = cpq;
        self
    }

    /// Degrading entry point: every failure becomes a polite reply.
    pub async fn handle_turn(&self, request: &TurnRequest) -> TurnReply {
        let correlation_id = Uuid::new_v4().to_string();
        match self.process_turn_with_id(request, &correlation_id).await {
            Ok(reply) => reply,
            Err(TurnError::EmptyGeneratorOutput) => {
                warn!(
                    event_name = "assistant.turn.empty_output",
                    correlation_id = %correlation_id,
                    "generator returned empty text, sending fallback"
                );
                TurnReply::text(self.guardrails.fallback_reply.clone(), None)
            }
            Err(error) => {
                let interface = ApplicationError::from(error.clone()).into_interface(correlation_id.as_str());
                warn!(
                    event_name = "assistant.turn.degraded",
                    correlation_id = %correlation_id,
                    error = %error,
                    "turn degraded to fallback reply"
                );
                TurnReply::text(interface.user_message(), None)
            }
        }
    }

    pub async fn process_turn(&self, request: &TurnRequest) -> Result<TurnReply, TurnError> {
        let correlation_id = Uuid::new_v4().to_string();
        self.process_turn_with_id(request, &correlation_id).await
    }

    async fn process_turn_with_id(
        &self,
        request: &TurnRequest,
        correlation_id: &str,
    ) -> Result<TurnReply, TurnError> {
        let latest = self.validate(request)?;
        let intent = self.classifier.classify(latest);
        let now = self.clock.now();
        let state = self.states.build(&request.messages, &request.side_channel(), now.date());

        info!(
            event_name = "assistant.turn.received",
            correlation_id = %correlation_id,
            intent = intent.map_or("none", Intent::tag),
            engaged = state.is_engaged(),
            confirmed = state.confirmed,
            missing = state.slots.missing_required().len(),
            "processing assistant turn"
        );

        let canned = intent.and_then(|intent| self.screened_template(&state, intent, correlation_id));
        if let (Some(intent), Some(text)) = (intent, canned.as_ref()) {
            if intent.is_emergency() {
                return Ok(TurnReply::text(text.clone(), Some(intent)));
            }
        }

        if state.slots.is_complete() {
            if let Some(mut reply) = self.draft_turn(&state, now, intent, correlation_id).await? {
                if state.confirmed {
                    info!(
                        event_name = "assistant.draft.confirmed",
                        correlation_id = %correlation_id,
                        "customer approved the draft summary"
                    );
                    reply.reply_text = self.templates.confirmed_reply();
                    if let Some(draft) = reply.draft_order.as_mut() {
                        draft.needs_confirmation = false;
                    }
                    return Ok(reply);
                }
                if last_assistant_message(&request.messages) != Some(reply.reply_text.as_str()) {
                    return Ok(reply);
                }
                info!(
                    event_name = "assistant.template.suppressed",
                    correlation_id = %correlation_id,
                    reason_code = "draft_already_sent",
                    "draft summary unchanged since the last reply"
                );
            }
        }

        if let Some(text) = canned {
            return Ok(TurnReply::text(text, intent));
        }

        self.generated_turn(request, &state, intent, correlation_id).await
    }

    /// Returns the latest user message.
    fn validate<'a>(&self, request: &'a TurnRequest) -> Result<&'a str, TurnError> {
        if request.messages.is_empty() {
            return Err(TurnError::InvalidTranscript("transcript is empty".to_string()));
        }
        if let Some(message) =
            request.messages.iter().find(|message| message.content.chars().count() > self.max_message_chars)
        {
            return Err(TurnError::InvalidTranscript(format!(
                "message exceeds {} characters ({} given)",
                self.max_message_chars,
                message.content.chars().count()
            )));
        }

        let last = request
            .messages
            .iter()
            .rev()
            .find(|message| !message.is_idle())
            .ok_or_else(|| TurnError::InvalidTranscript("transcript only holds idle messages".to_string()))?;
        if last.role != Role::User {
            return Err(TurnError::InvalidTranscript("last message is not from the user".to_string()));
        }
        if last.content.trim().is_empty() {
            return Err(TurnError::InvalidTranscript("last user message is empty".to_string()));
        }
        Ok(last.content.as_str())
    }

    fn screened_template(
        &self,
        state: &ConversationState,
        intent: Intent,
        correlation_id: &str,
    ) -> Option<String> {
        let template = self.templates.reply_for(intent)?;
        match self.guardrails.screen_template(state, &template) {
            GuardrailDecision::Allow => Some(template),
            GuardrailDecision::Suppress { reason_code } | GuardrailDecision::Replace { reason_code, .. } => {
                info!(
                    event_name = "assistant.template.suppressed",
                    correlation_id = %correlation_id,
                    intent = intent.tag(),
                    reason_code,
                    "canned reply suppressed"
                );
                None
            }
        }
    }

    async fn draft_turn(
        &self,
        state: &ConversationState,
        now: NaiveDateTime,
        intent: Option<Intent>,
        correlation_id: &str,
    ) -> Result<Option<TurnReply>, TurnError> {
        let (Some(input), Some(schedule)) = (recommendation_input(&state.slots), schedule(&state.slots)) else {
            return Ok(None);
        };
        let evaluation = self.cpq.evaluate(CpqEvaluationInput {
            request: &input,
            zone: zone(&state.slots),
            schedule: Some(schedule),
            now,
        });

        let mut selections = Vec::new();
        for (catalog_id, qty) in evaluation.recommendation.catalog_lines() {
            if self.catalog_knows(&catalog_id).await? {
                selections.push(DraftSelection { catalog_id, qty });
            } else {
                warn!(
                    event_name = "assistant.draft.unknown_catalog_id",
                    correlation_id = %correlation_id,
                    catalog_id = catalog_id.as_str(),
                    "recommended item missing from catalog"
                );
            }
        }
        if selections.is_empty() {
            return Ok(None);
        }

        let mut draft = DraftOrder::new(
            selections,
            DraftEvent {
                start_iso: iso(schedule.start),
                end_iso: iso(schedule.end),
                address: state.slots.address.clone(),
                department: state.slots.department.clone(),
            },
        );
        draft.with_installation = state.slots.with_installation;

        info!(
            event_name = "assistant.turn.draft_ready",
            correlation_id = %correlation_id,
            total = %evaluation.pricing.total,
            rental_days = evaluation.pricing.rental_days,
            urgent = evaluation.pricing.urgent,
            "draft order prepared"
        );

        Ok(Some(TurnReply {
            reply_text: summary(&state.slots, &evaluation, schedule),
            intent_tag: intent.map(|intent| intent.tag().to_string()),
            draft_order: Some(draft),
        }))
    }

    async fn catalog_knows(&self, id: &ProductId) -> Result<bool, TurnError> {
        self.catalog
            .find_by_id(id)
            .await
            .map(|entry| entry.is_some())
            .map_err(|error| TurnError::CollaboratorUnavailable(format!("catalog: {error:#}")))
    }

    async fn generated_turn(
        &self,
        request: &TurnRequest,
        state: &ConversationState,
        intent: Option<Intent>,
        correlation_id: &str,
    ) -> Result<TurnReply, TurnError> {
        let preamble = self.preamble.build(state, &self.guardrails, &self.catalog_ids);

        let generated = self
            .llm
            .generate(&request.messages, &preamble)
            .await
            .map_err(|error| TurnError::CollaboratorUnavailable(format!("generator: {error:#}")))?;
        if generated.trim().is_empty() {
            return Err(TurnError::EmptyGeneratorOutput);
        }

        let extracted = extract_draft(&generated);
        let draft_order = match extracted.draft {
            Some(draft) => validate_draft(draft, self.catalog.as_ref())
                .await
                .map_err(|error| TurnError::CollaboratorUnavailable(format!("catalog: {error:#}")))?,
            None => None,
        };

        let reply_text = match self.guardrails.filter_generated(state, &extracted.text) {
            GuardrailDecision::Allow => extracted.text,
            GuardrailDecision::Replace { reason_code, replacement } => {
                info!(
                    event_name = "assistant.generated.replaced",
                    correlation_id = %correlation_id,
                    reason_code,
                    "generated reply replaced"
                );
                replacement
            }
            GuardrailDecision::Suppress { reason_code } => {
                info!(
                    event_name = "assistant.generated.replaced",
                    correlation_id = %correlation_id,
                    reason_code,
                    "generated reply suppressed"
                );
                self.guardrails.fallback_reply.clone()
            }
        };

        Ok(TurnReply {
            reply_text,
            intent_tag: intent.map(|intent| intent.tag().to_string()),
            draft_order,
        })
    }
}

fn last_assistant_message(messages: &[Message]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|message| message.role == Role::Assistant && !message.is_idle())
        .map(|message| message.content.as_str())
}

fn recommendation_input(slots: &KnownSlots) -> Option<RecommendationInput> {
    let mut input = RecommendationInput::new(GuestCount::Exact(slots.people_count?));
    input.needs = slots.needs.clone();
    input.environment = slots.indoor_outdoor;
    input.event_type = slots.event_type;
    input.with_installation = slots.with_installation == Some(true);
    Some(input)
}

/// Events ending at or before their start time run past midnight.
fn schedule(slots: &KnownSlots) -> Option<RentalSchedule> {
    let start_date = slots.start_date?;
    let start = start_date.and_time(slots.start_time?);
    let end_date = slots.end_date.unwrap_or(start_date);
    let end_time = slots
        .end_time
        .or_else(|| NaiveTime::from_hms_opt(23, 59, 0))?;
    let mut end = end_date.and_time(end_time);
    if end <= start {
        end = end.checked_add_days(Days::new(1))?;
    }
    Some(RentalSchedule::new(start, end))
}

fn zone(slots: &KnownSlots) -> ZoneTier {
    match (slots.delivery_choice, slots.department.as_deref()) {
        (Some(DeliveryChoice::Pickup), _) => ZoneTier::Pickup,
        (_, Some(department)) => ZoneTier::for_department(department),
        (_, None) => ZoneTier::Far,
    }
}

fn iso(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn summary(slots: &KnownSlots, evaluation: &CpqEvaluation, schedule: RentalSchedule) -> String {
    let recommendation = &evaluation.recommendation;
    let pricing = &evaluation.pricing;
    let mut lines = vec!["Voici ma proposition :".to_string()];

    match &recommendation.selection {
        Selection::Pack(pack) => lines.push(format!("- {}", pack.name)),
        Selection::Custom(custom) => {
            lines.push("- Configuration sur mesure :".to_string());
            lines.extend(custom.lines.iter().map(|line| format!("  - {} x {}", line.quantity, line.label)));
        }
    }
    lines.extend(
        recommendation
            .add_ons
            .iter()
            .map(|add_on| format!("- {} x {}", add_on.quantity, add_on.extra.label())),
    );
    if let Some(reason) = recommendation.reasons.first() {
        lines.push(reason.clone());
    }
    lines.extend(recommendation.notes.iter().cloned());

    let days = if pricing.rental_days > 1 {
        format!("{} jours", pricing.rental_days)
    } else {
        "1 jour".to_string()
    };
    let urgency = if pricing.urgent { ", majoration urgence incluse" } else { "" };
    lines.push(format!("Total estimé : {} € TTC ({days}{urgency}).", pricing.total.normalize()));

    let event = slots.event_type.map_or("événement", |kind| kind.label());
    let place = match slots.indoor_outdoor {
        Some(Environment::Outdoor) => "en extérieur",
        _ => "en intérieur",
    };
    let logistics = match (slots.delivery_choice, slots.department.as_deref()) {
        (Some(DeliveryChoice::Pickup), _) => "retrait en boutique".to_string(),
        (_, Some(department)) => format!("livraison département {department}"),
        (_, None) => "livraison".to_string(),
    };
    let dates = if schedule.start.date() == schedule.end.date() || pricing.rental_days == 1 {
        format!("le {}", schedule.start.format("%d/%m/%Y"))
    } else {
        format!("du {} au {}", schedule.start.format("%d/%m/%Y"), schedule.end.format("%d/%m/%Y"))
    };
    lines.push(format!(
        "Récapitulatif : {event} {place} pour {} personnes, {dates} à {}, {logistics}.",
        slots.people_count.unwrap_or_default(),
        schedule.start.format("%Hh%M"),
    ));
    lines.push("Est-ce que tout est correct ?".to_string());
    lines.join("\n")
}
