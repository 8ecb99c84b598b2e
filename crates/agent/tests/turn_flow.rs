use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use soundrent_agent::{
    AgentRuntime, FixedClock, InMemoryCatalog, LlmClient, Message, StaticLlmClient, TurnError,
    TurnRequest,
};
use soundrent_core::config::AppConfig;
use soundrent_core::Inventory;

struct UnreachableLlm;

#[async_trait]
impl LlmClient for UnreachableLlm {
    async fn generate(&self, _transcript: &[Message], _preamble: &str) -> Result<String> {
        Err(anyhow!("connection refused"))
    }
}

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 5, 20)
        .and_then(|date| date.and_hms_opt(10, 0, 0))
        .expect("valid clock")
}

fn runtime(llm: Arc<dyn LlmClient>) -> AgentRuntime {
    let config = AppConfig::default();
    let catalog = Arc::new(InMemoryCatalog::seeded(&config.catalog.packs, &Inventory::default()));
    AgentRuntime::from_config(&config, llm, catalog).with_clock(Arc::new(FixedClock(now())))
}

fn complete_wedding() -> TurnRequest {
    TurnRequest::new(vec![Message::user(
        "Bonjour, nous organisons un mariage pour 120 personnes en intérieur, du 12 au 13 juin de 19h à 2h, avec livraison à Paris 75011",
    )])
}

#[tokio::test]
async fn complete_transcript_yields_a_draft_order() {
    let runtime = runtime(Arc::new(UnreachableLlm));

    let reply = runtime.process_turn(&complete_wedding()).await.expect("draft turn");
    let draft = reply.draft_order.expect("draft order");

    assert_eq!(reply.intent_tag.as_deref(), Some("evenement_mariage"));
    assert!(draft.needs_confirmation);
    assert!(draft.selections.first().is_some_and(|line| line.catalog_id.as_str().starts_with("pack-")));
    assert_eq!(draft.event.start_iso, "2026-06-12T19:00:00");
    assert_eq!(draft.event.end_iso, "2026-06-13T02:00:00");
    assert_eq!(draft.event.department.as_deref(), Some("75"));
    assert!(reply.reply_text.contains("€"));
    assert!(reply.reply_text.contains("120 personnes"));
    assert!(reply.reply_text.ends_with("Est-ce que tout est correct ?"));
}

#[tokio::test]
async fn replaying_a_transcript_gives_the_same_reply() {
    let runtime = runtime(Arc::new(UnreachableLlm));

    let first = runtime.handle_turn(&complete_wedding()).await;
    let second = runtime.handle_turn(&complete_wedding()).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn human_contact_request_gets_the_phone_number() {
    let runtime = runtime(Arc::new(UnreachableLlm));
    let request = TurnRequest::new(vec![Message::user("Je voudrais parler à un conseiller")]);

    let reply = runtime.handle_turn(&request).await;
    assert_eq!(reply.intent_tag.as_deref(), Some("contact_humain"));
    assert!(reply.reply_text.contains("01 23 45 67 89"));
    assert_eq!(reply.draft_order, None);
}

#[tokio::test]
async fn transcript_ending_with_the_assistant_is_rejected() {
    let runtime = runtime(Arc::new(UnreachableLlm));
    let request = TurnRequest::new(vec![
        Message::user("un mariage"),
        Message::assistant("Combien de personnes attendez-vous ?"),
    ]);

    assert!(matches!(runtime.process_turn(&request).await, Err(TurnError::InvalidTranscript(_))));
    let degraded = runtime.handle_turn(&request).await;
    assert!(degraded.reply_text.contains("reformuler"));
}

#[tokio::test]
async fn empty_transcript_is_rejected() {
    let runtime = runtime(Arc::new(UnreachableLlm));
    let result = runtime.process_turn(&TurnRequest::new(Vec::new())).await;
    assert!(matches!(result, Err(TurnError::InvalidTranscript(_))));
}

#[tokio::test]
async fn unreachable_generator_degrades_to_an_apology() {
    let runtime = runtime(Arc::new(UnreachableLlm));
    let request = TurnRequest::new(vec![Message::user("Quel est le prix d'un devis ?")]);

    assert!(matches!(
        runtime.process_turn(&request).await,
        Err(TurnError::CollaboratorUnavailable(_))
    ));
    let reply = runtime.handle_turn(&request).await;
    assert!(reply.reply_text.starts_with("Désolé"));
    assert!(!reply.reply_text.contains("connection refused"));
}

#[tokio::test]
async fn empty_generator_output_falls_back() {
    let runtime = runtime(Arc::new(StaticLlmClient::new("   ")));
    let request = TurnRequest::new(vec![Message::user("Quel est le prix d'un devis ?")]);

    assert!(matches!(runtime.process_turn(&request).await, Err(TurnError::EmptyGeneratorOutput)));
    assert!(!runtime.handle_turn(&request).await.reply_text.is_empty());
}

#[tokio::test]
async fn generated_draft_is_validated_against_the_catalog() {
    let generated = r#"Je vous propose le Pack M.
<draft_order>{"selections":[{"catalogId":"pack-m","qty":1},{"catalogId":"canon-a-fumee","qty":1}],"event":{"startISO":"2026-06-12T19:00:00","endISO":"2026-06-12T23:59:00"}}</draft_order>"#;
    let runtime = runtime(Arc::new(StaticLlmClient::new(generated)));
    let request = TurnRequest::new(vec![Message::user("Quel est le prix d'un devis ?")]);

    let reply = runtime.process_turn(&request).await.expect("generated turn");
    assert_eq!(reply.reply_text, "Je vous propose le Pack M.");
    assert_eq!(reply.intent_tag.as_deref(), Some("demande_devis"));

    let draft = reply.draft_order.expect("validated draft");
    let ids = draft.selections.iter().map(|line| line.catalog_id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["pack-m"]);
    assert!(draft.needs_confirmation);
}

#[tokio::test]
async fn generated_reset_is_replaced_once_engaged() {
    let runtime = runtime(Arc::new(StaticLlmClient::new(
        "Bonjour, je suis votre assistant ! Comment puis-je vous aider ?",
    )));
    let request = TurnRequest::new(vec![
        Message::user("un mariage pour 120 personnes"),
        Message::assistant("L'événement aura-t-il lieu en intérieur ou en extérieur ?"),
        Message::user("Quel est le prix d'un devis ?"),
    ]);

    let reply = runtime.process_turn(&request).await.expect("generated turn");
    assert_eq!(
        reply.reply_text,
        "Pour rappel, l'événement aura-t-il lieu en intérieur ou en extérieur ?"
    );
}

#[tokio::test]
async fn known_slot_template_is_not_repeated() {
    let runtime = runtime(Arc::new(StaticLlmClient::new("Parfait, notez que le Pack L convient bien.")));
    let request = TurnRequest::new(vec![
        Message::user("un mariage pour 120 personnes"),
        Message::assistant("L'événement aura-t-il lieu en intérieur ou en extérieur ?"),
        Message::user("c'est un mariage"),
    ]);

    let reply = runtime.process_turn(&request).await.expect("generated turn");
    assert_eq!(reply.reply_text, "Parfait, notez que le Pack L convient bien.");
    assert_eq!(reply.intent_tag.as_deref(), Some("evenement_mariage"));
}

#[tokio::test]
async fn approving_the_summary_moves_on_instead_of_repeating_it() {
    let runtime = runtime(Arc::new(UnreachableLlm));
    let first = runtime.process_turn(&complete_wedding()).await.expect("draft turn");

    let mut messages = complete_wedding().messages;
    messages.push(Message::assistant(first.reply_text.clone()));
    messages.push(Message::user("oui"));
    let second = runtime.process_turn(&TurnRequest::new(messages)).await.expect("confirmed turn");

    assert_ne!(second.reply_text, first.reply_text);
    assert!(second.reply_text.contains("validée"));
    assert!(second.reply_text.contains("01 23 45 67 89"));
    let draft = second.draft_order.expect("confirmed draft");
    assert!(!draft.needs_confirmation);
    assert_eq!(Some(&draft.selections), first.draft_order.as_ref().map(|draft| &draft.selections));
}

#[tokio::test]
async fn unchanged_draft_is_not_sent_twice() {
    let runtime = runtime(Arc::new(StaticLlmClient::new("Prenez votre temps, je reste disponible.")));
    let first = runtime.process_turn(&complete_wedding()).await.expect("draft turn");

    let mut messages = complete_wedding().messages;
    messages.push(Message::assistant(first.reply_text.clone()));
    messages.push(Message::user("hmm, laissez-moi y réfléchir"));
    let second = runtime.process_turn(&TurnRequest::new(messages)).await.expect("follow-up turn");

    assert_ne!(second.reply_text, first.reply_text);
    assert_eq!(second.draft_order, None);
}

#[tokio::test]
async fn dated_headcount_drafts_for_the_stated_guests() {
    let runtime = runtime(Arc::new(UnreachableLlm));
    let request = TurnRequest::new(vec![Message::user(
        "Mariage le 13/06/2026, 120 personnes en intérieur, à 19h, sur une journée, livraison à Paris 75011",
    )]);

    let reply = runtime.process_turn(&request).await.expect("draft turn");
    assert!(reply.reply_text.contains("120 personnes"));
    assert!(reply.draft_order.is_some());
}
