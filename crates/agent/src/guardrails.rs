//! Anti-repetition guard over canned and generated replies.
//!
//! Canned templates are screened before use; generated text is filtered
//! after the model answers. Both decisions are pure functions of the
//! conversation state.

use soundrent_core::text::Utterance;

use crate::conversation::ConversationState;
use crate::slots::{asked_slots, SlotKey};

pub const FALLBACK_REPLY: &str =
    "Pouvez-vous m'en dire un peu plus sur votre événement pour que je vous oriente au mieux ?";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow,
    Suppress { reason_code: &'static str },
    Replace { reason_code: &'static str, replacement: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardrailPolicy {
    pub fallback_reply: String,
    /// Keep DJ and dance-floor talk out of non-party pack modes.
    pub cross_topic_guard: bool,
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self { fallback_reply: FALLBACK_REPLY.to_string(), cross_topic_guard: true }
    }
}

impl GuardrailPolicy {
    pub fn screen_template(&self, state: &ConversationState, template: &str) -> GuardrailDecision {
        let utterance = Utterance::new(template);

        if state.is_engaged() && is_reset(&utterance) {
            return GuardrailDecision::Suppress { reason_code: "reset_after_engagement" };
        }
        if asked_slots(&utterance).iter().any(|slot| state.slots.is_known(*slot)) {
            return GuardrailDecision::Suppress { reason_code: "slot_already_known" };
        }
        if self.cross_topic_guard && state.in_non_party_pack_mode() && is_party_talk(&utterance) {
            return GuardrailDecision::Suppress { reason_code: "cross_topic_pack_mode" };
        }
        GuardrailDecision::Allow
    }

    pub fn filter_generated(&self, state: &ConversationState, text: &str) -> GuardrailDecision {
        if text.trim().is_empty() {
            return GuardrailDecision::Replace {
                reason_code: "empty_output",
                replacement: self.fallback_reply.clone(),
            };
        }
        if state.is_engaged() && is_reset(&Utterance::new(text)) {
            return GuardrailDecision::Replace {
                reason_code: "reset_after_engagement",
                replacement: self.next_question(state).unwrap_or_else(|| self.fallback_reply.clone()),
            };
        }
        GuardrailDecision::Allow
    }

    /// Question for the first unknown slot, phrased as a reminder when it
    /// was already asked.
    pub fn next_question(&self, state: &ConversationState) -> Option<String> {
        let slot = state.next_missing()?;
        let reminder = state.was_asked(slot);
        if slot == SlotKey::EventType && !state.slots.is_known(SlotKey::PeopleCount) {
            let question = "quel type d'événement organisez-vous et pour combien de personnes ?";
            return Some(if reminder {
                format!("Pour rappel, pour vous proposer le bon matériel : {question}")
            } else {
                format!("Pour vous proposer le bon matériel, {question}")
            });
        }
        Some(question_for(slot, reminder))
    }
}

pub fn question_for(slot: SlotKey, reminder: bool) -> String {
    let (fresh, again) = match slot {
        SlotKey::EventType => (
            "Quel type d'événement organisez-vous ?",
            "Je reviens vers vous : quel type d'événement organisez-vous ?",
        ),
        SlotKey::PeopleCount => (
            "Combien de personnes attendez-vous ?",
            "Pour rappel, combien de personnes attendez-vous ?",
        ),
        SlotKey::IndoorOutdoor => (
            "L'événement aura-t-il lieu en intérieur ou en extérieur ?",
            "Pour rappel, l'événement aura-t-il lieu en intérieur ou en extérieur ?",
        ),
        SlotKey::Ambiance => (
            "Quelle ambiance souhaitez-vous : plutôt festive, lounge ou prise de parole ?",
            "Pour affiner ma proposition, quelle ambiance souhaitez-vous ?",
        ),
        SlotKey::StartDate => (
            "À quelle date a lieu votre événement ?",
            "Pour rappel, à quelle date a lieu votre événement ?",
        ),
        SlotKey::EndDate => (
            "Jusqu'à quelle date souhaitez-vous garder le matériel ?",
            "Pour rappel, jusqu'à quelle date souhaitez-vous garder le matériel ?",
        ),
        SlotKey::StartTime => (
            "À quelle heure commence l'événement ?",
            "Pour rappel, à quelle heure commence l'événement ?",
        ),
        SlotKey::EndTime => (
            "À quelle heure se termine l'événement ?",
            "Pour rappel, à quelle heure se termine l'événement ?",
        ),
        SlotKey::DeliveryChoice => (
            "Préférez-vous la livraison ou le retrait en boutique ?",
            "Pour rappel, préférez-vous la livraison ou le retrait en boutique ?",
        ),
        SlotKey::Department => (
            "Quel est le code postal du lieu de l'événement ?",
            "Pour rappel, quel est le code postal du lieu de l'événement ?",
        ),
    };
    if reminder { again } else { fresh }.to_string()
}

fn is_reset(utterance: &Utterance) -> bool {
    utterance.has_word("bienvenue")
        || utterance.has_any_phrase(&[
            "dites moi ce que vous organisez",
            "comment puis je vous aider",
            "en quoi puis je vous aider",
            "que puis je faire pour vous",
            "je suis votre assistant",
            "je suis l assistant",
        ])
}

fn is_party_talk(utterance: &Utterance) -> bool {
    utterance.has_any_word(&["dj", "danse", "danser", "dancefloor", "boom", "clubbing", "festive"])
        || utterance.has_phrase("piste de danse")
}
