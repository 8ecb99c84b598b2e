//! System preamble handed to the reply generator.

use std::fmt::Write as _;

use soundrent_core::{DeliveryChoice, Environment, ProductId};

use crate::conversation::ConversationState;
use crate::guardrails::GuardrailPolicy;
use crate::slots::SlotKey;

pub const DRAFT_OPEN_TAG: &str = "<draft_order>";
pub const DRAFT_CLOSE_TAG: &str = "</draft_order>";

#[derive(Clone, Debug)]
pub struct PreambleBuilder {
    contact_phone: String,
}

impl PreambleBuilder {
    pub fn new(contact_phone: impl Into<String>) -> Self {
        Self { contact_phone: contact_phone.into() }
    }

    pub fn build(
        &self,
        state: &ConversationState,
        guardrails: &GuardrailPolicy,
        catalog_ids: &[ProductId],
    ) -> String {
        let mut preamble = String::from(
            "Tu es l'assistant commercial d'un loueur de sonorisation pour événements. \
             Réponds en français, avec chaleur et concision.\n\
             Règles :\n\
             - Ne donne jamais de prix : ils sont calculés par le système.\n\
             - Pose une seule question à la fois.\n\
             - Ne redemande jamais une information déjà connue.\n",
        );

        if state.is_engaged() {
            preamble.push_str("- La conversation est engagée : ne salue pas à nouveau et ne te présente pas.\n");
        }
        if state.confirmed {
            preamble.push_str("- Le client vient de confirmer le récapitulatif : ne le redemande pas.\n");
        }
        if state.in_non_party_pack_mode() {
            preamble.push_str("- Le client configure un pack conférence : ne parle ni de DJ ni de piste de danse.\n");
        }
        let _ = writeln!(
            preamble,
            "- Si le client veut parler à un humain, donne le numéro {}.",
            self.contact_phone
        );

        preamble.push_str("\nInformations connues :\n");
        let known = known_facts(state);
        if known.is_empty() {
            preamble.push_str("- aucune pour l'instant\n");
        }
        for fact in known {
            let _ = writeln!(preamble, "- {fact}");
        }

        if let Some(question) = guardrails.next_question(state) {
            let _ = writeln!(preamble, "\nProchaine question à poser : {question}");
        }
        if let Some(mode) = &state.pack_mode {
            let _ = writeln!(preamble, "Pack en cours de configuration : {}", mode.key);
        }
        if let Some(context) = &state.product_context {
            let _ = writeln!(preamble, "Produit consulté : {context}");
        }

        if !catalog_ids.is_empty() {
            let ids = catalog_ids.iter().map(ProductId::as_str).collect::<Vec<_>>().join(", ");
            let _ = writeln!(
                preamble,
                "\nPour proposer une commande, ajoute un bloc {DRAFT_OPEN_TAG}{{\"selections\":[{{\"catalogId\":\"...\",\"qty\":1}}],\"event\":{{\"startISO\":\"...\",\"endISO\":\"...\"}}}}{DRAFT_CLOSE_TAG} \
                 en n'utilisant que ces identifiants : {ids}."
            );
        }
        preamble
    }
}

fn known_facts(state: &ConversationState) -> Vec<String> {
    let slots = &state.slots;
    let mut facts = Vec::new();

    for slot in SlotKey::CANONICAL {
        let fact = match slot {
            SlotKey::EventType => slots.event_type.map(|kind| format!("type d'événement : {}", kind.label())),
            SlotKey::PeopleCount => slots.people_count.map(|count| format!("nombre de personnes : {count}")),
            SlotKey::IndoorOutdoor => slots.indoor_outdoor.map(|environment| {
                let label = match environment {
                    Environment::Indoor => "intérieur",
                    Environment::Outdoor => "extérieur",
                };
                format!("lieu : {label}")
            }),
            SlotKey::Ambiance => slots.ambiance.map(|ambiance| format!("ambiance : {ambiance:?}").to_lowercase()),
            SlotKey::StartDate => slots.start_date.map(|date| format!("date de début : {}", date.format("%d/%m/%Y"))),
            SlotKey::EndDate => slots.end_date.map(|date| format!("date de fin : {}", date.format("%d/%m/%Y"))),
            SlotKey::StartTime => slots.start_time.map(|time| format!("heure de début : {}", time.format("%H:%M"))),
            SlotKey::EndTime => slots.end_time.map(|time| format!("heure de fin : {}", time.format("%H:%M"))),
            SlotKey::DeliveryChoice => slots.delivery_choice.map(|choice| match choice {
                DeliveryChoice::Delivery => "livraison souhaitée".to_string(),
                DeliveryChoice::Pickup => "retrait en boutique".to_string(),
            }),
            SlotKey::Department => slots.department.as_ref().map(|department| format!("département : {department}")),
        };
        facts.extend(fact);
    }
    if let Some(address) = &slots.address {
        facts.push(format!("adresse : {address}"));
    }
    if let Some(installation) = slots.with_installation {
        facts.push(format!("installation : {}", if installation { "oui" } else { "non" }));
    }
    facts
}
