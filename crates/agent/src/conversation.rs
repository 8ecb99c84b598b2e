use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use soundrent_core::text::Utterance;
use soundrent_core::{
    Ambiance, DeliveryChoice, Environment, EventKind, Need, PackKind, PackTable, ProductId,
};

use crate::intent::{classify, Intent};
use crate::slots::{self, asked_slots, is_acknowledgement, seeks_confirmation, SlotKey, SlotMentions};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Welcome and idle messages are UI chrome, not conversation turns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Normal,
    Welcome,
    Idle,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), kind: MessageKind::Normal, created_at: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            kind: MessageKind::Normal,
            created_at: None,
        }
    }

    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_idle(&self) -> bool {
        self.kind == MessageKind::Idle
    }
}

/// Widget context sent alongside the transcript.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SideChannel {
    pub scenario_id: Option<String>,
    pub product_context: Option<String>,
    pub pack_mode_key: Option<String>,
}

/// The customer is configuring a specific pack from the widget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PackMode {
    pub key: String,
    pub party: bool,
}

impl PackMode {
    pub fn resolve(key: &str, packs: &PackTable) -> Self {
        let party = match packs.find(&ProductId::new(key)) {
            Some(pack) => pack.kind == PackKind::Sound,
            None => !Utterance::new(key)
                .has_any_word(&["conference", "seminaire", "ceremonie", "discours", "reunion"]),
        };
        Self { key: key.to_string(), party }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct KnownSlots {
    pub people_count: Option<u32>,
    pub indoor_outdoor: Option<Environment>,
    pub event_type: Option<EventKind>,
    pub ambiance: Option<Ambiance>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub delivery_choice: Option<DeliveryChoice>,
    pub department: Option<String>,
    pub address: Option<String>,
    pub with_installation: Option<bool>,
    pub needs: BTreeSet<Need>,
}

impl KnownSlots {
    pub fn is_known(&self, slot: SlotKey) -> bool {
        match slot {
            SlotKey::EventType => self.event_type.is_some(),
            SlotKey::PeopleCount => self.people_count.is_some(),
            SlotKey::IndoorOutdoor => self.indoor_outdoor.is_some(),
            SlotKey::Ambiance => self.ambiance.is_some(),
            SlotKey::StartDate => self.start_date.is_some(),
            SlotKey::EndDate => self.end_date.is_some(),
            SlotKey::StartTime => self.start_time.is_some(),
            SlotKey::EndTime => self.end_time.is_some(),
            SlotKey::DeliveryChoice => self.delivery_choice.is_some(),
            SlotKey::Department => self.department.is_some(),
        }
    }

    /// Department only matters once delivery is chosen.
    fn is_relevant(&self, slot: SlotKey) -> bool {
        slot != SlotKey::Department || self.delivery_choice != Some(DeliveryChoice::Pickup)
    }

    /// Slots still needed before an order can be drafted.
    pub fn missing_required(&self) -> Vec<SlotKey> {
        let mut required = vec![
            SlotKey::EventType,
            SlotKey::PeopleCount,
            SlotKey::IndoorOutdoor,
            SlotKey::StartDate,
            SlotKey::EndDate,
            SlotKey::StartTime,
            SlotKey::DeliveryChoice,
        ];
        if self.delivery_choice == Some(DeliveryChoice::Delivery) {
            required.push(SlotKey::Department);
        }
        required.retain(|slot| !self.is_known(*slot));
        required
    }

    pub fn is_complete(&self) -> bool {
        self.missing_required().is_empty()
    }

    pub fn any_known(&self) -> bool {
        SlotKey::CANONICAL.iter().any(|slot| self.is_known(*slot))
    }

    /// Later mentions overwrite earlier ones; nothing is ever cleared.
    fn absorb(&mut self, mentions: SlotMentions) {
        fn set<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        set(&mut self.people_count, mentions.people_count);
        set(&mut self.indoor_outdoor, mentions.environment);
        set(&mut self.event_type, mentions.event_type);
        set(&mut self.ambiance, mentions.ambiance);
        set(&mut self.start_date, mentions.start_date);
        set(&mut self.end_date, mentions.end_date);
        set(&mut self.start_time, mentions.start_time);
        set(&mut self.end_time, mentions.end_time);
        set(&mut self.delivery_choice, mentions.delivery_choice);
        set(&mut self.department, mentions.department);
        set(&mut self.address, mentions.address);
        set(&mut self.with_installation, mentions.with_installation);
        self.needs.extend(mentions.needs);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementTrigger {
    ScenarioActive,
    PackModeActive,
    SubstantiveExchange,
    SlotKnown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "trigger", rename_all = "snake_case")]
pub enum Engagement {
    Fresh,
    Engaged(EngagementTrigger),
}

impl Engagement {
    pub fn is_engaged(self) -> bool {
        matches!(self, Self::Engaged(_))
    }
}

/// Everything known about the conversation, rebuilt from scratch each turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConversationState {
    pub slots: KnownSlots,
    pub asked: BTreeSet<SlotKey>,
    pub engagement: Engagement,
    pub pack_mode: Option<PackMode>,
    pub scenario_id: Option<String>,
    pub product_context: Option<String>,
    pub latest_user_message: Option<String>,
    /// The latest user message acknowledged a summary the assistant asked to confirm.
    pub confirmed: bool,
    pub reference_date: NaiveDate,
}

impl ConversationState {
    pub fn is_engaged(&self) -> bool {
        self.engagement.is_engaged()
    }

    /// First unknown slot in asking order.
    pub fn next_missing(&self) -> Option<SlotKey> {
        SlotKey::CANONICAL
            .into_iter()
            .find(|slot| self.slots.is_relevant(*slot) && !self.slots.is_known(*slot))
    }

    pub fn was_asked(&self, slot: SlotKey) -> bool {
        self.asked.contains(&slot)
    }

    pub fn in_non_party_pack_mode(&self) -> bool {
        self.pack_mode.as_ref().is_some_and(|mode| !mode.party)
    }
}

#[derive(Clone, Debug, Default)]
pub struct StateBuilder {
    packs: PackTable,
}

impl StateBuilder {
    pub fn new(packs: PackTable) -> Self {
        Self { packs }
    }

    /// Pure function of the transcript, the side channel and the reference
    /// date. Idle messages are skipped.
    pub fn build(
        &self,
        messages: &[Message],
        side_channel: &SideChannel,
        reference_date: NaiveDate,
    ) -> ConversationState {
        let turns = messages.iter().filter(|message| !message.is_idle()).collect::<Vec<_>>();
        let latest_user = turns.iter().rposition(|message| message.role == Role::User);

        let pack_mode = side_channel
            .pack_mode_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| PackMode::resolve(key, &self.packs));

        let mut slots = KnownSlots::default();
        if pack_mode.is_some() {
            slots.delivery_choice = Some(DeliveryChoice::Delivery);
            slots.with_installation = Some(true);
        }

        let mut asked = BTreeSet::new();
        let mut last_question = BTreeSet::new();
        let mut pending_confirmation: Option<&str> = None;
        let mut awaiting_reply = false;
        let mut substantive_exchange = false;
        let mut confirmed = false;

        for (index, message) in turns.iter().enumerate() {
            let utterance = Utterance::new(&message.content);
            match message.role {
                Role::Assistant => {
                    last_question = asked_slots(&utterance);
                    asked.extend(last_question.iter().copied());
                    // A headcount the assistant restated fills the gap but never
                    // overrides one the customer gave.
                    if slots.people_count.is_none() {
                        slots.people_count = slots::stated_people_count(&message.content);
                    }
                    if message.kind == MessageKind::Normal {
                        substantive_exchange |= awaiting_reply;
                        pending_confirmation =
                            seeks_confirmation(&utterance).then_some(message.content.as_str());
                    }
                }
                Role::User => {
                    if is_acknowledgement(&utterance) {
                        if let Some(summary) = pending_confirmation.take() {
                            slots.absorb(slots::detect(summary, reference_date));
                            confirmed = Some(index) == latest_user;
                        }
                        continue;
                    }
                    pending_confirmation = None;

                    if !utterance.is_empty() && classify(&message.content) != Some(Intent::Greeting) {
                        awaiting_reply = true;
                    }
                    slots.absorb(slots::detect(&message.content, reference_date));

                    if Some(index) == latest_user && last_question.contains(&SlotKey::PeopleCount) {
                        if let Some(count) = bare_number(&utterance) {
                            slots.people_count = Some(count);
                        }
                    }
                }
            }
        }

        let scenario_id = non_empty(side_channel.scenario_id.as_deref());
        let engagement = if scenario_id.is_some() {
            Engagement::Engaged(EngagementTrigger::ScenarioActive)
        } else if pack_mode.is_some() {
            Engagement::Engaged(EngagementTrigger::PackModeActive)
        } else if substantive_exchange {
            Engagement::Engaged(EngagementTrigger::SubstantiveExchange)
        } else if slots.any_known() {
            Engagement::Engaged(EngagementTrigger::SlotKnown)
        } else {
            Engagement::Fresh
        };

        ConversationState {
            slots,
            asked,
            engagement,
            pack_mode,
            scenario_id,
            product_context: non_empty(side_channel.product_context.as_deref()),
            latest_user_message: latest_user.map(|index| turns[index].content.clone()),
            confirmed,
            reference_date,
        }
    }
}

fn bare_number(utterance: &Utterance) -> Option<u32> {
    if !utterance.is_numeric() {
        return None;
    }
    utterance.words().iter().filter_map(|word| word.parse::<u32>().ok()).max()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}
