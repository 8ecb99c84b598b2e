use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::catalog::{
    Inventory, PackTable, LARGE_MIXER_ID, LIGHTING_ID, SMALL_MIXER_ID, SUBWOOFER_ID,
    WIRED_MICROPHONE_ID, WIRELESS_MICROPHONE_ID,
};
use crate::cpq::pricing::ExtraKey;
use crate::domain::event::{Environment, EventKind, GuestCount, Need};
use crate::domain::product::{Pack, PackKind, ProductId};

/// Microphones a custom configuration may carry.
pub const CUSTOM_MICROPHONE_CAP: u32 = 4;
/// Guests served per microphone in a custom configuration.
pub const GUESTS_PER_MICROPHONE: u32 = 50;
/// Above this headcount a custom configuration gets a subwoofer.
pub const SUBWOOFER_THRESHOLD: u32 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationInput {
    pub guests: GuestCount,
    pub needs: BTreeSet<Need>,
    pub environment: Option<Environment>,
    pub event_type: Option<EventKind>,
    pub with_installation: bool,
}

impl RecommendationInput {
    pub fn new(guests: GuestCount) -> Self {
        Self {
            guests,
            needs: BTreeSet::new(),
            environment: None,
            event_type: None,
            with_installation: false,
        }
    }

    fn preferred_kind(&self) -> PackKind {
        match self.event_type {
            Some(EventKind::Conference) => PackKind::Conference,
            _ => PackKind::Sound,
        }
    }

    fn is_outdoor(&self) -> bool {
        self.environment == Some(Environment::Outdoor)
    }

    fn wants(&self, need: Need) -> bool {
        self.needs.contains(&need)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigLine {
    pub item_id: ProductId,
    pub label: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomConfig {
    pub lines: Vec<ConfigLine>,
}

impl CustomConfig {
    pub fn base_cost(&self) -> Decimal {
        self.lines.iter().map(|line| line.unit_price * Decimal::from(line.quantity)).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Selection {
    Pack(Pack),
    Custom(CustomConfig),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOn {
    pub extra: ExtraKey,
    pub quantity: u32,
    /// Added by a business rule rather than requested.
    pub forced: bool,
    /// Unit price from a matched catalog item, overriding the extras table.
    pub unit_price: Option<Decimal>,
}

impl AddOn {
    fn requested(extra: ExtraKey) -> Self {
        Self { extra, quantity: 1, forced: false, unit_price: None }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RecommendationWarning {
    QuoteOnlyCeilingExceeded { pack_id: ProductId, headcount: u32 },
    CoverageGap { headcount: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub selection: Selection,
    pub add_ons: Vec<AddOn>,
    pub reasons: Vec<String>,
    pub more_power_upsell: bool,
    pub lighting_requested: bool,
    pub notes: Vec<String>,
    pub warnings: Vec<RecommendationWarning>,
}

impl Recommendation {
    pub fn base_price(&self) -> Decimal {
        match &self.selection {
            Selection::Pack(pack) => pack.base_price.unwrap_or_default(),
            Selection::Custom(custom) => custom.base_cost(),
        }
    }

    pub fn lighting_included(&self) -> bool {
        matches!(&self.selection, Selection::Pack(pack) if pack.lighting_included)
    }

    pub fn has_microphone(&self) -> bool {
        let in_add_ons = self.add_ons.iter().any(|add_on| {
            matches!(add_on.extra, ExtraKey::WiredMicrophone | ExtraKey::WirelessMicrophone)
        });
        let in_custom = matches!(&self.selection, Selection::Custom(custom) if custom
            .lines
            .iter()
            .any(|line| line.item_id.as_str() == WIRED_MICROPHONE_ID
                || line.item_id.as_str() == WIRELESS_MICROPHONE_ID));
        in_add_ons || in_custom
    }

    /// Catalog ids and quantities making up this recommendation.
    pub fn catalog_lines(&self) -> Vec<(ProductId, u32)> {
        let mut lines = match &self.selection {
            Selection::Pack(pack) => vec![(pack.id.clone(), 1)],
            Selection::Custom(custom) => {
                custom.lines.iter().map(|line| (line.item_id.clone(), line.quantity)).collect()
            }
        };
        lines.extend(
            self.add_ons
                .iter()
                .map(|add_on| (ProductId::new(add_on.extra.catalog_id()), add_on.quantity)),
        );
        lines
    }
}

pub trait RecommendationEngine: Send + Sync {
    fn recommend(&self, input: &RecommendationInput) -> Recommendation;
}

#[derive(Clone, Debug, Default)]
pub struct DeterministicRecommendationEngine {
    packs: PackTable,
    inventory: Inventory,
}

impl DeterministicRecommendationEngine {
    pub fn new(packs: PackTable, inventory: Inventory) -> Self {
        Self { packs, inventory }
    }

    pub fn packs(&self) -> &PackTable {
        &self.packs
    }

    /// Smallest pack of `kind` whose range contains `headcount`.
    fn containing_pack(&self, kind: PackKind, headcount: u32) -> Option<&Pack> {
        self.packs.ordered(kind).into_iter().find(|pack| pack.capacity_range.contains(headcount))
    }

    /// Largest fixed-price pack of the same kind below `ceiling`.
    fn next_smaller_priced(&self, ceiling: &Pack) -> Option<&Pack> {
        self.packs
            .ordered(ceiling.kind)
            .into_iter()
            .filter(|pack| {
                !pack.is_quote_only() && pack.capacity_range.max < ceiling.capacity_range.max
            })
            .last()
    }

    fn custom_config(&self, input: &RecommendationInput) -> CustomConfig {
        let headcount = input.guests.headcount();
        let mut lines = Vec::new();

        let tiers = self.inventory.speaker_tiers();
        let speaker = tiers
            .iter()
            .find(|item| item.capacity_rating.is_some_and(|rating| rating >= headcount))
            .or(tiers.last());
        if let Some(speaker) = speaker {
            let oversized = speaker.capacity_rating.is_some_and(|rating| headcount > rating);
            lines.push(config_line(speaker, if oversized { 4 } else { 2 }));
        }

        if headcount > SUBWOOFER_THRESHOLD || input.is_outdoor() {
            if let Some(subwoofer) = self.inventory.find(SUBWOOFER_ID) {
                lines.push(config_line(subwoofer, 1));
            }
        }

        let mixer_id =
            if input.wants(Need::MoreChannels) { LARGE_MIXER_ID } else { SMALL_MIXER_ID };
        if let Some(mixer) = self.inventory.find(mixer_id) {
            lines.push(config_line(mixer, 1));
        }

        let mut microphones = headcount.div_ceil(GUESTS_PER_MICROPHONE).min(CUSTOM_MICROPHONE_CAP);
        let microphone_required = input.event_type.is_some_and(EventKind::requires_microphone)
            || input.needs.iter().any(|need| need.is_microphone());
        if microphone_required {
            microphones = microphones.max(1);
        }
        let microphone_id = if input.wants(Need::WirelessMicrophone) {
            WIRELESS_MICROPHONE_ID
        } else {
            WIRED_MICROPHONE_ID
        };
        if microphones > 0 {
            if let Some(microphone) = self.inventory.find(microphone_id) {
                lines.push(config_line(microphone, microphones));
            }
        }

        if input.wants(Need::Lighting) {
            if let Some(lighting) = self.inventory.find(LIGHTING_ID) {
                lines.push(config_line(lighting, 1));
            }
        }

        CustomConfig { lines }
    }
}

fn config_line(item: &crate::domain::product::InventoryItem, quantity: u32) -> ConfigLine {
    ConfigLine {
        item_id: item.id.clone(),
        label: item.label.clone(),
        quantity,
        unit_price: item.unit_price,
    }
}

impl RecommendationEngine for DeterministicRecommendationEngine {
    fn recommend(&self, input: &RecommendationInput) -> Recommendation {
        let headcount = input.guests.headcount();
        let mut notes = Vec::new();
        let mut warnings = Vec::new();

        let preferred = input.preferred_kind();
        let containing = self
            .containing_pack(preferred, headcount)
            .or_else(|| self.containing_pack(PackKind::Sound, headcount));

        let pack = match containing {
            Some(pack) if pack.is_quote_only() => {
                warnings.push(RecommendationWarning::QuoteOnlyCeilingExceeded {
                    pack_id: pack.id.clone(),
                    headcount,
                });
                notes.push(format!(
                    "Au-delà de {} personnes, contactez l'un de nos experts pour un dispositif sur mesure.",
                    pack.capacity_range.min.saturating_sub(1)
                ));
                self.next_smaller_priced(pack)
            }
            Some(pack) => Some(pack),
            None => {
                warnings.push(RecommendationWarning::CoverageGap { headcount });
                None
            }
        };

        let selection = match pack {
            Some(pack) => Selection::Pack(pack.clone()),
            None => Selection::Custom(self.custom_config(input)),
        };
        let is_custom = matches!(selection, Selection::Custom(_));

        let add_ons = add_ons_for(input, &selection, is_custom);
        let more_power_upsell = input.is_outdoor()
            || input.event_type.is_some_and(EventKind::is_party)
            || input.wants(Need::Dj)
            || input.guests.bucket().is_top();

        let reasons = reasons_for(&selection, input, more_power_upsell);

        Recommendation {
            selection,
            add_ons,
            reasons,
            more_power_upsell,
            lighting_requested: input.wants(Need::Lighting),
            notes,
            warnings,
        }
    }
}

fn add_ons_for(input: &RecommendationInput, selection: &Selection, is_custom: bool) -> Vec<AddOn> {
    let mut add_ons = Vec::new();
    let lighting_in_pack = matches!(selection, Selection::Pack(pack) if pack.lighting_included);

    if !is_custom {
        if input.wants(Need::WirelessMicrophone) {
            add_ons.push(AddOn::requested(ExtraKey::WirelessMicrophone));
        }
        if input.wants(Need::Microphone) {
            add_ons.push(AddOn::requested(ExtraKey::WiredMicrophone));
        }
        let microphone_requested = input.needs.iter().any(|need| need.is_microphone());
        if !microphone_requested && input.event_type.is_some_and(EventKind::requires_microphone) {
            add_ons.push(AddOn {
                extra: ExtraKey::WiredMicrophone,
                quantity: 1,
                forced: true,
                unit_price: None,
            });
        }
        if input.wants(Need::ExtraBass) || input.wants(Need::MorePower) {
            add_ons.push(AddOn::requested(ExtraKey::Subwoofer));
        }
        if input.wants(Need::Lighting) && !lighting_in_pack {
            add_ons.push(AddOn::requested(ExtraKey::Lighting));
        }
        if input.wants(Need::MoreChannels) {
            add_ons.push(AddOn::requested(ExtraKey::MixerUpgrade));
        }
    }

    if input.wants(Need::Karaoke) {
        add_ons.push(AddOn::requested(ExtraKey::Karaoke));
    }
    if input.with_installation || input.wants(Need::Installation) {
        add_ons.push(AddOn::requested(ExtraKey::Installation));
    }

    add_ons
}

fn reasons_for(selection: &Selection, input: &RecommendationInput, upsell: bool) -> Vec<String> {
    let headcount = input.guests.headcount();
    let mut reasons = Vec::new();

    match selection {
        Selection::Pack(pack) => {
            reasons.push(format!(
                "Le {} est dimensionné pour {} à {} personnes, adapté à vos {} invités.",
                pack.name, pack.capacity_range.min, pack.capacity_range.max, headcount
            ));
            reasons.push(format!(
                "Composition : {}, pour un son clair et équilibré dans tout l'espace.",
                pack.composition.join(", ")
            ));
        }
        Selection::Custom(custom) => {
            reasons.push(format!(
                "Configuration sur mesure dimensionnée pour {headcount} personnes."
            ));
            let labels = custom
                .lines
                .iter()
                .map(|line| format!("{} x {}", line.quantity, line.label))
                .collect::<Vec<_>>();
            reasons.push(format!(
                "Composition : {}, pour un son clair et équilibré dans tout l'espace.",
                labels.join(", ")
            ));
        }
    }

    if input.is_outdoor() {
        reasons.push(
            "En extérieur le son se disperse : le système est orienté pour porter loin sans saturer."
                .to_string(),
        );
    }
    if upsell {
        reasons.push(
            "Option conseillée : un caisson supplémentaire pour plus de puissance et d'impact."
                .to_string(),
        );
    }

    reasons
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        DeterministicRecommendationEngine, RecommendationEngine, RecommendationInput,
        RecommendationWarning, Selection,
    };
    use crate::cpq::catalog::{default_packs, Inventory, PackTable};
    use crate::cpq::pricing::ExtraKey;
    use crate::domain::event::{Environment, EventKind, GuestBucket, GuestCount, Need};
    use crate::domain::product::ProductId;

    fn pack_id(selection: &Selection) -> Option<&str> {
        match selection {
            Selection::Pack(pack) => Some(pack.id.as_str()),
            Selection::Custom(_) => None,
        }
    }

    fn capacity_max(selection: &Selection) -> u32 {
        match selection {
            Selection::Pack(pack) => pack.capacity_range.max,
            Selection::Custom(_) => u32::MAX,
        }
    }

    #[test]
    fn pack_capacity_is_monotonic_in_headcount() {
        let engine = DeterministicRecommendationEngine::default();
        let maxima = [25, 75, 150, 300]
            .into_iter()
            .map(|headcount| {
                let input = RecommendationInput::new(GuestCount::Exact(headcount));
                capacity_max(&engine.recommend(&input).selection)
            })
            .collect::<Vec<_>>();

        assert!(maxima.windows(2).all(|pair| pair[0] <= pair[1]), "{maxima:?}");
    }

    #[test]
    fn mid_size_indoor_sound_request_selects_pack_containing_midpoint() {
        let engine = DeterministicRecommendationEngine::default();
        let mut input = RecommendationInput::new(GuestCount::Bucket(GuestBucket::From100To200));
        input.environment = Some(Environment::Indoor);
        input.needs.insert(Need::Sound);

        let recommendation = engine.recommend(&input);
        match &recommendation.selection {
            Selection::Pack(pack) => assert!(pack.capacity_range.contains(150)),
            Selection::Custom(_) => panic!("expected a fixed pack"),
        }
        assert!(recommendation.warnings.is_empty());
        assert_eq!(recommendation.reasons.len(), 2);
    }

    #[test]
    fn boundary_headcount_stays_in_lower_pack() {
        let engine = DeterministicRecommendationEngine::default();
        let at_boundary = engine.recommend(&RecommendationInput::new(GuestCount::Exact(100)));
        let above = engine.recommend(&RecommendationInput::new(GuestCount::Exact(101)));

        assert_eq!(pack_id(&at_boundary.selection), Some("pack-m"));
        assert_eq!(pack_id(&above.selection), Some("pack-l"));
    }

    #[test]
    fn wedding_gets_a_wired_microphone_without_asking() {
        let engine = DeterministicRecommendationEngine::default();
        let mut input = RecommendationInput::new(GuestCount::Bucket(GuestBucket::From50To100));
        input.event_type = Some(EventKind::Wedding);

        let recommendation = engine.recommend(&input);
        let microphone = recommendation
            .add_ons
            .iter()
            .find(|add_on| add_on.extra == ExtraKey::WiredMicrophone)
            .expect("wired microphone add-on");
        assert!(microphone.forced);
        assert!(microphone.quantity >= 1);
        assert!(recommendation.has_microphone());
    }

    #[test]
    fn requested_wireless_microphone_replaces_forced_wired_one() {
        let engine = DeterministicRecommendationEngine::default();
        let mut input = RecommendationInput::new(GuestCount::Exact(80));
        input.event_type = Some(EventKind::Corporate);
        input.needs.insert(Need::WirelessMicrophone);

        let recommendation = engine.recommend(&input);
        assert!(recommendation.add_ons.iter().all(|add_on| !add_on.forced));
        assert!(recommendation.has_microphone());
    }

    #[test]
    fn quote_only_pack_falls_back_to_next_smaller_priced_pack() {
        let engine = DeterministicRecommendationEngine::default();
        let recommendation =
            engine.recommend(&RecommendationInput::new(GuestCount::Bucket(GuestBucket::Over400)));

        assert_eq!(pack_id(&recommendation.selection), Some("pack-xl"));
        assert!(recommendation.base_price() > Decimal::ZERO);
        assert!(recommendation.notes.iter().any(|note| note.contains("experts")));
        assert!(matches!(
            recommendation.warnings.as_slice(),
            [RecommendationWarning::QuoteOnlyCeilingExceeded { .. }]
        ));
        assert!(recommendation.more_power_upsell);
    }

    #[test]
    fn upsell_and_reasons_follow_fixed_order() {
        let engine = DeterministicRecommendationEngine::default();
        let mut input = RecommendationInput::new(GuestCount::Exact(60));
        input.environment = Some(Environment::Outdoor);

        let recommendation = engine.recommend(&input);
        assert!(recommendation.more_power_upsell);
        assert_eq!(recommendation.reasons.len(), 4);
        assert!(recommendation.reasons[0].contains("dimensionné"));
        assert!(recommendation.reasons[1].starts_with("Composition"));
        assert!(recommendation.reasons[2].contains("extérieur"));
        assert!(recommendation.reasons[3].contains("Option"));
    }

    #[test]
    fn indoor_small_event_has_no_upsell() {
        let engine = DeterministicRecommendationEngine::default();
        let mut input = RecommendationInput::new(GuestCount::Exact(30));
        input.environment = Some(Environment::Indoor);
        input.event_type = Some(EventKind::Conference);

        let recommendation = engine.recommend(&input);
        assert!(!recommendation.more_power_upsell);
        assert_eq!(pack_id(&recommendation.selection), Some("pack-conference"));
    }

    #[test]
    fn coverage_gap_builds_custom_configuration() {
        let packs = default_packs()
            .into_iter()
            .filter(|pack| pack.id != ProductId::new("pack-l"))
            .collect::<Vec<_>>();
        let engine = DeterministicRecommendationEngine::new(PackTable::new(packs), Inventory::default());

        let mut input = RecommendationInput::new(GuestCount::Exact(150));
        input.needs.insert(Need::Lighting);
        let recommendation = engine.recommend(&input);

        let Selection::Custom(custom) = &recommendation.selection else {
            panic!("expected custom configuration");
        };
        let ids = custom.lines.iter().map(|line| line.item_id.as_str()).collect::<Vec<_>>();
        assert_eq!(
            ids,
            vec!["enceinte-12", "caisson-18", "table-6-voies", "micro-filaire", "jeu-lumieres"]
        );
        let microphones = custom
            .lines
            .iter()
            .find(|line| line.item_id.as_str() == "micro-filaire")
            .map(|line| line.quantity);
        assert_eq!(microphones, Some(3));
        // 2 x 40 + 60 + 30 + 3 x 15 + 45
        assert_eq!(recommendation.base_price(), Decimal::from(260));
        assert_eq!(
            recommendation.warnings,
            vec![RecommendationWarning::CoverageGap { headcount: 150 }]
        );
    }

    #[test]
    fn custom_configuration_caps_microphones() {
        let engine = DeterministicRecommendationEngine::new(PackTable::new(Vec::new()), Inventory::default());
        let mut input = RecommendationInput::new(GuestCount::Exact(1_000));
        input.needs.insert(Need::MoreChannels);

        let recommendation = engine.recommend(&input);
        let Selection::Custom(custom) = &recommendation.selection else {
            panic!("expected custom configuration");
        };
        let find = |id: &str| custom.lines.iter().find(|line| line.item_id.as_str() == id);
        assert_eq!(find("micro-filaire").map(|line| line.quantity), Some(4));
        assert_eq!(find("enceinte-15").map(|line| line.quantity), Some(4));
        assert!(find("table-12-voies").is_some());
        assert!(find("jeu-lumieres").is_none());
    }

    #[test]
    fn custom_configuration_keeps_the_ceremony_microphone() {
        let engine = DeterministicRecommendationEngine::new(PackTable::new(Vec::new()), Inventory::default());
        let mut input = RecommendationInput::new(GuestCount::Exact(0));
        input.event_type = Some(EventKind::Wedding);

        let recommendation = engine.recommend(&input);
        let Selection::Custom(custom) = &recommendation.selection else {
            panic!("expected custom configuration");
        };
        let microphones = custom
            .lines
            .iter()
            .find(|line| line.item_id.as_str() == "micro-filaire")
            .map(|line| line.quantity);
        assert_eq!(microphones, Some(1));
        assert!(recommendation.has_microphone());

        let mut party = RecommendationInput::new(GuestCount::Exact(0));
        party.event_type = Some(EventKind::PrivateParty);
        assert!(!engine.recommend(&party).has_microphone());
    }
}
