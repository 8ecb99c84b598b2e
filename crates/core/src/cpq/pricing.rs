use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDateTime, Timelike, Weekday};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::cpq::catalog::{
    INSTALLATION_ID, KARAOKE_ID, LARGE_MIXER_ID, LIGHTING_ID, SUBWOOFER_ID, WIRED_MICROPHONE_ID,
    WIRELESS_MICROPHONE_ID,
};
use crate::cpq::recommend::{Recommendation, Selection};
use crate::errors::DomainError;
use crate::text::normalize;

/// Lead time under which a booking is treated as short notice.
pub const URGENCY_WINDOW_HOURS: i64 = 2;
/// Saturday start hour from which the weekend-peak surcharge applies.
pub const SATURDAY_PEAK_HOUR: u32 = 15;
/// Events ending before this hour the next morning count as one day.
pub const OVERNIGHT_END_HOUR: u32 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraKey {
    WiredMicrophone,
    WirelessMicrophone,
    Subwoofer,
    Lighting,
    MixerUpgrade,
    Karaoke,
    Installation,
}

impl ExtraKey {
    pub fn catalog_id(self) -> &'static str {
        match self {
            Self::WiredMicrophone => WIRED_MICROPHONE_ID,
            Self::WirelessMicrophone => WIRELESS_MICROPHONE_ID,
            Self::Subwoofer => SUBWOOFER_ID,
            Self::Lighting => LIGHTING_ID,
            Self::MixerUpgrade => LARGE_MIXER_ID,
            Self::Karaoke => KARAOKE_ID,
            Self::Installation => INSTALLATION_ID,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::WiredMicrophone => "Micro filaire",
            Self::WirelessMicrophone => "Micro sans fil",
            Self::Subwoofer => "Caisson de basses supplémentaire",
            Self::Lighting => "Jeu de lumières",
            Self::MixerUpgrade => "Table de mixage 12 voies",
            Self::Karaoke => "Kit karaoké",
            Self::Installation => "Installation et réglages sur site",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingUnit {
    PerDay,
    Flat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraPrice {
    pub amount: Decimal,
    pub unit: BillingUnit,
}

impl ExtraPrice {
    pub fn per_day(amount: i64) -> Self {
        Self { amount: Decimal::from(amount), unit: BillingUnit::PerDay }
    }

    pub fn flat(amount: i64) -> Self {
        Self { amount: Decimal::from(amount), unit: BillingUnit::Flat }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneTier {
    Near,
    Mid,
    Far,
    Pickup,
}

impl ZoneTier {
    pub fn label(self) -> &'static str {
        match self {
            Self::Near => "zone proche",
            Self::Mid => "zone intermédiaire",
            Self::Far => "zone éloignée",
            Self::Pickup => "retrait en agence",
        }
    }

    /// Delivery tier of a French department number (`"75"`, `"2A"`, `"974"`).
    pub fn for_department(department: &str) -> Self {
        match department.trim().to_ascii_uppercase().as_str() {
            "75" | "92" | "93" | "94" => Self::Near,
            "77" | "78" | "91" | "95" => Self::Mid,
            _ => Self::Far,
        }
    }

    /// Tier of a five-digit postal code, if it is one.
    pub fn for_postal_code(postal_code: &str) -> Option<Self> {
        department_from_postal_code(postal_code).map(|department| Self::for_department(&department))
    }
}

impl FromStr for ZoneTier {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(value);
        match normalized.as_str() {
            "paris" | "near" | "proche" => return Ok(Self::Near),
            "mid" | "ile de france" | "idf" | "grande couronne" => return Ok(Self::Mid),
            "far" | "province" | "loin" => return Ok(Self::Far),
            "pickup" | "retrait" | "sur place" => return Ok(Self::Pickup),
            _ => {}
        }

        if let Some(zone) = Self::for_postal_code(&normalized) {
            return Ok(zone);
        }
        if (2..=3).contains(&normalized.len()) && normalized.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Self::for_department(&normalized));
        }

        Err(DomainError::UnknownValue { field: "zone", value: value.to_string() })
    }
}

/// Department number for a French postal code (`75011` → `75`, `20090` →
/// `2A`, `97400` → `974`).
pub fn department_from_postal_code(postal_code: &str) -> Option<String> {
    let code = postal_code.trim();
    if code.len() != 5 || !code.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    if code.starts_with("97") || code.starts_with("98") {
        return Some(code[..3].to_string());
    }
    if let Some(rest) = code.strip_prefix("20") {
        let corsica = if rest < "200" { "2A" } else { "2B" };
        return Some(corsica.to_string());
    }
    Some(code[..2].to_string())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPrices {
    pub near: Decimal,
    pub mid: Decimal,
    pub far: Decimal,
}

impl DeliveryPrices {
    pub fn for_zone(&self, zone: ZoneTier) -> Decimal {
        match zone {
            ZoneTier::Near => self.near,
            ZoneTier::Mid => self.mid,
            ZoneTier::Far => self.far,
            ZoneTier::Pickup => Decimal::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub urgency_multiplier: Decimal,
    pub delivery: DeliveryPrices,
    /// Daily credit given back when a pack bundles lighting nobody asked for.
    pub lighting_credit: Decimal,
    pub extras: BTreeMap<ExtraKey, ExtraPrice>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            urgency_multiplier: Decimal::new(125, 2),
            delivery: DeliveryPrices {
                near: Decimal::from(80),
                mid: Decimal::from(120),
                far: Decimal::from(180),
            },
            lighting_credit: Decimal::from(40),
            extras: BTreeMap::from([
                (ExtraKey::WiredMicrophone, ExtraPrice::per_day(15)),
                (ExtraKey::WirelessMicrophone, ExtraPrice::per_day(25)),
                (ExtraKey::Subwoofer, ExtraPrice::per_day(60)),
                (ExtraKey::Lighting, ExtraPrice::per_day(45)),
                (ExtraKey::MixerUpgrade, ExtraPrice::per_day(25)),
                (ExtraKey::Karaoke, ExtraPrice::per_day(40)),
                (ExtraKey::Installation, ExtraPrice::flat(90)),
            ]),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalSchedule {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl RentalSchedule {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Calendar days billed.
    pub fn rental_days(&self) -> u32 {
        let mut days = (self.end.date() - self.start.date()).num_days() + 1;
        if days == 2 && self.end.hour() < OVERNIGHT_END_HOUR {
            days = 1;
        }
        days.max(1) as u32
    }
}

/// Single authoritative urgency rule. Multi-day rentals are never urgent.
pub fn is_urgent(start: NaiveDateTime, now: NaiveDateTime, rental_days: u32) -> bool {
    if rental_days > 1 {
        return false;
    }

    let short_notice = start <= now + Duration::hours(URGENCY_WINDOW_HOURS);
    let sunday = start.weekday() == Weekday::Sun;
    let saturday_peak = start.weekday() == Weekday::Sat && start.hour() >= SATURDAY_PEAK_HOUR;

    short_notice || sunday || saturday_peak
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceComponent {
    Base,
    Delivery,
    Extra,
    Adjustment,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLine {
    pub label: String,
    pub component: PriceComponent,
    pub unit: BillingUnit,
    pub unit_amount: Decimal,
    pub quantity: u32,
}

impl PriceLine {
    fn new(
        label: impl Into<String>,
        component: PriceComponent,
        unit: BillingUnit,
        unit_amount: Decimal,
        quantity: u32,
    ) -> Self {
        Self { label: label.into(), component, unit, unit_amount, quantity }
    }

    pub fn total(&self, rental_days: u32) -> Decimal {
        let days = match self.unit {
            BillingUnit::PerDay => Decimal::from(rental_days),
            BillingUnit::Flat => Decimal::ONE,
        };
        self.unit_amount * Decimal::from(self.quantity) * days
    }
}

/// Sums the lines of one component. Every total goes through here.
pub fn reduce(lines: &[PriceLine], component: PriceComponent, rental_days: u32) -> Decimal {
    lines
        .iter()
        .filter(|line| line.component == component)
        .map(|line| line.total(rental_days))
        .sum()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub base: Decimal,
    pub delivery: Decimal,
    /// Net of the lighting concordance adjustment.
    pub extras: Decimal,
    pub urgency: Decimal,
    pub total: Decimal,
    pub concordance_adjustment: Decimal,
    pub rental_days: u32,
    pub urgent: bool,
    pub manual_review: bool,
    pub lines: Vec<PriceLine>,
}

#[derive(Clone, Debug)]
pub struct PricingRequest<'a> {
    pub recommendation: &'a Recommendation,
    pub zone: ZoneTier,
    pub schedule: Option<RentalSchedule>,
    pub now: NaiveDateTime,
}

pub trait PricingEngine: Send + Sync {
    fn price(&self, request: &PricingRequest<'_>) -> PriceBreakdown;
}

#[derive(Clone, Debug, Default)]
pub struct DeterministicPricingEngine {
    config: PricingConfig,
}

impl DeterministicPricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }
}

impl PricingEngine for DeterministicPricingEngine {
    fn price(&self, request: &PricingRequest<'_>) -> PriceBreakdown {
        price_with_lines(&self.config, request)
    }
}

pub fn price_lines(config: &PricingConfig, request: &PricingRequest<'_>) -> Vec<PriceLine> {
    let recommendation = request.recommendation;
    let mut lines = Vec::new();

    match &recommendation.selection {
        Selection::Pack(pack) => {
            lines.push(PriceLine::new(
                pack.name.clone(),
                PriceComponent::Base,
                BillingUnit::PerDay,
                pack.base_price.unwrap_or_default(),
                1,
            ));
        }
        Selection::Custom(custom) => {
            for line in &custom.lines {
                lines.push(PriceLine::new(
                    line.label.clone(),
                    PriceComponent::Base,
                    BillingUnit::PerDay,
                    line.unit_price,
                    line.quantity,
                ));
            }
        }
    }

    let delivery = config.delivery.for_zone(request.zone);
    if request.zone != ZoneTier::Pickup {
        lines.push(PriceLine::new(
            format!("Livraison {}", request.zone.label()),
            PriceComponent::Delivery,
            BillingUnit::Flat,
            delivery,
            1,
        ));
    }

    for add_on in &recommendation.add_ons {
        let Some(table_price) = config.extras.get(&add_on.extra) else {
            continue;
        };
        let unit_amount = add_on.unit_price.unwrap_or(table_price.amount);
        lines.push(PriceLine::new(
            add_on.extra.label(),
            PriceComponent::Extra,
            table_price.unit,
            unit_amount,
            add_on.quantity,
        ));
    }

    if recommendation.lighting_included() && !recommendation.lighting_requested {
        lines.push(PriceLine::new(
            "Lumières incluses non demandées",
            PriceComponent::Adjustment,
            BillingUnit::PerDay,
            -config.lighting_credit,
            1,
        ));
    }

    lines
}

pub fn price_with_lines(config: &PricingConfig, request: &PricingRequest<'_>) -> PriceBreakdown {
    let rental_days = request.schedule.map(|schedule| schedule.rental_days()).unwrap_or(1);
    let lines = price_lines(config, request);

    let base = reduce(&lines, PriceComponent::Base, rental_days);
    let delivery = reduce(&lines, PriceComponent::Delivery, rental_days);
    let concordance_adjustment = -reduce(&lines, PriceComponent::Adjustment, rental_days);
    let mut extras = reduce(&lines, PriceComponent::Extra, rental_days) - concordance_adjustment;

    let mut manual_review = false;
    let mut subtotal = base + delivery + extras;
    if subtotal < Decimal::ZERO {
        extras = -(base + delivery);
        subtotal = Decimal::ZERO;
        manual_review = true;
    }

    let urgent = request
        .schedule
        .map(|schedule| is_urgent(schedule.start, request.now, rental_days))
        .unwrap_or(false);

    let total = if urgent {
        (subtotal * config.urgency_multiplier)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    } else {
        subtotal
    };
    let urgency = total - subtotal;

    PriceBreakdown {
        base,
        delivery,
        extras,
        urgency,
        total,
        concordance_adjustment,
        rental_days,
        urgent,
        manual_review,
        lines,
    }
}
