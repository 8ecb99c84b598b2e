use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackKind {
    Sound,
    Conference,
}

/// Inclusive guest-count range a pack is sized for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityRange {
    pub min: u32,
    pub max: u32,
}

impl CapacityRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, headcount: u32) -> bool {
        (self.min..=self.max).contains(&headcount)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pack {
    pub id: ProductId,
    pub name: String,
    pub kind: PackKind,
    /// Daily price; `None` marks a quote-only pack.
    pub base_price: Option<Decimal>,
    pub composition: Vec<String>,
    pub capacity_range: CapacityRange,
    #[serde(default)]
    pub lighting_included: bool,
}

impl Pack {
    pub fn is_quote_only(&self) -> bool {
        self.base_price.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Pack,
    Speaker,
    Subwoofer,
    Mixer,
    Microphone,
    Lighting,
    Accessory,
    Service,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ProductId,
    pub label: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub capacity_rating: Option<u32>,
    pub category: ItemCategory,
}
