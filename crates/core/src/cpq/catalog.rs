use rust_decimal::Decimal;

use crate::domain::product::{
    CapacityRange, InventoryItem, ItemCategory, Pack, PackKind, ProductId,
};

/// Largest headcount the sound packs must cover.
pub const MAX_GUESTS: u32 = 5_000;

pub const WIRED_MICROPHONE_ID: &str = "micro-filaire";
pub const WIRELESS_MICROPHONE_ID: &str = "micro-hf";
pub const SUBWOOFER_ID: &str = "caisson-18";
pub const LIGHTING_ID: &str = "jeu-lumieres";
pub const KARAOKE_ID: &str = "kit-karaoke";
pub const INSTALLATION_ID: &str = "installation";
pub const SMALL_MIXER_ID: &str = "table-6-voies";
pub const LARGE_MIXER_ID: &str = "table-12-voies";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackTable {
    packs: Vec<Pack>,
}

impl Default for PackTable {
    fn default() -> Self {
        Self::new(default_packs())
    }
}

impl PackTable {
    pub fn new(packs: Vec<Pack>) -> Self {
        Self { packs }
    }

    pub fn find(&self, id: &ProductId) -> Option<&Pack> {
        self.packs.iter().find(|pack| &pack.id == id)
    }

    pub fn packs(&self) -> &[Pack] {
        &self.packs
    }

    /// Packs of `kind`, ordered by ascending `capacity_range.max`.
    pub fn ordered(&self, kind: PackKind) -> Vec<&Pack> {
        let mut packs = self.packs.iter().filter(|pack| pack.kind == kind).collect::<Vec<_>>();
        packs.sort_by_key(|pack| (pack.capacity_range.max, pack.capacity_range.min));
        packs
    }

    /// Headcount intervals in `0..=MAX_GUESTS` that no sound pack covers.
    pub fn coverage_gaps(&self) -> Vec<CapacityRange> {
        let mut gaps = Vec::new();
        let mut next_uncovered = 0u32;

        let mut ranges =
            self.ordered(PackKind::Sound).iter().map(|pack| pack.capacity_range).collect::<Vec<_>>();
        ranges.sort_by_key(|range| range.min);

        for range in ranges {
            if range.min > next_uncovered {
                gaps.push(CapacityRange::new(next_uncovered, range.min - 1));
            }
            next_uncovered = next_uncovered.max(range.max.saturating_add(1));
            if next_uncovered > MAX_GUESTS {
                return gaps;
            }
        }

        gaps.push(CapacityRange::new(next_uncovered, MAX_GUESTS));
        gaps
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inventory {
    items: Vec<InventoryItem>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(default_inventory())
    }
}

impl Inventory {
    pub fn new(items: Vec<InventoryItem>) -> Self {
        Self { items }
    }

    pub fn find(&self, id: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|item| item.id.as_str() == id)
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    /// Speakers ordered by ascending capacity rating.
    pub fn speaker_tiers(&self) -> Vec<&InventoryItem> {
        let mut speakers = self
            .items
            .iter()
            .filter(|item| item.category == ItemCategory::Speaker && item.capacity_rating.is_some())
            .collect::<Vec<_>>();
        speakers.sort_by_key(|item| item.capacity_rating);
        speakers
    }
}

fn pack(
    id: &str,
    name: &str,
    kind: PackKind,
    base_price: Option<i64>,
    composition: &[&str],
    capacity: (u32, u32),
    lighting_included: bool,
) -> Pack {
    Pack {
        id: ProductId::new(id),
        name: name.to_string(),
        kind,
        base_price: base_price.map(Decimal::from),
        composition: composition.iter().map(|label| label.to_string()).collect(),
        capacity_range: CapacityRange::new(capacity.0, capacity.1),
        lighting_included,
    }
}

pub fn default_packs() -> Vec<Pack> {
    vec![
        pack(
            "pack-s",
            "Pack S",
            PackKind::Sound,
            Some(109),
            &["2 enceintes actives 8\"", "table de mixage 6 voies", "câblage complet"],
            (0, 50),
            false,
        ),
        pack(
            "pack-m",
            "Pack M",
            PackKind::Sound,
            Some(189),
            &["2 enceintes actives 12\"", "1 caisson de basses 18\"", "table de mixage 6 voies"],
            (51, 100),
            false,
        ),
        pack(
            "pack-l",
            "Pack L",
            PackKind::Sound,
            Some(289),
            &[
                "4 enceintes actives 12\"",
                "2 caissons de basses 18\"",
                "table de mixage 12 voies",
                "jeu de lumières",
            ],
            (101, 200),
            true,
        ),
        pack(
            "pack-xl",
            "Pack XL",
            PackKind::Sound,
            Some(449),
            &[
                "4 enceintes actives 15\"",
                "4 caissons de basses 18\"",
                "table de mixage 12 voies",
                "jeu de lumières",
            ],
            (201, 400),
            true,
        ),
        pack(
            "pack-evenement",
            "Pack Événement sur mesure",
            PackKind::Sound,
            None,
            &["système line array", "régie son dédiée", "technicien sur place"],
            (401, MAX_GUESTS),
            false,
        ),
        pack(
            "pack-conference",
            "Pack Conférence",
            PackKind::Conference,
            Some(129),
            &["2 enceintes colonnes", "2 micros sans fil", "table de mixage 6 voies"],
            (0, 80),
            false,
        ),
        pack(
            "pack-conference-plus",
            "Pack Conférence Plus",
            PackKind::Conference,
            Some(229),
            &["4 enceintes colonnes", "4 micros sans fil", "table de mixage 12 voies"],
            (81, 300),
            false,
        ),
    ]
}

fn item(
    id: &str,
    label: &str,
    unit_price: i64,
    quantity: u32,
    capacity_rating: Option<u32>,
    category: ItemCategory,
) -> InventoryItem {
    InventoryItem {
        id: ProductId::new(id),
        label: label.to_string(),
        unit_price: Decimal::from(unit_price),
        quantity,
        capacity_rating,
        category,
    }
}

pub fn default_inventory() -> Vec<InventoryItem> {
    vec![
        item("enceinte-8", "Enceinte active 8\"", 25, 12, Some(50), ItemCategory::Speaker),
        item("enceinte-12", "Enceinte active 12\"", 40, 12, Some(150), ItemCategory::Speaker),
        item("enceinte-15", "Enceinte active 15\"", 60, 8, Some(400), ItemCategory::Speaker),
        item(SUBWOOFER_ID, "Caisson de basses 18\"", 60, 8, None, ItemCategory::Subwoofer),
        item(SMALL_MIXER_ID, "Table de mixage 6 voies", 30, 6, None, ItemCategory::Mixer),
        item(LARGE_MIXER_ID, "Table de mixage 12 voies", 55, 4, None, ItemCategory::Mixer),
        item(WIRED_MICROPHONE_ID, "Micro filaire", 15, 20, None, ItemCategory::Microphone),
        item(WIRELESS_MICROPHONE_ID, "Micro sans fil", 25, 12, None, ItemCategory::Microphone),
        item(LIGHTING_ID, "Jeu de lumières", 45, 6, None, ItemCategory::Lighting),
        item(KARAOKE_ID, "Kit karaoké", 40, 4, None, ItemCategory::Accessory),
        item(INSTALLATION_ID, "Installation et réglages sur site", 90, 10, None, ItemCategory::Service),
    ]
}
