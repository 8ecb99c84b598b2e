use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use soundrent_core::domain::product::ItemCategory;
use soundrent_core::{Inventory, PackTable, ProductId};
use tokio::sync::RwLock;

/// Catalog entry as the booking backend exposes it. Packs are listed under
/// [`ItemCategory::Pack`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: ProductId,
    pub name: String,
    pub category: ItemCategory,
    pub unit_price: Option<Decimal>,
    pub quantity: u32,
}

#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<CatalogEntry>>;
    async fn list_by_category(&self, category: ItemCategory) -> Result<Vec<CatalogEntry>>;
}

#[derive(Default)]
pub struct InMemoryCatalog {
    entries: RwLock<BTreeMap<ProductId, CatalogEntry>>,
}

impl InMemoryCatalog {
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let entries = entries.into_iter().map(|entry| (entry.id.clone(), entry)).collect();
        Self { entries: RwLock::new(entries) }
    }

    /// Every pack plus every inventory item.
    pub fn seeded(packs: &PackTable, inventory: &Inventory) -> Self {
        let packs = packs.packs().iter().map(|pack| CatalogEntry {
            id: pack.id.clone(),
            name: pack.name.clone(),
            category: ItemCategory::Pack,
            unit_price: pack.base_price,
            quantity: 1,
        });
        let items = inventory.items().iter().map(|item| CatalogEntry {
            id: item.id.clone(),
            name: item.label.clone(),
            category: item.category,
            unit_price: Some(item.unit_price),
            quantity: item.quantity,
        });
        Self::new(packs.chain(items))
    }

    pub async fn upsert(&self, entry: CatalogEntry) {
        self.entries.write().await.insert(entry.id.clone(), entry);
    }

    pub async fn remove(&self, id: &ProductId) -> Option<CatalogEntry> {
        self.entries.write().await.remove(id)
    }
}

#[async_trait]
impl CatalogClient for InMemoryCatalog {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<CatalogEntry>> {
        Ok(self.entries.read().await.get(id).cloned())
    }

    async fn list_by_category(&self, category: ItemCategory) -> Result<Vec<CatalogEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .values()
            .filter(|entry| entry.category == category)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use soundrent_core::domain::product::ItemCategory;
    use soundrent_core::{Inventory, PackTable, ProductId};

    use super::{CatalogClient, InMemoryCatalog};

    #[tokio::test]
    async fn seeded_catalog_lists_packs_and_items() {
        let catalog = InMemoryCatalog::seeded(&PackTable::default(), &Inventory::default());

        let packs = catalog.list_by_category(ItemCategory::Pack).await.unwrap_or_default();
        assert_eq!(packs.len(), PackTable::default().packs().len());

        let quote_only = catalog
            .find_by_id(&ProductId::new("pack-evenement"))
            .await
            .ok()
            .flatten()
            .map(|entry| entry.unit_price);
        assert_eq!(quote_only, Some(None));

        let microphones =
            catalog.list_by_category(ItemCategory::Microphone).await.unwrap_or_default();
        assert!(microphones.iter().any(|entry| entry.id.as_str() == "micro-hf"));
    }

    #[tokio::test]
    async fn removed_entries_are_no_longer_found() {
        let catalog = InMemoryCatalog::seeded(&PackTable::default(), &Inventory::default());
        let id = ProductId::new("kit-karaoke");

        assert!(catalog.remove(&id).await.is_some());
        assert_eq!(catalog.find_by_id(&id).await.ok().flatten(), None);
    }
}
