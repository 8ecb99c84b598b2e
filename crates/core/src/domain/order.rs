use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSelection {
    pub catalog_id: ProductId,
    pub qty: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftEvent {
    #[serde(rename = "startISO")]
    pub start_iso: String,
    #[serde(rename = "endISO")]
    pub end_iso: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// Structured order proposal handed back to the booking widget. Always needs
/// an explicit confirmation from the customer before checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrder {
    pub selections: Vec<DraftSelection>,
    pub event: DraftEvent,
    #[serde(default = "needs_confirmation_default")]
    pub needs_confirmation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_installation: Option<bool>,
}

fn needs_confirmation_default() -> bool {
    true
}

impl DraftOrder {
    pub fn new(selections: Vec<DraftSelection>, event: DraftEvent) -> Self {
        Self { selections, event, needs_confirmation: true, with_installation: None }
    }

    pub fn catalog_ids(&self) -> impl Iterator<Item = &ProductId> {
        self.selections.iter().map(|selection| &selection.catalog_id)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DraftEvent, DraftOrder, DraftSelection};
    use crate::domain::product::ProductId;

    #[test]
    fn serializes_with_wire_field_names() {
        let mut order = DraftOrder::new(
            vec![DraftSelection { catalog_id: ProductId::new("pack-l"), qty: 1 }],
            DraftEvent {
                start_iso: "2026-06-13T18:00:00".to_string(),
                end_iso: "2026-06-14T02:00:00".to_string(),
                address: None,
                department: Some("75".to_string()),
            },
        );
        order.with_installation = Some(true);

        let value = serde_json::to_value(&order).expect("serialize draft order");
        assert_eq!(
            value,
            json!({
                "selections": [{"catalogId": "pack-l", "qty": 1}],
                "event": {
                    "startISO": "2026-06-13T18:00:00",
                    "endISO": "2026-06-14T02:00:00",
                    "department": "75"
                },
                "needsConfirmation": true,
                "withInstallation": true
            })
        );
    }

    #[test]
    fn missing_confirmation_flag_defaults_to_true() {
        let order: DraftOrder = serde_json::from_value(json!({
            "selections": [],
            "event": {"startISO": "2026-06-13T18:00:00", "endISO": "2026-06-13T23:00:00"}
        }))
        .expect("deserialize draft order");
        assert!(order.needs_confirmation);
    }
}
