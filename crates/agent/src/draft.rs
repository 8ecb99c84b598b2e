//! Draft order blocks embedded in generated replies.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use soundrent_core::DraftOrder;
use tracing::warn;

use crate::catalog::CatalogClient;

static DRAFT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<draft_order>\s*(.*?)\s*</draft_order>").expect("draft block pattern")
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedDraft {
    /// Reply text with every draft block removed.
    pub text: String,
    pub draft: Option<DraftOrder>,
}

/// Splits a generated reply into visible text and the first parseable
/// draft order block.
pub fn extract_draft(generated: &str) -> ExtractedDraft {
    let draft = DRAFT_BLOCK.captures_iter(generated).find_map(|captures| {
        let body = captures.get(1)?.as_str();
        match serde_json::from_str::<DraftOrder>(body) {
            Ok(draft) => Some(draft),
            Err(error) => {
                warn!(
                    event_name = "assistant.draft.unparseable",
                    error = %error,
                    "ignoring malformed draft order block"
                );
                None
            }
        }
    });
    let text = DRAFT_BLOCK.replace_all(generated, "").trim().to_string();
    ExtractedDraft { text, draft }
}

/// Drops selections whose catalog id the catalog does not know. A draft with
/// nothing left is discarded.
pub async fn validate_draft(
    mut draft: DraftOrder,
    catalog: &dyn CatalogClient,
) -> Result<Option<DraftOrder>> {
    let mut kept = Vec::with_capacity(draft.selections.len());
    for selection in draft.selections {
        if selection.qty == 0 {
            continue;
        }
        if catalog.find_by_id(&selection.catalog_id).await?.is_some() {
            kept.push(selection);
        } else {
            warn!(
                event_name = "assistant.draft.unknown_catalog_id",
                catalog_id = selection.catalog_id.as_str(),
                "dropping draft selection with unknown catalog id"
            );
        }
    }

    if kept.is_empty() {
        return Ok(None);
    }
    draft.selections = kept;
    draft.needs_confirmation = true;
    Ok(Some(draft))
}

#[cfg(test)]
mod tests {
    use soundrent_core::{Inventory, PackTable};

    use super::{extract_draft, validate_draft};
    use crate::catalog::InMemoryCatalog;

    const REPLY: &str = r#"Voici ma proposition.
<draft_order>{"selections":[{"catalogId":"pack-m","qty":1},{"catalogId":"laser-vert","qty":2}],"event":{"startISO":"2026-06-12T18:00:00","endISO":"2026-06-12T23:59:00"},"needsConfirmation":false}</draft_order>
Qu'en pensez-vous ?"#;

    #[test]
    fn block_is_stripped_from_the_visible_text() {
        let extracted = extract_draft(REPLY);

        assert_eq!(extracted.text, "Voici ma proposition.\n\nQu'en pensez-vous ?");
        assert_eq!(extracted.draft.map(|draft| draft.selections.len()), Some(2));
    }

    #[test]
    fn malformed_block_is_dropped_but_still_hidden() {
        let extracted = extract_draft("Proposition <draft_order>{not json}</draft_order>");
        assert_eq!(extracted.text, "Proposition");
        assert_eq!(extracted.draft, None);
    }

    #[tokio::test]
    async fn unknown_catalog_ids_are_removed() {
        let catalog = InMemoryCatalog::seeded(&PackTable::default(), &Inventory::default());
        let draft = extract_draft(REPLY).draft.expect("draft block");

        let validated = validate_draft(draft, &catalog).await.ok().flatten().expect("validated draft");
        let ids = validated.catalog_ids().map(|id| id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["pack-m"]);
        assert!(validated.needs_confirmation);
    }

    #[tokio::test]
    async fn draft_without_known_ids_is_discarded() {
        let catalog = InMemoryCatalog::seeded(&PackTable::default(), &Inventory::default());
        let draft = extract_draft(
            r#"<draft_order>{"selections":[{"catalogId":"inconnu","qty":1}],"event":{"startISO":"a","endISO":"b"}}</draft_order>"#,
        )
        .draft
        .expect("draft block");

        assert_eq!(validate_draft(draft, &catalog).await.ok().flatten(), None);
    }
}
