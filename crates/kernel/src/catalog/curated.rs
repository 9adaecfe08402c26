//! Curated recommendation lists.
//!
//! A list is always replaced as a whole: the old membership is cleared and
//! the new entries inserted in one batch. Readers racing a replacement on a
//! store without transactions may see the list empty.

use tracing::info;

use super::category::CuratedList;
use super::mapper;
use super::query::{BookFilter, BookQuery};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{Book, CuratedEntry};
use crate::store::CatalogStore;

/// Check a replacement before anything is written.
///
/// The token must name a curated list, every entry needs an id, and director
/// entries need both annotation fields.
pub fn validate(token: &str, entries: &[CuratedEntry]) -> CatalogResult<CuratedList> {
    let list = CuratedList::from_token(token)
        .ok_or_else(|| CatalogError::invalid(format!("not a curated category: {token:?}")))?;

    for (index, entry) in entries.iter().enumerate() {
        if entry.id.is_empty() {
            return Err(CatalogError::invalid(format!("entry {index} has no book id")));
        }
        if list.is_annotated() && (entry.rwords.is_empty() || entry.ruser.is_empty()) {
            return Err(CatalogError::invalid(format!(
                "director entry {index} ({}) needs rwords and ruser",
                entry.id
            )));
        }
    }

    Ok(list)
}

/// Replace a curated list's membership.
///
/// Validation failures leave storage untouched. A storage failure is
/// reported as [`CatalogError::Persistence`]; on stores without
/// transactions the list may then be partially replaced.
pub async fn replace_set(
    store: &dyn CatalogStore,
    token: &str,
    entries: &[CuratedEntry],
) -> CatalogResult<()> {
    let list = validate(token, entries)?;

    // Annotations are only persisted for the director list.
    let entries: Vec<CuratedEntry> = if list.is_annotated() {
        entries.to_vec()
    } else {
        entries
            .iter()
            .map(|e| CuratedEntry::plain(e.id.clone()))
            .collect()
    };

    store.replace_curated(list, &entries).await?;
    info!(list = token, entries = entries.len(), "curated list replaced");
    Ok(())
}

/// Books on a curated list, in list order.
pub async fn query_curated_join(
    store: &dyn CatalogStore,
    list: CuratedList,
    filter: BookFilter,
) -> CatalogResult<Vec<Book>> {
    let plan = BookQuery::curated(list, filter);
    let rows = store.select_books(&plan).await?;
    Ok(mapper::map_books(rows, plan.shape))
}
