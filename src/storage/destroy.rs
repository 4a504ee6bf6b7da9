use tracing::{debug, error};

use crate::types::{CactusError, LinkId, Result};

use super::store::LinkStore;

/// Destroys `link` and every link reachable from it through `next`.
///
/// The tail is walked and validated before anything is released, so a
/// dangling or cyclic `next` leaves the store untouched. The predecessor of
/// `link` (if any) is not updated; its `next` keeps a handle that no longer
/// resolves. Use [`super::Chain::truncate`] to shorten a chain and
/// re-terminate it in one step.
///
/// Returns the number of links released.
pub fn destroy_cascade(store: &mut LinkStore, link: LinkId) -> Result<usize> {
    let doomed = collect_tail(store, link)?;
    for id in &doomed {
        store.release(*id)?;
    }
    debug!(links = doomed.len(), head = %link, "link.destroy.cascade");
    Ok(doomed.len())
}

/// Returns `link` followed by every successor, in forward order.
pub(crate) fn collect_tail(store: &LinkStore, link: LinkId) -> Result<Vec<LinkId>> {
    let mut tail = Vec::new();
    let mut cursor = Some(link);
    while let Some(id) = cursor {
        let current = match store.get(id) {
            Some(current) => current,
            None if id == link => return Err(CactusError::StaleLink(id)),
            None => {
                error!(from = %link, dangling = %id, "link.destroy.dangling_next");
                return Err(CactusError::InvariantViolation(format!(
                    "link chain starting at {link} reaches destroyed {id}"
                )));
            }
        };
        tail.push(id);
        if tail.len() > store.len() {
            error!(from = %link, "link.destroy.cycle");
            return Err(CactusError::InvariantViolation(format!(
                "link chain starting at {link} is cyclic"
            )));
        }
        cursor = current.next();
    }
    Ok(tail)
}
