//! Keyset pagination for list endpoints.
//!
//! Agreements are listed in id order. The cursor is the id of the last
//! agreement on the previous page, so pages stay stable while agreements are
//! added or retired between requests.

use ehr_types::{AgreementId, StateAndRef};
use serde::{Deserialize, Serialize};

use crate::error::RpcError;

/// Default page size when `count` is not specified.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Maximum allowed page size.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Common pagination parameters accepted by list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    /// Id of the last agreement seen, from a previous response.
    pub cursor: Option<String>,
    /// Number of items per page (default 100, max 1000).
    pub count: Option<u32>,
}

impl PaginationParams {
    /// Resolve effective page size, clamped to [1, MAX_PAGE_SIZE].
    pub fn effective_count(&self) -> u32 {
        self.count
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn after(&self) -> Result<Option<AgreementId>, RpcError> {
        self.cursor
            .as_deref()
            .map(|c| {
                c.parse()
                    .map_err(|_| RpcError::BadRequest(format!("invalid cursor: {c}")))
            })
            .transpose()
    }
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    /// Cursor to pass for the next page, or `None` if this is the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// One page of `items` after the cursor in `params`.
pub fn paginate(
    mut items: Vec<StateAndRef>,
    params: &PaginationParams,
) -> Result<(Vec<StateAndRef>, PaginationMeta), RpcError> {
    items.sort_by_key(|v| v.state.id);
    if let Some(after) = params.after()? {
        items.retain(|v| v.state.id > after);
    }
    let count = params.effective_count() as usize;
    let more = items.len() > count;
    items.truncate(count);
    let cursor = more
        .then(|| items.last().map(|v| v.state.id.to_string()))
        .flatten();
    Ok((items, PaginationMeta { cursor }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ehr_types::{Agreement, Party, PartyName, PublicKey, StateRef};

    fn party(name: &str, byte: u8) -> Party {
        Party::new(PartyName::parse(name).unwrap(), PublicKey([byte; 32]))
    }

    fn versions(n: usize) -> Vec<StateAndRef> {
        (0..n)
            .map(|_| {
                let state = Agreement::new(party("D1", 1), party("D2", 2), party("P", 3), None, None);
                StateAndRef {
                    reference: StateRef::new(state.id, 1),
                    state,
                }
            })
            .collect()
    }

    #[test]
    fn effective_count_defaults_and_clamps() {
        assert_eq!(PaginationParams::default().effective_count(), 100);
        let p = PaginationParams {
            cursor: None,
            count: Some(5000),
        };
        assert_eq!(p.effective_count(), 1000);
    }

    #[test]
    fn pages_walk_every_item_once() {
        let all = versions(5);
        let mut params = PaginationParams {
            cursor: None,
            count: Some(2),
        };
        let mut seen = Vec::new();
        loop {
            let (page, meta) = paginate(all.clone(), &params).unwrap();
            seen.extend(page.into_iter().map(|v| v.state.id));
            match meta.cursor {
                Some(cursor) => params.cursor = Some(cursor),
                None => break,
            }
        }
        let mut expected: Vec<_> = all.iter().map(|v| v.state.id).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn exact_final_page_has_no_cursor() {
        let params = PaginationParams {
            cursor: None,
            count: Some(3),
        };
        let (page, meta) = paginate(versions(3), &params).unwrap();
        assert_eq!(page.len(), 3);
        assert!(meta.cursor.is_none());
    }

    #[test]
    fn garbage_cursor_is_rejected() {
        let params = PaginationParams {
            cursor: Some("not-an-id".into()),
            count: None,
        };
        assert!(matches!(
            paginate(versions(1), &params),
            Err(RpcError::BadRequest(_))
        ));
    }
}
