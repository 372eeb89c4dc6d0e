//! Exhaustive listing of parameters under a path
//!
//! Follows continuation tokens until the listing is drained, accumulating
//! records by name. Implemented as an explicit loop so arbitrarily large
//! parameter sets cannot grow the call stack.

use indexmap::IndexMap;

use crate::error::Result;
use crate::remote::{ParameterRecord, ParameterStore};

/// List every parameter directly under `parameter_path`, keyed by name.
///
/// Pages through the store `fetch_size` records at a time. A later duplicate
/// name overwrites an earlier one; the store guarantees unique names, so this
/// is tolerated rather than expected. The listing is considered drained when
/// the continuation token is absent or empty, when a page comes back empty,
/// or when a page is shorter than the requested size.
pub async fn find_all_parameters_for_path(
    store: &dyn ParameterStore,
    parameter_path: &str,
    fetch_size: i32,
) -> Result<IndexMap<String, ParameterRecord>> {
    let mut accumulator = IndexMap::new();
    let mut next_token: Option<String> = None;

    loop {
        let page = store
            .parameters_by_path(parameter_path, fetch_size, next_token.take())
            .await?;
        let page_len = page.parameters.len();

        for parameter in page.parameters {
            accumulator.insert(parameter.name.clone(), parameter);
        }

        let token = page.next_token.filter(|t| !t.is_empty());
        let is_last = token.is_none() || page_len == 0 || (page_len as i32) < fetch_size;
        if is_last {
            break;
        }

        tracing::debug!(
            "Fetched {page_len} parameters under {parameter_path}, continuing"
        );
        next_token = token;
    }

    Ok(accumulator)
}
