use crate::ids::{Batch, SourceRecord};
use crate::provider::{Identified, ProviderErrorKind, ProviderResponse};
use std::collections::HashMap;

/// Outcome of matching a batched response back to its batch
#[derive(Debug)]
pub struct Correlation<T> {
    /// Members the provider returned, in batch order
    pub found: Vec<(SourceRecord, T)>,
    /// Members the provider omitted, in batch order
    pub missing: Vec<SourceRecord>,
    /// Why the whole batch failed, if it did
    pub error: Option<ProviderErrorKind>,
}

/// Matches returned items to the batch members that requested them
///
/// Every member ends up in exactly one of `found` or `missing`. Items the
/// provider returned that no member asked for are dropped. An error or an
/// empty response marks the whole batch missing.
pub fn correlate<T: Identified>(batch: Batch, response: ProviderResponse<T>) -> Correlation<T> {
    let (items, error) = match response {
        ProviderResponse::Success(page) => (page.items, None),
        ProviderResponse::EmptyPage(_) => (Vec::new(), None),
        ProviderResponse::ProviderError(kind) => (Vec::new(), Some(kind)),
    };

    let mut returned: HashMap<String, T> = items
        .into_iter()
        .map(|item| (item.identifier(), item))
        .collect();

    let mut correlation = Correlation {
        found: Vec::with_capacity(returned.len()),
        missing: Vec::new(),
        error,
    };

    for member in batch.into_members() {
        match returned.remove(&member.identifier) {
            Some(item) => correlation.found.push((member, item)),
            None => correlation.missing.push(member),
        }
    }

    if !returned.is_empty() {
        tracing::debug!(
            "Provider returned {} items that were not requested",
            returned.len()
        );
    }

    correlation
}
